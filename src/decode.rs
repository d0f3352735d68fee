//! Decoder: restores the named form of a compacted program.
//!
//! Every namespace of the symbol table is reversed into an index → name map
//! and the compaction walk is replayed backwards. Debug metadata dropped by
//! compaction is gone for good.

#[cfg(feature = "napi")]
use napi_derive::napi;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::block::{
    ScriptKind, ARGS_KEY, FUNCTION_KEY, IMAGE_KEY, LIST_KEY, SCRIPTS_KEY, VARIABLE_KEY,
};
use crate::symbols::{Namespace, SymbolTable};
use crate::validate::CompactError;
use crate::visitor::{walk_block, walk_call, BlockVisitor};

type Names = BTreeMap<i64, String>;

// ═══════════════════════════════════════════════════════════════════════════════
// REVERSE TABLE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default)]
pub struct ReverseTable {
    function: Names,
    list: Names,
    variable: Names,
    image: Names,
    locals: BTreeMap<String, Names>,
    event_locals: Option<Names>,
}

impl ReverseTable {
    /// Fails if a namespace maps two names to one index, or holds an index of
    /// the wrong sign for its kind.
    pub fn new(table: &SymbolTable) -> Result<Self, CompactError> {
        let locals = table
            .locals
            .iter()
            .map(|(function, namespace)| {
                let label = format!("locals.{}", function);
                Ok((function.clone(), reverse(&label, namespace, true)?))
            })
            .collect::<Result<BTreeMap<_, _>, CompactError>>()?;

        Ok(ReverseTable {
            function: reverse("function", &table.function, false)?,
            list: reverse("list", &table.list, false)?,
            variable: reverse("variable", &table.variable, false)?,
            image: reverse("image", &table.image, false)?,
            locals,
            event_locals: table
                .event_locals()
                .map(|namespace| reverse("when-green-flag-clicked.locals", namespace, true))
                .transpose()?,
        })
    }

    pub fn function_name(&self, index: i64) -> Option<&str> {
        self.function.get(&index).map(String::as_str)
    }

    /// Reverse local namespace of the function referenced by `target`, which
    /// is either a function index or a name left unresolved.
    fn callee_locals(&self, target: Option<&Value>) -> Option<&Names> {
        self.locals.get(self.callee_name(target)?)
    }

    fn callee_name<'s>(&'s self, target: Option<&'s Value>) -> Option<&'s str> {
        match target? {
            Value::String(name) => Some(name.as_str()),
            other => self.function_name(other.as_i64()?),
        }
    }

    fn decode_scripts(&self, scripts: &mut Value) -> Result<(), CompactError> {
        match scripts {
            Value::Array(items) => {
                for item in items {
                    self.decode_script(item)?;
                }
            }
            other => Decoder::new(self, None).visit_value(other),
        }
        Ok(())
    }

    fn decode_script(&self, script: &mut Value) -> Result<(), CompactError> {
        let scope = match script.as_object_mut() {
            Some(map) => match ScriptKind::of(map) {
                ScriptKind::EventHandler => self.event_locals.as_ref(),
                ScriptKind::Function => {
                    let function = self.callee_name(map.get(FUNCTION_KEY)).map(str::to_string);
                    let locals = function.as_deref().and_then(|name| self.locals.get(name));
                    if let (Some(function), Some(locals)) = (function.as_deref(), locals) {
                        restore_args(map, function, locals)?;
                    } else if map.get(ARGS_KEY).is_some_and(Value::is_u64) {
                        log::warn!("argument count of an unknown function left as is");
                    }
                    locals
                }
                _ => None,
            },
            None => None,
        };
        Decoder::new(self, scope).visit_value(script);
        Ok(())
    }
}

fn reverse(label: &str, namespace: &Namespace, local: bool) -> Result<Names, CompactError> {
    let mut names = Names::new();
    for (name, index) in namespace.iter() {
        if local != (index < 0) {
            return Err(CompactError::invalid_table(
                label,
                format!("index {} of '{}' has the wrong sign", index, name),
            ));
        }
        if let Some(previous) = names.insert(index, name.to_string()) {
            return Err(CompactError::invalid_table(
                label,
                format!("index {} is shared by '{}' and '{}'", index, previous, name),
            ));
        }
    }
    Ok(names)
}

/// Expands an argument count back into declarations: argument `i` (1-based)
/// is local index `-i`. The count may not exceed the function's namespace.
fn restore_args(
    script: &mut Map<String, Value>,
    function: &str,
    locals: &Names,
) -> Result<(), CompactError> {
    let Some(count) = script.get(ARGS_KEY).and_then(Value::as_u64) else {
        return Ok(());
    };
    let declared = locals.len();
    if count > declared as u64 {
        return Err(CompactError::ArgumentCount {
            function: function.to_string(),
            count,
            declared,
        });
    }
    let args = (1..=count as i64)
        .map(|position| {
            let name = locals
                .get(&-position)
                .cloned()
                .unwrap_or_else(|| format!("arg{}", position));
            let mut declaration = Map::new();
            declaration.insert(VARIABLE_KEY.to_string(), Value::String(name));
            Value::Object(declaration)
        })
        .collect();
    script.insert(ARGS_KEY.to_string(), Value::Array(args));
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// DECODER
// ═══════════════════════════════════════════════════════════════════════════════

struct Decoder<'a> {
    table: &'a ReverseTable,
    scope: Option<&'a Names>,
}

impl<'a> Decoder<'a> {
    fn new(table: &'a ReverseTable, scope: Option<&'a Names>) -> Self {
        Decoder { table, scope }
    }
}

fn restore(map: &mut Map<String, Value>, key: &str, names: Option<&Names>) {
    let Some(index) = map.get(key).and_then(Value::as_i64) else {
        return;
    };
    match names.and_then(|names| names.get(&index)) {
        Some(name) => {
            map.insert(key.to_string(), Value::String(name.clone()));
        }
        None => log::warn!("no {} name for index {}", key, index),
    }
}

impl BlockVisitor for Decoder<'_> {
    fn visit_block(&mut self, block: &mut Map<String, Value>) {
        let is_local = block
            .get(VARIABLE_KEY)
            .and_then(Value::as_i64)
            .is_some_and(|index| index < 0);
        let variables = if is_local {
            self.scope
        } else {
            Some(&self.table.variable)
        };
        restore(block, VARIABLE_KEY, variables);
        restore(block, LIST_KEY, Some(&self.table.list));
        restore(block, IMAGE_KEY, Some(&self.table.image));
        restore(block, FUNCTION_KEY, Some(&self.table.function));
        walk_block(self, block);
    }

    fn visit_call(&mut self, call: &mut Map<String, Value>) {
        let table = self.table;
        let callee = table.callee_locals(call.get(FUNCTION_KEY));
        if let Some(Value::Array(bindings)) = call.get_mut(ARGS_KEY) {
            for binding in bindings.iter_mut().filter_map(Value::as_object_mut) {
                restore(binding, VARIABLE_KEY, callee);
            }
        }
        restore(call, FUNCTION_KEY, Some(&table.function));
        walk_call(self, call);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ENTRY
// ═══════════════════════════════════════════════════════════════════════════════

/// Restores names in a value produced by `compactify`, using the table that
/// compaction returned. Scalars pass through.
pub fn uncompactify(value: &Value, table: &SymbolTable) -> Result<Value, CompactError> {
    let reverse = ReverseTable::new(table)?;
    let mut value = value.clone();

    if value.is_array() {
        reverse.decode_scripts(&mut value)?;
    } else if let Some(scripts) = value
        .as_object_mut()
        .and_then(|program| program.get_mut(SCRIPTS_KEY))
    {
        reverse.decode_scripts(scripts)?;
    }
    Ok(value)
}

// ═══════════════════════════════════════════════════════════════════════════════
// NAPI EXPORTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(feature = "napi")]
#[napi]
pub fn uncompactify_native(
    value: serde_json::Value,
    table: serde_json::Value,
) -> napi::Result<serde_json::Value> {
    let table: SymbolTable = serde_json::from_value(table)
        .map_err(|e| CompactError::invalid_table("symbol", e.to_string()))?;
    Ok(uncompactify(&value, &table)?)
}
