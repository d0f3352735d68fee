//! Script-level resolution.
//!
//! Second pass over scope-compacted scripts: names the owning scope left as
//! strings fall back to the global namespaces, call targets become function
//! indices and call bindings are resolved against the *callee's* locals.
//! Debug metadata is dropped on the way.

use crate::block::{
    strip_debug_info, ScriptKind, ARGS_KEY, EVENT_HANDLER, FUNCTION_KEY, IMAGE_KEY, LIST_KEY,
    VARIABLE_KEY,
};
use crate::scope::compact_scopes;
use crate::symbols::{Namespace, SymbolTable};
use crate::validate::{NameKind, UnresolvedName};
use crate::visitor::{walk_block, walk_call, BlockVisitor};
use serde_json::{Map, Value};

/// Fields of an ordinary block that hold global names.
const GLOBAL_FIELDS: [(&str, NameKind); 4] = [
    (VARIABLE_KEY, NameKind::Variable),
    (LIST_KEY, NameKind::List),
    (IMAGE_KEY, NameKind::Image),
    (FUNCTION_KEY, NameKind::Function),
];

pub struct RenamerVisitor<'a> {
    table: &'a SymbolTable,
    scope: Option<String>,
    pub unresolved: Vec<UnresolvedName>,
}

impl<'a> RenamerVisitor<'a> {
    pub fn new(table: &'a SymbolTable) -> Self {
        RenamerVisitor {
            table,
            scope: None,
            unresolved: Vec::new(),
        }
    }

    /// Names the scope subsequent diagnostics are attributed to.
    pub fn enter_scope(&mut self, scope: Option<String>) {
        self.scope = scope;
    }

    fn namespace(&self, kind: NameKind) -> &'a Namespace {
        let table = self.table;
        match kind {
            NameKind::List => &table.list,
            NameKind::Image => &table.image,
            NameKind::Function => &table.function,
            NameKind::Variable | NameKind::Binding => &table.variable,
        }
    }

    fn resolve_global(&mut self, block: &mut Map<String, Value>, key: &str, kind: NameKind) {
        let Some(name) = block.get(key).and_then(Value::as_str).map(str::to_owned) else {
            return;
        };
        match self.namespace(kind).get(&name) {
            Some(index) => {
                block.insert(key.to_string(), Value::from(index));
            }
            None => self.report(kind, name, self.scope.clone()),
        }
    }

    fn resolve_binding(
        &mut self,
        binding: &mut Map<String, Value>,
        callee: Option<&Namespace>,
        target: &str,
    ) {
        let Some(name) = binding
            .get(VARIABLE_KEY)
            .and_then(Value::as_str)
            .map(str::to_owned)
        else {
            return;
        };
        match callee.and_then(|locals| locals.get(&name)) {
            Some(index) => {
                binding.insert(VARIABLE_KEY.to_string(), Value::from(index));
            }
            None => self.report(NameKind::Binding, name, Some(target.to_string())),
        }
    }

    fn report(&mut self, kind: NameKind, name: String, scope: Option<String>) {
        log::warn!(
            "unresolved {} '{}'{}",
            kind,
            name,
            scope
                .as_deref()
                .map(|s| format!(" in '{}'", s))
                .unwrap_or_default()
        );
        self.unresolved.push(UnresolvedName { kind, name, scope });
    }
}

impl BlockVisitor for RenamerVisitor<'_> {
    fn visit_block(&mut self, block: &mut Map<String, Value>) {
        for (key, kind) in GLOBAL_FIELDS {
            self.resolve_global(block, key, kind);
        }
        walk_block(self, block);
    }

    fn visit_call(&mut self, call: &mut Map<String, Value>) {
        let table = self.table;
        let target = call
            .get(FUNCTION_KEY)
            .and_then(Value::as_str)
            .map(str::to_owned);

        // Bindings are looked up by the callee's name, so before the target
        // itself turns into an index.
        if let Some(target) = &target {
            let callee = table.function_locals(target);
            if let Some(Value::Array(bindings)) = call.get_mut(ARGS_KEY) {
                for binding in bindings.iter_mut().filter_map(Value::as_object_mut) {
                    self.resolve_binding(binding, callee, target);
                }
            }
        }
        self.resolve_global(call, FUNCTION_KEY, NameKind::Function);

        walk_call(self, call);
    }
}

/// Scope a top-level script owns, for diagnostics.
fn script_scope(script: &Value) -> Option<String> {
    let script = script.as_object()?;
    match ScriptKind::of(script) {
        ScriptKind::EventHandler => Some(EVENT_HANDLER.to_string()),
        ScriptKind::Function => script
            .get(FUNCTION_KEY)
            .and_then(Value::as_str)
            .map(str::to_owned),
        _ => None,
    }
}

/// Resolves already scope-compacted scripts in place. Returns every name no
/// namespace could resolve; those stay strings in the tree.
pub fn resolve_scripts(scripts: &mut Value, table: &SymbolTable) -> Vec<UnresolvedName> {
    strip_debug_info(scripts);

    let mut renamer = RenamerVisitor::new(table);
    match scripts {
        Value::Array(items) => {
            for item in items {
                renamer.enter_scope(script_scope(item));
                renamer.visit_value(item);
            }
        }
        other => renamer.visit_value(other),
    }
    renamer.unresolved
}

/// Scope-local compaction followed by script-level resolution.
pub fn compact_scripts(scripts: &Value, table: &SymbolTable) -> (Value, Vec<UnresolvedName>) {
    let mut compacted = compact_scopes(scripts, table);
    let unresolved = resolve_scripts(&mut compacted, table);
    (compacted, unresolved)
}
