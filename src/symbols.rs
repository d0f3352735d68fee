//! Symbol table construction.
//!
//! One pass over the top-level script list assigns every declared name a
//! small integer: global namespaces count up from 0 in first-seen order, each
//! scope's locals count down from -1 (arguments first, then locals).

use crate::block::{declared_variables, ScriptKind, ARGS_KEY, FUNCTION_KEY, LOCALS_KEY};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

// ═══════════════════════════════════════════════════════════════════════════════
// NAMESPACE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Namespace(BTreeMap<String, i64>);

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `name` with the next non-negative index. Re-declaring a known
    /// name returns its existing index.
    pub fn declare_global(&mut self, name: &str) -> i64 {
        let next = self.0.len() as i64;
        *self.0.entry(name.to_string()).or_insert(next)
    }

    /// Registers `name` with the next negative index (-1, -2, ...).
    pub fn declare_local(&mut self, name: &str) -> i64 {
        let next = -(self.0.len() as i64) - 1;
        *self.0.entry(name.to_string()).or_insert(next)
    }

    pub fn get(&self, name: &str) -> Option<i64> {
        self.0.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.0.iter().map(|(name, index)| (name.as_str(), *index))
    }
}

impl<S: Into<String>> FromIterator<(S, i64)> for Namespace {
    fn from_iter<I: IntoIterator<Item = (S, i64)>>(iter: I) -> Self {
        Namespace(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SYMBOL TABLE
// ═══════════════════════════════════════════════════════════════════════════════

/// The event handler's reserved slot. `locals` is present only when the
/// program has an event-handler script.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventScope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locals: Option<Namespace>,
}

/// Five-namespace symbol table. Serializes to the wire shape the JS host
/// already knows:
/// `{ "when-green-flag-clicked": {..}, locals, function, list, variable, image }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolTable {
    #[serde(rename = "when-green-flag-clicked", default)]
    pub event_handler: EventScope,
    /// Per-function local namespaces, keyed by function name.
    #[serde(default)]
    pub locals: BTreeMap<String, Namespace>,
    #[serde(default)]
    pub function: Namespace,
    #[serde(default)]
    pub list: Namespace,
    #[serde(default)]
    pub variable: Namespace,
    #[serde(default)]
    pub image: Namespace,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Local namespace of the function named `function`.
    pub fn function_locals(&self, function: &str) -> Option<&Namespace> {
        self.locals.get(function)
    }

    pub fn event_locals(&self) -> Option<&Namespace> {
        self.event_handler.locals.as_ref()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// BUILDER
// ═══════════════════════════════════════════════════════════════════════════════

/// Builds the symbol table from a top-level script list. Unrecognized
/// entries are ignored.
pub fn build_symbol_table(scripts: &[Value]) -> SymbolTable {
    let mut table = SymbolTable::new();

    for script in scripts.iter().filter_map(Value::as_object) {
        let kind = ScriptKind::of(script);
        match kind {
            ScriptKind::EventHandler => {
                let locals = table.event_handler.locals.get_or_insert_with(Namespace::new);
                for name in declared_variables(script.get(LOCALS_KEY)) {
                    locals.declare_local(name);
                }
            }
            ScriptKind::Function => {
                let Some(name) = script.get(FUNCTION_KEY).and_then(Value::as_str) else {
                    continue;
                };
                table.function.declare_global(name);
                let locals = table.locals.entry(name.to_string()).or_default();
                let declared = declared_variables(script.get(ARGS_KEY))
                    .chain(declared_variables(script.get(LOCALS_KEY)));
                for local in declared {
                    locals.declare_local(local);
                }
            }
            ScriptKind::Image | ScriptKind::Variable | ScriptKind::List => {
                let Some(name) = kind.name_key().and_then(|key| script.get(key)).and_then(Value::as_str)
                else {
                    continue;
                };
                let namespace = match kind {
                    ScriptKind::Image => &mut table.image,
                    ScriptKind::Variable => &mut table.variable,
                    _ => &mut table.list,
                };
                namespace.declare_global(name);
            }
            ScriptKind::Other => {}
        }
    }

    log::debug!(
        "symbol table: {} function(s), {} list(s), {} variable(s), {} image(s)",
        table.function.len(),
        table.list.len(),
        table.variable.len(),
        table.image.len()
    );
    table
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
