//! Scope-local compaction.
//!
//! Rewrites one function (or the event handler) using only that scope's own
//! local namespace. Names the scope does not declare stay strings; the
//! renamer resolves them against the globals afterwards.

use crate::block::{ScriptKind, ARGS_KEY, FUNCTION_KEY, VARIABLE_KEY};
use crate::symbols::{Namespace, SymbolTable};
use crate::visitor::{walk_block, BlockVisitor};
use serde_json::{Map, Value};

pub struct ScopeCompactor<'a> {
    locals: &'a Namespace,
}

impl<'a> ScopeCompactor<'a> {
    pub fn new(locals: &'a Namespace) -> Self {
        ScopeCompactor { locals }
    }
}

impl BlockVisitor for ScopeCompactor<'_> {
    fn visit_block(&mut self, block: &mut Map<String, Value>) {
        let index = block
            .get(VARIABLE_KEY)
            .and_then(Value::as_str)
            .and_then(|name| self.locals.get(name));
        if let Some(index) = index {
            block.insert(VARIABLE_KEY.to_string(), Value::from(index));
        }
        walk_block(self, block);
    }

    // Calls keep the default walk: bound values are rewritten in this scope,
    // binding names belong to the callee and are left alone.
}

/// Compacts a single scope-owning script against `locals`. The argument
/// declaration list collapses to its length; declared locals and every
/// reference inside the body take their negative index.
pub fn compact_scope(script: &Map<String, Value>, locals: &Namespace) -> Map<String, Value> {
    let mut script = script.clone();

    let arg_count = script.get(ARGS_KEY).and_then(Value::as_array).map(Vec::len);
    if let Some(count) = arg_count {
        script.insert(ARGS_KEY.to_string(), Value::from(count));
    }

    ScopeCompactor::new(locals).visit_block(&mut script);
    script
}

/// Runs the scope-local compactor over every function and event handler of a
/// script list. Other scripts, and non-list input, are returned unchanged.
pub fn compact_scopes(scripts: &Value, table: &SymbolTable) -> Value {
    let Some(items) = scripts.as_array() else {
        return scripts.clone();
    };

    let empty = Namespace::new();
    let compacted = items
        .iter()
        .map(|item| {
            let Some(script) = item.as_object() else {
                return item.clone();
            };
            let locals = match ScriptKind::of(script) {
                ScriptKind::EventHandler => table.event_locals(),
                ScriptKind::Function => script
                    .get(FUNCTION_KEY)
                    .and_then(Value::as_str)
                    .and_then(|name| table.function_locals(name)),
                _ => return item.clone(),
            };
            Value::Object(compact_scope(script, locals.unwrap_or(&empty)))
        })
        .collect();

    Value::Array(compacted)
}
