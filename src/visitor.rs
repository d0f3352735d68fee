use crate::block::{is_call, ARGS_KEY};
use serde_json::{Map, Value};

/// The BlockVisitor trait defines the single authoritative traversal mechanism for block trees.
///
/// Rules:
/// 1. Calls with named bindings are dispatched to `visit_call`, their binding
///    entries to `visit_binding`; every other object is a block.
/// 2. Implementers override `visit_*` methods to add behavior.
/// 3. Implementers MUST call `walk_*` functions to continue traversal unless pruning is intended.
pub trait BlockVisitor {
    fn visit_value(&mut self, value: &mut Value) {
        walk_value(self, value);
    }

    fn visit_block(&mut self, block: &mut Map<String, Value>) {
        walk_block(self, block);
    }

    fn visit_call(&mut self, call: &mut Map<String, Value>) {
        walk_call(self, call);
    }

    /// A `{variable, value}` entry of a call. Its `variable` names a parameter
    /// of the callee, not a reference in the current scope.
    fn visit_binding(&mut self, binding: &mut Map<String, Value>) {
        walk_binding(self, binding);
    }
}

pub fn walk_value<V: BlockVisitor + ?Sized>(visitor: &mut V, value: &mut Value) {
    match value {
        Value::Array(items) => {
            for item in items {
                visitor.visit_value(item);
            }
        }
        Value::Object(map) => {
            if is_call(map) {
                visitor.visit_call(map);
            } else {
                visitor.visit_block(map);
            }
        }
        _ => {}
    }
}

pub fn walk_block<V: BlockVisitor + ?Sized>(visitor: &mut V, block: &mut Map<String, Value>) {
    for child in block.values_mut() {
        visitor.visit_value(child);
    }
}

pub fn walk_call<V: BlockVisitor + ?Sized>(visitor: &mut V, call: &mut Map<String, Value>) {
    for (key, child) in call.iter_mut() {
        match (key.as_str(), child) {
            (ARGS_KEY, Value::Array(bindings)) => {
                for binding in bindings {
                    match binding {
                        Value::Object(map) => visitor.visit_binding(map),
                        other => visitor.visit_value(other),
                    }
                }
            }
            (_, other) => visitor.visit_value(other),
        }
    }
}

pub fn walk_binding<V: BlockVisitor + ?Sized>(visitor: &mut V, binding: &mut Map<String, Value>) {
    for child in binding.values_mut() {
        visitor.visit_value(child);
    }
}
