//! Block vocabulary for the visual program tree.
//!
//! Blocks are JSON objects discriminated by their `name` field. Only a handful
//! of fields ever carry names subject to compaction; everything else is opaque
//! data and passes through untouched.

use serde_json::{Map, Value};

// ═══════════════════════════════════════════════════════════════════════════════
// FIELD NAMES
// ═══════════════════════════════════════════════════════════════════════════════

/// Discriminator of every block and script.
pub const KIND_KEY: &str = "name";

pub const VARIABLE_KEY: &str = "variable";
pub const LIST_KEY: &str = "list";
pub const IMAGE_KEY: &str = "image";
pub const FUNCTION_KEY: &str = "function";

pub const ARGS_KEY: &str = "args";
pub const LOCALS_KEY: &str = "locals";

pub const SCRIPTS_KEY: &str = "scripts";
pub const PORT_SETTINGS_KEY: &str = "port-settings";
pub const PORT_PARAMETERS_KEY: &str = "port-parameters";

/// Non-semantic source annotation attached by the editor.
pub const DEBUG_INFO_KEY: &str = "python-info";

pub const EVENT_HANDLER: &str = "when-green-flag-clicked";
pub const CALL_FUNCTION: &str = "call-function";

// ═══════════════════════════════════════════════════════════════════════════════
// SCRIPT CLASSIFICATION
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptKind {
    EventHandler,
    Function,
    Image,
    Variable,
    List,
    Other,
}

impl ScriptKind {
    pub fn of(script: &Map<String, Value>) -> Self {
        match script.get(KIND_KEY).and_then(Value::as_str) {
            Some(EVENT_HANDLER) => ScriptKind::EventHandler,
            Some(FUNCTION_KEY) => ScriptKind::Function,
            Some(IMAGE_KEY) => ScriptKind::Image,
            Some(VARIABLE_KEY) => ScriptKind::Variable,
            Some(LIST_KEY) => ScriptKind::List,
            _ => ScriptKind::Other,
        }
    }

    /// Field holding the declared name, for declaring kinds.
    pub fn name_key(self) -> Option<&'static str> {
        match self {
            ScriptKind::Function => Some(FUNCTION_KEY),
            ScriptKind::Image => Some(IMAGE_KEY),
            ScriptKind::Variable => Some(VARIABLE_KEY),
            ScriptKind::List => Some(LIST_KEY),
            ScriptKind::EventHandler | ScriptKind::Other => None,
        }
    }
}

pub fn is_call(block: &Map<String, Value>) -> bool {
    block.get(KIND_KEY).and_then(Value::as_str) == Some(CALL_FUNCTION)
}

/// Names introduced by a `[{variable: ..}, ..]` declaration list, in order.
/// Entries without a string name are skipped.
pub fn declared_variables(entries: Option<&Value>) -> impl Iterator<Item = &str> {
    entries
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|entry| entry.get(VARIABLE_KEY).and_then(Value::as_str))
}

// ═══════════════════════════════════════════════════════════════════════════════
// DEBUG METADATA
// ═══════════════════════════════════════════════════════════════════════════════

/// Drops every debug-metadata attachment reachable from `value`.
pub fn strip_debug_info(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.remove(DEBUG_INFO_KEY);
            for child in map.values_mut() {
                strip_debug_info(child);
            }
        }
        Value::Array(items) => {
            for item in items {
                strip_debug_info(item);
            }
        }
        _ => {}
    }
}
