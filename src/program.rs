//! Program-level compaction and the entry dispatcher.
//!
//! Drives symbol-table construction and script resolution over a whole
//! program, strips debug metadata from the device port tables, and applies the
//! caller's unresolved-name policy.

#[cfg(feature = "napi")]
use napi_derive::napi;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::block::{
    strip_debug_info, DEBUG_INFO_KEY, PORT_PARAMETERS_KEY, PORT_SETTINGS_KEY, SCRIPTS_KEY,
};
use crate::renamer::compact_scripts;
use crate::symbols::{build_symbol_table, SymbolTable};
use crate::validate::{CompactError, UnresolvedName};

// ═══════════════════════════════════════════════════════════════════════════════
// OPTIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// What to do with a name no namespace resolves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnresolvedPolicy {
    /// Leave the name as a string and report it in `Compaction::unresolved`.
    #[default]
    Keep,
    /// Fail the whole compaction.
    Reject,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompactOptions {
    pub unresolved: UnresolvedPolicy,
}

impl CompactOptions {
    /// Parses options handed over by the JS host. Missing fields take defaults.
    pub fn from_json(value: Value) -> Result<Self, CompactError> {
        serde_json::from_value(value).map_err(|e| CompactError::InvalidOptions(e.to_string()))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMPACTION RESULT
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Compaction {
    /// The compacted tree.
    pub value: Value,
    /// Table the tree was compacted with; `uncompactify` needs it back.
    pub table: SymbolTable,
    #[serde(default)]
    pub unresolved: Vec<UnresolvedName>,
}

impl Compaction {
    fn unchanged(value: &Value) -> Self {
        Compaction {
            value: value.clone(),
            table: SymbolTable::new(),
            unresolved: Vec::new(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMPACTOR
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default)]
pub struct Compactor {
    options: CompactOptions,
}

impl Compactor {
    pub fn new(options: CompactOptions) -> Self {
        Compactor { options }
    }

    /// Scalars and the empty list come back unchanged, a program object goes
    /// through `compact_program`, a bare script list gets its own symbol table.
    pub fn compact(&self, value: &Value) -> Result<Compaction, CompactError> {
        let compaction = match value {
            Value::Object(program) => compact_program(program),
            Value::Array(scripts) if !scripts.is_empty() => {
                let table = build_symbol_table(scripts);
                let (value, unresolved) = compact_scripts(value, &table);
                Compaction {
                    value,
                    table,
                    unresolved,
                }
            }
            other => Compaction::unchanged(other),
        };
        self.enforce(compaction)
    }

    fn enforce(&self, compaction: Compaction) -> Result<Compaction, CompactError> {
        match self.options.unresolved {
            UnresolvedPolicy::Reject if !compaction.unresolved.is_empty() => {
                Err(CompactError::UnresolvedNames(compaction.unresolved))
            }
            _ => Ok(compaction),
        }
    }
}

/// Compacts a whole program. The output always carries `port-settings` and
/// `port-parameters`; `scripts` only if the input had it.
///
/// Missing port tables come back as empty ones, and `uncompactify` leaves
/// them there. A round trip therefore equals the input only up to debug
/// metadata and those two defaulted tables.
pub fn compact_program(program: &Map<String, Value>) -> Compaction {
    let scripts = program
        .get(SCRIPTS_KEY)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let table = build_symbol_table(scripts);

    let mut compacted = Map::new();
    let mut unresolved = Vec::new();
    for (key, value) in program {
        if key == DEBUG_INFO_KEY {
            continue;
        }
        if key == SCRIPTS_KEY {
            let (scripts, missing) = compact_scripts(value, &table);
            unresolved = missing;
            compacted.insert(key.clone(), scripts);
        } else {
            // Port tables and anything else are opaque; only metadata goes.
            let mut value = value.clone();
            strip_debug_info(&mut value);
            compacted.insert(key.clone(), value);
        }
    }
    for key in [PORT_SETTINGS_KEY, PORT_PARAMETERS_KEY] {
        compacted
            .entry(key)
            .or_insert_with(|| Value::Object(Map::new()));
    }

    Compaction {
        value: Value::Object(compacted),
        table,
        unresolved,
    }
}

/// Compacts any editor value with default options.
pub fn compactify(value: &Value) -> Result<Value, CompactError> {
    Compactor::default()
        .compact(value)
        .map(|compaction| compaction.value)
}

// ═══════════════════════════════════════════════════════════════════════════════
// NAPI EXPORTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Returns `{ value, table, unresolved }` to the host.
#[cfg(feature = "napi")]
#[napi]
pub fn compactify_native(
    value: serde_json::Value,
    options: Option<serde_json::Value>,
) -> napi::Result<serde_json::Value> {
    let options = match options {
        Some(options) => CompactOptions::from_json(options)?,
        None => CompactOptions::default(),
    };
    let compaction = Compactor::new(options).compact(&value)?;
    serde_json::to_value(compaction).map_err(|e| napi::Error::from_reason(e.to_string()))
}
