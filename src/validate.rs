use serde::{Deserialize, Serialize};
use std::fmt;

// ═══════════════════════════════════════════════════════════════════════════════
// ERROR CODES
// ═══════════════════════════════════════════════════════════════════════════════

pub const ERR_UNRESOLVED_NAME: &str = "C-ERR-NAME-001";
pub const ERR_INVALID_TABLE: &str = "C-ERR-TABLE-001";
pub const ERR_INVALID_OPTIONS: &str = "C-ERR-OPTIONS-001";
pub const ERR_ARGUMENT_COUNT: &str = "C-ERR-ARGS-001";

// ═══════════════════════════════════════════════════════════════════════════════
// DIAGNOSTICS
// ═══════════════════════════════════════════════════════════════════════════════

/// Which lookup a name failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NameKind {
    Variable,
    List,
    Image,
    Function,
    /// Parameter name of a call with named bindings, looked up in the callee.
    Binding,
}

impl fmt::Display for NameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NameKind::Variable => "variable",
            NameKind::List => "list",
            NameKind::Image => "image",
            NameKind::Function => "function",
            NameKind::Binding => "binding",
        };
        f.write_str(label)
    }
}

/// A reference that no namespace could resolve. The name is left in the
/// compacted tree as a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnresolvedName {
    pub kind: NameKind,
    pub name: String,
    /// Function (or event handler) the reference appears in, if any.
    pub scope: Option<String>,
}

impl fmt::Display for UnresolvedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.kind, self.name)?;
        if let Some(scope) = &self.scope {
            write!(f, " in '{}'", scope)?;
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMPACT ERROR
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompactError {
    #[error("{} unresolved name(s), first: {}", .0.len(), first_unresolved(.0))]
    UnresolvedNames(Vec<UnresolvedName>),

    #[error("invalid symbol table: {namespace} namespace {reason}")]
    InvalidTable { namespace: String, reason: String },

    #[error("invalid options: {0}")]
    InvalidOptions(String),

    /// A compacted argument count exceeds the callee's local namespace.
    #[error("function '{function}' claims {count} argument(s) but declares {declared} local(s)")]
    ArgumentCount {
        function: String,
        count: u64,
        declared: usize,
    },
}

fn first_unresolved(names: &[UnresolvedName]) -> String {
    names
        .first()
        .map(|n| n.to_string())
        .unwrap_or_else(|| "<none>".to_string())
}

impl CompactError {
    pub fn invalid_table(namespace: &str, reason: impl Into<String>) -> Self {
        CompactError::InvalidTable {
            namespace: namespace.to_string(),
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            CompactError::UnresolvedNames(_) => ERR_UNRESOLVED_NAME,
            CompactError::InvalidTable { .. } => ERR_INVALID_TABLE,
            CompactError::InvalidOptions(_) => ERR_INVALID_OPTIONS,
            CompactError::ArgumentCount { .. } => ERR_ARGUMENT_COUNT,
        }
    }
}

#[cfg(feature = "napi")]
impl From<CompactError> for napi::Error {
    fn from(err: CompactError) -> Self {
        napi::Error::from_reason(format!("[{}] {}", err.code(), err))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
