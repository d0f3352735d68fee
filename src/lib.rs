//! # Block Program Compactor
//!
//! Replaces every human-readable name in a block program with a small integer
//! before the program is shipped to a device runtime, and restores the names
//! when the program comes back to the editor.
//!
//! ## Index Invariants
//!
//! 1. **Global namespaces**: `function`, `list`, `variable` and `image` each map a
//!    declared name to a non-negative index, assigned in first-seen declaration order.
//!
//! 2. **Local namespaces**: every function (keyed by name) and the event handler own a
//!    private namespace of negative indices. Arguments come first, from -1 down, then
//!    locals continue the same sequence.
//!
//! 3. **Resolution order**: a variable reference resolves against its own scope first,
//!    then the global `variable` namespace. No other namespace falls through.
//!
//! 4. **Call bindings**: in `call-function`, bound values resolve in the caller's
//!    scope, binding names in the callee's.
//!
//! 5. **Debug metadata**: `python-info` attachments are dropped everywhere and cannot
//!    be restored.
//!
//! 6. **Unresolved names** stay strings and are reported; see `UnresolvedPolicy`.

mod block;
mod decode;
mod program;
mod renamer;
mod scope;
mod symbols;
mod validate;
mod visitor;

#[cfg(test)]
mod decode_tests;

pub use decode::{uncompactify, ReverseTable};
pub use program::{
    compact_program, compactify, CompactOptions, Compaction, Compactor, UnresolvedPolicy,
};
pub use renamer::{compact_scripts, resolve_scripts};
pub use scope::{compact_scope, compact_scopes};
pub use symbols::{build_symbol_table, EventScope, Namespace, SymbolTable};
pub use validate::*;

#[cfg(feature = "napi")]
pub use decode::uncompactify_native;
#[cfg(feature = "napi")]
pub use program::compactify_native;
