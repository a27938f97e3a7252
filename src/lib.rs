//! Tessera - an immutable expression IR with pluggable translation targets.
//!
//! Expression trees (columns, scalars, aggregations, joins, string and
//! temporal operations) are built as validated, structurally hashed
//! [`ir::Node`]s and translated node by node into SQL text or into plans
//! for the embedded Arrow engine.

#![forbid(unsafe_code)]
#![allow(clippy::module_name_repetitions)]

// Re-export member crates
pub use common_config as config;
pub use common_display as display;
pub use common_error as error;
pub use tessera_core as core;
pub use tessera_engine as engine;
pub use tessera_ir as ir;
pub use tessera_sql as sql;
pub use tessera_translate as translate;

/// Tessera version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
