//! Embedded Arrow engine target.
//!
//! Value nodes lower to column [`Expr`]essions and table nodes to
//! [`LazyFrame`]s: deferred plans that run eagerly over in-memory Arrow
//! batches registered in a [`Catalog`]. The engine has no native right
//! join, so right joins are lowered as swapped left joins. Parameters that
//! shape a computation (patterns, widths, formats, bounds) must be
//! literals; anything else fails with an unsupported-argument error.
//!
//! ```ignore
//! let compiler = EngineCompiler::default();
//! let mut catalog = compiler.catalog();
//! catalog.register("people", batch);
//! let result = compiler.execute(&selection, &catalog)?;
//! ```

mod aggregate;
mod arrays;
mod backend;
mod catalog;
mod compiler;
mod executor;
pub mod expr;
mod frame;
mod operators;
mod relations;
mod strings;
mod temporal;
mod types;
mod values;

pub use backend::{Engine, Lowered};
pub use catalog::Catalog;
pub use compiler::{execute, EngineCompiler};
pub use expr::{
    col, lit, typed_lit, when, AggFunc, BinaryOp, Expr, ExprEvaluator, Function, TemporalField,
    UnaryOp,
};
pub use frame::{GroupBy, JoinType, LazyFrame, Plan};
pub use types::{batch_from_rows, literal_array, to_arrow_schema, to_arrow_type};
