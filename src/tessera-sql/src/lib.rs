//! SQL text target.
//!
//! Renders IR trees as SQL for 1-indexed, Hive/Impala-flavoured engines.
//! Value nodes become expression fragments; table nodes become complete
//! `SELECT` statements, with non-physical sources nested as aliased
//! subqueries (`t0`, `t1`, ...).

mod backend;
mod compiler;
mod literal;
mod relations;
mod strings;
mod temporal;
mod values;

pub use backend::Sql;
pub use compiler::{to_sql, SqlCompiler};
pub use literal::{render_literal, sql_type};
