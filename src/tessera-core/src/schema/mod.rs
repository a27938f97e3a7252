//! Relation descriptors.

#[allow(clippy::module_inception)]
mod schema;

pub use schema::{ColumnInfo, Schema};
