//! Core data model for Tessera.
//!
//! This crate is the type oracle consumed by the IR and the backends:
//! - `DataType` and `Value` for logical types and literal values
//! - `Shape` for the scalar/columnar classification of expressions
//! - `Schema` for ordered relation descriptors

pub mod schema;
pub mod types;

#[cfg(test)]
mod proptest_utils;

pub use schema::{ColumnInfo, Schema};
pub use types::{DataType, IntervalUnit, Shape, TimeUnit, Value};
