//! Type system for Tessera values.
//!
//! This module defines the `Value` enum for literal values, `DataType`
//! for logical type information and `Shape` for expression cardinality.

mod data_type;
mod shape;
mod value;

pub use data_type::{DataType, IntervalUnit, TimeUnit};
pub use shape::Shape;
pub use value::Value;
