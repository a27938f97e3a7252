//! Error types and result aliases for Tessera.
//!
//! Every crate in the workspace reports failures through [`TesseraError`]:
//! construction failures as `Validation`, missing translation rules as
//! `Dispatch`, backend capability limits as `UnsupportedArgument` and
//! structural target restrictions as `Translation`.

mod error;

pub use error::{TesseraError, TesseraResult};
