//! Field annotations: validators, argument/attribute descriptors and signatures.
//!
//! A node type declares its fields as a [`Signature`] of named
//! [`Argument`]s. Constructing a node binds raw positional and keyword
//! arguments to those fields, fills defaults and runs each field's
//! [`Validator`] in declaration order. Validators and default producers
//! see the fields validated before them through a [`Bound`] context, so
//! later fields may depend on earlier ones.

mod argument;
mod bound;
mod signature;
pub mod validator;

pub use argument::{Argument, Attribute, DefaultValue, ParamKind, Parameter};
pub use bound::Bound;
pub use signature::Signature;
pub use validator::Validator;
