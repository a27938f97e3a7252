//! Immutable, validated expression IR.
//!
//! Every node type declares its fields as a [`Signature`]; constructing a
//! [`Node`] binds and validates raw arguments once, derives the node's
//! output type, shape or schema, and memoizes a structural hash. Node
//! kinds form a single-inheritance capability hierarchy ([`NodeKind`])
//! that translators walk when looking up rendering rules.

pub mod annotations;
mod arg;
pub mod capability;
mod kind;
mod node;
pub mod ops;
pub mod registry;

pub use annotations::{Argument, Attribute, Bound, ParamKind, Parameter, Signature, Validator};
pub use arg::Arg;
pub use capability::{Expr, Named, Relational, ToExpr, Typed};
pub use kind::NodeKind;
pub use node::{Node, NodeBuilder};
pub use registry::{node_type, NodeType};
