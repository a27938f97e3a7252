//! The node catalog.
//!
//! Each submodule declares a family of node types (signatures, type and
//! shape rules) and offers constructors for the common ones. Most leaf
//! types add nothing to their capability supertype but a tag.

mod arrays;
mod generic;
mod logical;
mod numeric;
mod reductions;
mod relations;
mod strings;
mod temporal;

use common_error::{TesseraError, TesseraResult};
use tessera_core::{DataType, Shape, Value};

pub use generic::{alias, cast, literal, null_literal, sort_key, table_column};
pub use relations::{database_table, in_memory_table, JOIN_SUFFIX};
pub use strings::URL_PARTS;
pub use temporal::{DATE_UNITS, INTERVAL_UNITS, TIMESTAMP_UNITS, UNIX_UNITS};

use crate::annotations::Bound;
use crate::arg::Arg;
use crate::kind::NodeKind;
use crate::node::Node;
use crate::registry::Registry;

pub(crate) fn register_all(registry: &mut Registry) {
    generic::register(registry);
    arrays::register(registry);
    logical::register(registry);
    numeric::register(registry);
    strings::register(registry);
    temporal::register(registry);
    reductions::register(registry);
    relations::register(registry);
}

/// Build a unary node such as `Negate` or `Lowercase`.
pub fn unary(kind: NodeKind, arg: impl Into<Arg>) -> TesseraResult<Node> {
    Node::new(kind, vec![arg.into()], vec![])
}

/// Build a binary node such as `Add` or `Equals`.
pub fn binary(kind: NodeKind, left: impl Into<Arg>, right: impl Into<Arg>) -> TesseraResult<Node> {
    Node::new(kind, vec![left.into(), right.into()], vec![])
}

/// Build any node from positional arguments.
pub fn call(kind: NodeKind, args: Vec<Arg>) -> TesseraResult<Node> {
    Node::new(kind, args, vec![])
}

/// Output type of the value node bound to `field`.
pub(crate) fn dtype_of(bound: &Bound, field: &str) -> TesseraResult<DataType> {
    bound
        .node(field)
        .and_then(Node::dtype)
        .cloned()
        .ok_or_else(|| TesseraError::internal(format!("field {field} has no output type")))
}

/// Output shape of the value node bound to `field`.
pub(crate) fn shape_of(bound: &Bound, field: &str) -> TesseraResult<Shape> {
    bound
        .node(field)
        .and_then(Node::shape)
        .ok_or_else(|| TesseraError::internal(format!("field {field} has no output shape")))
}

/// Widest shape among all value nodes held by the bound fields.
pub(crate) fn widest_shape(bound: &Bound) -> TesseraResult<Shape> {
    Ok(Shape::widest(
        bound
            .iter()
            .flat_map(|(_, arg)| arg.nodes())
            .filter(|node| node.kind().is_value())
            .filter_map(Node::shape),
    ))
}

/// Common supertype of the value nodes held by `fields`.
pub(crate) fn common_dtype(bound: &Bound, fields: &[&str]) -> TesseraResult<DataType> {
    let types: Vec<DataType> = fields
        .iter()
        .filter_map(|field| bound.get(field))
        .flat_map(Arg::nodes)
        .filter_map(|node| node.dtype().cloned())
        .collect();
    DataType::highest_precedence(types.iter()).ok_or_else(|| {
        TesseraError::type_error(format!(
            "no common type for {}",
            types.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
        ))
    })
}

/// Arg producing a null literal default.
pub(crate) fn null_default(_: &Bound) -> Arg {
    Arg::Value(Value::Null)
}
