//! Comparison, boolean and null-test nodes.

use tessera_core::DataType;

use crate::annotations::validator::{boolean_value, comparable_with, value};
use crate::annotations::Argument;
use crate::kind::NodeKind;
use crate::registry::Registry;

pub(super) fn register(registry: &mut Registry) {
    registry
        .define(NodeKind::Not)
        .arg("arg", Argument::mandatory(boolean_value()))
        .dtype(|_| Ok(DataType::Bool))
        .finish();
    registry.leaves(&[NodeKind::IsNull, NodeKind::NotNull], |t| {
        t.dtype(|_| Ok(DataType::Bool))
    });

    registry
        .define(NodeKind::Comparison)
        .abstract_()
        .arg("left", Argument::mandatory(value()))
        .arg("right", Argument::mandatory(comparable_with("left")))
        .dtype(|_| Ok(DataType::Bool))
        .finish();
    registry.leaves(
        &[
            NodeKind::Equals,
            NodeKind::NotEquals,
            NodeKind::Greater,
            NodeKind::GreaterEqual,
            NodeKind::Less,
            NodeKind::LessEqual,
        ],
        |t| t,
    );

    registry
        .define(NodeKind::LogicalBinary)
        .abstract_()
        .arg("left", Argument::mandatory(boolean_value()))
        .arg("right", Argument::mandatory(boolean_value()))
        .dtype(|_| Ok(DataType::Bool))
        .finish();
    registry.leaves(&[NodeKind::And, NodeKind::Or, NodeKind::Xor], |t| t);
}
