//! Arithmetic, math and bitwise nodes.

use tessera_core::DataType;

use super::{common_dtype, dtype_of};
use crate::annotations::validator::{integer_value, numeric};
use crate::annotations::Argument;
use crate::arg::Arg;
use crate::kind::NodeKind;
use crate::registry::Registry;

pub(super) fn register(registry: &mut Registry) {
    registry
        .define(NodeKind::Negate)
        .arg("arg", Argument::mandatory(numeric()))
        .finish();
    registry
        .define(NodeKind::BitwiseNot)
        .arg("arg", Argument::mandatory(integer_value()))
        .finish();
    registry.leaves(&[NodeKind::ZeroIfNull, NodeKind::NullIfZero], |t| {
        t.arg("arg", Argument::mandatory(numeric()))
    });
    registry.leaves(&[NodeKind::IsNan, NodeKind::IsInf], |t| {
        t.arg("arg", Argument::mandatory(numeric()))
            .dtype(|_| Ok(DataType::Bool))
    });

    registry
        .define(NodeKind::MathUnary)
        .abstract_()
        .arg("arg", Argument::mandatory(numeric()))
        .dtype(|_| Ok(DataType::Float64))
        .finish();
    registry.leaves(
        &[
            NodeKind::Exp,
            NodeKind::Ln,
            NodeKind::Log2,
            NodeKind::Log10,
            NodeKind::Sqrt,
            NodeKind::Acos,
            NodeKind::Asin,
            NodeKind::Atan,
            NodeKind::Cos,
            NodeKind::Sin,
            NodeKind::Tan,
            NodeKind::Cot,
            NodeKind::Radians,
            NodeKind::Degrees,
        ],
        |t| t,
    );
    registry.leaves(&[NodeKind::Abs, NodeKind::Sign], |t| {
        t.dtype(|b| dtype_of(b, "arg"))
    });
    registry.leaves(&[NodeKind::Ceil, NodeKind::Floor], |t| {
        t.dtype(|_| Ok(DataType::Int64))
    });

    registry
        .define(NodeKind::NumericBinary)
        .abstract_()
        .arg("left", Argument::mandatory(numeric()))
        .arg("right", Argument::mandatory(numeric()))
        .finish();
    registry.leaves(
        &[
            NodeKind::Add,
            NodeKind::Subtract,
            NodeKind::Multiply,
            NodeKind::FloorDivide,
            NodeKind::Modulus,
        ],
        |t| t,
    );
    registry.leaves(&[NodeKind::Divide, NodeKind::Power, NodeKind::Atan2], |t| {
        t.dtype(|_| Ok(DataType::Float64))
    });

    registry
        .define(NodeKind::BitwiseBinary)
        .abstract_()
        .arg("left", Argument::mandatory(integer_value()))
        .arg("right", Argument::mandatory(integer_value()))
        .dtype(|b| common_dtype(b, &["left", "right"]))
        .finish();
    registry.leaves(
        &[
            NodeKind::BitwiseAnd,
            NodeKind::BitwiseOr,
            NodeKind::BitwiseXor,
            NodeKind::BitwiseLeftShift,
            NodeKind::BitwiseRightShift,
        ],
        |t| t,
    );

    registry
        .define(NodeKind::Round)
        .arg("arg", Argument::mandatory(numeric()))
        .arg("digits", Argument::optional(integer_value()))
        .dtype(|b| match b.get("digits") {
            Some(Arg::Node(_)) => dtype_of(b, "arg"),
            _ => Ok(DataType::Int64),
        })
        .finish();
    registry
        .define(NodeKind::Clip)
        .arg("arg", Argument::mandatory(numeric()))
        .arg("lower", Argument::optional(numeric()))
        .arg("upper", Argument::optional(numeric()))
        .dtype(|b| dtype_of(b, "arg"))
        .finish();
    registry
        .define(NodeKind::Log)
        .arg("arg", Argument::mandatory(numeric()))
        .arg("base", Argument::optional(numeric()))
        .dtype(|_| Ok(DataType::Float64))
        .finish();
}

