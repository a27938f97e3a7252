//! Reductions: many rows in, one value out.

use tessera_core::{DataType, Shape};

use super::dtype_of;
use crate::annotations::validator::{boolean_value, numeric, one_of, table, value};
use crate::annotations::Argument;
use crate::kind::NodeKind;
use crate::registry::Registry;

pub(super) fn register(registry: &mut Registry) {
    registry
        .define(NodeKind::Reduction)
        .abstract_()
        .arg("arg", Argument::mandatory(value()))
        .arg("where", Argument::optional(boolean_value()))
        .shape(|_| Ok(Shape::Scalar))
        .finish();

    registry.leaves(&[NodeKind::Count, NodeKind::CountDistinct], |t| {
        t.dtype(|_| Ok(DataType::Int64))
    });
    registry
        .define(NodeKind::CountStar)
        .arg("arg", Argument::mandatory(table()))
        .dtype(|_| Ok(DataType::Int64))
        .finish();
    registry
        .define(NodeKind::Sum)
        .arg("arg", Argument::mandatory(numeric()))
        .dtype(|b| {
            Ok(match dtype_of(b, "arg")? {
                DataType::Float64 => DataType::Float64,
                _ => DataType::Int64,
            })
        })
        .finish();
    registry
        .define(NodeKind::Mean)
        .arg("arg", Argument::mandatory(numeric()))
        .dtype(|_| Ok(DataType::Float64))
        .finish();
    registry.leaves(&[NodeKind::Min, NodeKind::Max], |t| {
        t.dtype(|b| dtype_of(b, "arg"))
    });
    registry.leaves(&[NodeKind::StandardDev, NodeKind::Variance], |t| {
        t.arg("arg", Argument::mandatory(numeric()))
            .arg("how", Argument::default("sample", one_of(&["sample", "pop"])))
            .dtype(|_| Ok(DataType::Float64))
    });
    registry
        .define(NodeKind::ApproxMedian)
        .arg("arg", Argument::mandatory(numeric()))
        .dtype(|_| Ok(DataType::Float64))
        .finish();
    registry
        .define(NodeKind::ArrayCollect)
        .dtype(|b| Ok(DataType::Array(Box::new(dtype_of(b, "arg")?))))
        .finish();
}
