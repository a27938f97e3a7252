//! Array nodes.

use common_error::TesseraError;
use tessera_core::DataType;

use super::common_dtype;
use crate::annotations::validator::{array_value, comparable_with, value};
use crate::annotations::Argument;
use crate::kind::NodeKind;
use crate::registry::Registry;

pub(super) fn register(registry: &mut Registry) {
    registry
        .define(NodeKind::ArrayLength)
        .arg("arg", Argument::mandatory(array_value()))
        .dtype(|_| Ok(DataType::Int64))
        .finish();
    registry
        .define(NodeKind::ArrayConcat)
        .arg("left", Argument::mandatory(array_value()))
        .arg("right", Argument::mandatory(comparable_with("left")))
        .dtype(|b| common_dtype(b, &["left", "right"]))
        .finish();
    registry
        .define(NodeKind::ArrayColumn)
        .arg("cols", Argument::variadic(value()))
        .dtype(|b| {
            if b.get("cols").map_or(0, |cols| cols.nodes().len()) == 0 {
                return Err(TesseraError::validation(
                    "ArrayColumn",
                    "cols",
                    "an array column needs at least one element",
                ));
            }
            Ok(DataType::Array(Box::new(common_dtype(b, &["cols"])?)))
        })
        .finish();
}
