//! Root classes and general-purpose value nodes.

use common_error::TesseraResult;
use tessera_core::{DataType, Shape, Value};

use super::{common_dtype, dtype_of, null_default, shape_of, widest_shape};
use crate::annotations::validator::{
    boolean, boolean_value, column_name_of, comparable_with, datatype, instance_of,
    same_length_as, string, table, tuple_of, value, Validator,
};
use crate::annotations::Argument;
use crate::arg::Arg;
use crate::kind::NodeKind;
use crate::node::Node;
use crate::registry::Registry;

pub(super) fn register(registry: &mut Registry) {
    registry.define(NodeKind::Node).abstract_().finish();
    registry
        .define(NodeKind::Value)
        .abstract_()
        .shape(widest_shape)
        .finish();
    registry
        .define(NodeKind::Unary)
        .abstract_()
        .arg("arg", Argument::mandatory(value()))
        .dtype(|b| dtype_of(b, "arg"))
        .shape(|b| shape_of(b, "arg"))
        .finish();
    registry
        .define(NodeKind::Binary)
        .abstract_()
        .arg("left", Argument::mandatory(value()))
        .arg("right", Argument::mandatory(value()))
        .dtype(|b| common_dtype(b, &["left", "right"]))
        .shape(|b| Ok(shape_of(b, "left")?.max(shape_of(b, "right")?)))
        .finish();
    registry
        .define(NodeKind::NAry)
        .abstract_()
        .arg("arg", Argument::variadic(value()))
        .dtype(|b| common_dtype(b, &["arg"]))
        .finish();
    registry.leaves(
        &[NodeKind::Coalesce, NodeKind::Greatest, NodeKind::Least],
        |t| t,
    );

    registry
        .define(NodeKind::SortKey)
        .arg("expr", Argument::mandatory(value()))
        .arg("ascending", Argument::default(true, boolean()))
        .finish();
    registry
        .define(NodeKind::NodeList)
        .arg("values", Argument::variadic(instance_of(NodeKind::Node)))
        .finish();

    registry
        .define(NodeKind::Literal)
        .arg("value", Argument::mandatory(scalar_payload()))
        .arg(
            "dtype",
            Argument::default_with(
                |b| {
                    Arg::Type(
                        b.get("value")
                            .and_then(Arg::as_value)
                            .map_or(DataType::Null, Value::data_type),
                    )
                },
                datatype(),
            ),
        )
        .dtype(|b| {
            Ok(b.get("dtype")
                .and_then(Arg::as_type)
                .cloned()
                .unwrap_or(DataType::Null))
        })
        .finish();
    registry
        .define(NodeKind::TableColumn)
        .arg("table", Argument::mandatory(table()))
        .arg("name", Argument::mandatory(column_name_of("table")))
        .dtype(|b| {
            let name = b.get("name").and_then(Arg::as_str).unwrap_or_default();
            Ok(b.node("table")
                .and_then(Node::schema)
                .and_then(|schema| schema.data_type(name))
                .cloned()
                .unwrap_or(DataType::Null))
        })
        .shape(|_| Ok(Shape::Columnar))
        .finish();
    registry
        .define(NodeKind::Alias)
        .arg("arg", Argument::mandatory(value()))
        .arg("name", Argument::mandatory(string()))
        .dtype(|b| dtype_of(b, "arg"))
        .shape(|b| shape_of(b, "arg"))
        .finish();
    registry
        .define(NodeKind::Cast)
        .arg("arg", Argument::mandatory(value()))
        .arg("to", Argument::mandatory(datatype()))
        .dtype(|b| {
            Ok(b.get("to")
                .and_then(Arg::as_type)
                .cloned()
                .unwrap_or(DataType::Null))
        })
        .finish();
    registry
        .define(NodeKind::IfNull)
        .arg("arg", Argument::mandatory(value()))
        .arg("ifnull_expr", Argument::mandatory(comparable_with("arg")))
        .dtype(|b| common_dtype(b, &["arg", "ifnull_expr"]))
        .finish();
    registry
        .define(NodeKind::NullIf)
        .arg("arg", Argument::mandatory(value()))
        .arg("null_if_expr", Argument::mandatory(comparable_with("arg")))
        .dtype(|b| dtype_of(b, "arg"))
        .finish();
    registry
        .define(NodeKind::Where)
        .arg("bool_expr", Argument::mandatory(boolean_value()))
        .arg("true_expr", Argument::mandatory(value()))
        .arg("false_null_expr", Argument::mandatory(value()))
        .dtype(|b| common_dtype(b, &["true_expr", "false_null_expr"]))
        .finish();
    registry
        .define(NodeKind::SimpleCase)
        .arg("base", Argument::mandatory(value()))
        .arg("cases", Argument::mandatory(tuple_of(comparable_with("base"))))
        .arg("results", Argument::mandatory(same_length_as("cases")))
        .arg("default", Argument::default_with(null_default, value()))
        .dtype(|b| common_dtype(b, &["results", "default"]))
        .finish();
    registry
        .define(NodeKind::SearchedCase)
        .arg("cases", Argument::mandatory(tuple_of(boolean_value())))
        .arg("results", Argument::mandatory(same_length_as("cases")))
        .arg("default", Argument::default_with(null_default, value()))
        .dtype(|b| common_dtype(b, &["results", "default"]))
        .finish();
    registry
        .define(NodeKind::Between)
        .arg("arg", Argument::mandatory(value()))
        .arg("lower_bound", Argument::mandatory(comparable_with("arg")))
        .arg("upper_bound", Argument::mandatory(comparable_with("arg")))
        .dtype(|_| Ok(DataType::Bool))
        .finish();
    for kind in [NodeKind::Contains, NodeKind::NotContains] {
        registry
            .define(kind)
            .arg("value", Argument::mandatory(value()))
            .arg("options", Argument::mandatory(tuple_of(comparable_with("value"))))
            .dtype(|_| Ok(DataType::Bool))
            .finish();
    }
}

/// A literal payload: any plain value, sequences become arrays.
fn scalar_payload() -> Validator {
    Validator::new("literal payload", |arg, _| match arg {
        Arg::Value(_) => Ok(arg),
        Arg::Seq(items) => items
            .into_iter()
            .map(|item| match item {
                Arg::Value(v) => Ok(v),
                other => Err(format!("array literals hold plain values, got {}", other.describe())),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(|values| Arg::Value(Value::Array(values))),
        other => Err(format!("expected a plain value, got {}", other.describe())),
    })
}

/// Build a literal with its type inferred from the value.
pub fn literal(value: impl Into<Value>) -> TesseraResult<Node> {
    Node::new(NodeKind::Literal, vec![Arg::Value(value.into())], vec![])
}

/// Build a typed null literal.
pub fn null_literal(dtype: DataType) -> TesseraResult<Node> {
    Node::new(
        NodeKind::Literal,
        vec![Arg::Value(Value::Null), Arg::Type(dtype)],
        vec![],
    )
}

/// Reference a column of `table` by name.
pub fn table_column(table: &Node, name: &str) -> TesseraResult<Node> {
    Node::new(
        NodeKind::TableColumn,
        vec![Arg::from(table), Arg::from(name)],
        vec![],
    )
}

/// Rename a value expression.
pub fn alias(arg: impl Into<Arg>, name: &str) -> TesseraResult<Node> {
    Node::new(NodeKind::Alias, vec![arg.into(), Arg::from(name)], vec![])
}

/// Cast a value expression to `to`.
pub fn cast(arg: impl Into<Arg>, to: DataType) -> TesseraResult<Node> {
    Node::new(NodeKind::Cast, vec![arg.into(), Arg::Type(to)], vec![])
}

/// Sort key over `expr`.
pub fn sort_key(expr: impl Into<Arg>, ascending: bool) -> TesseraResult<Node> {
    Node::new(
        NodeKind::SortKey,
        vec![expr.into(), Arg::from(ascending)],
        vec![],
    )
}
