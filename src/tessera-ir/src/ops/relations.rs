//! Table nodes: relations and relational operators.

use common_error::{TesseraError, TesseraResult};
use tessera_core::{ColumnInfo, Schema, Value};

use crate::annotations::validator::{
    boolean_value, either, instance_of, integer, map_of, one_of, scalar_value, schema, string,
    table, tuple_of, value, Validator,
};
use crate::annotations::{Argument, Bound};
use crate::arg::Arg;
use crate::capability::{Named, Typed};
use crate::kind::NodeKind;
use crate::node::Node;
use crate::registry::Registry;

/// Suffix appended to right-hand join columns that clash with left-hand ones.
pub const JOIN_SUFFIX: &str = "_right";

pub(super) fn register(registry: &mut Registry) {
    registry.define(NodeKind::TableNode).abstract_().finish();

    registry
        .define(NodeKind::DatabaseTable)
        .arg("name", Argument::mandatory(string()))
        .arg("schema", Argument::mandatory(schema()))
        .schema(|b| {
            b.get("schema")
                .and_then(Arg::as_schema)
                .cloned()
                .ok_or_else(|| TesseraError::internal("DatabaseTable without schema"))
        })
        .finish();
    registry
        .define(NodeKind::InMemoryTable)
        .arg("name", Argument::mandatory(string()))
        .arg("schema", Argument::mandatory(schema()))
        .arg("data", Argument::mandatory(rows_of("schema")))
        .schema(|b| {
            b.get("schema")
                .and_then(Arg::as_schema)
                .cloned()
                .ok_or_else(|| TesseraError::internal("InMemoryTable without schema"))
        })
        .finish();
    registry
        .define(NodeKind::Selection)
        .arg("table", Argument::mandatory(table()))
        .arg(
            "selections",
            Argument::default(Arg::Seq(vec![]), tuple_of(either(table(), value()))),
        )
        .arg(
            "predicates",
            Argument::default(Arg::Seq(vec![]), tuple_of(boolean_value())),
        )
        .arg("sort_keys", Argument::default(Arg::Seq(vec![]), tuple_of(sort_key())))
        .schema(selection_schema)
        .finish();
    registry
        .define(NodeKind::Aggregation)
        .arg("table", Argument::mandatory(table()))
        .arg(
            "metrics",
            Argument::default(Arg::Seq(vec![]), tuple_of(scalar_value())),
        )
        .arg("by", Argument::default(Arg::Seq(vec![]), tuple_of(value())))
        .arg(
            "predicates",
            Argument::default(Arg::Seq(vec![]), tuple_of(boolean_value())),
        )
        .schema(aggregation_schema)
        .finish();
    registry
        .define(NodeKind::Limit)
        .arg("table", Argument::mandatory(table()))
        .arg("n", Argument::mandatory(integer()))
        .arg("offset", Argument::default(0i64, integer()))
        .schema(parent_schema)
        .finish();
    registry
        .define(NodeKind::DropNa)
        .arg("table", Argument::mandatory(table()))
        .arg("how", Argument::default("any", one_of(&["any", "all"])))
        .arg("subset", Argument::optional(tuple_of(value())))
        .schema(parent_schema)
        .finish();
    registry
        .define(NodeKind::FillNa)
        .arg("table", Argument::mandatory(table()))
        .arg(
            "replacements",
            Argument::mandatory(either(map_of(scalar_value()), scalar_value())),
        )
        .schema(parent_schema)
        .finish();
    registry
        .define(NodeKind::Distinct)
        .arg("table", Argument::mandatory(table()))
        .schema(parent_schema)
        .finish();

    registry
        .define(NodeKind::Join)
        .abstract_()
        .arg("left", Argument::mandatory(table()))
        .arg("right", Argument::mandatory(table()))
        .arg(
            "predicates",
            Argument::default(Arg::Seq(vec![]), tuple_of(boolean_value())),
        )
        .schema(join_schema)
        .finish();
    registry.leaves(
        &[
            NodeKind::InnerJoin,
            NodeKind::LeftJoin,
            NodeKind::RightJoin,
            NodeKind::OuterJoin,
        ],
        |t| t,
    );
    registry.leaves(&[NodeKind::LeftSemiJoin, NodeKind::LeftAntiJoin], |t| {
        t.schema(|b| schema_of(b, "left"))
    });
}

/// A sort key; bare value expressions sort ascending.
fn sort_key() -> Validator {
    let is_key = instance_of(NodeKind::SortKey);
    let is_value = value();
    Validator::new("sort key", move |arg, context| {
        if let Ok(key) = is_key.validate(arg.clone(), context) {
            return Ok(key);
        }
        let expr = is_value.validate(arg, context)?;
        Node::new(NodeKind::SortKey, vec![expr, Arg::from(true)], vec![])
            .map(Arg::Node)
            .map_err(|e| e.to_string())
    })
}

/// Rows of plain values matching the schema bound to `schema_field`.
fn rows_of(schema_field: &'static str) -> Validator {
    Validator::new(format!("rows of {schema_field}"), move |arg, context| {
        let schema = context
            .get(schema_field)
            .and_then(Arg::as_schema)
            .ok_or_else(|| format!("field {schema_field} is not a bound schema"))?;
        let rows = arg
            .as_seq()
            .ok_or_else(|| format!("expected a sequence of rows, got {}", arg.describe()))?;
        for (i, row) in rows.iter().enumerate() {
            let values = row
                .as_seq()
                .ok_or_else(|| format!("row {i}: expected a sequence, got {}", row.describe()))?;
            if values.len() != schema.len() {
                return Err(format!(
                    "row {i}: expected {} values, got {}",
                    schema.len(),
                    values.len()
                ));
            }
            for (value, column) in values.iter().zip(schema.iter()) {
                let value = value.as_value().ok_or_else(|| {
                    format!("row {i}: expected a plain value, got {}", value.describe())
                })?;
                let dtype = value.data_type();
                let fits = dtype.can_coerce_to(&column.data_type)
                    || (dtype.is_integer() && column.data_type.is_integer());
                if !fits {
                    return Err(format!(
                        "row {i}: {dtype} value does not fit column {:?} of type {}",
                        column.name, column.data_type
                    ));
                }
            }
        }
        Ok(arg)
    })
}

fn schema_of(bound: &Bound, field: &str) -> TesseraResult<Schema> {
    bound
        .node(field)
        .and_then(Node::schema)
        .cloned()
        .ok_or_else(|| TesseraError::internal(format!("field {field} is not a relation")))
}

fn parent_schema(bound: &Bound) -> TesseraResult<Schema> {
    schema_of(bound, "table")
}

fn push_unique(schema: &mut Schema, owner: &str, field: &str, column: ColumnInfo) -> TesseraResult<()> {
    if schema.contains(&column.name) {
        return Err(TesseraError::validation(
            owner,
            field,
            format!("duplicate column name {:?}", column.name),
        ));
    }
    schema.add_column(column);
    Ok(())
}

fn value_column(node: &Node) -> TesseraResult<ColumnInfo> {
    Ok(ColumnInfo::new(node.name()?, node.output_dtype()?))
}

fn selection_schema(bound: &Bound) -> TesseraResult<Schema> {
    let selections = bound.get("selections").map(Arg::nodes).unwrap_or_default();
    if selections.is_empty() {
        return parent_schema(bound);
    }
    let mut schema = Schema::new();
    for node in selections {
        if node.kind().is_table() {
            for column in node.schema().map(|s| s.columns.clone()).unwrap_or_default() {
                push_unique(&mut schema, "Selection", "selections", column)?;
            }
        } else {
            push_unique(&mut schema, "Selection", "selections", value_column(node)?)?;
        }
    }
    Ok(schema)
}

fn aggregation_schema(bound: &Bound) -> TesseraResult<Schema> {
    let mut schema = Schema::new();
    for field in ["by", "metrics"] {
        for node in bound.get(field).map(Arg::nodes).unwrap_or_default() {
            push_unique(&mut schema, "Aggregation", field, value_column(node)?)?;
        }
    }
    Ok(schema)
}

fn join_schema(bound: &Bound) -> TesseraResult<Schema> {
    let mut schema = schema_of(bound, "left")?;
    for mut column in schema_of(bound, "right")?.columns {
        if schema.contains(&column.name) {
            column.name = format!("{}{JOIN_SUFFIX}", column.name);
        }
        push_unique(&mut schema, "Join", "right", column)?;
    }
    Ok(schema)
}

/// Build a physical table reference.
pub fn database_table(name: &str, schema: Schema) -> TesseraResult<Node> {
    Node::new(
        NodeKind::DatabaseTable,
        vec![Arg::from(name), Arg::Schema(schema)],
        vec![],
    )
}

/// Build a relation over rows held in memory.
pub fn in_memory_table(name: &str, schema: Schema, rows: Vec<Vec<Value>>) -> TesseraResult<Node> {
    let data = rows
        .into_iter()
        .map(|row| Arg::Seq(row.into_iter().map(Arg::Value).collect()))
        .collect();
    Node::new(
        NodeKind::InMemoryTable,
        vec![Arg::from(name), Arg::Schema(schema), Arg::Seq(data)],
        vec![],
    )
}
