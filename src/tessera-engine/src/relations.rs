//! Table rules. Every table node lowers to a [`LazyFrame`].

use common_error::{TesseraError, TesseraResult};
use tessera_core::{Schema, Value};
use tessera_ir::ops::JOIN_SUFFIX;
use tessera_ir::{Arg, Named, Node, NodeKind, Relational};
use tessera_translate::{Backend, RuleTable};

use crate::backend::Engine;
use crate::expr::{col, lit, Expr};
use crate::frame::{JoinType, LazyFrame};
use crate::types::batch_from_rows;
use crate::values::{expr, EngineTranslator};

const JOIN_TYPES: &[(NodeKind, JoinType)] = &[
    (NodeKind::InnerJoin, JoinType::Inner),
    (NodeKind::LeftJoin, JoinType::Left),
    (NodeKind::OuterJoin, JoinType::Outer),
    (NodeKind::LeftSemiJoin, JoinType::Semi),
    (NodeKind::LeftAntiJoin, JoinType::Anti),
];

fn frame(t: &mut EngineTranslator, node: &Node, field: &str) -> TesseraResult<LazyFrame> {
    t.translate_field(node, field)?.into_frame()
}

/// A value lowered under its output column name, so the frame's columns
/// line up with the node's schema.
fn named(t: &mut EngineTranslator, node: &Node) -> TesseraResult<Expr> {
    let lowered = t.translate(node)?.into_expr()?;
    Ok(match node.kind() {
        NodeKind::Alias | NodeKind::TableColumn => lowered,
        _ => lowered.alias(node.name()?),
    })
}

fn named_all(t: &mut EngineTranslator, node: &Node, field: &str) -> TesseraResult<Vec<Expr>> {
    node.children_of(field)?
        .into_iter()
        .map(|child| named(t, child))
        .collect()
}

/// AND together every predicate in `field`, if there are any.
fn conjunction(t: &mut EngineTranslator, node: &Node, field: &str) -> TesseraResult<Option<Expr>> {
    let mut predicates = t
        .translate_seq(node, field)?
        .into_iter()
        .map(|lowered| lowered.into_expr());
    let Some(first) = predicates.next().transpose()? else {
        return Ok(None);
    };
    predicates
        .try_fold(first, |acc, next| -> TesseraResult<Expr> { Ok(acc.and(next?)) })
        .map(Some)
}

fn columns(schema: &Schema) -> Vec<Expr> {
    schema.iter().map(|column| col(&column.name)).collect()
}

fn non_negative(node: &Node, field: &str) -> TesseraResult<usize> {
    let value = node.int_field(field)?;
    usize::try_from(value).map_err(|_| {
        TesseraError::value_error(format!(
            "{}.{field} must not be negative, got {value}",
            node.kind()
        ))
    })
}

/// Whether every column `expr` reads belongs to `table`.
fn reads_only(expr: &Node, table: &Node) -> bool {
    if expr.kind() == NodeKind::TableColumn {
        return expr.child("table").is_ok_and(|owner| owner == table);
    }
    expr.children().into_iter().all(|child| reads_only(child, table))
}

/// Split equality predicates into left and right key lists, orienting each
/// side by the table it reads from.
fn join_keys(t: &mut EngineTranslator, node: &Node) -> TesseraResult<(Vec<Expr>, Vec<Expr>)> {
    let left = node.child("left")?;
    let right = node.child("right")?;
    let predicates = node.children_of("predicates")?;
    if predicates.is_empty() {
        return Err(TesseraError::translation(format!(
            "{} needs at least one equality predicate",
            node.kind()
        )));
    }
    let mut left_on = Vec::with_capacity(predicates.len());
    let mut right_on = Vec::with_capacity(predicates.len());
    for predicate in predicates {
        if predicate.kind() != NodeKind::Equals {
            return Err(TesseraError::translation(format!(
                "only equality join predicates are supported, got {}",
                predicate.kind()
            )));
        }
        let a = predicate.child("left")?;
        let b = predicate.child("right")?;
        let (l, r) = if reads_only(a, left) && reads_only(b, right) {
            (a, b)
        } else if reads_only(a, right) && reads_only(b, left) {
            (b, a)
        } else {
            return Err(TesseraError::translation(
                "each side of a join predicate must read from one join input",
            ));
        };
        left_on.push(t.translate(l)?.into_expr()?);
        right_on.push(t.translate(r)?.into_expr()?);
    }
    Ok((left_on, right_on))
}

/// Replacement literal for one `FillNa` entry.
fn replacement(node: &Node, arg: &Arg) -> TesseraResult<Value> {
    let value = match arg {
        Arg::Node(child) => child.literal_value(),
        Arg::Value(value) => Some(value),
        _ => None,
    };
    value.cloned().ok_or_else(|| {
        TesseraError::unsupported_argument(node.kind().name(), "replacements", Engine::NAME)
    })
}

fn in_memory_rows(node: &Node) -> TesseraResult<Vec<Vec<Value>>> {
    let malformed = || TesseraError::internal("InMemoryTable rows must hold plain values");
    node.field("data")?
        .as_seq()
        .ok_or_else(malformed)?
        .iter()
        .map(|row| {
            row.as_seq()
                .ok_or_else(malformed)?
                .iter()
                .map(|cell| cell.as_value().cloned().ok_or_else(malformed))
                .collect()
        })
        .collect()
}

pub(crate) fn register(rules: &mut RuleTable<Engine>) {
    rules.register(NodeKind::DatabaseTable, |_, node| {
        Ok(LazyFrame::scan(node.str_field("name")?).into())
    });
    rules.register(NodeKind::InMemoryTable, |_, node| {
        let batch = batch_from_rows(node.output_schema()?, &in_memory_rows(node)?)?;
        Ok(LazyFrame::values(node.str_field("name")?, batch).into())
    });

    rules.register(NodeKind::Selection, |t, node| {
        let mut out = frame(t, node, "table")?;
        if let Some(predicate) = conjunction(t, node, "predicates")? {
            out = out.filter(predicate);
        }
        let keys = node.children_of("sort_keys")?;
        if !keys.is_empty() {
            let mut by = Vec::with_capacity(keys.len());
            let mut descending = Vec::with_capacity(keys.len());
            for key in keys {
                by.push(expr(t, key, "expr")?);
                descending.push(!key.bool_field("ascending")?);
            }
            out = out.sort(by, descending);
        }
        let selections = node.children_of("selections")?;
        if !selections.is_empty() {
            let mut projected = Vec::new();
            for selection in selections {
                if selection.kind().is_table() {
                    projected.extend(columns(selection.output_schema()?));
                } else {
                    projected.push(named(t, selection)?);
                }
            }
            out = out.select(projected);
        }
        Ok(out.into())
    });

    rules.register(NodeKind::Aggregation, |t, node| {
        let mut input = frame(t, node, "table")?;
        if let Some(predicate) = conjunction(t, node, "predicates")? {
            input = input.filter(predicate);
        }
        let keys = named_all(t, node, "by")?;
        let metrics = named_all(t, node, "metrics")?;
        Ok(input.group_by(keys).agg(metrics).into())
    });

    rules.register(NodeKind::Limit, |t, node| {
        let n = non_negative(node, "n")?;
        let offset = non_negative(node, "offset")?;
        Ok(frame(t, node, "table")?.slice(offset, Some(n)).into())
    });

    rules.register(NodeKind::Distinct, |t, node| {
        Ok(frame(t, node, "table")?.unique().into())
    });

    rules.register(NodeKind::DropNa, |t, node| {
        if node.str_field("how")? != "any" {
            return Err(TesseraError::unsupported_argument(
                node.kind().name(),
                "how",
                Engine::NAME,
            ));
        }
        let input = frame(t, node, "table")?;
        let subset = match node.get("subset") {
            None | Some(Arg::None) => None,
            Some(_) => {
                let names = node
                    .children_of("subset")?
                    .into_iter()
                    .map(Named::name)
                    .collect::<TesseraResult<Vec<_>>>()?;
                if names.is_empty() {
                    return Ok(input.into());
                }
                Some(names)
            }
        };
        Ok(input.drop_nulls(subset).into())
    });

    rules.register(NodeKind::FillNa, |t, node| {
        let schema = node.child("table")?.output_schema()?.clone();
        let replacements = node.field("replacements")?.clone();
        let mut fills = Vec::new();
        match &replacements {
            Arg::Map(entries) => {
                for (name, arg) in entries {
                    let column = schema.column(name).ok_or_else(|| {
                        TesseraError::translation(format!(
                            "cannot fill column {name:?}: not in {schema}"
                        ))
                    })?;
                    fills.push((column.clone(), replacement(node, arg)?));
                }
            }
            scalar => {
                let value = replacement(node, scalar)?;
                let dtype = value.data_type();
                fills.extend(
                    schema
                        .iter()
                        .filter(|column| dtype.is_comparable_with(&column.data_type))
                        .map(|column| (column.clone(), value.clone())),
                );
            }
        }
        let input = frame(t, node, "table")?;
        if fills.is_empty() {
            return Ok(input.into());
        }
        let exprs = fills
            .into_iter()
            .map(|(column, value)| {
                col(&column.name)
                    .fill_nan(lit(value.clone()))
                    .fill_null(lit(value))
                    .cast(column.data_type)
                    .alias(column.name)
            })
            .collect();
        Ok(input.with_columns(exprs).into())
    });

    for &(kind, how) in JOIN_TYPES {
        rules.register(kind, move |t, node| {
            let left = frame(t, node, "left")?;
            let right = frame(t, node, "right")?;
            let (left_on, right_on) = join_keys(t, node)?;
            Ok(left.join(right, left_on, right_on, how).into())
        });
    }

    // No native right join: swap the inputs, then restore the left-first layout.
    rules.register(NodeKind::RightJoin, |t, node| {
        let left_schema = node.child("left")?.output_schema()?.clone();
        let right_schema = node.child("right")?.output_schema()?.clone();
        let left = frame(t, node, "left")?;
        let right = frame(t, node, "right")?;
        let (left_on, right_on) = join_keys(t, node)?;
        let swapped = right.join(left, right_on, left_on, JoinType::Left);

        let mut layout = Vec::with_capacity(left_schema.len() + right_schema.len());
        for column in left_schema.iter() {
            layout.push(if right_schema.contains(&column.name) {
                col(format!("{}{JOIN_SUFFIX}", column.name)).alias(&column.name)
            } else {
                col(&column.name)
            });
        }
        for column in right_schema.iter() {
            layout.push(if left_schema.contains(&column.name) {
                col(&column.name).alias(format!("{}{JOIN_SUFFIX}", column.name))
            } else {
                col(&column.name)
            });
        }
        Ok(swapped.select(layout).into())
    });
}
