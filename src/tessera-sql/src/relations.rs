//! Table rules. Every table node renders as a complete `SELECT`.

use std::collections::HashMap;
use std::fmt;

use common_error::{TesseraError, TesseraResult};
use tessera_ir::ops::JOIN_SUFFIX;
use tessera_core::Value;
use tessera_ir::{Arg, Named, Node, NodeKind, Relational};
use tessera_translate::RuleTable;

use crate::backend::{Binding, Sql};
use crate::literal::{render_literal, sql_type};
use crate::values::SqlTranslator;

const JOIN_TYPES: &[(NodeKind, &str)] = &[
    (NodeKind::InnerJoin, "INNER JOIN"),
    (NodeKind::LeftJoin, "LEFT OUTER JOIN"),
    (NodeKind::RightJoin, "RIGHT OUTER JOIN"),
    (NodeKind::OuterJoin, "FULL OUTER JOIN"),
    (NodeKind::LeftSemiJoin, "LEFT SEMI JOIN"),
    (NodeKind::LeftAntiJoin, "LEFT ANTI JOIN"),
];

#[derive(Debug, Default)]
struct Select {
    distinct: bool,
    items: Vec<String>,
    from: String,
    filters: Vec<String>,
    group_by: Vec<String>,
    order_by: Vec<String>,
    limit: Option<i64>,
    offset: i64,
}

impl Select {
    fn new(from: String) -> Self {
        Self {
            from,
            ..Self::default()
        }
    }
}

impl fmt::Display for Select {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SELECT ")?;
        if self.distinct {
            f.write_str("DISTINCT ")?;
        }
        write!(f, "{} FROM {}", self.items.join(", "), self.from)?;
        if !self.filters.is_empty() {
            write!(f, " WHERE {}", self.filters.join(" AND "))?;
        }
        if !self.group_by.is_empty() {
            write!(f, " GROUP BY {}", self.group_by.join(", "))?;
        }
        if !self.order_by.is_empty() {
            write!(f, " ORDER BY {}", self.order_by.join(", "))?;
        }
        if let Some(limit) = self.limit {
            write!(f, " LIMIT {limit}")?;
        }
        if self.offset != 0 {
            write!(f, " OFFSET {}", self.offset)?;
        }
        Ok(())
    }
}

/// Render `table` as a `FROM` item and return it with its alias.
///
/// Physical tables are referenced by name; anything else nests as a subquery
/// in its own scope. Tables inside a subquery stay reachable through the
/// subquery alias, except behind an aggregation, whose output has only its
/// keys and metrics.
fn from_item(t: &mut SqlTranslator, table: &Node) -> TesseraResult<(String, String)> {
    if table.kind() == NodeKind::DatabaseTable {
        let name = t.backend().quote(table.str_field("name")?);
        let alias = t.backend_mut().bind(table)?;
        return Ok((format!("{name} {alias}"), alias));
    }
    t.backend_mut().push_scope();
    let subquery = t.isolated(|t| t.translate(table));
    let inner = t.backend_mut().pop_scope()?;
    let subquery = subquery?;
    let alias = t.backend_mut().bind(table)?;
    if table.kind() != NodeKind::Aggregation {
        t.backend_mut().export(inner, &alias)?;
    }
    Ok((format!("({subquery}) {alias}"), alias))
}

/// A value expression in a select list, named after the node.
fn select_item(t: &mut SqlTranslator, node: &Node) -> TesseraResult<String> {
    let rendered = t.translate(node)?;
    let name = node.name()?;
    let keeps_name = node.kind() == NodeKind::TableColumn
        && t.backend().output_name(node.child("table")?, node.str_field("name")?) == name;
    if keeps_name {
        Ok(rendered)
    } else {
        Ok(format!("{rendered} AS {}", t.backend().quote(&name)))
    }
}

/// Every column of `table` in a select list, under its schema names.
fn expand(t: &SqlTranslator, table: &Node) -> TesseraResult<Vec<String>> {
    let sql = t.backend();
    match sql.binding(table) {
        Some(Binding::Table {
            alias,
            direct: true,
            renames,
        }) if renames.is_empty() => Ok(vec![format!("{alias}.*")]),
        Some(_) => table
            .output_schema()?
            .iter()
            .map(|column| {
                let item = sql.column(table, &column.name)?;
                Ok(if sql.output_name(table, &column.name) == column.name {
                    item
                } else {
                    format!("{item} AS {}", sql.quote(&column.name))
                })
            })
            .collect(),
        None => Err(TesseraError::translation(
            "a selection may only expand tables of its own source",
        )),
    }
}

/// Rows held in memory as a `UNION ALL` of single-row selects, each value
/// cast to its column type. No rows select typed nulls under `LIMIT 0`.
fn in_memory_rows(sql: &Sql, node: &Node) -> TesseraResult<String> {
    let schema = node.output_schema()?;
    let rows = node
        .field("data")?
        .as_seq()
        .ok_or_else(|| TesseraError::internal("InMemoryTable data is not a sequence"))?;
    let select = |values: &[Option<&Value>]| -> TesseraResult<String> {
        let items = schema
            .iter()
            .zip(values)
            .map(|(column, value)| {
                let literal = match value {
                    Some(value) => render_literal(value)?,
                    None => "NULL".to_string(),
                };
                Ok(format!(
                    "CAST({literal} AS {}) AS {}",
                    sql_type(&column.data_type)?,
                    sql.quote(&column.name)
                ))
            })
            .collect::<TesseraResult<Vec<_>>>()?;
        Ok(format!("SELECT {}", items.join(", ")))
    };
    if rows.is_empty() {
        let nulls: Vec<Option<&Value>> = vec![None; schema.len()];
        return Ok(format!("{} LIMIT 0", select(&nulls)?));
    }
    let selects = rows
        .iter()
        .map(|row| {
            let values: Vec<Option<&Value>> = row
                .as_seq()
                .unwrap_or_default()
                .iter()
                .map(Arg::as_value)
                .collect();
            select(&values)
        })
        .collect::<TesseraResult<Vec<_>>>()?;
    Ok(selects.join(" UNION ALL "))
}

fn owned_children(node: &Node, field: &str) -> TesseraResult<Vec<Node>> {
    Ok(node.children_of(field)?.into_iter().cloned().collect())
}

fn qualified(t: &SqlTranslator, alias: &str, column: &str) -> String {
    format!("{alias}.{}", t.backend().quote(column))
}

pub(crate) fn register(rules: &mut RuleTable<Sql>) {
    rules.register(NodeKind::DatabaseTable, |t, node| {
        Ok(format!("SELECT * FROM {}", t.backend().quote(node.str_field("name")?)))
    });
    rules.register(NodeKind::InMemoryTable, |t, node| in_memory_rows(t.backend(), node));
    rules.register(NodeKind::SortKey, |t, node| {
        let expr = t.translate_field(node, "expr")?;
        let order = if node.bool_field("ascending")? { "ASC" } else { "DESC" };
        Ok(format!("{expr} {order}"))
    });

    rules.register(NodeKind::Selection, |t, node| {
        let table = node.child("table")?.clone();
        let (from, alias) = from_item(t, &table)?;
        let mut select = Select::new(from);
        for selection in owned_children(node, "selections")? {
            if selection.kind().is_table() {
                select.items.extend(expand(t, &selection)?);
            } else {
                select.items.push(select_item(t, &selection)?);
            }
        }
        select.filters = t.translate_seq(node, "predicates")?;
        select.order_by = t.translate_seq(node, "sort_keys")?;
        if select.items.is_empty() {
            select.items.push(format!("{alias}.*"));
        } else {
            t.backend_mut().clear_renames()?;
        }
        Ok(select.to_string())
    });

    rules.register(NodeKind::Aggregation, |t, node| {
        let table = node.child("table")?.clone();
        let (from, _) = from_item(t, &table)?;
        let mut select = Select::new(from);
        let by = owned_children(node, "by")?;
        for key in &by {
            select.items.push(select_item(t, key)?);
        }
        for metric in owned_children(node, "metrics")? {
            select.items.push(select_item(t, &metric)?);
        }
        select.group_by = (1..=by.len()).map(|i| i.to_string()).collect();
        select.filters = t.translate_seq(node, "predicates")?;
        Ok(select.to_string())
    });

    rules.register(NodeKind::Limit, |t, node| {
        let table = node.child("table")?.clone();
        let (from, alias) = from_item(t, &table)?;
        let mut select = Select::new(from);
        select.items.push(format!("{alias}.*"));
        select.limit = Some(node.int_field("n")?);
        select.offset = node.int_field("offset")?;
        Ok(select.to_string())
    });

    rules.register(NodeKind::Distinct, |t, node| {
        let table = node.child("table")?.clone();
        let (from, alias) = from_item(t, &table)?;
        let mut select = Select::new(from);
        select.distinct = true;
        select.items.push(format!("{alias}.*"));
        Ok(select.to_string())
    });

    rules.register(NodeKind::DropNa, |t, node| {
        let table = node.child("table")?.clone();
        let (from, alias) = from_item(t, &table)?;
        let mut select = Select::new(from);
        select.items.push(format!("{alias}.*"));

        let subset = match node.get("subset") {
            Some(Arg::Seq(_)) => t.translate_seq(node, "subset")?,
            _ => table
                .output_schema()?
                .iter()
                .map(|column| qualified(t, &alias, &column.name))
                .collect(),
        };
        if !subset.is_empty() {
            let checks: Vec<String> = subset.iter().map(|c| format!("{c} IS NOT NULL")).collect();
            select.filters.push(match node.str_field("how")? {
                "all" => format!("({})", checks.join(" OR ")),
                _ => checks.join(" AND "),
            });
        }
        Ok(select.to_string())
    });

    rules.register(NodeKind::FillNa, |t, node| {
        let table = node.child("table")?.clone();
        let schema = table.output_schema()?.clone();
        let replacements = node.field("replacements")?.clone();
        if let Arg::Map(entries) = &replacements {
            if let Some((name, _)) = entries.iter().find(|(name, _)| !schema.contains(name)) {
                return Err(TesseraError::translation(format!(
                    "cannot fill column {name:?}: not in {schema}"
                )));
            }
        }

        let (from, alias) = from_item(t, &table)?;
        let mut select = Select::new(from);
        for column in schema.iter() {
            let replacement = match &replacements {
                Arg::Map(entries) => entries
                    .iter()
                    .find(|(name, _)| *name == column.name)
                    .and_then(|(_, value)| value.as_node()),
                Arg::Node(value) => value
                    .dtype()
                    .filter(|dtype| dtype.is_comparable_with(&column.data_type))
                    .map(|_| value),
                _ => None,
            };
            let current = qualified(t, &alias, &column.name);
            select.items.push(match replacement {
                Some(value) => format!(
                    "coalesce({current}, {}) AS {}",
                    t.translate(value)?,
                    t.backend().quote(&column.name)
                ),
                None => current,
            });
        }
        Ok(select.to_string())
    });

    for &(kind, keyword) in JOIN_TYPES {
        rules.register(kind, move |t, node| {
            let left = node.child("left")?.clone();
            let right = node.child("right")?.clone();
            let (left_from, left_alias) = from_item(t, &left)?;
            let (right_from, right_alias) = from_item(t, &right)?;
            let predicates = t.translate_seq(node, "predicates")?;

            let from = match (predicates.is_empty(), kind) {
                (true, NodeKind::InnerJoin) => format!("{left_from} CROSS JOIN {right_from}"),
                (true, _) => format!("{left_from} {keyword} {right_from} ON TRUE"),
                (false, _) => format!(
                    "{left_from} {keyword} {right_from} ON {}",
                    predicates.join(" AND ")
                ),
            };
            let mut select = Select::new(from);

            if matches!(kind, NodeKind::LeftSemiJoin | NodeKind::LeftAntiJoin) {
                select.items.push(format!("{left_alias}.*"));
                return Ok(select.to_string());
            }
            let left_schema = left.output_schema()?.clone();
            for column in left_schema.iter() {
                select.items.push(qualified(t, &left_alias, &column.name));
            }
            let mut renamed = HashMap::new();
            for column in right.output_schema()?.iter() {
                let item = qualified(t, &right_alias, &column.name);
                select.items.push(if left_schema.contains(&column.name) {
                    let output = format!("{}{JOIN_SUFFIX}", column.name);
                    let item = format!("{item} AS {}", t.backend().quote(&output));
                    renamed.insert(column.name.clone(), output);
                    item
                } else {
                    item
                });
            }
            t.backend_mut().rename(&right_alias, &renamed)?;
            Ok(select.to_string())
        });
    }
}
