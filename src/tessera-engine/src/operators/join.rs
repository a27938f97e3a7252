//! Equi-joins.

use std::collections::HashMap;

use arrow::array::{Array, ArrayRef, UInt32Array};
use arrow::compute::{cast, take};
use arrow::record_batch::RecordBatch;
use arrow::row::{OwnedRow, RowConverter, SortField};

use common_config::EngineConfig;
use common_error::{ensure, TesseraResult};

use super::{batch_from_columns, take_batch};
use crate::expr::evaluator::broadcast;
use crate::expr::{Expr, ExprEvaluator};
use crate::frame::JoinType;

fn evaluate_keys(batch: &RecordBatch, keys: &[Expr]) -> TesseraResult<Vec<ArrayRef>> {
    let evaluator = ExprEvaluator::new();
    keys.iter()
        .map(|key| broadcast(&evaluator.evaluate(key, batch)?, batch.num_rows()))
        .collect()
}

fn has_null(keys: &[ArrayRef], row: usize) -> bool {
    keys.iter().any(|key| key.is_null(row))
}

/// Matched row pairs. `None` stands for the missing side of an outer row.
struct JoinIndices {
    left: Vec<Option<u32>>,
    right: Vec<Option<u32>>,
}

fn match_rows(
    left_keys: &[ArrayRef],
    right_keys: &[ArrayRef],
    left_rows: usize,
    right_rows: usize,
    how: JoinType,
    nulls_match: bool,
) -> TesseraResult<JoinIndices> {
    let fields = left_keys
        .iter()
        .map(|key| SortField::new(key.data_type().clone()))
        .collect();
    let converter = RowConverter::new(fields)?;
    let left_encoded = converter.convert_columns(left_keys)?;
    let right_encoded = converter.convert_columns(right_keys)?;

    let mut table: HashMap<OwnedRow, Vec<u32>> = HashMap::new();
    for row in 0..right_rows {
        if nulls_match || !has_null(right_keys, row) {
            table
                .entry(right_encoded.row(row).owned())
                .or_default()
                .push(row as u32);
        }
    }

    let mut out = JoinIndices {
        left: Vec::new(),
        right: Vec::new(),
    };
    let mut right_matched = vec![false; right_rows];
    for row in 0..left_rows {
        let matches = if nulls_match || !has_null(left_keys, row) {
            table.get(&left_encoded.row(row).owned())
        } else {
            None
        };
        match (how, matches) {
            (JoinType::Semi, Some(_)) | (JoinType::Anti, None) => {
                out.left.push(Some(row as u32));
            }
            (JoinType::Semi | JoinType::Anti, _) => {}
            (_, Some(matches)) => {
                for &r in matches {
                    out.left.push(Some(row as u32));
                    out.right.push(Some(r));
                    right_matched[r as usize] = true;
                }
            }
            (JoinType::Left | JoinType::Outer, None) => {
                out.left.push(Some(row as u32));
                out.right.push(None);
            }
            (JoinType::Inner, None) => {}
        }
    }

    if how == JoinType::Outer {
        for (row, matched) in right_matched.into_iter().enumerate() {
            if !matched {
                out.left.push(None);
                out.right.push(Some(row as u32));
            }
        }
    }
    Ok(out)
}

/// Join `left` and `right` on pairwise key equality.
///
/// Rows come out in left order, each followed by its right matches in right
/// order; unmatched right rows of an outer join trail. Semi and anti joins
/// keep only the left columns. Right columns whose names clash with a left
/// column get `suffix`. Null keys never match unless the engine config says
/// otherwise.
pub(crate) fn hash_join(
    left: &RecordBatch,
    right: &RecordBatch,
    left_on: &[Expr],
    right_on: &[Expr],
    how: JoinType,
    suffix: &str,
    config: &EngineConfig,
) -> TesseraResult<RecordBatch> {
    ensure!(
        !left_on.is_empty() && left_on.len() == right_on.len(),
        Translation: "join needs matching non-empty key lists, got {} and {}",
        left_on.len(),
        right_on.len()
    );

    let left_keys = evaluate_keys(left, left_on)?;
    let right_keys = evaluate_keys(right, right_on)?
        .into_iter()
        .zip(&left_keys)
        .map(|(key, target)| {
            if key.data_type() == target.data_type() {
                Ok(key)
            } else {
                Ok(cast(&key, target.data_type())?)
            }
        })
        .collect::<TesseraResult<Vec<_>>>()?;

    let indices = match_rows(
        &left_keys,
        &right_keys,
        left.num_rows(),
        right.num_rows(),
        how,
        config.null_join_keys_match,
    )?;
    log::trace!("{how} join produced {} rows", indices.left.len());

    let left_indices = UInt32Array::from(indices.left);
    if matches!(how, JoinType::Semi | JoinType::Anti) {
        return take_batch(left, &left_indices);
    }
    let right_indices = UInt32Array::from(indices.right);
    let rows = left_indices.len();

    let left_schema = left.schema();
    let mut names: Vec<String> = left_schema
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let mut columns = left
        .columns()
        .iter()
        .map(|column| take(column.as_ref(), &left_indices, None))
        .collect::<Result<Vec<_>, _>>()?;

    let right_schema = right.schema();
    let left_count = names.len();
    for (field, column) in right_schema.fields().iter().zip(right.columns()) {
        let name = if names[..left_count].contains(field.name()) {
            format!("{}{suffix}", field.name())
        } else {
            field.name().clone()
        };
        names.push(name);
        columns.push(take(column.as_ref(), &right_indices, None)?);
    }
    batch_from_columns(names, columns, rows)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::array::{Int64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};

    use super::*;
    use crate::expr::col;

    fn people() -> RecordBatch {
        let schema = Schema::new(vec![
            Field::new("id", DataType::Int64, true),
            Field::new("name", DataType::Utf8, true),
        ]);
        RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(Int64Array::from(vec![Some(1), Some(2), None])),
                Arc::new(StringArray::from(vec!["ann", "bob", "cid"])),
            ],
        )
        .unwrap()
    }

    fn orders() -> RecordBatch {
        let schema = Schema::new(vec![
            Field::new("id", DataType::Int64, true),
            Field::new("amount", DataType::Int64, true),
        ]);
        RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(Int64Array::from(vec![Some(1), Some(1), Some(3), None])),
                Arc::new(Int64Array::from(vec![10, 20, 30, 40])),
            ],
        )
        .unwrap()
    }

    fn join(how: JoinType, config: &EngineConfig) -> RecordBatch {
        hash_join(
            &people(),
            &orders(),
            &[col("id")],
            &[col("id")],
            how,
            "_right",
            config,
        )
        .unwrap()
    }

    fn names(batch: &RecordBatch) -> Vec<String> {
        batch.schema().fields().iter().map(|f| f.name().clone()).collect()
    }

    #[test]
    fn test_inner_join_suffixes_clashes() {
        let out = join(JoinType::Inner, &EngineConfig::default());
        assert_eq!(out.num_rows(), 2);
        assert_eq!(names(&out), vec!["id", "name", "id_right", "amount"]);
    }

    #[test]
    fn test_outer_join_rows() {
        let out = join(JoinType::Outer, &EngineConfig::default());
        // ann twice, bob, cid unmatched, then orders 3 and null unmatched.
        assert_eq!(out.num_rows(), 6);
        let amount = out.column(3).as_any().downcast_ref::<Int64Array>().unwrap();
        assert_eq!(
            amount.iter().collect::<Vec<_>>(),
            vec![Some(10), Some(20), None, None, Some(30), Some(40)]
        );
    }

    #[test]
    fn test_semi_and_anti() {
        let semi = join(JoinType::Semi, &EngineConfig::default());
        assert_eq!(names(&semi), vec!["id", "name"]);
        assert_eq!(semi.num_rows(), 1);
        let anti = join(JoinType::Anti, &EngineConfig::default());
        assert_eq!(anti.num_rows(), 2);
    }

    #[test]
    fn test_null_keys_can_match() {
        let config = EngineConfig {
            null_join_keys_match: true,
        };
        let out = join(JoinType::Inner, &config);
        assert_eq!(out.num_rows(), 3);
    }
}
