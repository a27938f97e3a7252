//! Hash aggregation.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use arrow::array::{new_null_array, Array, ArrayRef, UInt32Array};
use arrow::compute::{concat, take};
use arrow::record_batch::RecordBatch;
use arrow::row::{OwnedRow, RowConverter, SortField};

use common_error::{TesseraError, TesseraResult};

use super::{batch_from_columns, take_batch};
use crate::expr::evaluator::broadcast;
use crate::expr::{Expr, ExprEvaluator};

/// Row indices of each group, in order of first appearance.
fn group_rows(keys: &[ArrayRef], rows: usize) -> TesseraResult<Vec<Vec<u32>>> {
    let fields = keys
        .iter()
        .map(|key| SortField::new(key.data_type().clone()))
        .collect();
    let converter = RowConverter::new(fields)?;
    let encoded = converter.convert_columns(keys)?;

    let mut slots: HashMap<OwnedRow, usize> = HashMap::new();
    let mut groups: Vec<Vec<u32>> = Vec::new();
    for row in 0..rows {
        let slot = *slots.entry(encoded.row(row).owned()).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(row as u32);
    }
    Ok(groups)
}

/// Reduce one group to exactly one row.
fn reduce(evaluator: &ExprEvaluator, expr: &Expr, group: &RecordBatch) -> TesseraResult<ArrayRef> {
    let array = evaluator.evaluate(expr, group)?;
    Ok(match array.len() {
        0 => new_null_array(array.data_type(), 1),
        1 => array,
        _ => array.slice(0, 1),
    })
}

fn check_names(names: &[String]) -> TesseraResult<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(TesseraError::schema_error(format!(
                "duplicate output column: {name}"
            )));
        }
    }
    Ok(())
}

/// Group `batch` by `keys` and evaluate `aggs` once per group.
///
/// Without keys the whole input forms a single group, so the result always
/// has exactly one row, even for empty input. With keys, groups come out in
/// order of first appearance and null keys form their own group.
pub(crate) fn aggregate(
    batch: &RecordBatch,
    keys: &[Expr],
    aggs: &[Expr],
) -> TesseraResult<RecordBatch> {
    let names: Vec<String> = keys.iter().chain(aggs).map(Expr::output_name).collect();
    check_names(&names)?;
    let evaluator = ExprEvaluator::new();

    if keys.is_empty() {
        let columns = aggs
            .iter()
            .map(|agg| reduce(&evaluator, agg, batch))
            .collect::<TesseraResult<Vec<_>>>()?;
        return batch_from_columns(names, columns, 1);
    }

    let key_arrays = keys
        .iter()
        .map(|key| broadcast(&evaluator.evaluate(key, batch)?, batch.num_rows()))
        .collect::<TesseraResult<Vec<_>>>()?;
    let groups = group_rows(&key_arrays, batch.num_rows())?;
    log::trace!("aggregate: {} rows in {} groups", batch.num_rows(), groups.len());

    let firsts = UInt32Array::from(groups.iter().map(|rows| rows[0]).collect::<Vec<_>>());
    let mut columns = key_arrays
        .iter()
        .map(|key| take(key.as_ref(), &firsts, None))
        .collect::<Result<Vec<_>, _>>()?;

    let mut partials: Vec<Vec<ArrayRef>> = vec![Vec::with_capacity(groups.len()); aggs.len()];
    for rows in &groups {
        let group = take_batch(batch, &UInt32Array::from(rows.clone()))?;
        for (agg, partial) in aggs.iter().zip(partials.iter_mut()) {
            partial.push(reduce(&evaluator, agg, &group)?);
        }
    }

    for (agg, partial) in aggs.iter().zip(partials) {
        if partial.is_empty() {
            // No groups; evaluate on the empty input to learn the output type.
            let empty = reduce(&evaluator, agg, &batch.slice(0, 0))?;
            columns.push(empty.slice(0, 0));
        } else {
            let refs: Vec<&dyn Array> = partial.iter().map(|a| a.as_ref() as &dyn Array).collect();
            columns.push(concat(&refs)?);
        }
    }
    batch_from_columns(names, columns, groups.len())
}

#[cfg(test)]
mod tests {
    use arrow::array::{Float64Array, Int64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};

    use super::*;
    use crate::expr::{col, lit, AggFunc};

    fn batch() -> RecordBatch {
        let schema = Schema::new(vec![
            Field::new("dept", DataType::Utf8, true),
            Field::new("salary", DataType::Int64, true),
        ]);
        RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(StringArray::from(vec![
                    Some("eng"),
                    Some("ops"),
                    Some("eng"),
                    None,
                ])),
                Arc::new(Int64Array::from(vec![100, 50, 200, 10])),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_groups_in_first_appearance_order() {
        let out = aggregate(
            &batch(),
            &[col("dept")],
            &[col("salary").agg(AggFunc::Sum).alias("total")],
        )
        .unwrap();
        assert_eq!(out.num_rows(), 3);
        let depts = out.column(0).as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(depts.iter().collect::<Vec<_>>(), vec![Some("eng"), Some("ops"), None]);
        let totals = out.column(1).as_any().downcast_ref::<Int64Array>().unwrap();
        assert_eq!(totals.values(), &[300, 50, 10]);
    }

    #[test]
    fn test_no_keys_yields_one_row() {
        let empty = batch().slice(0, 0);
        let out = aggregate(
            &empty,
            &[],
            &[
                Expr::CountRows(None).alias("n"),
                col("salary").agg(AggFunc::Mean).alias("avg"),
            ],
        )
        .unwrap();
        assert_eq!(out.num_rows(), 1);
        let n = out.column(0).as_any().downcast_ref::<Int64Array>().unwrap();
        assert_eq!(n.value(0), 0);
        let avg = out.column(1).as_any().downcast_ref::<Float64Array>().unwrap();
        assert!(avg.is_null(0));
    }

    #[test]
    fn test_keyed_empty_input_keeps_types() {
        let out = aggregate(
            &batch().slice(0, 0),
            &[col("dept")],
            &[col("salary").agg(AggFunc::Mean).alias("avg")],
        )
        .unwrap();
        assert_eq!(out.num_rows(), 0);
        assert_eq!(out.schema().field(1).data_type(), &DataType::Float64);
    }

    #[test]
    fn test_metric_expressions_over_reductions() {
        let metric = col("salary")
            .agg(AggFunc::Max)
            .sub(col("salary").agg(AggFunc::Min))
            .add(lit(0i64))
            .alias("spread");
        let out = aggregate(&batch(), &[col("dept")], &[metric]).unwrap();
        let spread = out.column(1).as_any().downcast_ref::<Int64Array>().unwrap();
        assert_eq!(spread.values(), &[100, 0, 0]);
    }
}
