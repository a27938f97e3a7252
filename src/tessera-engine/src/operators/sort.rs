//! Multi-key sorting.

use arrow::compute::{lexsort_to_indices, SortColumn, SortOptions};
use arrow::record_batch::RecordBatch;

use common_error::{ensure, TesseraResult};

use super::take_batch;
use crate::expr::evaluator::broadcast;
use crate::expr::{Expr, ExprEvaluator};

/// Stable lexicographic sort. Nulls lead ascending keys and trail
/// descending ones.
pub(crate) fn sort(
    batch: &RecordBatch,
    by: &[Expr],
    descending: &[bool],
) -> TesseraResult<RecordBatch> {
    ensure!(
        by.len() == descending.len(),
        InternalError: "sort got {} keys but {} directions",
        by.len(),
        descending.len()
    );
    if by.is_empty() || batch.num_rows() < 2 {
        return Ok(batch.clone());
    }

    let evaluator = ExprEvaluator::new();
    let columns = by
        .iter()
        .zip(descending)
        .map(|(expr, &descending)| {
            let values = broadcast(&evaluator.evaluate(expr, batch)?, batch.num_rows())?;
            Ok(SortColumn {
                values,
                options: Some(SortOptions {
                    descending,
                    nulls_first: !descending,
                }),
            })
        })
        .collect::<TesseraResult<Vec<_>>>()?;

    let indices = lexsort_to_indices(&columns, None)?;
    take_batch(batch, &indices)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::array::{Int64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};

    use super::*;
    use crate::expr::col;

    fn batch() -> RecordBatch {
        let schema = Schema::new(vec![
            Field::new("g", DataType::Utf8, true),
            Field::new("x", DataType::Int64, true),
        ]);
        RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(StringArray::from(vec!["b", "a", "b", "a"])),
                Arc::new(Int64Array::from(vec![Some(1), Some(2), None, Some(4)])),
            ],
        )
        .unwrap()
    }

    fn xs(batch: &RecordBatch) -> Vec<Option<i64>> {
        batch
            .column(1)
            .as_any()
            .downcast_ref::<Int64Array>()
            .unwrap()
            .iter()
            .collect()
    }

    #[test]
    fn test_sort_mixed_directions() {
        let out = sort(&batch(), &[col("g"), col("x")], &[false, true]).unwrap();
        assert_eq!(xs(&out), vec![Some(4), Some(2), Some(1), None]);
    }

    #[test]
    fn test_ascending_puts_nulls_first() {
        let out = sort(&batch(), &[col("x")], &[false]).unwrap();
        assert_eq!(xs(&out), vec![None, Some(1), Some(2), Some(4)]);
    }
}
