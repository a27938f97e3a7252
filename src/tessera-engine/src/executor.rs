//! Plan execution.

use std::time::Instant;

use arrow::record_batch::RecordBatch;
use common_display::TreeNode;
use common_error::TesseraResult;

use crate::catalog::Catalog;
use crate::frame::Plan;
use crate::operators;

/// Execute `plan` bottom-up against the tables in `catalog`.
pub fn execute(plan: &Plan, catalog: &Catalog) -> TesseraResult<RecordBatch> {
    let start = Instant::now();
    let batch = execute_node(plan, catalog)?;
    log::debug!(
        "executed {} plan: {} rows x {} columns in {:?}",
        plan.name(),
        batch.num_rows(),
        batch.num_columns(),
        start.elapsed()
    );
    Ok(batch)
}

fn execute_node(plan: &Plan, catalog: &Catalog) -> TesseraResult<RecordBatch> {
    let batch = match plan {
        Plan::Scan { table } => catalog.get(table)?.clone(),
        Plan::Values { batch, .. } => batch.clone(),
        Plan::Filter { input, predicate } => {
            operators::filter(&execute_node(input, catalog)?, predicate)?
        }
        Plan::Select { input, exprs } => operators::select(&execute_node(input, catalog)?, exprs)?,
        Plan::WithColumns { input, exprs } => {
            operators::with_columns(&execute_node(input, catalog)?, exprs)?
        }
        Plan::Sort {
            input,
            by,
            descending,
        } => operators::sort(&execute_node(input, catalog)?, by, descending)?,
        Plan::Slice { input, offset, len } => {
            operators::slice(&execute_node(input, catalog)?, *offset, *len)
        }
        Plan::Aggregate { input, keys, aggs } => {
            operators::aggregate(&execute_node(input, catalog)?, keys, aggs)?
        }
        Plan::Join {
            left,
            right,
            left_on,
            right_on,
            how,
            suffix,
        } => operators::hash_join(
            &execute_node(left, catalog)?,
            &execute_node(right, catalog)?,
            left_on,
            right_on,
            *how,
            suffix,
            catalog.config(),
        )?,
        Plan::DropNulls { input, subset } => {
            operators::drop_nulls(&execute_node(input, catalog)?, subset.as_deref())?
        }
        Plan::Unique { input } => operators::unique(&execute_node(input, catalog)?)?,
    };
    log::trace!("{} -> {} rows", plan.name(), batch.num_rows());
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::array::Int64Array;
    use arrow::datatypes::{DataType, Field, Schema};
    use common_error::TesseraError;

    use super::*;
    use crate::expr::{col, lit};
    use crate::frame::LazyFrame;

    fn catalog() -> Catalog {
        let schema = Schema::new(vec![Field::new("x", DataType::Int64, true)]);
        let batch = RecordBatch::try_new(
            Arc::new(schema),
            vec![Arc::new(Int64Array::from(vec![5, 3, 9, 1]))],
        )
        .unwrap();
        let mut catalog = Catalog::new();
        catalog.register("t", batch);
        catalog
    }

    #[test]
    fn test_pipeline() {
        let frame = LazyFrame::scan("t")
            .filter(col("x").gt(lit(2i64)))
            .sort(vec![col("x")], vec![true])
            .slice(1, Some(5));
        let out = frame.collect(&catalog()).unwrap();
        let xs = out.column(0).as_any().downcast_ref::<Int64Array>().unwrap();
        assert_eq!(xs.values(), &[5, 3]);
    }

    #[test]
    fn test_missing_table() {
        let err = LazyFrame::scan("nope").collect(&catalog()).unwrap_err();
        assert!(matches!(err, TesseraError::ExecutionError(_)));
    }
}
