//! Row filtering.

use arrow::compute::filter_record_batch;
use arrow::record_batch::RecordBatch;

use common_error::TesseraResult;

use crate::expr::{Expr, ExprEvaluator};

/// Keep the rows where `predicate` is true. Null counts as false.
pub(crate) fn filter(batch: &RecordBatch, predicate: &Expr) -> TesseraResult<RecordBatch> {
    let mask = ExprEvaluator::new().evaluate_predicate(predicate, batch)?;
    Ok(filter_record_batch(batch, &mask)?)
}
