//! Projection operators.

use std::collections::HashSet;

use arrow::array::ArrayRef;
use arrow::record_batch::RecordBatch;

use common_error::{TesseraError, TesseraResult};

use super::batch_from_columns;
use crate::expr::evaluator::broadcast;
use crate::expr::{Expr, ExprEvaluator};

fn evaluate(batch: &RecordBatch, expr: &Expr, rows: usize) -> TesseraResult<ArrayRef> {
    broadcast(&ExprEvaluator::new().evaluate(expr, batch)?, rows)
}

/// Evaluate `exprs` into a new batch.
///
/// A projection made only of reductions yields one row; otherwise
/// single-row results are broadcast to the input height.
pub(crate) fn select(batch: &RecordBatch, exprs: &[Expr]) -> TesseraResult<RecordBatch> {
    let rows = if !exprs.is_empty() && exprs.iter().all(Expr::is_aggregate) {
        1
    } else {
        batch.num_rows()
    };

    let mut seen = HashSet::new();
    let mut names = Vec::with_capacity(exprs.len());
    let mut columns = Vec::with_capacity(exprs.len());
    for expr in exprs {
        let name = expr.output_name();
        if !seen.insert(name.clone()) {
            return Err(TesseraError::schema_error(format!(
                "duplicate output column: {name}"
            )));
        }
        columns.push(evaluate(batch, expr, rows)?);
        names.push(name);
    }
    batch_from_columns(names, columns, rows)
}

/// Add or replace columns. Replaced columns keep their position.
pub(crate) fn with_columns(batch: &RecordBatch, exprs: &[Expr]) -> TesseraResult<RecordBatch> {
    let rows = batch.num_rows();
    let schema = batch.schema();
    let mut names: Vec<String> = schema.fields().iter().map(|f| f.name().clone()).collect();
    let mut columns: Vec<ArrayRef> = batch.columns().to_vec();

    let mut seen = HashSet::new();
    for expr in exprs {
        let name = expr.output_name();
        if !seen.insert(name.clone()) {
            return Err(TesseraError::schema_error(format!(
                "duplicate output column: {name}"
            )));
        }
        // Every expression sees the input batch, not earlier replacements.
        let column = evaluate(batch, expr, rows)?;
        match names.iter().position(|existing| *existing == name) {
            Some(index) => columns[index] = column,
            None => {
                names.push(name);
                columns.push(column);
            }
        }
    }
    batch_from_columns(names, columns, rows)
}
