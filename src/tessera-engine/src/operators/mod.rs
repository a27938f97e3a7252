//! Batch operators.
//!
//! Each operator consumes fully materialized input and produces one
//! [`RecordBatch`](arrow::record_batch::RecordBatch). The executor wires
//! them together by walking a [`Plan`](crate::frame::Plan).
//!
//! | Operator | Plan node |
//! |----------|-----------|
//! | [`filter`] | `Filter` |
//! | [`select`], [`with_columns`] | `Select`, `WithColumns` |
//! | [`sort`] | `Sort` |
//! | [`slice`] | `Slice` |
//! | [`aggregate`] | `Aggregate` |
//! | [`hash_join`] | `Join` |
//! | [`unique`], [`drop_nulls`] | `Unique`, `DropNulls` |

mod distinct;
mod filter;
mod group_by;
mod join;
mod limit;
mod project;
mod sort;

pub(crate) use distinct::{drop_nulls, unique};
pub(crate) use filter::filter;
pub(crate) use group_by::aggregate;
pub(crate) use join::hash_join;
pub(crate) use limit::slice;
pub(crate) use project::{select, with_columns};
pub(crate) use sort::sort;

use std::sync::Arc;

use arrow::array::{Array, ArrayRef};
use arrow::compute::take;
use arrow::datatypes::{Field, Schema as ArrowSchema};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};

use common_error::TesseraResult;

/// Build a batch from named columns. Every field is nullable.
pub(crate) fn batch_from_columns(
    names: Vec<String>,
    columns: Vec<ArrayRef>,
    rows: usize,
) -> TesseraResult<RecordBatch> {
    let fields: Vec<Field> = names
        .into_iter()
        .zip(&columns)
        .map(|(name, column)| Field::new(name, column.data_type().clone(), true))
        .collect();
    let options = RecordBatchOptions::new().with_row_count(Some(rows));
    Ok(RecordBatch::try_new_with_options(
        Arc::new(ArrowSchema::new(fields)),
        columns,
        &options,
    )?)
}

/// Gather `indices` from every column of `batch`.
pub(crate) fn take_batch(batch: &RecordBatch, indices: &dyn Array) -> TesseraResult<RecordBatch> {
    let columns = batch
        .columns()
        .iter()
        .map(|column| take(column.as_ref(), indices, None))
        .collect::<Result<Vec<_>, _>>()?;
    let options = RecordBatchOptions::new().with_row_count(Some(indices.len()));
    Ok(RecordBatch::try_new_with_options(
        batch.schema(),
        columns,
        &options,
    )?)
}
