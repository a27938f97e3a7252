//! Offset and row limits.

use arrow::record_batch::RecordBatch;

/// Rows `offset..offset + len`, clamped to the batch.
pub(crate) fn slice(batch: &RecordBatch, offset: usize, len: Option<usize>) -> RecordBatch {
    let start = offset.min(batch.num_rows());
    let available = batch.num_rows() - start;
    let len = len.map_or(available, |len| len.min(available));
    batch.slice(start, len)
}
