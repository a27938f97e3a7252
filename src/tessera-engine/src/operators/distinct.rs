//! Duplicate and null row removal.

use std::collections::HashSet;

use arrow::array::{Array, BooleanArray, UInt32Array};
use arrow::compute::filter_record_batch;
use arrow::record_batch::RecordBatch;
use arrow::row::{RowConverter, SortField};

use common_error::{TesseraError, TesseraResult};

use super::take_batch;

/// Keep the first occurrence of every distinct row.
pub(crate) fn unique(batch: &RecordBatch) -> TesseraResult<RecordBatch> {
    if batch.num_columns() == 0 {
        return Ok(batch.slice(0, batch.num_rows().min(1)));
    }
    let fields = batch
        .schema()
        .fields()
        .iter()
        .map(|f| SortField::new(f.data_type().clone()))
        .collect();
    let converter = RowConverter::new(fields)?;
    let rows = converter.convert_columns(batch.columns())?;

    let mut seen = HashSet::new();
    let keep: Vec<u32> = (0..batch.num_rows())
        .filter(|&row| seen.insert(rows.row(row)))
        .map(|row| row as u32)
        .collect();
    if keep.len() == batch.num_rows() {
        return Ok(batch.clone());
    }
    take_batch(batch, &UInt32Array::from(keep))
}

/// Drop every row with a null in one of `subset`, or in any column when
/// `subset` is `None`.
pub(crate) fn drop_nulls(
    batch: &RecordBatch,
    subset: Option<&[String]>,
) -> TesseraResult<RecordBatch> {
    let columns = match subset {
        None => batch.columns().to_vec(),
        Some(names) => names
            .iter()
            .map(|name| {
                batch.column_by_name(name).cloned().ok_or_else(|| {
                    TesseraError::schema_error(format!("column not found: {name}"))
                })
            })
            .collect::<TesseraResult<Vec<_>>>()?,
    };
    if columns.iter().all(|column| column.null_count() == 0) {
        return Ok(batch.clone());
    }
    let mask: BooleanArray = (0..batch.num_rows())
        .map(|row| Some(columns.iter().all(|column| column.is_valid(row))))
        .collect();
    Ok(filter_record_batch(batch, &mask)?)
}
