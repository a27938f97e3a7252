//! List kernels.
//!
//! Lists are Arrow `List` arrays with nullable `item` elements, matching
//! the physical type of array columns.

use std::sync::Arc;

use arrow::array::{new_empty_array, Array, ArrayRef, AsArray, ListArray};
use arrow::buffer::{NullBuffer, OffsetBuffer};
use arrow::compute::kernels::length::length as list_lengths;
use arrow::compute::{cast, concat as concat_arrays, interleave};
use arrow::datatypes::{DataType as ArrowDataType, Field};

use common_error::{TesseraError, TesseraResult};

fn list_array(array: &ArrayRef) -> TesseraResult<&ListArray> {
    array.as_list_opt::<i32>().ok_or_else(|| {
        TesseraError::type_error(format!("expected a list array, got {}", array.data_type()))
    })
}

/// Element count of each list; null lists stay null.
pub(super) fn length(array: &ArrayRef) -> TesseraResult<ArrayRef> {
    list_array(array)?;
    let lengths = list_lengths(array.as_ref())?;
    Ok(cast(&lengths, &ArrowDataType::Int64)?)
}

/// Row by row `left ++ right`; null if either side is null.
pub(super) fn concat(args: &[ArrayRef]) -> TesseraResult<ArrayRef> {
    let [left, right] = args else {
        return Err(TesseraError::execution("list.concat expects two arguments"));
    };
    let right = if right.data_type() == left.data_type() {
        Arc::clone(right)
    } else {
        cast(right, left.data_type())?
    };
    let (lhs, rhs) = (list_array(left)?, list_array(&right)?);
    let ArrowDataType::List(field) = lhs.data_type() else {
        return Err(TesseraError::internal("list array without list type"));
    };

    let mut pieces: Vec<ArrayRef> = Vec::new();
    let mut lengths = Vec::with_capacity(lhs.len());
    let mut valid = Vec::with_capacity(lhs.len());
    for row in 0..lhs.len() {
        let present = lhs.is_valid(row) && rhs.is_valid(row);
        if present {
            pieces.push(lhs.value(row));
            pieces.push(rhs.value(row));
            lengths.push(lhs.value_length(row) as usize + rhs.value_length(row) as usize);
        } else {
            lengths.push(0);
        }
        valid.push(present);
    }
    let values = if pieces.is_empty() {
        new_empty_array(field.data_type())
    } else {
        let refs: Vec<&dyn Array> = pieces.iter().map(AsRef::as_ref).collect();
        concat_arrays(&refs)?
    };
    let list = ListArray::try_new(
        Arc::clone(field),
        OffsetBuffer::from_lengths(lengths),
        values,
        Some(NullBuffer::from(valid)),
    )?;
    Ok(Arc::new(list))
}

/// Gather the arguments of each row into one list. The arguments must
/// already share a type.
pub(super) fn from_columns(args: &[ArrayRef]) -> TesseraResult<ArrayRef> {
    let Some(first) = args.first() else {
        return Err(TesseraError::execution("concat_list expects at least one argument"));
    };
    let rows = first.len();
    let width = args.len();
    let refs: Vec<&dyn Array> = args.iter().map(AsRef::as_ref).collect();
    let indices: Vec<(usize, usize)> = (0..rows)
        .flat_map(|row| (0..width).map(move |column| (column, row)))
        .collect();
    let values = interleave(&refs, &indices)?;
    let field = Arc::new(Field::new("item", values.data_type().clone(), true));
    let offsets = OffsetBuffer::from_lengths(std::iter::repeat(width).take(rows));
    Ok(Arc::new(ListArray::try_new(field, offsets, values, None)?))
}
