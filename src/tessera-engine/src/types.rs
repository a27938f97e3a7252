//! Conversions between Tessera logical types and Arrow physical types.

use std::iter;
use std::sync::Arc;

use arrow::array::{
    new_empty_array, new_null_array, Array, ArrayRef, BinaryArray, BooleanArray, Float64Array,
    Int32Array, Int64Array, StringArray,
};
use arrow::compute::{cast, concat};
use arrow::datatypes::{
    DataType as ArrowDataType, Field, Schema as ArrowSchema, TimeUnit as ArrowTimeUnit,
};
use arrow::record_batch::RecordBatch;

use common_error::{TesseraError, TesseraResult};
use tessera_core::{DataType, Schema, TimeUnit, Value};

pub(crate) fn to_arrow_time_unit(unit: TimeUnit) -> ArrowTimeUnit {
    match unit {
        TimeUnit::Second => ArrowTimeUnit::Second,
        TimeUnit::Millisecond => ArrowTimeUnit::Millisecond,
        TimeUnit::Microsecond => ArrowTimeUnit::Microsecond,
        TimeUnit::Nanosecond => ArrowTimeUnit::Nanosecond,
    }
}

/// Physical type of a logical type. Intervals are plain integer counts.
pub fn to_arrow_type(dtype: &DataType) -> ArrowDataType {
    match dtype {
        DataType::Null => ArrowDataType::Null,
        DataType::Bool => ArrowDataType::Boolean,
        DataType::Int32 => ArrowDataType::Int32,
        DataType::Int64 | DataType::Interval(_) => ArrowDataType::Int64,
        DataType::Float64 => ArrowDataType::Float64,
        DataType::String => ArrowDataType::Utf8,
        DataType::Binary => ArrowDataType::Binary,
        DataType::Date => ArrowDataType::Date32,
        DataType::Timestamp(unit) => ArrowDataType::Timestamp(to_arrow_time_unit(*unit), None),
        DataType::Array(inner) => {
            ArrowDataType::List(Arc::new(Field::new("item", to_arrow_type(inner), true)))
        }
    }
}

/// Arrow schema of a relation; every column is nullable.
pub fn to_arrow_schema(schema: &Schema) -> ArrowSchema {
    ArrowSchema::new(
        schema
            .iter()
            .map(|column| Field::new(&column.name, to_arrow_type(&column.data_type), true))
            .collect::<Vec<_>>(),
    )
}

/// Broadcast a literal to `rows` rows of the physical type of `dtype`.
pub fn literal_array(value: &Value, dtype: &DataType, rows: usize) -> TesseraResult<ArrayRef> {
    let target = to_arrow_type(dtype);
    let array: ArrayRef = match value {
        Value::Null => return Ok(new_null_array(&target, rows)),
        Value::Bool(b) => Arc::new(BooleanArray::from(vec![*b; rows])),
        Value::Int64(v) | Value::Timestamp(v, _) | Value::Interval(v, _) => {
            Arc::new(Int64Array::from(vec![*v; rows]))
        }
        Value::Float64(v) => Arc::new(Float64Array::from(vec![*v; rows])),
        Value::String(s) => Arc::new(StringArray::from_iter_values(iter::repeat(s).take(rows))),
        Value::Binary(b) => Arc::new(BinaryArray::from_iter_values(
            iter::repeat(b.as_slice()).take(rows),
        )),
        Value::Date(days) => Arc::new(Int32Array::from(vec![*days; rows])),
        Value::Array(_) => {
            return Err(TesseraError::not_implemented("array literals in the engine"))
        }
    };

    // Timestamps are reinterpreted in their own unit first, then converted.
    let array = match value {
        Value::Timestamp(_, unit) => cast(
            &array,
            &ArrowDataType::Timestamp(to_arrow_time_unit(*unit), None),
        )?,
        _ => array,
    };
    if array.data_type() == &target || target == ArrowDataType::Null {
        Ok(array)
    } else {
        Ok(cast(&array, &target)?)
    }
}

/// Build a batch from rows of plain values, each cast to its column type.
pub fn batch_from_rows(schema: &Schema, rows: &[Vec<Value>]) -> TesseraResult<RecordBatch> {
    let columns = schema
        .iter()
        .enumerate()
        .map(|(i, column)| {
            if rows.is_empty() {
                return Ok(new_empty_array(&to_arrow_type(&column.data_type)));
            }
            let cells = rows
                .iter()
                .map(|row| {
                    let value = row.get(i).ok_or_else(|| {
                        TesseraError::value_error(format!(
                            "row has no value for column {:?}",
                            column.name
                        ))
                    })?;
                    literal_array(value, &column.data_type, 1)
                })
                .collect::<TesseraResult<Vec<_>>>()?;
            let refs: Vec<&dyn Array> = cells.iter().map(AsRef::as_ref).collect();
            Ok(concat(&refs)?)
        })
        .collect::<TesseraResult<Vec<_>>>()?;
    Ok(RecordBatch::try_new(
        Arc::new(to_arrow_schema(schema)),
        columns,
    )?)
}
