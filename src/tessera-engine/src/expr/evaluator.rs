//! Expression evaluator implementation.

use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, BooleanArray, Datum, Float64Array, Int64Array, Scalar, UInt32Array,
};
use arrow::compute::kernels::{bitwise, boolean, cmp, numeric, zip::zip};
use arrow::compute::{self, cast};
use arrow::datatypes::DataType as ArrowDataType;
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;

use common_error::{TesseraError, TesseraResult};

use super::{BinaryOp, Expr, UnaryOp};
use crate::aggregate::accumulator_for;
use crate::types::{literal_array, to_arrow_type};

/// Evaluates engine expressions against record batches.
///
/// Reductions evaluate to a single row; operators broadcast single-row
/// operands against full columns, so `sum(x) + 1` works in the same way
/// as `x + 1`.
#[derive(Debug, Default)]
pub struct ExprEvaluator;

impl ExprEvaluator {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Evaluate an expression against a record batch.
    pub fn evaluate(&self, expr: &Expr, batch: &RecordBatch) -> TesseraResult<ArrayRef> {
        match expr {
            Expr::Column(name) => self.eval_column(name, batch),
            Expr::Literal { value, dtype } => literal_array(value, dtype, batch.num_rows()),
            Expr::Alias(expr, _) => self.evaluate(expr, batch),
            Expr::Cast(expr, dtype) => {
                let array = self.evaluate(expr, batch)?;
                Ok(cast(&array, &to_arrow_type(dtype))?)
            }
            Expr::Binary { left, op, right } => {
                let left = self.evaluate(left, batch)?;
                let right = self.evaluate(right, batch)?;
                self.eval_binary(&left, *op, &right)
            }
            Expr::Unary { op, expr } => {
                let array = self.evaluate(expr, batch)?;
                self.eval_unary(*op, &array)
            }
            Expr::When {
                predicate,
                then,
                otherwise,
            } => {
                let mask = self.evaluate_predicate(predicate, batch)?;
                let then = self.evaluate(then, batch)?;
                let otherwise = self.evaluate(otherwise, batch)?;
                self.eval_when(&mask, &then, &otherwise)
            }
            Expr::FillNull(expr, value) => {
                let array = self.evaluate(expr, batch)?;
                let value = self.evaluate(value, batch)?;
                let value = cast(&value, array.data_type())?;
                let mask = compute::is_not_null(array.as_ref())?;
                self.eval_when(&mask, &array, &value)
            }
            Expr::FillNan(expr, value) => {
                let array = self.evaluate(expr, batch)?;
                if array.data_type() != &ArrowDataType::Float64 {
                    return Ok(array);
                }
                let value = cast(&self.evaluate(value, batch)?, &ArrowDataType::Float64)?;
                let floats = downcast::<Float64Array>(&array)?;
                let is_nan: BooleanArray = floats
                    .iter()
                    .map(|v| Some(v.is_some_and(f64::is_nan)))
                    .collect();
                self.eval_when(&boolean::not(&is_nan)?, &array, &value)
            }
            Expr::IsIn { expr, list } => {
                let array = self.evaluate(expr, batch)?;
                self.eval_in_list(&array, list, batch)
            }
            Expr::Between { expr, low, high } => {
                let array = self.evaluate(expr, batch)?;
                let low = self.evaluate(low, batch)?;
                let high = self.evaluate(high, batch)?;
                let above = self.eval_binary(&array, BinaryOp::GtEq, &low)?;
                let below = self.eval_binary(&array, BinaryOp::LtEq, &high)?;
                self.eval_binary(&above, BinaryOp::And, &below)
            }
            Expr::Coalesce(items) => {
                let mut arrays = self.evaluate_all(items, batch)?.into_iter().rev();
                let mut result = arrays
                    .next()
                    .ok_or_else(|| TesseraError::execution("coalesce of nothing"))?;
                for array in arrays {
                    let result_cast = cast(&result, array.data_type())?;
                    let mask = compute::is_not_null(array.as_ref())?;
                    result = self.eval_when(&mask, &array, &result_cast)?;
                }
                Ok(result)
            }
            Expr::MinHorizontal(items) => self.eval_horizontal(items, batch, BinaryOp::Lt),
            Expr::MaxHorizontal(items) => self.eval_horizontal(items, batch, BinaryOp::Gt),
            Expr::Function { function, args } => {
                let arrays = self.evaluate_all(args, batch)?;
                let rows = arrays.iter().map(|a| a.len()).max().unwrap_or(0);
                let arrays = arrays
                    .iter()
                    .map(|array| broadcast(array, rows))
                    .collect::<TesseraResult<Vec<_>>>()?;
                function.apply(&arrays)
            }
            Expr::Agg { func, expr, filter } => {
                let mut values = self.evaluate(expr, batch)?;
                if let Some(filter) = filter {
                    let mask = self.evaluate_predicate(filter, batch)?;
                    values = compute::filter(values.as_ref(), &mask)?;
                }
                let mut accumulator = accumulator_for(*func, values.data_type())?;
                accumulator.update(&values)?;
                accumulator.finalize()
            }
            Expr::CountRows(filter) => {
                let count = match filter {
                    Some(filter) => self.evaluate_predicate(filter, batch)?.true_count(),
                    None => batch.num_rows(),
                };
                Ok(Arc::new(Int64Array::from(vec![count as i64])))
            }
        }
    }

    /// Evaluate a predicate expression, returning a BooleanArray.
    pub fn evaluate_predicate(
        &self,
        expr: &Expr,
        batch: &RecordBatch,
    ) -> TesseraResult<BooleanArray> {
        let result = broadcast(&self.evaluate(expr, batch)?, batch.num_rows())?;
        result
            .as_any()
            .downcast_ref::<BooleanArray>()
            .cloned()
            .ok_or_else(|| {
                TesseraError::type_error(format!(
                    "predicate must evaluate to boolean, got {}",
                    result.data_type()
                ))
            })
    }

    fn evaluate_all(&self, exprs: &[Expr], batch: &RecordBatch) -> TesseraResult<Vec<ArrayRef>> {
        exprs.iter().map(|expr| self.evaluate(expr, batch)).collect()
    }

    fn eval_column(&self, name: &str, batch: &RecordBatch) -> TesseraResult<ArrayRef> {
        batch
            .column_by_name(name)
            .cloned()
            .ok_or_else(|| TesseraError::schema_error(format!("column not found: {name}")))
    }

    fn eval_binary(
        &self,
        left: &ArrayRef,
        op: BinaryOp,
        right: &ArrayRef,
    ) -> TesseraResult<ArrayRef> {
        let (left, right) = coerce_pair(left, right)?;
        match op {
            BinaryOp::Add => datum_kernel(&left, &right, numeric::add),
            BinaryOp::Subtract => datum_kernel(&left, &right, numeric::sub),
            BinaryOp::Multiply => datum_kernel(&left, &right, numeric::mul),
            BinaryOp::Divide => datum_kernel(&left, &right, numeric::div),
            BinaryOp::Modulo => datum_kernel(&left, &right, numeric::rem),
            BinaryOp::Power => {
                let base = downcast::<Float64Array>(&cast(&left, &ArrowDataType::Float64)?)?;
                let exponent = downcast::<Float64Array>(&cast(&right, &ArrowDataType::Float64)?)?;
                let rows = base.len().max(exponent.len());
                let (base, exponent) = (broadcast_f64(&base, rows)?, broadcast_f64(&exponent, rows)?);
                let result: Float64Array = base
                    .iter()
                    .zip(exponent.iter())
                    .map(|(b, e)| Some(b?.powf(e?)))
                    .collect();
                Ok(Arc::new(result))
            }
            BinaryOp::Eq => bool_kernel(&left, &right, cmp::eq),
            BinaryOp::NotEq => bool_kernel(&left, &right, cmp::neq),
            BinaryOp::Lt => bool_kernel(&left, &right, cmp::lt),
            BinaryOp::LtEq => bool_kernel(&left, &right, cmp::lt_eq),
            BinaryOp::Gt => bool_kernel(&left, &right, cmp::gt),
            BinaryOp::GtEq => bool_kernel(&left, &right, cmp::gt_eq),
            BinaryOp::And | BinaryOp::Or | BinaryOp::Xor => {
                let rows = left.len().max(right.len());
                let left = downcast::<BooleanArray>(&broadcast(&left, rows)?)?;
                let right = downcast::<BooleanArray>(&broadcast(&right, rows)?)?;
                let result = match op {
                    BinaryOp::And => boolean::and_kleene(&left, &right)?,
                    BinaryOp::Or => boolean::or_kleene(&left, &right)?,
                    _ => cmp::neq(&left, &right)?,
                };
                Ok(Arc::new(result))
            }
            BinaryOp::BitAnd
            | BinaryOp::BitOr
            | BinaryOp::BitXor
            | BinaryOp::ShiftLeft
            | BinaryOp::ShiftRight => {
                let rows = left.len().max(right.len());
                let left = int64s(&broadcast(&left, rows)?)?;
                let right = int64s(&broadcast(&right, rows)?)?;
                let result = match op {
                    BinaryOp::BitAnd => bitwise::bitwise_and(&left, &right)?,
                    BinaryOp::BitOr => bitwise::bitwise_or(&left, &right)?,
                    BinaryOp::BitXor => bitwise::bitwise_xor(&left, &right)?,
                    BinaryOp::ShiftLeft => bitwise::bitwise_shift_left(&left, &right)?,
                    _ => bitwise::bitwise_shift_right(&left, &right)?,
                };
                Ok(Arc::new(result))
            }
        }
    }

    fn eval_unary(&self, op: UnaryOp, array: &ArrayRef) -> TesseraResult<ArrayRef> {
        match op {
            UnaryOp::Negate => Ok(numeric::neg(array.as_ref())?),
            UnaryOp::Not => Ok(Arc::new(boolean::not(&downcast::<BooleanArray>(array)?)?)),
            UnaryOp::BitNot => Ok(Arc::new(bitwise::bitwise_not(&int64s(array)?)?)),
            UnaryOp::IsNull => Ok(Arc::new(compute::is_null(array.as_ref())?)),
            UnaryOp::IsNotNull => Ok(Arc::new(compute::is_not_null(array.as_ref())?)),
            UnaryOp::IsNan => float_predicate(array, f64::is_nan),
            UnaryOp::IsInfinite => float_predicate(array, f64::is_infinite),
            UnaryOp::Abs => {
                // Integers keep their type; everything else goes through floats.
                if matches!(array.data_type(), ArrowDataType::Int32 | ArrowDataType::Int64) {
                    let ints = int64s(array)?;
                    let result: Int64Array = ints.iter().map(|v| v.map(i64::wrapping_abs)).collect();
                    Ok(cast(&(Arc::new(result) as ArrayRef), array.data_type())?)
                } else {
                    float_map(array, f64::abs)
                }
            }
            UnaryOp::Sign => {
                let result = float_map(array, |v| if v == 0.0 { 0.0 } else { v.signum() })?;
                Ok(cast(&result, array.data_type())?)
            }
            UnaryOp::Ceil => float_map(array, f64::ceil),
            UnaryOp::Floor => float_map(array, f64::floor),
            UnaryOp::Round => float_map(array, f64::round),
            UnaryOp::Exp => float_map(array, f64::exp),
            UnaryOp::Ln => float_map(array, f64::ln),
            UnaryOp::Log2 => float_map(array, f64::log2),
            UnaryOp::Log10 => float_map(array, f64::log10),
            UnaryOp::Sqrt => float_map(array, f64::sqrt),
            UnaryOp::Acos => float_map(array, f64::acos),
            UnaryOp::Asin => float_map(array, f64::asin),
            UnaryOp::Atan => float_map(array, f64::atan),
            UnaryOp::Cos => float_map(array, f64::cos),
            UnaryOp::Sin => float_map(array, f64::sin),
            UnaryOp::Tan => float_map(array, f64::tan),
        }
    }

    /// Pick `then` where the mask holds and `otherwise` elsewhere; null mask
    /// entries select `otherwise`.
    fn eval_when(
        &self,
        mask: &BooleanArray,
        then: &ArrayRef,
        otherwise: &ArrayRef,
    ) -> TesseraResult<ArrayRef> {
        let rows = mask.len().max(then.len()).max(otherwise.len());
        let mask = if mask.len() == rows {
            mask.clone()
        } else {
            downcast::<BooleanArray>(&broadcast(&(Arc::new(mask.clone()) as ArrayRef), rows)?)?
        };
        let (then, otherwise) = coerce_pair(then, otherwise)?;
        let then = broadcast(&then, rows)?;
        let otherwise = broadcast(&otherwise, rows)?;
        Ok(zip(&mask, &then, &otherwise)?)
    }

    fn eval_in_list(
        &self,
        array: &ArrayRef,
        list: &[Expr],
        batch: &RecordBatch,
    ) -> TesseraResult<ArrayRef> {
        let mut result: Option<ArrayRef> = None;
        for item in list {
            let value = self.evaluate(item, batch)?;
            let matches = self.eval_binary(array, BinaryOp::Eq, &value)?;
            result = Some(match result {
                Some(acc) => self.eval_binary(&acc, BinaryOp::Or, &matches)?,
                None => matches,
            });
        }
        match result {
            Some(result) => Ok(result),
            None => Ok(Arc::new(BooleanArray::from(vec![false; array.len()]))),
        }
    }

    /// Elementwise min or max across expressions, skipping nulls.
    fn eval_horizontal(
        &self,
        items: &[Expr],
        batch: &RecordBatch,
        keep_left: BinaryOp,
    ) -> TesseraResult<ArrayRef> {
        let mut arrays = self.evaluate_all(items, batch)?.into_iter();
        let mut result = arrays
            .next()
            .ok_or_else(|| TesseraError::execution("horizontal reduction of nothing"))?;
        for array in arrays {
            let (current, next) = coerce_pair(&result, &array)?;
            let better = self.eval_binary(&current, keep_left, &next)?;
            let better = downcast::<BooleanArray>(&better)?;
            let current_valid = compute::is_not_null(current.as_ref())?;
            let next_null = compute::is_null(next.as_ref())?;
            let keep = boolean::and(&current_valid, &boolean::or(&next_null, &fill_false(&better))?)?;
            result = self.eval_when(&keep, &current, &next)?;
        }
        Ok(result)
    }
}

fn downcast<T: Array + Clone + 'static>(array: &ArrayRef) -> TesseraResult<T> {
    array.as_any().downcast_ref::<T>().cloned().ok_or_else(|| {
        TesseraError::type_error(format!("unexpected array type {}", array.data_type()))
    })
}

fn int64s(array: &ArrayRef) -> TesseraResult<Int64Array> {
    downcast::<Int64Array>(&cast(array, &ArrowDataType::Int64)?)
}

fn fill_false(mask: &BooleanArray) -> BooleanArray {
    mask.iter().map(|v| Some(v.unwrap_or(false))).collect()
}

fn float_map<F: Fn(f64) -> f64>(array: &ArrayRef, f: F) -> TesseraResult<ArrayRef> {
    let floats = downcast::<Float64Array>(&cast(array, &ArrowDataType::Float64)?)?;
    let result: Float64Array = floats.iter().map(|v| v.map(&f)).collect();
    Ok(Arc::new(result))
}

fn float_predicate<F: Fn(f64) -> bool>(array: &ArrayRef, f: F) -> TesseraResult<ArrayRef> {
    let floats = downcast::<Float64Array>(&cast(array, &ArrowDataType::Float64)?)?;
    let result: BooleanArray = floats.iter().map(|v| v.map(&f)).collect();
    Ok(Arc::new(result))
}

fn broadcast_f64(array: &Float64Array, rows: usize) -> TesseraResult<Float64Array> {
    downcast::<Float64Array>(&broadcast(&(Arc::new(array.clone()) as ArrayRef), rows)?)
}

/// Repeat a single-row array to `rows` rows; other lengths must already match.
pub(crate) fn broadcast(array: &ArrayRef, rows: usize) -> TesseraResult<ArrayRef> {
    match array.len() {
        n if n == rows => Ok(Arc::clone(array)),
        1 => {
            let indices = UInt32Array::from(vec![0u32; rows]);
            Ok(compute::take(array.as_ref(), &indices, None)?)
        }
        n => Err(TesseraError::execution(format!(
            "cannot combine columns of {n} and {rows} rows"
        ))),
    }
}

/// Bring two operands to a common physical type.
fn coerce_pair(left: &ArrayRef, right: &ArrayRef) -> TesseraResult<(ArrayRef, ArrayRef)> {
    let (lt, rt) = (left.data_type(), right.data_type());
    if lt == rt {
        return Ok((Arc::clone(left), Arc::clone(right)));
    }
    let target = match (lt, rt) {
        (ArrowDataType::Null, other) | (other, ArrowDataType::Null) => other.clone(),
        (ArrowDataType::Float64, _) | (_, ArrowDataType::Float64) => ArrowDataType::Float64,
        (ArrowDataType::Int32, ArrowDataType::Int64) | (ArrowDataType::Int64, ArrowDataType::Int32) => {
            ArrowDataType::Int64
        }
        (ArrowDataType::Timestamp(..), ArrowDataType::Date32) => lt.clone(),
        (ArrowDataType::Date32, ArrowDataType::Timestamp(..)) => rt.clone(),
        (ArrowDataType::Utf8, temporal) | (temporal, ArrowDataType::Utf8)
            if temporal.is_temporal() =>
        {
            temporal.clone()
        }
        _ => {
            return Err(TesseraError::type_error(format!(
                "incompatible operand types {lt} and {rt}"
            )))
        }
    };
    let left = if lt == &target { Arc::clone(left) } else { cast(left, &target)? };
    let right = if rt == &target { Arc::clone(right) } else { cast(right, &target)? };
    Ok((left, right))
}

/// Wrap single-row operands as scalars so arrow broadcasts them.
fn with_datums<T>(
    left: &ArrayRef,
    right: &ArrayRef,
    kernel: impl Fn(&dyn Datum, &dyn Datum) -> Result<T, ArrowError>,
) -> TesseraResult<T> {
    let result = match (left.len(), right.len()) {
        (l, r) if l == r => kernel(left, right),
        (1, _) => kernel(&Scalar::new(Arc::clone(left)), right),
        (_, 1) => kernel(left, &Scalar::new(Arc::clone(right))),
        (l, r) => {
            return Err(TesseraError::execution(format!(
                "cannot combine columns of {l} and {r} rows"
            )))
        }
    };
    Ok(result?)
}

fn datum_kernel(
    left: &ArrayRef,
    right: &ArrayRef,
    kernel: fn(&dyn Datum, &dyn Datum) -> Result<ArrayRef, ArrowError>,
) -> TesseraResult<ArrayRef> {
    with_datums(left, right, kernel)
}

fn bool_kernel(
    left: &ArrayRef,
    right: &ArrayRef,
    kernel: fn(&dyn Datum, &dyn Datum) -> Result<BooleanArray, ArrowError>,
) -> TesseraResult<ArrayRef> {
    let result = with_datums(left, right, kernel)?;
    Ok(Arc::new(result))
}
