//! Reduction accumulators.

use std::collections::HashSet;
use std::sync::Arc;

use arrow::array::{
    new_empty_array, new_null_array, Array, ArrayRef, Float64Array, Int64Array, ListArray,
};
use arrow::buffer::OffsetBuffer;
use arrow::compute::{cast, concat, filter, is_not_null, sort_to_indices, take, SortOptions};
use arrow::datatypes::{DataType as ArrowDataType, Field};
use arrow::row::{OwnedRow, RowConverter, SortField};

use common_error::{TesseraError, TesseraResult};

use crate::expr::AggFunc;

/// Running state of one reduction over one group.
pub(crate) trait Accumulator {
    /// Update the accumulator with new values.
    fn update(&mut self, values: &ArrayRef) -> TesseraResult<()>;

    /// Single-row result.
    fn finalize(&self) -> TesseraResult<ArrayRef>;
}

/// Pick the accumulator for `func` over values of type `input`.
pub(crate) fn accumulator_for(
    func: AggFunc,
    input: &ArrowDataType,
) -> TesseraResult<Box<dyn Accumulator>> {
    Ok(match func {
        AggFunc::Count => Box::new(CountAccumulator::default()),
        AggFunc::CountDistinct => Box::new(DistinctCountAccumulator::new(input)?),
        AggFunc::Sum if input == &ArrowDataType::Float64 => {
            Box::new(SumFloat64Accumulator::default())
        }
        AggFunc::Sum => Box::new(SumInt64Accumulator::default()),
        AggFunc::Mean => Box::new(MeanAccumulator::default()),
        AggFunc::Min => Box::new(ExtremeAccumulator::new(input, false)),
        AggFunc::Max => Box::new(ExtremeAccumulator::new(input, true)),
        AggFunc::Median => Box::new(MedianAccumulator::default()),
        AggFunc::Std(ddof) => Box::new(MomentAccumulator::new(ddof, true)),
        AggFunc::Var(ddof) => Box::new(MomentAccumulator::new(ddof, false)),
        AggFunc::Collect => Box::new(CollectAccumulator::new(input)),
    })
}

fn floats(values: &ArrayRef) -> TesseraResult<Float64Array> {
    cast(values, &ArrowDataType::Float64)?
        .as_any()
        .downcast_ref::<Float64Array>()
        .cloned()
        .ok_or_else(|| TesseraError::type_error("expected numeric input"))
}

fn single_f64(value: Option<f64>) -> ArrayRef {
    Arc::new(Float64Array::from(vec![value]))
}

#[derive(Debug, Default)]
struct CountAccumulator {
    count: usize,
}

impl Accumulator for CountAccumulator {
    fn update(&mut self, values: &ArrayRef) -> TesseraResult<()> {
        self.count += values.len() - values.null_count();
        Ok(())
    }

    fn finalize(&self) -> TesseraResult<ArrayRef> {
        Ok(Arc::new(Int64Array::from(vec![self.count as i64])))
    }
}

/// Counts distinct non-null values by their row encoding.
struct DistinctCountAccumulator {
    converter: RowConverter,
    seen: HashSet<OwnedRow>,
}

impl DistinctCountAccumulator {
    fn new(input: &ArrowDataType) -> TesseraResult<Self> {
        Ok(Self {
            converter: RowConverter::new(vec![SortField::new(input.clone())])?,
            seen: HashSet::new(),
        })
    }
}

impl Accumulator for DistinctCountAccumulator {
    fn update(&mut self, values: &ArrayRef) -> TesseraResult<()> {
        let rows = self.converter.convert_columns(&[Arc::clone(values)])?;
        for i in 0..values.len() {
            if values.is_valid(i) {
                self.seen.insert(rows.row(i).owned());
            }
        }
        Ok(())
    }

    fn finalize(&self) -> TesseraResult<ArrayRef> {
        Ok(Arc::new(Int64Array::from(vec![self.seen.len() as i64])))
    }
}

#[derive(Debug, Default)]
struct SumInt64Accumulator {
    sum: i64,
    count: usize,
}

impl Accumulator for SumInt64Accumulator {
    fn update(&mut self, values: &ArrayRef) -> TesseraResult<()> {
        let values = cast(values, &ArrowDataType::Int64)?;
        let ints = values
            .as_any()
            .downcast_ref::<Int64Array>()
            .ok_or_else(|| TesseraError::type_error("SUM requires numeric input"))?;
        for value in ints.iter().flatten() {
            self.sum = self.sum.wrapping_add(value);
            self.count += 1;
        }
        Ok(())
    }

    fn finalize(&self) -> TesseraResult<ArrayRef> {
        let sum = (self.count > 0).then_some(self.sum);
        Ok(Arc::new(Int64Array::from(vec![sum])))
    }
}

#[derive(Debug, Default)]
struct SumFloat64Accumulator {
    sum: f64,
    count: usize,
}

impl Accumulator for SumFloat64Accumulator {
    fn update(&mut self, values: &ArrayRef) -> TesseraResult<()> {
        for value in floats(values)?.iter().flatten() {
            self.sum += value;
            self.count += 1;
        }
        Ok(())
    }

    fn finalize(&self) -> TesseraResult<ArrayRef> {
        Ok(single_f64((self.count > 0).then_some(self.sum)))
    }
}

#[derive(Debug, Default)]
struct MeanAccumulator {
    sum: f64,
    count: usize,
}

impl Accumulator for MeanAccumulator {
    fn update(&mut self, values: &ArrayRef) -> TesseraResult<()> {
        for value in floats(values)?.iter().flatten() {
            self.sum += value;
            self.count += 1;
        }
        Ok(())
    }

    fn finalize(&self) -> TesseraResult<ArrayRef> {
        Ok(single_f64(
            (self.count > 0).then(|| self.sum / self.count as f64),
        ))
    }
}

/// Minimum or maximum of any orderable type.
struct ExtremeAccumulator {
    data_type: ArrowDataType,
    descending: bool,
    chunks: Vec<ArrayRef>,
}

impl ExtremeAccumulator {
    fn new(input: &ArrowDataType, descending: bool) -> Self {
        Self {
            data_type: input.clone(),
            descending,
            chunks: Vec::new(),
        }
    }
}

impl Accumulator for ExtremeAccumulator {
    fn update(&mut self, values: &ArrayRef) -> TesseraResult<()> {
        self.chunks.push(Arc::clone(values));
        Ok(())
    }

    fn finalize(&self) -> TesseraResult<ArrayRef> {
        let chunks: Vec<&dyn Array> = self.chunks.iter().map(AsRef::as_ref).collect();
        if chunks.is_empty() {
            return Ok(new_null_array(&self.data_type, 1));
        }
        let values = concat(&chunks)?;
        if values.is_empty() {
            return Ok(new_null_array(&self.data_type, 1));
        }
        let options = SortOptions {
            descending: self.descending,
            nulls_first: false,
        };
        // All-null input leaves a null in first position, which is the answer.
        let indices = sort_to_indices(values.as_ref(), Some(options), Some(1))?;
        Ok(take(values.as_ref(), &indices, None)?)
    }
}

#[derive(Debug, Default)]
struct MedianAccumulator {
    values: Vec<f64>,
}

impl Accumulator for MedianAccumulator {
    fn update(&mut self, values: &ArrayRef) -> TesseraResult<()> {
        self.values.extend(floats(values)?.iter().flatten());
        Ok(())
    }

    fn finalize(&self) -> TesseraResult<ArrayRef> {
        let mut sorted = self.values.clone();
        sorted.sort_by(f64::total_cmp);
        let n = sorted.len();
        let median = match n {
            0 => None,
            _ if n % 2 == 1 => Some(sorted[n / 2]),
            _ => Some((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0),
        };
        Ok(single_f64(median))
    }
}

/// Welford's running variance; `ddof` of 1 gives the sample estimate.
#[derive(Debug)]
struct MomentAccumulator {
    count: u64,
    mean: f64,
    m2: f64,
    ddof: u8,
    sqrt: bool,
}

impl MomentAccumulator {
    fn new(ddof: u8, sqrt: bool) -> Self {
        Self {
            count: 0,
            mean: 0.0,
            m2: 0.0,
            ddof,
            sqrt,
        }
    }
}

impl Accumulator for MomentAccumulator {
    fn update(&mut self, values: &ArrayRef) -> TesseraResult<()> {
        for value in floats(values)?.iter().flatten() {
            self.count += 1;
            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            self.m2 += delta * (value - self.mean);
        }
        Ok(())
    }

    fn finalize(&self) -> TesseraResult<ArrayRef> {
        let ddof = u64::from(self.ddof);
        if self.count <= ddof {
            return Ok(single_f64(None));
        }
        let variance = self.m2 / (self.count - ddof) as f64;
        Ok(single_f64(Some(if self.sqrt {
            variance.sqrt()
        } else {
            variance
        })))
    }
}

/// Gathers non-null values into a single list.
struct CollectAccumulator {
    data_type: ArrowDataType,
    chunks: Vec<ArrayRef>,
}

impl CollectAccumulator {
    fn new(input: &ArrowDataType) -> Self {
        Self {
            data_type: input.clone(),
            chunks: Vec::new(),
        }
    }
}

impl Accumulator for CollectAccumulator {
    fn update(&mut self, values: &ArrayRef) -> TesseraResult<()> {
        let present = is_not_null(values.as_ref())?;
        self.chunks.push(filter(values.as_ref(), &present)?);
        Ok(())
    }

    fn finalize(&self) -> TesseraResult<ArrayRef> {
        let values = if self.chunks.is_empty() {
            new_empty_array(&self.data_type)
        } else {
            let chunks: Vec<&dyn Array> = self.chunks.iter().map(AsRef::as_ref).collect();
            concat(&chunks)?
        };
        let field = Arc::new(Field::new("item", self.data_type.clone(), true));
        let offsets = OffsetBuffer::from_lengths([values.len()]);
        Ok(Arc::new(ListArray::try_new(field, offsets, values, None)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::StringArray;

    fn run(func: AggFunc, values: ArrayRef) -> ArrayRef {
        let mut acc = accumulator_for(func, values.data_type()).unwrap();
        acc.update(&values).unwrap();
        acc.finalize().unwrap()
    }

    fn f64_of(array: &ArrayRef) -> Option<f64> {
        let array = array.as_any().downcast_ref::<Float64Array>().unwrap();
        (!array.is_null(0)).then(|| array.value(0))
    }

    #[test]
    fn test_sum_and_count_skip_nulls() {
        let values: ArrayRef = Arc::new(Int64Array::from(vec![Some(1), None, Some(5)]));
        let sum = run(AggFunc::Sum, values.clone());
        assert_eq!(sum.as_any().downcast_ref::<Int64Array>().unwrap().value(0), 6);
        let count = run(AggFunc::Count, values);
        assert_eq!(count.as_any().downcast_ref::<Int64Array>().unwrap().value(0), 2);
    }

    #[test]
    fn test_empty_input_yields_null() {
        let empty: ArrayRef = Arc::new(Int64Array::from(Vec::<i64>::new()));
        assert!(run(AggFunc::Sum, empty.clone()).is_null(0));
        assert!(run(AggFunc::Max, empty.clone()).is_null(0));
        assert_eq!(f64_of(&run(AggFunc::Mean, empty)), None);
    }

    #[test]
    fn test_extremes_work_on_strings() {
        let values: ArrayRef =
            Arc::new(StringArray::from(vec![Some("pear"), None, Some("apple")]));
        let min = run(AggFunc::Min, values.clone());
        let min = min.as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(min.value(0), "apple");
        let max = run(AggFunc::Max, values);
        assert_eq!(max.as_any().downcast_ref::<StringArray>().unwrap().value(0), "pear");
    }

    #[test]
    fn test_moments_and_median() {
        let values: ArrayRef =
            Arc::new(Float64Array::from(vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]));
        let std = f64_of(&run(AggFunc::Std(0), values.clone())).unwrap();
        assert!((std - 2.0).abs() < 1e-12);
        let var = f64_of(&run(AggFunc::Var(0), values.clone())).unwrap();
        assert!((var - 4.0).abs() < 1e-12);
        assert_eq!(f64_of(&run(AggFunc::Median, values.clone())), Some(4.5));
        assert_eq!(f64_of(&run(AggFunc::Mean, values)), Some(5.0));

        let single: ArrayRef = Arc::new(Float64Array::from(vec![1.0]));
        assert_eq!(f64_of(&run(AggFunc::Std(1), single)), None);
    }

    #[test]
    fn test_distinct_count() {
        let values: ArrayRef =
            Arc::new(StringArray::from(vec![Some("a"), Some("b"), Some("a"), None]));
        let count = run(AggFunc::CountDistinct, values);
        assert_eq!(count.as_any().downcast_ref::<Int64Array>().unwrap().value(0), 2);
    }

    #[test]
    fn test_collect_gathers_non_null_values() {
        let mut acc = accumulator_for(AggFunc::Collect, &ArrowDataType::Int64).unwrap();
        acc.update(&(Arc::new(Int64Array::from(vec![Some(3), None])) as ArrayRef)).unwrap();
        acc.update(&(Arc::new(Int64Array::from(vec![Some(1)])) as ArrayRef)).unwrap();
        let out = acc.finalize().unwrap();
        let list = out.as_any().downcast_ref::<ListArray>().unwrap();
        assert_eq!(list.len(), 1);
        let items = list.value(0);
        let items = items.as_any().downcast_ref::<Int64Array>().unwrap();
        assert_eq!(items.values(), &[3, 1]);

        let empty: ArrayRef = Arc::new(Int64Array::from(Vec::<i64>::new()));
        let none = run(AggFunc::Collect, empty);
        let none = none.as_any().downcast_ref::<ListArray>().unwrap();
        assert_eq!(none.value_length(0), 0);
    }
}
