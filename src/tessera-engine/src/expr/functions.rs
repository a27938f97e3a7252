//! Elementwise functions with constant parameters.
//!
//! Parameters that shape the computation (patterns, widths, formats) are
//! plain values rather than expressions; the compiler only builds these
//! from literal IR fields.

use std::fmt::Write as _;
use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, BooleanArray, Float64Array, Int32Array, Int64Array, ListBuilder,
    StringArray, StringBuilder,
};
use arrow::compute::{binary, cast};
use arrow::compute::kernels::temporal::{date_part, DatePart};
use arrow::datatypes::{DataType as ArrowDataType, TimeUnit as ArrowTimeUnit};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveDateTime, Timelike};
use regex::Regex;

use common_error::{TesseraError, TesseraResult};

use super::lists;

/// Calendar and clock fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemporalField {
    Year,
    Quarter,
    Month,
    Week,
    DayOfYear,
    Day,
    Hour,
    Minute,
    Second,
    Millisecond,
    /// Day of the week, Monday = 0.
    Weekday,
}

impl TemporalField {
    fn date_part(self) -> DatePart {
        match self {
            Self::Year => DatePart::Year,
            Self::Quarter => DatePart::Quarter,
            Self::Month => DatePart::Month,
            Self::Week => DatePart::Week,
            Self::DayOfYear => DatePart::DayOfYear,
            Self::Day => DatePart::Day,
            Self::Hour => DatePart::Hour,
            Self::Minute => DatePart::Minute,
            Self::Second => DatePart::Second,
            Self::Millisecond => DatePart::Millisecond,
            Self::Weekday => DatePart::DayOfWeekMonday0,
        }
    }
}

/// An elementwise function.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Function {
    Lowercase,
    Uppercase,
    Strip,
    LStrip,
    RStrip,
    Capitalize,
    Reverse,
    /// Length in characters.
    Length,
    /// Characters from `start` (negative counts from the end).
    Slice { start: i64, length: Option<i64> },
    /// Last `n` characters.
    Tail(usize),
    /// Zero-based character position of `needle` at or after `start`, -1 when absent.
    Find { needle: String, start: usize },
    /// Zero-based position in `values`, -1 when absent.
    FindInSet(Vec<String>),
    Contains(String),
    StartsWith(String),
    EndsWith(String),
    Replace { pattern: String, replacement: String },
    RegexMatch(String),
    RegexExtract { pattern: String, group: usize },
    RegexReplace { pattern: String, replacement: String },
    Split(String),
    PadStart { width: usize, fill: String },
    PadEnd { width: usize, fill: String },
    Repeat(usize),
    /// Join all arguments with `separator`; null if any argument is null.
    Concat { separator: String },
    Temporal(TemporalField),
    EpochSeconds,
    Strftime(String),
    /// Parse strings into nanosecond timestamps.
    Strptime(String),
    /// Truncate to a unit code (`Y`, `Q`, `M`, `W`, `D`, `h`, `m`, `s`, `ms`, `us`).
    Truncate(String),
    /// Build dates from year, month and day arguments.
    DateFromParts,
    /// Build second timestamps from year, month, day, hour, minute and second.
    TimestampFromParts,
    /// Four-quadrant arctangent of the first argument over the second.
    Atan2,
    /// Number of elements of each list.
    ListLength,
    /// Elementwise concatenation of two lists of the same type.
    ListConcat,
    /// One list per row holding every argument's value, in order.
    ListFromColumns,
}

impl Function {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Lowercase => "to_lowercase",
            Self::Uppercase => "to_uppercase",
            Self::Strip => "strip_chars",
            Self::LStrip => "strip_chars_start",
            Self::RStrip => "strip_chars_end",
            Self::Capitalize => "capitalize",
            Self::Reverse => "reverse",
            Self::Length => "len_chars",
            Self::Slice { .. } => "slice",
            Self::Tail(_) => "tail",
            Self::Find { .. } => "find",
            Self::FindInSet(_) => "find_in_set",
            Self::Contains(_) => "contains",
            Self::StartsWith(_) => "starts_with",
            Self::EndsWith(_) => "ends_with",
            Self::Replace { .. } => "replace",
            Self::RegexMatch(_) => "regex_match",
            Self::RegexExtract { .. } => "extract",
            Self::RegexReplace { .. } => "replace_all",
            Self::Split(_) => "split",
            Self::PadStart { .. } => "pad_start",
            Self::PadEnd { .. } => "pad_end",
            Self::Repeat(_) => "repeat",
            Self::Concat { .. } => "concat_str",
            Self::Temporal(_) => "date_part",
            Self::EpochSeconds => "epoch",
            Self::Strftime(_) => "strftime",
            Self::Strptime(_) => "strptime",
            Self::Truncate(_) => "truncate",
            Self::DateFromParts => "date",
            Self::TimestampFromParts => "datetime",
            Self::Atan2 => "arctan2",
            Self::ListLength => "list.len",
            Self::ListConcat => "list.concat",
            Self::ListFromColumns => "concat_list",
        }
    }

    /// Apply the function to already evaluated arguments of equal length.
    pub(crate) fn apply(&self, args: &[ArrayRef]) -> TesseraResult<ArrayRef> {
        match self {
            Self::Concat { separator } => return concat(args, separator),
            Self::DateFromParts => return date_from_parts(args),
            Self::TimestampFromParts => return timestamp_from_parts(args),
            Self::Atan2 => return atan2(args),
            Self::ListConcat => return lists::concat(args),
            Self::ListFromColumns => return lists::from_columns(args),
            _ => {}
        }
        let [arg] = args else {
            return Err(TesseraError::execution(format!(
                "{} expects one argument, got {}",
                self.name(),
                args.len()
            )));
        };

        match self {
            Self::Lowercase => map_string(arg, |s| Some(s.to_lowercase())),
            Self::Uppercase => map_string(arg, |s| Some(s.to_uppercase())),
            Self::Strip => map_string(arg, |s| Some(s.trim().to_string())),
            Self::LStrip => map_string(arg, |s| Some(s.trim_start().to_string())),
            Self::RStrip => map_string(arg, |s| Some(s.trim_end().to_string())),
            Self::Capitalize => map_string(arg, |s| Some(capitalize(s))),
            Self::Reverse => map_string(arg, |s| Some(s.chars().rev().collect())),
            Self::Length => {
                let values = map_values(arg, |s| i32::try_from(s.chars().count()).ok())?;
                Ok(Arc::new(Int32Array::from(values)))
            }
            Self::Slice { start, length } => {
                map_string(arg, |s| Some(slice_chars(s, *start, *length)))
            }
            Self::Tail(n) => map_string(arg, |s| {
                let count = s.chars().count();
                Some(s.chars().skip(count.saturating_sub(*n)).collect())
            }),
            Self::Find { needle, start } => {
                let values = map_values(arg, |s| Some(find_chars(s, needle, *start)))?;
                Ok(Arc::new(Int64Array::from(values)))
            }
            Self::FindInSet(values) => {
                let positions = map_values(arg, |s| {
                    Some(
                        values
                            .iter()
                            .position(|v| v == s)
                            .map_or(-1, |p| p as i64),
                    )
                })?;
                Ok(Arc::new(Int64Array::from(positions)))
            }
            Self::Contains(needle) => map_bool(arg, |s| s.contains(needle.as_str())),
            Self::StartsWith(prefix) => map_bool(arg, |s| s.starts_with(prefix.as_str())),
            Self::EndsWith(suffix) => map_bool(arg, |s| s.ends_with(suffix.as_str())),
            Self::Replace {
                pattern,
                replacement,
            } => map_string(arg, |s| Some(s.replace(pattern.as_str(), replacement))),
            Self::RegexMatch(pattern) => {
                let regex = compile(pattern)?;
                map_bool(arg, |s| regex.is_match(s))
            }
            Self::RegexExtract { pattern, group } => {
                let regex = compile(pattern)?;
                map_string(arg, |s| {
                    regex
                        .captures(s)
                        .and_then(|caps| caps.get(*group))
                        .map(|m| m.as_str().to_string())
                })
            }
            Self::RegexReplace {
                pattern,
                replacement,
            } => {
                let regex = compile(pattern)?;
                map_string(arg, |s| {
                    Some(regex.replace_all(s, replacement.as_str()).into_owned())
                })
            }
            Self::Split(delimiter) => split(arg, delimiter),
            Self::PadStart { width, fill } => map_string(arg, |s| Some(pad(s, *width, fill, true))),
            Self::PadEnd { width, fill } => map_string(arg, |s| Some(pad(s, *width, fill, false))),
            Self::Repeat(times) => {
                let values = strings(arg)?
                    .iter()
                    .map(|v| v.map(|s| repeat(s, *times)).transpose())
                    .collect::<TesseraResult<Vec<_>>>()?;
                Ok(Arc::new(StringArray::from(values)))
            }
            Self::Temporal(field) => Ok(date_part(arg.as_ref(), field.date_part())?),
            Self::EpochSeconds => {
                let seconds = cast(arg, &ArrowDataType::Timestamp(ArrowTimeUnit::Second, None))?;
                Ok(cast(&seconds, &ArrowDataType::Int64)?)
            }
            Self::Strftime(format) => strftime(arg, format),
            Self::Strptime(format) => strptime(arg, format),
            Self::Truncate(unit) => truncate(arg, unit),
            Self::ListLength => lists::length(arg),
            Self::Concat { .. }
            | Self::DateFromParts
            | Self::TimestampFromParts
            | Self::Atan2
            | Self::ListConcat
            | Self::ListFromColumns => Err(TesseraError::internal(
                "variadic function reached the unary path",
            )),
        }
    }
}

fn strings(array: &ArrayRef) -> TesseraResult<StringArray> {
    let array = cast(array, &ArrowDataType::Utf8)?;
    array
        .as_any()
        .downcast_ref::<StringArray>()
        .cloned()
        .ok_or_else(|| TesseraError::type_error("expected a string array"))
}

fn map_values<T, F>(array: &ArrayRef, mut f: F) -> TesseraResult<Vec<Option<T>>>
where
    F: FnMut(&str) -> Option<T>,
{
    Ok(strings(array)?.iter().map(|v| v.and_then(&mut f)).collect())
}

fn map_string<F>(array: &ArrayRef, f: F) -> TesseraResult<ArrayRef>
where
    F: FnMut(&str) -> Option<String>,
{
    Ok(Arc::new(StringArray::from(map_values(array, f)?)))
}

fn map_bool<F>(array: &ArrayRef, mut f: F) -> TesseraResult<ArrayRef>
where
    F: FnMut(&str) -> bool,
{
    let values = map_values(array, |s| Some(f(s)))?;
    Ok(Arc::new(BooleanArray::from(values)))
}

fn compile(pattern: &str) -> TesseraResult<Regex> {
    Regex::new(pattern)
        .map_err(|e| TesseraError::value_error(format!("invalid regex {pattern:?}: {e}")))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

fn slice_chars(s: &str, start: i64, length: Option<i64>) -> String {
    let count = s.chars().count() as i64;
    let begin = if start < 0 {
        count.saturating_add(start).max(0)
    } else {
        start.min(count)
    };
    let end = length.map_or(count, |len| begin.saturating_add(len.max(0)).min(count));
    s.chars()
        .skip(begin as usize)
        .take((end - begin).max(0) as usize)
        .collect()
}

fn find_chars(s: &str, needle: &str, start: usize) -> i64 {
    let Some((offset, _)) = s.char_indices().nth(start).or_else(|| {
        // Searching from the very end only matches the empty needle.
        (s.chars().count() == start).then_some((s.len(), ' '))
    }) else {
        return -1;
    };
    s[offset..]
        .find(needle)
        .map_or(-1, |byte| (start + s[offset..offset + byte].chars().count()) as i64)
}

fn repeat(s: &str, times: usize) -> TesseraResult<String> {
    if s.len().checked_mul(times).is_none() {
        return Err(TesseraError::execution(format!(
            "repeating {} bytes {times} times overflows",
            s.len()
        )));
    }
    Ok(s.repeat(times))
}

fn pad(s: &str, width: usize, fill: &str, at_start: bool) -> String {
    let count = s.chars().count();
    if count >= width || fill.is_empty() {
        return s.to_string();
    }
    let padding: String = fill.chars().cycle().take(width - count).collect();
    if at_start {
        padding + s
    } else {
        format!("{s}{padding}")
    }
}

fn split(array: &ArrayRef, delimiter: &str) -> TesseraResult<ArrayRef> {
    let mut builder = ListBuilder::new(StringBuilder::new());
    for value in strings(array)?.iter() {
        match value {
            Some(s) => {
                for part in s.split(delimiter) {
                    builder.values().append_value(part);
                }
                builder.append(true);
            }
            None => builder.append(false),
        }
    }
    Ok(Arc::new(builder.finish()))
}

fn concat(args: &[ArrayRef], separator: &str) -> TesseraResult<ArrayRef> {
    let columns = args.iter().map(strings).collect::<TesseraResult<Vec<_>>>()?;
    let rows = columns.first().map_or(0, Array::len);
    let values: Vec<Option<String>> = (0..rows)
        .map(|row| {
            columns
                .iter()
                .map(|column| (!column.is_null(row)).then(|| column.value(row)))
                .collect::<Option<Vec<_>>>()
                .map(|parts| parts.join(separator))
        })
        .collect();
    Ok(Arc::new(StringArray::from(values)))
}

fn int64s(array: &ArrayRef) -> TesseraResult<Int64Array> {
    let array = cast(array, &ArrowDataType::Int64)?;
    array
        .as_any()
        .downcast_ref::<Int64Array>()
        .cloned()
        .ok_or_else(|| TesseraError::type_error("expected an integer array"))
}

fn date_from_parts(args: &[ArrayRef]) -> TesseraResult<ArrayRef> {
    let [year, month, day] = args else {
        return Err(TesseraError::execution("date expects year, month and day"));
    };
    let (year, month, day) = (int64s(year)?, int64s(month)?, int64s(day)?);
    let dates: Vec<Option<NaiveDateTime>> = (0..year.len())
        .map(|row| {
            if year.is_null(row) || month.is_null(row) || day.is_null(row) {
                return None;
            }
            NaiveDate::from_ymd_opt(
                i32::try_from(year.value(row)).ok()?,
                u32::try_from(month.value(row)).ok()?,
                u32::try_from(day.value(row)).ok()?,
            )
            .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .collect();
    from_naive(dates, &ArrowDataType::Date32)
}

fn timestamp_from_parts(args: &[ArrayRef]) -> TesseraResult<ArrayRef> {
    if args.len() != 6 {
        return Err(TesseraError::execution(
            "datetime expects year, month, day, hour, minute and second",
        ));
    }
    let parts = args.iter().map(int64s).collect::<TesseraResult<Vec<_>>>()?;
    let rows = parts.first().map_or(0, Array::len);
    let stamps: Vec<Option<NaiveDateTime>> = (0..rows)
        .map(|row| {
            let values = parts
                .iter()
                .map(|part| (!part.is_null(row)).then(|| part.value(row)))
                .collect::<Option<Vec<_>>>()?;
            let [year, month, day, hour, minute, second] = values[..] else {
                return None;
            };
            let clock = |v: i64| u32::try_from(v).ok();
            NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, clock(month)?, clock(day)?)?
                .and_hms_opt(clock(hour)?, clock(minute)?, clock(second)?)
        })
        .collect();
    from_naive(stamps, &ArrowDataType::Timestamp(ArrowTimeUnit::Second, None))
}

fn atan2(args: &[ArrayRef]) -> TesseraResult<ArrayRef> {
    let [y, x] = args else {
        return Err(TesseraError::execution("arctan2 expects two arguments"));
    };
    let floats = |array: &ArrayRef| -> TesseraResult<Float64Array> {
        cast(array, &ArrowDataType::Float64)?
            .as_any()
            .downcast_ref::<Float64Array>()
            .cloned()
            .ok_or_else(|| TesseraError::type_error("arctan2 expects numeric arguments"))
    };
    let angles: Float64Array = binary(&floats(y)?, &floats(x)?, f64::atan2)?;
    Ok(Arc::new(angles))
}

/// Decode a date or timestamp array into naive datetimes.
fn to_naive(array: &ArrayRef) -> TesseraResult<Vec<Option<NaiveDateTime>>> {
    match array.data_type() {
        ArrowDataType::Date32 => {
            let days = cast(array, &ArrowDataType::Int32)?;
            let days = days
                .as_any()
                .downcast_ref::<Int32Array>()
                .ok_or_else(|| TesseraError::type_error("expected a date array"))?;
            Ok(days
                .iter()
                .map(|d| {
                    d.and_then(|d| DateTime::from_timestamp(i64::from(d) * 86_400, 0))
                        .map(|dt| dt.naive_utc())
                })
                .collect())
        }
        ArrowDataType::Timestamp(unit, _) => {
            let scale = unit_nanos(unit);
            Ok(int64s(array)?
                .iter()
                .map(|v| {
                    v.and_then(|v| v.checked_mul(scale))
                        .map(|nanos| DateTime::from_timestamp_nanos(nanos).naive_utc())
                })
                .collect())
        }
        other => Err(TesseraError::type_error(format!(
            "expected a temporal array, got {other}"
        ))),
    }
}

/// Encode naive datetimes back into an array of `target` type.
fn from_naive(
    values: Vec<Option<NaiveDateTime>>,
    target: &ArrowDataType,
) -> TesseraResult<ArrayRef> {
    match target {
        ArrowDataType::Date32 => {
            let days: Int32Array = values
                .into_iter()
                .map(|v| {
                    v.and_then(|dt| i32::try_from(dt.and_utc().timestamp().div_euclid(86_400)).ok())
                })
                .collect();
            Ok(cast(&(Arc::new(days) as ArrayRef), target)?)
        }
        ArrowDataType::Timestamp(unit, _) => {
            let scale = unit_nanos(unit);
            let counts: Int64Array = values
                .into_iter()
                .map(|v| v.and_then(|dt| dt.and_utc().timestamp_nanos_opt()).map(|n| n / scale))
                .collect();
            Ok(cast(&(Arc::new(counts) as ArrayRef), target)?)
        }
        other => Err(TesseraError::type_error(format!(
            "cannot build temporal values of type {other}"
        ))),
    }
}

fn unit_nanos(unit: &ArrowTimeUnit) -> i64 {
    match unit {
        ArrowTimeUnit::Second => 1_000_000_000,
        ArrowTimeUnit::Millisecond => 1_000_000,
        ArrowTimeUnit::Microsecond => 1_000,
        ArrowTimeUnit::Nanosecond => 1,
    }
}

fn strftime(array: &ArrayRef, format: &str) -> TesseraResult<ArrayRef> {
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(TesseraError::value_error(format!(
            "invalid format string {format:?}"
        )));
    }
    let values = to_naive(array)?
        .into_iter()
        .map(|v| {
            v.map(|dt| {
                let mut out = String::new();
                // Items were validated above, so formatting cannot fail.
                let _ = write!(out, "{}", dt.format(format));
                out
            })
        })
        .collect::<Vec<_>>();
    Ok(Arc::new(StringArray::from(values)))
}

fn strptime(array: &ArrayRef, format: &str) -> TesseraResult<ArrayRef> {
    let values = map_values(array, |s| {
        NaiveDateTime::parse_from_str(s, format)
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(s, format)
                    .ok()
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
            })
    })?;
    from_naive(
        values,
        &ArrowDataType::Timestamp(ArrowTimeUnit::Nanosecond, None),
    )
}

fn truncate(array: &ArrayRef, unit: &str) -> TesseraResult<ArrayRef> {
    let values = to_naive(array)?
        .into_iter()
        .map(|v| match v {
            Some(dt) => truncate_one(dt, unit).map(Some),
            None => Ok(None),
        })
        .collect::<TesseraResult<Vec<_>>>()?;
    from_naive(values, array.data_type())
}

fn truncate_one(dt: NaiveDateTime, unit: &str) -> TesseraResult<NaiveDateTime> {
    let date = dt.date();
    let truncated = match unit {
        "Y" => NaiveDate::from_ymd_opt(date.year(), 1, 1).and_then(|d| d.and_hms_opt(0, 0, 0)),
        "Q" => NaiveDate::from_ymd_opt(date.year(), date.month0() / 3 * 3 + 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0)),
        "M" => date.with_day(1).and_then(|d| d.and_hms_opt(0, 0, 0)),
        "W" => date
            .checked_sub_days(Days::new(u64::from(date.weekday().num_days_from_monday())))
            .and_then(|d| d.and_hms_opt(0, 0, 0)),
        "D" => date.and_hms_opt(0, 0, 0),
        "h" => date.and_hms_opt(dt.hour(), 0, 0),
        "m" => date.and_hms_opt(dt.hour(), dt.minute(), 0),
        "s" => dt.with_nanosecond(0),
        "ms" => dt.with_nanosecond(dt.nanosecond() / 1_000_000 * 1_000_000),
        "us" => dt.with_nanosecond(dt.nanosecond() / 1_000 * 1_000),
        other => {
            return Err(TesseraError::value_error(format!(
                "unsupported truncation unit {other:?}"
            )))
        }
    };
    truncated.ok_or_else(|| TesseraError::value_error(format!("cannot truncate {dt} to {unit}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Date32Array, ListArray, TimestampSecondArray};

    fn text(values: &[Option<&str>]) -> ArrayRef {
        Arc::new(StringArray::from(values.to_vec()))
    }

    fn as_strings(array: &ArrayRef) -> Vec<Option<String>> {
        strings(array)
            .unwrap()
            .iter()
            .map(|v| v.map(str::to_string))
            .collect()
    }

    #[test]
    fn test_slice_and_tail() {
        let input = text(&[Some("abcdef"), None]);
        let sliced = Function::Slice {
            start: 2,
            length: Some(3),
        }
        .apply(&[input.clone()])
        .unwrap();
        assert_eq!(as_strings(&sliced), vec![Some("cde".to_string()), None]);

        let from_end = Function::Slice {
            start: -2,
            length: None,
        }
        .apply(&[input.clone()])
        .unwrap();
        assert_eq!(as_strings(&from_end)[0].as_deref(), Some("ef"));

        let tail = Function::Tail(10).apply(&[input]).unwrap();
        assert_eq!(as_strings(&tail)[0].as_deref(), Some("abcdef"));
    }

    #[test]
    fn test_repeat_overflow_is_an_error() {
        let input = text(&[Some("ab"), Some("")]);
        assert!(matches!(
            Function::Repeat(usize::MAX).apply(&[input.clone()]),
            Err(TesseraError::ExecutionError(_))
        ));
        let twice = Function::Repeat(2).apply(&[input]).unwrap();
        assert_eq!(
            as_strings(&twice),
            vec![Some("abab".to_string()), Some(String::new())]
        );
    }

    #[test]
    fn test_slice_with_extreme_bounds() {
        let input = text(&[Some("abcdef")]);
        let slice = |start, length| {
            let sliced = Function::Slice { start, length }
                .apply(&[input.clone()])
                .unwrap();
            as_strings(&sliced)[0].clone()
        };
        assert_eq!(slice(1, Some(i64::MAX)).as_deref(), Some("bcdef"));
        assert_eq!(slice(i64::MIN, Some(2)).as_deref(), Some("ab"));
        assert_eq!(slice(i64::MAX, Some(i64::MAX)).as_deref(), Some(""));
    }

    #[test]
    fn test_find_is_zero_based() {
        let input = text(&[Some("banana"), Some("xyz")]);
        let found = Function::Find {
            needle: "an".into(),
            start: 2,
        }
        .apply(&[input])
        .unwrap();
        let found = found.as_any().downcast_ref::<Int64Array>().unwrap();
        assert_eq!(found.value(0), 3);
        assert_eq!(found.value(1), -1);
    }

    #[test]
    fn test_padding_and_capitalize() {
        let input = text(&[Some("ab"), Some("abcdef")]);
        let left = Function::PadStart {
            width: 5,
            fill: "-".into(),
        }
        .apply(&[input.clone()])
        .unwrap();
        assert_eq!(
            as_strings(&left),
            vec![Some("---ab".to_string()), Some("abcdef".to_string())]
        );
        let right = Function::PadEnd {
            width: 4,
            fill: "xy".into(),
        }
        .apply(&[input])
        .unwrap();
        assert_eq!(as_strings(&right)[0].as_deref(), Some("abxy"));

        assert_eq!(capitalize("hELLO"), "Hello");
    }

    #[test]
    fn test_regex_functions() {
        let input = text(&[Some("order-42"), Some("none")]);
        let extracted = Function::RegexExtract {
            pattern: r"(\w+)-(\d+)".into(),
            group: 2,
        }
        .apply(&[input.clone()])
        .unwrap();
        assert_eq!(as_strings(&extracted), vec![Some("42".to_string()), None]);

        let replaced = Function::RegexReplace {
            pattern: r"\d".into(),
            replacement: "#".into(),
        }
        .apply(&[input.clone()])
        .unwrap();
        assert_eq!(as_strings(&replaced)[0].as_deref(), Some("order-##"));

        let bad = Function::RegexMatch("(".into()).apply(&[input]);
        assert!(bad.is_err());
    }

    #[test]
    fn test_concat_propagates_nulls() {
        let a = text(&[Some("a"), None]);
        let b = text(&[Some("b"), Some("c")]);
        let joined = Function::Concat {
            separator: "-".into(),
        }
        .apply(&[a, b])
        .unwrap();
        assert_eq!(as_strings(&joined), vec![Some("a-b".to_string()), None]);
    }

    #[test]
    fn test_split_builds_lists() {
        let split = Function::Split(",".into())
            .apply(&[text(&[Some("a,b"), None])])
            .unwrap();
        let list = split.as_any().downcast_ref::<ListArray>().unwrap();
        assert_eq!(list.value(0).len(), 2);
        assert!(list.is_null(1));
    }

    #[test]
    fn test_temporal_functions() {
        // 2024-03-15 13:45:30 UTC
        let ts: ArrayRef = Arc::new(TimestampSecondArray::from(vec![Some(1_710_510_330), None]));

        let month = Function::Temporal(TemporalField::Month).apply(&[ts.clone()]).unwrap();
        let month = month.as_any().downcast_ref::<Int32Array>().unwrap();
        assert_eq!(month.value(0), 3);
        assert!(month.is_null(1));

        let weekday = Function::Temporal(TemporalField::Weekday).apply(&[ts.clone()]).unwrap();
        let weekday = weekday.as_any().downcast_ref::<Int32Array>().unwrap();
        assert_eq!(weekday.value(0), 4);

        let formatted = Function::Strftime("%Y-%m-%d %H:%M".into()).apply(&[ts.clone()]).unwrap();
        assert_eq!(as_strings(&formatted)[0].as_deref(), Some("2024-03-15 13:45"));

        let hour = Function::Truncate("h".into()).apply(&[ts.clone()]).unwrap();
        let hour = hour.as_any().downcast_ref::<TimestampSecondArray>().unwrap();
        assert_eq!(hour.value(0), 1_710_507_600);

        let epoch = Function::EpochSeconds.apply(&[ts]).unwrap();
        let epoch = epoch.as_any().downcast_ref::<Int64Array>().unwrap();
        assert_eq!(epoch.value(0), 1_710_510_330);
    }

    #[test]
    fn test_date_functions() {
        let year: ArrayRef = Arc::new(Int64Array::from(vec![2024, 2023]));
        let month: ArrayRef = Arc::new(Int64Array::from(vec![2, 13]));
        let day: ArrayRef = Arc::new(Int64Array::from(vec![29, 1]));
        let dates = Function::DateFromParts.apply(&[year, month, day]).unwrap();
        let dates = dates.as_any().downcast_ref::<Date32Array>().unwrap();
        assert_eq!(dates.value(0), 19_782);
        assert!(dates.is_null(1));

        let quarter = Function::Truncate("Q".into())
            .apply(&[Arc::new(dates.clone()) as ArrayRef])
            .unwrap();
        let quarter = quarter.as_any().downcast_ref::<Date32Array>().unwrap();
        // 2024-01-01
        assert_eq!(quarter.value(0), 19_723);

        let parsed = Function::Strptime("%Y-%m-%d".into())
            .apply(&[text(&[Some("1970-01-02"), Some("garbage")])])
            .unwrap();
        assert_eq!(parsed.null_count(), 1);
    }
}
