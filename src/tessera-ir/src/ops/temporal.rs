//! Date, timestamp and interval nodes.

use common_error::TesseraError;
use tessera_core::{DataType, IntervalUnit, Shape, TimeUnit};

use super::dtype_of;
use crate::annotations::validator::{
    date, integer_value, interval, one_of, string_value, temporal, timestamp,
};
use crate::annotations::{Argument, Bound};
use crate::arg::Arg;
use crate::kind::NodeKind;
use crate::registry::Registry;

/// Units accepted by `DateTruncate`.
pub const DATE_UNITS: &[&str] = &["Y", "Q", "M", "W", "D"];

/// Units accepted by `TimestampTruncate`.
pub const TIMESTAMP_UNITS: &[&str] = &["Y", "Q", "M", "W", "D", "h", "m", "s", "ms", "us"];

/// Units accepted by `TimestampFromUnix`.
pub const UNIX_UNITS: &[&str] = &["s", "ms", "us", "ns"];

/// Units accepted by `IntervalFromInteger`.
pub const INTERVAL_UNITS: &[&str] = &["Y", "M", "W", "D", "h", "m", "s", "ms", "us", "ns"];

fn unit_field(bound: &Bound) -> &str {
    bound.get("unit").and_then(Arg::as_str).unwrap_or_default()
}

pub(super) fn register(registry: &mut Registry) {
    registry
        .define(NodeKind::ExtractTemporalField)
        .abstract_()
        .arg("arg", Argument::mandatory(temporal()))
        .dtype(|_| Ok(DataType::Int32))
        .finish();
    registry.leaves(
        &[
            NodeKind::ExtractYear,
            NodeKind::ExtractQuarter,
            NodeKind::ExtractMonth,
            NodeKind::ExtractWeekOfYear,
            NodeKind::ExtractDayOfYear,
            NodeKind::ExtractDay,
        ],
        |t| t,
    );
    registry.leaves(
        &[
            NodeKind::ExtractHour,
            NodeKind::ExtractMinute,
            NodeKind::ExtractSecond,
            NodeKind::ExtractMillisecond,
        ],
        |t| t.arg("arg", Argument::mandatory(timestamp())),
    );
    registry
        .define(NodeKind::ExtractEpochSeconds)
        .arg("arg", Argument::mandatory(temporal()))
        .dtype(|_| Ok(DataType::Int64))
        .finish();
    registry
        .define(NodeKind::DayOfWeekIndex)
        .arg("arg", Argument::mandatory(temporal()))
        .dtype(|_| Ok(DataType::Int32))
        .finish();
    registry
        .define(NodeKind::DayOfWeekName)
        .arg("arg", Argument::mandatory(temporal()))
        .dtype(|_| Ok(DataType::String))
        .finish();
    registry
        .define(NodeKind::Date)
        .arg("arg", Argument::mandatory(timestamp()))
        .dtype(|_| Ok(DataType::Date))
        .finish();

    registry
        .define(NodeKind::TemporalBinary)
        .abstract_()
        .arg("left", Argument::mandatory(temporal()))
        .finish();
    registry.leaves(&[NodeKind::TimestampAdd, NodeKind::TimestampSub], |t| {
        t.arg("left", Argument::mandatory(timestamp()))
            .arg("right", Argument::mandatory(interval()))
            .dtype(|b| dtype_of(b, "left"))
    });
    registry.leaves(&[NodeKind::DateAdd, NodeKind::DateSub], |t| {
        t.arg("left", Argument::mandatory(date()))
            .arg("right", Argument::mandatory(interval()))
            .dtype(|_| Ok(DataType::Date))
    });
    registry
        .define(NodeKind::TimestampDiff)
        .arg("left", Argument::mandatory(timestamp()))
        .arg("right", Argument::mandatory(timestamp()))
        .dtype(|_| Ok(DataType::Interval(IntervalUnit::Second)))
        .finish();
    registry
        .define(NodeKind::DateDiff)
        .arg("left", Argument::mandatory(date()))
        .arg("right", Argument::mandatory(date()))
        .dtype(|_| Ok(DataType::Interval(IntervalUnit::Day)))
        .finish();
    registry
        .define(NodeKind::IntervalSubtract)
        .arg("left", Argument::mandatory(interval()))
        .arg("right", Argument::mandatory(interval()))
        .dtype(|b| dtype_of(b, "left"))
        .finish();

    registry
        .define(NodeKind::Strftime)
        .arg("arg", Argument::mandatory(temporal()))
        .arg("format_str", Argument::mandatory(string_value()))
        .dtype(|_| Ok(DataType::String))
        .finish();
    registry
        .define(NodeKind::StringToTimestamp)
        .arg("arg", Argument::mandatory(string_value()))
        .arg("format_str", Argument::mandatory(string_value()))
        .dtype(|_| Ok(DataType::Timestamp(TimeUnit::Nanosecond)))
        .finish();
    registry
        .define(NodeKind::DateTruncate)
        .arg("arg", Argument::mandatory(date()))
        .arg("unit", Argument::mandatory(one_of(DATE_UNITS)))
        .dtype(|_| Ok(DataType::Date))
        .finish();
    registry
        .define(NodeKind::TimestampTruncate)
        .arg("arg", Argument::mandatory(timestamp()))
        .arg("unit", Argument::mandatory(one_of(TIMESTAMP_UNITS)))
        .dtype(|b| dtype_of(b, "arg"))
        .finish();
    registry
        .define(NodeKind::DateFromYmd)
        .arg("year", Argument::mandatory(integer_value()))
        .arg("month", Argument::mandatory(integer_value()))
        .arg("day", Argument::mandatory(integer_value()))
        .dtype(|_| Ok(DataType::Date))
        .finish();
    registry
        .define(NodeKind::TimestampFromYmdhms)
        .arg("year", Argument::mandatory(integer_value()))
        .arg("month", Argument::mandatory(integer_value()))
        .arg("day", Argument::mandatory(integer_value()))
        .arg("hours", Argument::mandatory(integer_value()))
        .arg("minutes", Argument::mandatory(integer_value()))
        .arg("seconds", Argument::mandatory(integer_value()))
        .dtype(|_| Ok(DataType::Timestamp(TimeUnit::Second)))
        .finish();
    registry
        .define(NodeKind::TimestampFromUnix)
        .arg("arg", Argument::mandatory(integer_value()))
        .arg("unit", Argument::default("s", one_of(UNIX_UNITS)))
        .dtype(|b| {
            TimeUnit::from_code(unit_field(b))
                .map(DataType::Timestamp)
                .ok_or_else(|| TesseraError::value_error("unknown unix timestamp unit"))
        })
        .finish();
    registry
        .define(NodeKind::TimestampNow)
        .dtype(|_| Ok(DataType::Timestamp(TimeUnit::Nanosecond)))
        .shape(|_| Ok(Shape::Scalar))
        .finish();
    registry
        .define(NodeKind::IntervalFromInteger)
        .arg("arg", Argument::mandatory(integer_value()))
        .arg("unit", Argument::mandatory(one_of(INTERVAL_UNITS)))
        .dtype(|b| {
            IntervalUnit::from_code(unit_field(b))
                .map(DataType::Interval)
                .ok_or_else(|| TesseraError::value_error("unknown interval unit"))
        })
        .finish();
}
