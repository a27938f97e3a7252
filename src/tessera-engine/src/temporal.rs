//! Date and timestamp rules.
//!
//! Timestamps travel as integer counts of their own unit and intervals as
//! integer counts of theirs, so arithmetic rescales the interval first.
//! Calendar intervals (years, months) have no fixed length and are rejected.

use chrono::Utc;

use common_error::{TesseraError, TesseraResult};
use tessera_core::{DataType, IntervalUnit, TimeUnit, Value};
use tessera_ir::{Node, NodeKind, Typed};
use tessera_translate::{Backend, RuleTable};

use crate::backend::Engine;
use crate::expr::{lit, typed_lit, when, BinaryOp, Expr, Function, TemporalField};
use crate::values::{arg, expr, literal_string, EngineTranslator};

const NANOS_PER_DAY: i64 = 86_400_000_000_000;

const FIELDS: &[(NodeKind, TemporalField)] = &[
    (NodeKind::ExtractYear, TemporalField::Year),
    (NodeKind::ExtractQuarter, TemporalField::Quarter),
    (NodeKind::ExtractMonth, TemporalField::Month),
    (NodeKind::ExtractWeekOfYear, TemporalField::Week),
    (NodeKind::ExtractDayOfYear, TemporalField::DayOfYear),
    (NodeKind::ExtractDay, TemporalField::Day),
    (NodeKind::ExtractHour, TemporalField::Hour),
    (NodeKind::ExtractMinute, TemporalField::Minute),
    (NodeKind::ExtractSecond, TemporalField::Second),
    (NodeKind::ExtractMillisecond, TemporalField::Millisecond),
];

const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

fn child_dtype(node: &Node, field: &str) -> TesseraResult<DataType> {
    node.child(field)?
        .dtype()
        .cloned()
        .ok_or_else(|| TesseraError::internal(format!("{}.{field} has no type", node.kind())))
}

fn timestamp_unit(node: &Node, field: &str) -> TesseraResult<TimeUnit> {
    match child_dtype(node, field)? {
        DataType::Timestamp(unit) => Ok(unit),
        other => Err(TesseraError::type_error(format!(
            "{}.{field} must be a timestamp, got {other}",
            node.kind()
        ))),
    }
}

/// Length of the interval bound to `right`, rejecting calendar units.
fn interval_nanos(node: &Node) -> TesseraResult<(IntervalUnit, i64)> {
    let unsupported =
        || TesseraError::unsupported_argument(node.kind().name(), "right", Engine::NAME);
    match child_dtype(node, "right")? {
        DataType::Interval(unit) => unit
            .fixed_nanos()
            .map(|nanos| (unit, nanos))
            .ok_or_else(unsupported),
        _ => Err(unsupported()),
    }
}

/// Shift `base` (an integer count of `unit_nanos`) by `delta` intervals of
/// `step_nanos`, rescaling whichever side is coarser.
fn shift(base: Expr, delta: Expr, unit_nanos: i64, step_nanos: i64, subtract: bool) -> Expr {
    let combine = |left: Expr, right: Expr| {
        if subtract {
            left.sub(right)
        } else {
            left.add(right)
        }
    };
    if step_nanos % unit_nanos == 0 {
        combine(base, delta.mul(lit(step_nanos / unit_nanos)))
    } else {
        let finer = combine(base.mul(lit(unit_nanos)), delta.mul(lit(step_nanos)));
        finer.div(lit(unit_nanos))
    }
}

fn extract(t: &mut EngineTranslator, node: &Node, field: TemporalField) -> TesseraResult<Expr> {
    Ok(arg(t, node)?.call(Function::Temporal(field)))
}

pub(crate) fn register(rules: &mut RuleTable<Engine>) {
    register_extract(rules);
    register_arithmetic(rules);
    register_conversions(rules);
}

fn register_extract(rules: &mut RuleTable<Engine>) {
    rules.register(NodeKind::ExtractTemporalField, |t, node| {
        let field = FIELDS
            .iter()
            .find(|(kind, _)| *kind == node.kind())
            .map(|(_, field)| *field)
            .ok_or_else(|| TesseraError::dispatch(node.kind().name(), Engine::NAME))?;
        let mut out = extract(t, node, field)?;
        if field == TemporalField::Millisecond {
            out = out.cast(DataType::Int64).binary(BinaryOp::Modulo, lit(1000i64));
        }
        Ok(out.cast(DataType::Int32).into())
    });
    rules.register(NodeKind::DayOfWeekIndex, |t, node| {
        Ok(extract(t, node, TemporalField::Weekday)?
            .cast(DataType::Int32)
            .into())
    });
    rules.register(NodeKind::DayOfWeekName, |t, node| {
        let index = extract(t, node, TemporalField::Weekday)?;
        let unknown = typed_lit(Value::Null, DataType::String);
        let named = WEEKDAYS
            .iter()
            .enumerate()
            .rev()
            .fold(unknown, |otherwise, (i, name)| {
                when(index.clone().eq(lit(i as i64)))
                    .then(lit(*name))
                    .otherwise(otherwise)
            });
        Ok(named.into())
    });
    rules.register(NodeKind::ExtractEpochSeconds, |t, node| {
        Ok(arg(t, node)?.call(Function::EpochSeconds).into())
    });
}

fn register_arithmetic(rules: &mut RuleTable<Engine>) {
    rules.register_many(&[NodeKind::TimestampAdd, NodeKind::TimestampSub], |t, node| {
        let unit = timestamp_unit(node, "left")?;
        let (_, step) = interval_nanos(node)?;
        let base = expr(t, node, "left")?.cast(DataType::Int64);
        let delta = expr(t, node, "right")?.cast(DataType::Int64);
        let subtract = node.kind() == NodeKind::TimestampSub;
        Ok(shift(base, delta, unit.nanos(), step, subtract)
            .cast(DataType::Timestamp(unit))
            .into())
    });
    rules.register_many(&[NodeKind::DateAdd, NodeKind::DateSub], |t, node| {
        let (unit, step) = interval_nanos(node)?;
        if step % NANOS_PER_DAY != 0 {
            return Err(TesseraError::type_error(format!(
                "dates can only move by whole days, not {}",
                unit.sql_name()
            )));
        }
        let base = expr(t, node, "left")?.cast(DataType::Int32).cast(DataType::Int64);
        let delta = expr(t, node, "right")?.cast(DataType::Int64);
        let subtract = node.kind() == NodeKind::DateSub;
        Ok(shift(base, delta, NANOS_PER_DAY, step, subtract)
            .cast(DataType::Int32)
            .cast(DataType::Date)
            .into())
    });
    rules.register(NodeKind::IntervalSubtract, |t, node| {
        let unit = match child_dtype(node, "left")? {
            DataType::Interval(unit) => unit,
            other => {
                return Err(TesseraError::type_error(format!(
                    "IntervalSubtract.left must be an interval, got {other}"
                )))
            }
        };
        let left = expr(t, node, "left")?.cast(DataType::Int64);
        let right = expr(t, node, "right")?.cast(DataType::Int64);
        let difference = match (child_dtype(node, "right")?, unit.fixed_nanos()) {
            (DataType::Interval(other), _) if other == unit => left.sub(right),
            (_, Some(unit_nanos)) => {
                let (_, step) = interval_nanos(node)?;
                shift(left, right, unit_nanos, step, true)
            }
            (_, None) => {
                return Err(TesseraError::unsupported_argument(
                    node.kind().name(),
                    "left",
                    Engine::NAME,
                ))
            }
        };
        Ok(difference.cast(DataType::Interval(unit)).into())
    });
    rules.register(NodeKind::TimestampDiff, |t, node| {
        let seconds = |e: Expr| {
            e.cast(DataType::Timestamp(TimeUnit::Second))
                .cast(DataType::Int64)
        };
        let left = seconds(expr(t, node, "left")?);
        let right = seconds(expr(t, node, "right")?);
        Ok(left.sub(right).into())
    });
    rules.register(NodeKind::DateDiff, |t, node| {
        let days = |e: Expr| e.cast(DataType::Int32).cast(DataType::Int64);
        let left = days(expr(t, node, "left")?);
        let right = days(expr(t, node, "right")?);
        Ok(left.sub(right).into())
    });
}

fn register_conversions(rules: &mut RuleTable<Engine>) {
    rules.register(NodeKind::Date, |t, node| {
        Ok(arg(t, node)?.cast(DataType::Date).into())
    });
    rules.register(NodeKind::Strftime, |t, node| {
        let format = literal_string(t, node, "format_str")?;
        Ok(arg(t, node)?.call(Function::Strftime(format)).into())
    });
    rules.register(NodeKind::StringToTimestamp, |t, node| {
        let format = literal_string(t, node, "format_str")?;
        Ok(arg(t, node)?.call(Function::Strptime(format)).into())
    });
    rules.register_many(
        &[NodeKind::DateTruncate, NodeKind::TimestampTruncate],
        |t, node| {
            let unit = node.str_field("unit")?.to_string();
            Ok(arg(t, node)?.call(Function::Truncate(unit)).into())
        },
    );
    rules.register(NodeKind::DateFromYmd, |t, node| {
        let args = vec![
            expr(t, node, "year")?,
            expr(t, node, "month")?,
            expr(t, node, "day")?,
        ];
        Ok(Expr::Function {
            function: Function::DateFromParts,
            args,
        }
        .into())
    });
    rules.register(NodeKind::TimestampFromYmdhms, |t, node| {
        let args = ["year", "month", "day", "hours", "minutes", "seconds"]
            .into_iter()
            .map(|field| expr(t, node, field))
            .collect::<TesseraResult<Vec<_>>>()?;
        Ok(Expr::Function {
            function: Function::TimestampFromParts,
            args,
        }
        .into())
    });
    rules.register_many(
        &[NodeKind::TimestampFromUnix, NodeKind::IntervalFromInteger],
        |t, node| {
            Ok(arg(t, node)?
                .cast(DataType::Int64)
                .cast(node.output_dtype()?)
                .into())
        },
    );
    rules.register(NodeKind::TimestampNow, |_, _| {
        let now = Utc::now().timestamp_nanos_opt().ok_or_else(|| {
            TesseraError::execution("current time does not fit a nanosecond timestamp")
        })?;
        let unit = TimeUnit::Nanosecond;
        Ok(typed_lit(Value::Timestamp(now, unit), DataType::Timestamp(unit)).into())
    });
}
