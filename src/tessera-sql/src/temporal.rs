//! Temporal function rules.

use common_error::{TesseraError, TesseraResult};
use tessera_core::IntervalUnit;
use tessera_ir::{Node, NodeKind};
use tessera_translate::RuleTable;

use crate::backend::Sql;
use crate::values::{arg, call, SqlTranslator};

const EXTRACT_FIELDS: &[(NodeKind, &str)] = &[
    (NodeKind::ExtractYear, "YEAR"),
    (NodeKind::ExtractQuarter, "QUARTER"),
    (NodeKind::ExtractMonth, "MONTH"),
    (NodeKind::ExtractDay, "DAY"),
    (NodeKind::ExtractHour, "HOUR"),
    (NodeKind::ExtractMinute, "MINUTE"),
    (NodeKind::ExtractSecond, "SECOND"),
];

const TEMPORAL_FUNCTIONS: &[(NodeKind, &str)] = &[
    (NodeKind::ExtractWeekOfYear, "weekofyear"),
    (NodeKind::ExtractDayOfYear, "dayofyear"),
    (NodeKind::ExtractEpochSeconds, "unix_timestamp"),
    (NodeKind::DayOfWeekName, "dayname"),
    (NodeKind::Date, "to_date"),
];

fn truncate_unit(code: &str) -> TesseraResult<&'static str> {
    Ok(match code {
        "Y" => "YEAR",
        "Q" => "QUARTER",
        "M" => "MONTH",
        "W" => "WEEK",
        "D" => "DAY",
        "h" => "HOUR",
        "m" => "MINUTE",
        "s" => "SECOND",
        "ms" => "MILLISECONDS",
        "us" => "MICROSECONDS",
        other => {
            return Err(TesseraError::translation(format!(
                "unsupported truncation unit {other:?}"
            )))
        }
    })
}

fn binary_op(t: &mut SqlTranslator, node: &Node, op: &str) -> TesseraResult<String> {
    let left = t.translate_field(node, "left")?;
    let right = t.translate_field(node, "right")?;
    Ok(format!("({left} {op} {right})"))
}

pub(crate) fn register(rules: &mut RuleTable<Sql>) {
    for &(kind, field) in EXTRACT_FIELDS {
        rules.register(kind, move |t, node| {
            Ok(format!("extract({field} FROM {})", arg(t, node)?))
        });
    }
    for &(kind, name) in TEMPORAL_FUNCTIONS {
        rules.register(kind, move |t, node| Ok(call(name, &[arg(t, node)?])));
    }
    rules.register(NodeKind::ExtractMillisecond, |t, node| {
        Ok(format!("(extract(MILLISECOND FROM {}) % 1000)", arg(t, node)?))
    });
    rules.register(NodeKind::DayOfWeekIndex, |t, node| {
        Ok(format!("pmod(dayofweek({}) - 2, 7)", arg(t, node)?))
    });

    rules.register_many(&[NodeKind::TimestampAdd, NodeKind::DateAdd], |t, node| {
        binary_op(t, node, "+")
    });
    rules.register_many(
        &[NodeKind::TimestampSub, NodeKind::DateSub, NodeKind::IntervalSubtract],
        |t, node| binary_op(t, node, "-"),
    );
    rules.register(NodeKind::TimestampDiff, |t, node| {
        let left = t.translate_field(node, "left")?;
        let right = t.translate_field(node, "right")?;
        Ok(format!("(unix_timestamp({left}) - unix_timestamp({right}))"))
    });
    rules.register(NodeKind::DateDiff, |t, node| {
        let args = [t.translate_field(node, "left")?, t.translate_field(node, "right")?];
        Ok(call("datediff", &args))
    });

    rules.register(NodeKind::Strftime, |t, node| {
        let args = [arg(t, node)?, t.translate_field(node, "format_str")?];
        Ok(call("date_format", &args))
    });
    rules.register(NodeKind::StringToTimestamp, |t, node| {
        let args = [arg(t, node)?, t.translate_field(node, "format_str")?];
        Ok(call("to_timestamp", &args))
    });
    rules.register_many(
        &[NodeKind::DateTruncate, NodeKind::TimestampTruncate],
        |t, node| {
            let unit = truncate_unit(node.str_field("unit")?)?;
            Ok(call("date_trunc", &[format!("'{unit}'"), arg(t, node)?]))
        },
    );
    rules.register(NodeKind::DateFromYmd, |t, node| {
        let args = [
            t.translate_field(node, "year")?,
            t.translate_field(node, "month")?,
            t.translate_field(node, "day")?,
        ];
        Ok(call("make_date", &args))
    });
    rules.register(NodeKind::TimestampFromYmdhms, |t, node| {
        let args = ["year", "month", "day", "hours", "minutes", "seconds"]
            .into_iter()
            .map(|field| t.translate_field(node, field))
            .collect::<TesseraResult<Vec<_>>>()?;
        Ok(call("make_timestamp", &args))
    });
    rules.register(NodeKind::TimestampFromUnix, |t, node| {
        let arg = arg(t, node)?;
        let divisor = match node.str_field("unit")? {
            "s" => 1,
            "ms" => 1_000,
            "us" => 1_000_000,
            _ => 1_000_000_000,
        };
        Ok(if divisor == 1 {
            call("from_unixtime", &[arg])
        } else {
            call("from_unixtime", &[format!("{arg} DIV {divisor}")])
        })
    });
    rules.register(NodeKind::TimestampNow, |_, _| Ok("now()".to_string()));
    rules.register(NodeKind::IntervalFromInteger, |t, node| {
        let code = node.str_field("unit")?;
        let unit = IntervalUnit::from_code(code)
            .ok_or_else(|| TesseraError::translation(format!("unknown interval unit {code:?}")))?;
        Ok(format!("INTERVAL {} {}", arg(t, node)?, unit.sql_name()))
    });
}
