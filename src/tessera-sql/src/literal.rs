//! Literal values and type names.

use chrono::{DateTime, NaiveDate};
use common_error::{TesseraError, TesseraResult};
use tessera_core::{DataType, TimeUnit, Value};

/// Days between 0001-01-01 and 1970-01-01.
const UNIX_EPOCH_DAY_CE: i32 = 719_163;

/// Render a plain value as a SQL literal.
pub fn render_literal(value: &Value) -> TesseraResult<String> {
    Ok(match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        Value::Int64(v) => v.to_string(),
        Value::Float64(v) => render_float(*v),
        Value::String(s) => quote_string(s),
        Value::Binary(bytes) => {
            let hex: String = bytes.iter().map(|b| format!("{b:02X}")).collect();
            format!("unhex('{hex}')")
        }
        Value::Date(days) => format!("DATE '{}'", format_date(*days)?),
        Value::Timestamp(v, unit) => format!("TIMESTAMP '{}'", format_timestamp(*v, *unit)?),
        Value::Interval(n, unit) => format!("INTERVAL {n} {}", unit.sql_name()),
        Value::Array(items) => {
            let items = items
                .iter()
                .map(render_literal)
                .collect::<TesseraResult<Vec<_>>>()?;
            format!("array({})", items.join(", "))
        }
    })
}

/// Single-quote a string, doubling embedded quotes.
pub(crate) fn quote_string(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

fn render_float(v: f64) -> String {
    if v.is_nan() {
        "CAST('NaN' AS double)".to_string()
    } else if v.is_infinite() {
        let sign = if v > 0.0 { "" } else { "-" };
        format!("CAST('{sign}Infinity' AS double)")
    } else {
        format!("{v:?}")
    }
}

fn format_date(days: i32) -> TesseraResult<String> {
    days.checked_add(UNIX_EPOCH_DAY_CE)
        .and_then(NaiveDate::from_num_days_from_ce_opt)
        .map(|date| date.format("%Y-%m-%d").to_string())
        .ok_or_else(|| TesseraError::value_error(format!("date out of range: {days} days")))
}

fn format_timestamp(v: i64, unit: TimeUnit) -> TesseraResult<String> {
    let nanos = v
        .checked_mul(unit.nanos())
        .ok_or_else(|| TesseraError::value_error(format!("timestamp out of range: {v}{}", unit.code())))?;
    Ok(DateTime::from_timestamp_nanos(nanos)
        .format("%Y-%m-%d %H:%M:%S%.f")
        .to_string())
}

/// SQL name of a castable type.
pub fn sql_type(dtype: &DataType) -> TesseraResult<String> {
    Ok(match dtype {
        DataType::Bool => "boolean".to_string(),
        DataType::Int32 => "int".to_string(),
        DataType::Int64 => "bigint".to_string(),
        DataType::Float64 => "double".to_string(),
        DataType::String => "string".to_string(),
        DataType::Binary => "binary".to_string(),
        DataType::Date => "date".to_string(),
        DataType::Timestamp(_) => "timestamp".to_string(),
        DataType::Array(inner) => format!("array<{}>", sql_type(inner)?),
        DataType::Null | DataType::Interval(_) => {
            return Err(TesseraError::translation(format!(
                "cannot cast to {dtype} in SQL"
            )))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::IntervalUnit;

    #[test]
    fn test_scalar_literals() {
        assert_eq!(render_literal(&Value::Null).unwrap(), "NULL");
        assert_eq!(render_literal(&Value::Bool(true)).unwrap(), "TRUE");
        assert_eq!(render_literal(&Value::Int64(-3)).unwrap(), "-3");
        assert_eq!(render_literal(&Value::Float64(2.0)).unwrap(), "2.0");
        assert_eq!(
            render_literal(&Value::Float64(f64::NEG_INFINITY)).unwrap(),
            "CAST('-Infinity' AS double)"
        );
        assert_eq!(render_literal(&Value::from("it's")).unwrap(), "'it''s'");
        assert_eq!(render_literal(&Value::Binary(vec![0xab, 1])).unwrap(), "unhex('AB01')");
    }

    #[test]
    fn test_temporal_literals() {
        assert_eq!(render_literal(&Value::Date(0)).unwrap(), "DATE '1970-01-01'");
        assert_eq!(render_literal(&Value::Date(19_723)).unwrap(), "DATE '2024-01-01'");
        assert_eq!(
            render_literal(&Value::Timestamp(1_500, TimeUnit::Millisecond)).unwrap(),
            "TIMESTAMP '1970-01-01 00:00:01.500'"
        );
        assert_eq!(
            render_literal(&Value::Interval(3, IntervalUnit::Day)).unwrap(),
            "INTERVAL 3 DAY"
        );
    }

    #[test]
    fn test_sql_types() {
        assert_eq!(sql_type(&DataType::Int64).unwrap(), "bigint");
        assert_eq!(
            sql_type(&DataType::Array(Box::new(DataType::String))).unwrap(),
            "array<string>"
        );
        assert!(sql_type(&DataType::Interval(IntervalUnit::Day)).is_err());
    }
}
