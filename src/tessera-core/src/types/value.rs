//! Literal value representation.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use super::{DataType, IntervalUnit, TimeUnit};

/// A literal value carried by IR nodes.
///
/// Floats compare and hash by bit pattern so values can key hash maps
/// and take part in structural node equality.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit floating point.
    Float64(f64),
    /// UTF-8 string.
    String(String),
    /// Binary data.
    Binary(Vec<u8>),
    /// Date (days since Unix epoch).
    Date(i32),
    /// Timestamp (units since Unix epoch).
    Timestamp(i64, TimeUnit),
    /// Interval of `n` units.
    Interval(i64, IntervalUnit),
    /// Array of values.
    Array(Vec<Value>),
}

impl Value {
    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Try to get as boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get as i64.
    pub fn as_int64(&self) -> Option<i64> {
        match self {
            Self::Int64(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get as f64, widening integers.
    pub fn as_float64(&self) -> Option<f64> {
        match self {
            Self::Float64(f) => Some(*f),
            Self::Int64(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Try to get as string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Inferred logical type of this value.
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Null => DataType::Null,
            Self::Bool(_) => DataType::Bool,
            Self::Int64(_) => DataType::Int64,
            Self::Float64(_) => DataType::Float64,
            Self::String(_) => DataType::String,
            Self::Binary(_) => DataType::Binary,
            Self::Date(_) => DataType::Date,
            Self::Timestamp(_, unit) => DataType::Timestamp(*unit),
            Self::Interval(_, unit) => DataType::Interval(*unit),
            Self::Array(values) => {
                let element = DataType::highest_precedence(
                    values.iter().map(Self::data_type).collect::<Vec<_>>().iter(),
                )
                .unwrap_or(DataType::Null);
                DataType::Array(Box::new(element))
            }
        }
    }

    /// Get the type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "Null",
            Self::Bool(_) => "Bool",
            Self::Int64(_) => "Int64",
            Self::Float64(_) => "Float64",
            Self::String(_) => "String",
            Self::Binary(_) => "Binary",
            Self::Date(_) => "Date",
            Self::Timestamp(..) => "Timestamp",
            Self::Interval(..) => "Interval",
            Self::Array(_) => "Array",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int64(a), Self::Int64(b)) => a == b,
            (Self::Float64(a), Self::Float64(b)) => a.to_bits() == b.to_bits(),
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Binary(a), Self::Binary(b)) => a == b,
            (Self::Date(a), Self::Date(b)) => a == b,
            (Self::Timestamp(a, u), Self::Timestamp(b, v)) => a == b && u == v,
            (Self::Interval(a, u), Self::Interval(b, v)) => a == b && u == v,
            (Self::Array(a), Self::Array(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Null => {}
            Self::Bool(b) => b.hash(state),
            Self::Int64(i) => i.hash(state),
            Self::Float64(f) => f.to_bits().hash(state),
            Self::String(s) => s.hash(state),
            Self::Binary(b) => b.hash(state),
            Self::Date(d) => d.hash(state),
            Self::Timestamp(t, u) => {
                t.hash(state);
                u.hash(state);
            }
            Self::Interval(n, u) => {
                n.hash(state);
                u.hash(state);
            }
            Self::Array(values) => values.hash(state),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int64(i) => write!(f, "{i}"),
            Self::Float64(v) => write!(f, "{v:?}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Binary(b) => write!(f, "<{} bytes>", b.len()),
            Self::Date(d) => write!(f, "date({d})"),
            Self::Timestamp(t, u) => write!(f, "timestamp({t}{})", u.code()),
            Self::Interval(n, u) => write!(f, "interval({n}{})", u.code()),
            Self::Array(values) => {
                write!(f, "[")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int64(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int64(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float64(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_conversions() {
        assert_eq!(Value::from(42i64).as_int64(), Some(42));
        assert_eq!(Value::from(2.5f64).as_float64(), Some(2.5));
        assert_eq!(Value::from(7i32).as_float64(), Some(7.0));
        assert_eq!(Value::from("hello").as_str(), Some("hello"));
        assert!(Value::from(None::<i64>).is_null());
    }

    #[test]
    fn test_inferred_types() {
        assert_eq!(Value::Int64(1).data_type(), DataType::Int64);
        assert_eq!(
            Value::Array(vec![Value::Int64(1), Value::Float64(2.0), Value::Null]).data_type(),
            DataType::Array(Box::new(DataType::Float64))
        );
        assert_eq!(
            Value::Interval(3, IntervalUnit::Day).data_type(),
            DataType::Interval(IntervalUnit::Day)
        );
    }

    #[test]
    fn test_float_equality_by_bits() {
        assert_eq!(Value::Float64(f64::NAN), Value::Float64(f64::NAN));
        assert_ne!(Value::Float64(0.0), Value::Float64(-0.0));
        assert_ne!(Value::Int64(1), Value::Float64(1.0));
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::from("a").to_string(), "\"a\"");
        assert_eq!(Value::Null.to_string(), "NULL");
        assert_eq!(
            Value::Array(vec![Value::Int64(1), Value::Int64(2)]).to_string(),
            "[1, 2]"
        );
    }
}
