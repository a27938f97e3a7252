//! Logical data types.

use serde::{Deserialize, Serialize};

/// Resolution of timestamp values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TimeUnit {
    Second,
    Millisecond,
    Microsecond,
    #[default]
    Nanosecond,
}

impl TimeUnit {
    /// Number of nanoseconds in one unit.
    pub const fn nanos(self) -> i64 {
        match self {
            Self::Second => 1_000_000_000,
            Self::Millisecond => 1_000_000,
            Self::Microsecond => 1_000,
            Self::Nanosecond => 1,
        }
    }

    /// Parse the short unit codes used by temporal operations (`s`, `ms`, `us`, `ns`).
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "s" => Some(Self::Second),
            "ms" => Some(Self::Millisecond),
            "us" => Some(Self::Microsecond),
            "ns" => Some(Self::Nanosecond),
            _ => None,
        }
    }

    pub const fn code(self) -> &'static str {
        match self {
            Self::Second => "s",
            Self::Millisecond => "ms",
            Self::Microsecond => "us",
            Self::Nanosecond => "ns",
        }
    }
}

/// Unit of an interval value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntervalUnit {
    Year,
    Month,
    Week,
    Day,
    Hour,
    Minute,
    Second,
    Millisecond,
    Microsecond,
    Nanosecond,
}

impl IntervalUnit {
    /// Fixed length in nanoseconds, `None` for calendar units.
    pub const fn fixed_nanos(self) -> Option<i64> {
        match self {
            Self::Year | Self::Month => None,
            Self::Week => Some(7 * 86_400_000_000_000),
            Self::Day => Some(86_400_000_000_000),
            Self::Hour => Some(3_600_000_000_000),
            Self::Minute => Some(60_000_000_000),
            Self::Second => Some(1_000_000_000),
            Self::Millisecond => Some(1_000_000),
            Self::Microsecond => Some(1_000),
            Self::Nanosecond => Some(1),
        }
    }

    /// Parse a unit code (`Y`, `M`, `W`, `D`, `h`, `m`, `s`, `ms`, `us`, `ns`).
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "Y" => Some(Self::Year),
            "M" => Some(Self::Month),
            "W" => Some(Self::Week),
            "D" => Some(Self::Day),
            "h" => Some(Self::Hour),
            "m" => Some(Self::Minute),
            "s" => Some(Self::Second),
            "ms" => Some(Self::Millisecond),
            "us" => Some(Self::Microsecond),
            "ns" => Some(Self::Nanosecond),
            _ => None,
        }
    }

    pub const fn code(self) -> &'static str {
        match self {
            Self::Year => "Y",
            Self::Month => "M",
            Self::Week => "W",
            Self::Day => "D",
            Self::Hour => "h",
            Self::Minute => "m",
            Self::Second => "s",
            Self::Millisecond => "ms",
            Self::Microsecond => "us",
            Self::Nanosecond => "ns",
        }
    }

    /// Upper-case SQL keyword for this unit.
    pub const fn sql_name(self) -> &'static str {
        match self {
            Self::Year => "YEAR",
            Self::Month => "MONTH",
            Self::Week => "WEEK",
            Self::Day => "DAY",
            Self::Hour => "HOUR",
            Self::Minute => "MINUTE",
            Self::Second => "SECOND",
            Self::Millisecond => "MILLISECOND",
            Self::Microsecond => "MICROSECOND",
            Self::Nanosecond => "NANOSECOND",
        }
    }
}

/// Logical data type of a value expression or column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// Null type (unknown or absent).
    Null,
    /// Boolean type.
    Bool,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// 64-bit floating point.
    Float64,
    /// UTF-8 string.
    String,
    /// Binary data.
    Binary,
    /// Date (days since epoch).
    Date,
    /// Timestamp without time zone.
    Timestamp(TimeUnit),
    /// Interval measured in the given unit.
    Interval(IntervalUnit),
    /// Array of elements with specified type.
    Array(Box<Self>),
}

impl DataType {
    /// Check if this type is numeric.
    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Int32 | Self::Int64 | Self::Float64)
    }

    /// Check if this type is an integer type.
    pub const fn is_integer(&self) -> bool {
        matches!(self, Self::Int32 | Self::Int64)
    }

    pub const fn is_floating(&self) -> bool {
        matches!(self, Self::Float64)
    }

    pub const fn is_boolean(&self) -> bool {
        matches!(self, Self::Bool)
    }

    pub const fn is_string(&self) -> bool {
        matches!(self, Self::String)
    }

    /// Check if this type is a date or timestamp.
    pub const fn is_temporal(&self) -> bool {
        matches!(self, Self::Timestamp(_) | Self::Date)
    }

    pub const fn is_interval(&self) -> bool {
        matches!(self, Self::Interval(_))
    }

    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub const fn is_array(&self) -> bool {
        matches!(self, Self::Array(_))
    }

    /// Element type of an array type.
    pub fn element_type(&self) -> Option<&Self> {
        match self {
            Self::Array(inner) => Some(inner),
            _ => None,
        }
    }

    /// Get the display name for this type.
    pub fn display_name(&self) -> String {
        match self {
            Self::Null => "null".to_string(),
            Self::Bool => "boolean".to_string(),
            Self::Int32 => "int32".to_string(),
            Self::Int64 => "int64".to_string(),
            Self::Float64 => "float64".to_string(),
            Self::String => "string".to_string(),
            Self::Binary => "binary".to_string(),
            Self::Date => "date".to_string(),
            Self::Timestamp(unit) => format!("timestamp({})", unit.code()),
            Self::Interval(unit) => format!("interval('{}')", unit.code()),
            Self::Array(inner) => format!("array<{}>", inner.display_name()),
        }
    }

    /// Check if this type can be coerced to another type.
    pub fn can_coerce_to(&self, target: &Self) -> bool {
        if self == target {
            return true;
        }

        match (self, target) {
            (Self::Null, _)
            | (Self::Int32, Self::Int64 | Self::Float64)
            | (Self::Int64, Self::Float64)
            | (Self::Date, Self::Timestamp(_)) => true,
            (Self::Array(a), Self::Array(b)) => a.can_coerce_to(b),
            _ => false,
        }
    }

    /// Whether values of the two types can be compared with each other.
    pub fn is_comparable_with(&self, other: &Self) -> bool {
        self.common_supertype(other).is_some()
            || (self.is_temporal() && other.is_string())
            || (self.is_string() && other.is_temporal())
    }

    /// Get the common supertype of two types (for type inference).
    pub fn common_supertype(&self, other: &Self) -> Option<Self> {
        if self == other {
            return Some(self.clone());
        }

        match (self, other) {
            (Self::Null, t) | (t, Self::Null) => Some(t.clone()),
            (Self::Int32, Self::Int64) | (Self::Int64, Self::Int32) => Some(Self::Int64),
            (Self::Int32 | Self::Int64, Self::Float64)
            | (Self::Float64, Self::Int32 | Self::Int64) => Some(Self::Float64),
            (Self::Date, Self::Timestamp(u)) | (Self::Timestamp(u), Self::Date) => {
                Some(Self::Timestamp(*u))
            }
            (Self::Timestamp(a), Self::Timestamp(b)) => {
                let finer = if a.nanos() <= b.nanos() { *a } else { *b };
                Some(Self::Timestamp(finer))
            }
            (Self::Array(a), Self::Array(b)) => {
                a.common_supertype(b).map(|t| Self::Array(Box::new(t)))
            }
            _ => None,
        }
    }

    /// Common supertype of a sequence of types.
    pub fn highest_precedence<'a, I>(types: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Self>,
    {
        types
            .into_iter()
            .try_fold(Self::Null, |acc, t| acc.common_supertype(t))
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
