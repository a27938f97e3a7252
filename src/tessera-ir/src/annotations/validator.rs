//! Composable field validators.
//!
//! A validator takes a raw [`Arg`] plus the fields validated so far and
//! returns the validated (possibly coerced) value, or a reason string.
//! The signature attaches the node and field names when it reports the
//! failure.

use std::fmt;
use std::sync::Arc;

use tessera_core::{DataType, Shape};

use super::Bound;
use crate::arg::Arg;
use crate::kind::NodeKind;
use crate::node::Node;
use crate::ops;

type CheckFn = dyn Fn(Arg, &Bound) -> Result<Arg, String> + Send + Sync;

/// A field validator.
#[derive(Clone)]
pub struct Validator {
    description: Arc<str>,
    check: Arc<CheckFn>,
}

impl Validator {
    pub fn new<F>(description: impl Into<Arc<str>>, check: F) -> Self
    where
        F: Fn(Arg, &Bound) -> Result<Arg, String> + Send + Sync + 'static,
    {
        Self {
            description: description.into(),
            check: Arc::new(check),
        }
    }

    /// Validate `arg` against the already-bound fields in `context`.
    pub fn validate(&self, arg: Arg, context: &Bound) -> Result<Arg, String> {
        (self.check)(arg, context)
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validator({})", self.description)
    }
}

/// Accept anything.
pub fn any() -> Validator {
    Validator::new("any", |arg, _| Ok(arg))
}

/// Must be a node whose kind is `kind` or one of its descendants.
pub fn instance_of(kind: NodeKind) -> Validator {
    Validator::new(format!("instance of {kind}"), move |arg, _| match &arg {
        Arg::Node(node) if node.kind().is_subclass_of(kind) => Ok(arg),
        other => Err(format!("expected an instance of {kind}, got {}", other.describe())),
    })
}

/// Must be a relation.
pub fn table() -> Validator {
    instance_of(NodeKind::TableNode)
}

/// Must be a value expression; bare scalars are coerced to literals.
pub fn value() -> Validator {
    Validator::new("value", |arg, _| coerce_value(arg))
}

/// Must be a value expression whose output type satisfies `predicate`.
pub fn value_of(predicate: fn(&DataType) -> bool, expected: &'static str) -> Validator {
    Validator::new(format!("{expected} value"), move |arg, _| {
        let arg = coerce_value(arg)?;
        let dtype = node_dtype(&arg)?;
        if predicate(dtype) || dtype.is_null() {
            Ok(arg)
        } else {
            Err(format!("expected a {expected} value, got {dtype}"))
        }
    })
}

pub fn numeric() -> Validator {
    value_of(DataType::is_numeric, "numeric")
}

pub fn integer_value() -> Validator {
    value_of(DataType::is_integer, "integer")
}

pub fn string_value() -> Validator {
    value_of(DataType::is_string, "string")
}

pub fn boolean_value() -> Validator {
    value_of(DataType::is_boolean, "boolean")
}

pub fn temporal() -> Validator {
    value_of(DataType::is_temporal, "temporal")
}

pub fn timestamp() -> Validator {
    value_of(|t| matches!(t, DataType::Timestamp(_)), "timestamp")
}

pub fn date() -> Validator {
    value_of(|t| matches!(t, DataType::Date), "date")
}

pub fn interval() -> Validator {
    value_of(DataType::is_interval, "interval")
}

pub fn array_value() -> Validator {
    value_of(DataType::is_array, "array")
}

/// Must be a value expression with scalar shape.
pub fn scalar_value() -> Validator {
    Validator::new("scalar value", |arg, _| {
        let arg = coerce_value(arg)?;
        match arg.as_node().and_then(Node::shape) {
            Some(Shape::Scalar) => Ok(arg),
            _ => Err(format!("expected a scalar value, got {}", arg.describe())),
        }
    })
}

/// Must be a literal node; bare scalars are coerced to literals.
pub fn literal() -> Validator {
    Validator::new("literal", |arg, _| {
        let arg = coerce_value(arg)?;
        match &arg {
            Arg::Node(node) if node.kind() == NodeKind::Literal => Ok(arg),
            other => Err(format!("expected a literal, got {}", other.describe())),
        }
    })
}

/// Accept `None` unchanged, otherwise apply `inner`.
pub fn optional(inner: Validator) -> Validator {
    let description = format!("optional {}", inner.description());
    Validator::new(description, move |arg, context| match arg {
        Arg::None => Ok(Arg::None),
        arg => inner.validate(arg, context),
    })
}

/// Coerce into an ordered sequence, validating every element.
///
/// A single non-sequence value is wrapped into a one-element sequence.
pub fn tuple_of(inner: Validator) -> Validator {
    let description = format!("tuple of {}", inner.description());
    Validator::new(description, move |arg, context| {
        let items = match arg {
            Arg::Seq(items) => items,
            Arg::None => return Err("expected a sequence, got None".to_string()),
            single => vec![single],
        };
        items
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                inner
                    .validate(item, context)
                    .map_err(|reason| format!("element {i}: {reason}"))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Arg::Seq)
    })
}

/// A mapping whose values are validated with `inner`.
pub fn map_of(inner: Validator) -> Validator {
    let description = format!("map of {}", inner.description());
    Validator::new(description, move |arg, context| match arg {
        Arg::Map(entries) => entries
            .into_iter()
            .map(|(key, item)| {
                inner
                    .validate(item, context)
                    .map(|item| (key.clone(), item))
                    .map_err(|reason| format!("key {key:?}: {reason}"))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Arg::Map),
        other => Err(format!("expected a mapping, got {}", other.describe())),
    })
}

/// Must be a string equal to one of `options`.
pub fn one_of(options: &'static [&'static str]) -> Validator {
    Validator::new(format!("one of {options:?}"), move |arg, _| match arg.as_str() {
        Some(s) if options.contains(&s) => Ok(arg),
        _ => Err(format!("expected one of {options:?}, got {}", arg.describe())),
    })
}

/// A plain string.
pub fn string() -> Validator {
    Validator::new("string", |arg, _| match arg.as_str() {
        Some(_) => Ok(arg),
        None => Err(format!("expected a string, got {}", arg.describe())),
    })
}

/// A plain integer.
pub fn integer() -> Validator {
    Validator::new("integer", |arg, _| match arg.as_int() {
        Some(_) => Ok(arg),
        None => Err(format!("expected an integer, got {}", arg.describe())),
    })
}

/// A plain boolean.
pub fn boolean() -> Validator {
    Validator::new("boolean", |arg, _| match arg.as_bool() {
        Some(_) => Ok(arg),
        None => Err(format!("expected a boolean, got {}", arg.describe())),
    })
}

/// A data type.
pub fn datatype() -> Validator {
    Validator::new("datatype", |arg, _| match arg {
        Arg::Type(_) => Ok(arg),
        other => Err(format!("expected a datatype, got {}", other.describe())),
    })
}

/// A relation schema without duplicate column names.
pub fn schema() -> Validator {
    Validator::new("schema", |arg, _| match &arg {
        Arg::Schema(schema) => {
            let duplicates = schema.duplicate_names();
            if duplicates.is_empty() {
                Ok(arg)
            } else {
                Err(format!("duplicate column names {duplicates:?}"))
            }
        }
        other => Err(format!("expected a schema, got {}", other.describe())),
    })
}

/// Try `first`, then `second`.
pub fn either(first: Validator, second: Validator) -> Validator {
    let description = format!("{} or {}", first.description(), second.description());
    Validator::new(description, move |arg, context| {
        match first.validate(arg.clone(), context) {
            Ok(validated) => Ok(validated),
            Err(first_reason) => second
                .validate(arg, context)
                .map_err(|second_reason| format!("{first_reason}; {second_reason}")),
        }
    })
}

/// A string naming a column of the relation bound to `table_field`.
pub fn column_name_of(table_field: &'static str) -> Validator {
    Validator::new(format!("column of {table_field}"), move |arg, context| {
        let name = arg
            .as_str()
            .ok_or_else(|| format!("expected a column name, got {}", arg.describe()))?;
        let schema = context
            .node(table_field)
            .and_then(Node::schema)
            .ok_or_else(|| format!("field {table_field} is not a bound relation"))?;
        if schema.contains(name) {
            Ok(arg)
        } else {
            Err(format!("column {name:?} is not in {schema}"))
        }
    })
}

/// A value whose type can be compared with the value bound to `field`.
pub fn comparable_with(field: &'static str) -> Validator {
    Validator::new(format!("comparable with {field}"), move |arg, context| {
        let arg = coerce_value(arg)?;
        let other = context
            .get(field)
            .ok_or_else(|| format!("field {field} is not bound"))?;
        let (left, right) = (node_dtype(other)?, node_dtype(&arg)?);
        if left.is_comparable_with(right) {
            Ok(arg)
        } else {
            Err(format!("{right} is not comparable with {field} of type {left}"))
        }
    })
}

/// A sequence of values as long as the sequence bound to `field`.
pub fn same_length_as(field: &'static str) -> Validator {
    let elements = tuple_of(value());
    Validator::new(format!("same length as {field}"), move |arg, context| {
        let arg = elements.validate(arg, context)?;
        let expected = context
            .get(field)
            .and_then(Arg::as_seq)
            .map(<[Arg]>::len)
            .ok_or_else(|| format!("field {field} is not a bound sequence"))?;
        let actual = arg.as_seq().map_or(0, <[Arg]>::len);
        if actual == expected {
            Ok(arg)
        } else {
            Err(format!("expected {expected} elements to match {field}, got {actual}"))
        }
    })
}

fn coerce_value(arg: Arg) -> Result<Arg, String> {
    match arg {
        Arg::Value(value) => ops::literal(value)
            .map(Arg::Node)
            .map_err(|e| e.to_string()),
        Arg::Node(node) if node.kind().is_subclass_of(NodeKind::Value) => Ok(Arg::Node(node)),
        other => Err(format!("expected a value expression, got {}", other.describe())),
    }
}

fn node_dtype(arg: &Arg) -> Result<&DataType, String> {
    arg.as_node()
        .and_then(Node::dtype)
        .ok_or_else(|| format!("expected a typed value, got {}", arg.describe()))
}

#[cfg(test)]
mod tests {
    use tessera_core::Value;

    use super::*;

    #[test]
    fn test_value_coerces_scalars_to_literals() {
        let arg = value().validate(Arg::from(5i64), &Bound::new()).unwrap();
        let node = arg.as_node().unwrap();
        assert_eq!(node.kind(), NodeKind::Literal);
        assert_eq!(node.get("value"), Some(&Arg::Value(Value::Int64(5))));
    }

    #[test]
    fn test_one_of() {
        let how = one_of(&["any", "all"]);
        assert!(how.validate(Arg::from("all"), &Bound::new()).is_ok());
        let err = how.validate(Arg::from("some"), &Bound::new()).unwrap_err();
        assert!(err.contains("expected one of"));
    }

    #[test]
    fn test_optional_passes_none() {
        let v = optional(integer());
        assert_eq!(v.validate(Arg::None, &Bound::new()), Ok(Arg::None));
        assert!(v.validate(Arg::from("x"), &Bound::new()).is_err());
    }

    #[test]
    fn test_tuple_of_wraps_and_validates_each() {
        let v = tuple_of(integer());
        assert_eq!(
            v.validate(Arg::from(3i64), &Bound::new()),
            Ok(Arg::Seq(vec![Arg::from(3i64)]))
        );
        let err = v
            .validate(Arg::from(vec![Arg::from(1i64), Arg::from("x")]), &Bound::new())
            .unwrap_err();
        assert!(err.starts_with("element 1"));
    }

    #[test]
    fn test_either_reports_both_reasons() {
        let v = either(integer(), boolean());
        assert!(v.validate(Arg::from(true), &Bound::new()).is_ok());
        let err = v.validate(Arg::from("x"), &Bound::new()).unwrap_err();
        assert!(err.contains("integer") && err.contains("boolean"));
    }

    #[test]
    fn test_string_value_rejects_numbers() {
        let err = string_value()
            .validate(Arg::from(1i64), &Bound::new())
            .unwrap_err();
        assert_eq!(err, "expected a string value, got int64");
    }

    #[test]
    fn test_same_length_as() {
        let mut context = Bound::new();
        context.insert("cases", Arg::from(vec![1i64, 2]));
        let v = same_length_as("cases");
        assert!(v.validate(Arg::from(vec!["a", "b"]), &context).is_ok());
        assert!(v.validate(Arg::from(vec!["a"]), &context).is_err());
    }
}
