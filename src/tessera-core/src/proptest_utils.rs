//! Property-based tests for tessera-core types.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use proptest::prelude::*;

use crate::types::{DataType, IntervalUnit, Shape, TimeUnit, Value};

fn hash_of<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Strategy for simple (non-recursive) values.
pub(crate) fn arb_simple_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int64),
        any::<i32>().prop_map(|i| Value::Float64(f64::from(i))),
        "[a-zA-Z0-9]{0,20}".prop_map(Value::String),
        any::<i32>().prop_map(Value::Date),
        any::<i64>().prop_map(|t| Value::Timestamp(t, TimeUnit::Nanosecond)),
        any::<i32>().prop_map(|n| Value::Interval(i64::from(n), IntervalUnit::Day)),
    ]
}

fn arb_value() -> impl Strategy<Value = Value> {
    arb_simple_value().prop_recursive(2, 16, 4, |inner| {
        prop::collection::vec(inner, 0..4).prop_map(Value::Array)
    })
}

fn arb_data_type() -> impl Strategy<Value = DataType> {
    prop_oneof![
        Just(DataType::Null),
        Just(DataType::Bool),
        Just(DataType::Int32),
        Just(DataType::Int64),
        Just(DataType::Float64),
        Just(DataType::String),
        Just(DataType::Date),
        Just(DataType::Timestamp(TimeUnit::Nanosecond)),
        Just(DataType::Timestamp(TimeUnit::Second)),
    ]
}

proptest! {
    #[test]
    fn prop_value_equality_implies_equal_hash(value in arb_value()) {
        let copy = value.clone();
        prop_assert_eq!(&value, &copy);
        prop_assert_eq!(hash_of(&value), hash_of(&copy));
    }

    #[test]
    fn prop_value_json_roundtrip(value in arb_value()) {
        let json = serde_json::to_string(&value).unwrap();
        let back: Value = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back, value);
    }

    #[test]
    fn prop_common_supertype_is_symmetric(a in arb_data_type(), b in arb_data_type()) {
        prop_assert_eq!(a.common_supertype(&b), b.common_supertype(&a));
    }

    #[test]
    fn prop_both_types_coerce_to_supertype(a in arb_data_type(), b in arb_data_type()) {
        if let Some(sup) = a.common_supertype(&b) {
            prop_assert!(a.can_coerce_to(&sup) || a.is_temporal());
            prop_assert!(b.can_coerce_to(&sup) || b.is_temporal());
        }
    }

    #[test]
    fn prop_widest_shape_is_max(shapes in prop::collection::vec(
        prop_oneof![Just(Shape::Scalar), Just(Shape::Columnar)], 0..8)
    ) {
        let widest = Shape::widest(shapes.clone());
        prop_assert_eq!(widest.is_columnar(), shapes.contains(&Shape::Columnar));
    }
}
