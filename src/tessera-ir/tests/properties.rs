//! Property tests for signature merging and node equality.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use proptest::prelude::*;
use tessera_core::{DataType, Schema, Value};
use tessera_ir::annotations::validator::any as any_value;
use tessera_ir::ops::{binary, database_table, literal, table_column};
use tessera_ir::{Argument, Node, NodeKind, Parameter, Signature};

const NAMES: &[&str] = &["a", "b", "c", "d", "e", "f", "g", "h"];

fn signature(flags: &[bool], offset: usize) -> Signature {
    Signature::new(
        flags.iter()
            .enumerate()
            .map(|(i, mandatory)| {
                let argument = if *mandatory {
                    Argument::mandatory(any_value())
                } else {
                    Argument::optional(any_value())
                };
                Parameter::new(NAMES[offset + i], argument)
            })
            .collect(),
    )
}

fn hash_of(node: &Node) -> u64 {
    let mut hasher = DefaultHasher::new();
    node.hash(&mut hasher);
    hasher.finish()
}

proptest! {
    #[test]
    fn prop_merge_orders_by_origin_then_mandatory(
        parent in prop::collection::vec(any::<bool>(), 0..4),
        child in prop::collection::vec(any::<bool>(), 0..4),
    ) {
        let parent_sig = signature(&parent, 0);
        let child_sig = signature(&child, 4);
        let merged = Signature::merge(&[&parent_sig], child_sig.clone());

        let pick = |sig: &Signature, mandatory: bool| -> Vec<&'static str> {
            sig.params()
                .iter()
                .filter(|p| p.argument.is_mandatory() == mandatory)
                .map(|p| p.name)
                .collect()
        };
        let mut expected = pick(&parent_sig, true);
        expected.extend(pick(&child_sig, true));
        expected.extend(pick(&child_sig, false));
        expected.extend(pick(&parent_sig, false));

        prop_assert_eq!(merged.names(), expected);
    }

    #[test]
    fn prop_equal_inputs_build_equal_nodes(left in any::<i64>(), right in any::<i64>()) {
        let a = binary(NodeKind::Add, literal(left).unwrap(), right).unwrap();
        let b = binary(NodeKind::Add, literal(left).unwrap(), right).unwrap();
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn prop_unequal_literals_build_unequal_nodes(x in any::<i64>(), y in any::<i64>()) {
        prop_assume!(x != y);
        prop_assert_ne!(literal(x).unwrap(), literal(y).unwrap());
    }

    #[test]
    fn prop_column_dtype_follows_schema(idx in 0usize..3) {
        let types = [DataType::Int64, DataType::String, DataType::Bool];
        let t = database_table(
            "t",
            Schema::from_pairs([("a", types[0].clone()), ("b", types[1].clone()), ("c", types[2].clone())]),
        )
        .unwrap();
        let column = table_column(&t, ["a", "b", "c"][idx]).unwrap();
        prop_assert_eq!(column.dtype(), Some(&types[idx]));
    }

    #[test]
    fn prop_literal_roundtrips_value(value in prop_oneof![
        any::<i64>().prop_map(Value::Int64),
        any::<bool>().prop_map(Value::Bool),
        "[a-z]{0,8}".prop_map(Value::String),
    ]) {
        let node = literal(value.clone()).unwrap();
        prop_assert_eq!(node.literal_value(), Some(&value));
        prop_assert_eq!(node.dtype(), Some(&value.data_type()));
    }
}
