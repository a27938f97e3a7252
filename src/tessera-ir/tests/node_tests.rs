//! Construction, equality and capability tests for IR nodes.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};

use common_error::TesseraError;
use tessera_core::{DataType, IntervalUnit, Schema, Shape, Value};
use tessera_ir::ops::{self, alias, binary, database_table, literal, table_column, unary};
use tessera_ir::{Arg, Expr, Named, Node, NodeKind, Relational, ToExpr, Typed};

fn people() -> Node {
    database_table(
        "people",
        Schema::from_pairs([
            ("id", DataType::Int64),
            ("name", DataType::String),
            ("score", DataType::Float64),
            ("born", DataType::Date),
        ]),
    )
    .unwrap()
}

fn hash_of(node: &Node) -> u64 {
    let mut hasher = DefaultHasher::new();
    node.hash(&mut hasher);
    hasher.finish()
}

#[test]
fn test_fields_read_back_validated_values() {
    let t = people();
    let id = table_column(&t, "id").unwrap();
    let add = binary(NodeKind::Add, &id, 5i64).unwrap();

    assert_eq!(add.child("left").unwrap(), &id);
    let right = add.child("right").unwrap();
    assert_eq!(right.kind(), NodeKind::Literal);
    assert_eq!(right.literal_value(), Some(&Value::Int64(5)));
    assert_eq!(add.output_dtype().unwrap(), DataType::Int64);
}

#[test]
fn test_structural_equality_and_hash() {
    let a = binary(NodeKind::Add, &table_column(&people(), "id").unwrap(), 1i64).unwrap();
    let b = binary(NodeKind::Add, &table_column(&people(), "id").unwrap(), 1i64).unwrap();
    let c = binary(NodeKind::Add, &table_column(&people(), "id").unwrap(), 2i64).unwrap();

    assert_eq!(a, b);
    assert_eq!(hash_of(&a), hash_of(&b));
    assert_eq!(a.structural_hash(), b.structural_hash());
    assert_ne!(a, c);

    let set: HashSet<Node> = [a.clone(), b, c].into_iter().collect();
    assert_eq!(set.len(), 2);
}

#[test]
fn test_same_fields_different_kind_are_not_equal() {
    let id = table_column(&people(), "id").unwrap();
    let add = binary(NodeKind::Add, &id, 1i64).unwrap();
    let sub = binary(NodeKind::Subtract, &id, 1i64).unwrap();
    assert_ne!(add, sub);
}

#[test]
fn test_shape_rules() {
    let t = people();
    let score = table_column(&t, "score").unwrap();
    let lit = literal(2.0).unwrap();

    assert_eq!(lit.output_shape().unwrap(), Shape::Scalar);
    assert_eq!(score.output_shape().unwrap(), Shape::Columnar);

    let neg = unary(NodeKind::Negate, &lit).unwrap();
    assert_eq!(neg.output_shape().unwrap(), Shape::Scalar);

    let mixed = binary(NodeKind::Multiply, &lit, &score).unwrap();
    assert_eq!(mixed.output_shape().unwrap(), Shape::Columnar);

    let aliased = alias(&score, "s").unwrap();
    assert_eq!(aliased.output_shape().unwrap(), Shape::Columnar);
    assert_eq!(aliased.output_dtype().unwrap(), DataType::Float64);
    assert_eq!(aliased.name().unwrap(), "s");

    let total = unary(NodeKind::Sum, &score).unwrap();
    assert_eq!(total.output_shape().unwrap(), Shape::Scalar);
}

#[test]
fn test_default_name() {
    let t = people();
    let upper = unary(NodeKind::Uppercase, &table_column(&t, "name").unwrap()).unwrap();
    assert_eq!(upper.name().unwrap(), "Uppercase(name)");
}

#[test]
fn test_validation_failures_name_node_and_field() {
    let t = people();
    let name = table_column(&t, "name").unwrap();

    let err = unary(NodeKind::Negate, &name).unwrap_err();
    match err {
        TesseraError::Validation { node, field, reason } => {
            assert_eq!(node, "Negate");
            assert_eq!(field, "arg");
            assert!(reason.contains("numeric"), "{reason}");
        }
        other => panic!("unexpected error {other}"),
    }

    let err = table_column(&t, "missing").unwrap_err();
    assert!(err.to_string().contains("TableColumn.name"));

    let err = Node::new(NodeKind::Negate, vec![], vec![]).unwrap_err();
    assert!(err.to_string().contains("missing required argument"));

    let err = Node::builder(NodeKind::Negate)
        .arg(1i64)
        .kwarg("bogus", 2i64)
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("Negate.bogus"));

    let err = Node::new(NodeKind::Unary, vec![Arg::from(1i64)], vec![]).unwrap_err();
    assert!(err.to_string().contains("abstract"));
}

#[test]
fn test_comparison_requires_comparable_operands() {
    let t = people();
    let name = table_column(&t, "name").unwrap();
    assert!(binary(NodeKind::Equals, &name, "bob").is_ok());
    let err = binary(NodeKind::Equals, &name, 3i64).unwrap_err();
    assert!(err.to_string().contains("Equals.right"));

    let born = table_column(&t, "born").unwrap();
    assert!(binary(NodeKind::Greater, &born, "2020-01-01").is_ok());
}

#[test]
fn test_replace_revalidates() {
    let t = people();
    let id = table_column(&t, "id").unwrap();
    let add = binary(NodeKind::Add, &id, 1i64).unwrap();

    let replaced = add.replace([("right", Arg::from(2.5))]).unwrap();
    assert_eq!(replaced.kind(), NodeKind::Add);
    assert_eq!(replaced.output_dtype().unwrap(), DataType::Float64);
    assert_eq!(add.output_dtype().unwrap(), DataType::Int64);

    let err = add.replace([("right", Arg::from("x"))]).unwrap_err();
    assert!(err.is_validation());

    let err = add.replace([("nope", Arg::None)]).unwrap_err();
    assert!(err.to_string().contains("Add.nope"));
}

#[test]
fn test_builder_matches_positional_construction() {
    let t = people();
    let name = table_column(&t, "name").unwrap();
    let positional = ops::call(
        NodeKind::Substring,
        vec![Arg::from(&name), Arg::from(2i64), Arg::from(3i64)],
    )
    .unwrap();
    let built = Node::builder(NodeKind::Substring)
        .arg(&name)
        .kwarg("length", 3i64)
        .kwarg("start", 2i64)
        .build()
        .unwrap();
    assert_eq!(positional, built);
}

#[test]
fn test_literal_dtype_default_reads_value() {
    let lit = literal("x").unwrap();
    assert_eq!(lit.get("dtype"), Some(&Arg::Type(DataType::String)));

    let typed = Node::builder(NodeKind::Literal)
        .arg(Value::Null)
        .kwarg("dtype", DataType::Int32)
        .build()
        .unwrap();
    assert_eq!(typed.output_dtype().unwrap(), DataType::Int32);

    let interval = literal(Value::Interval(2, IntervalUnit::Day)).unwrap();
    let date = table_column(&people(), "born").unwrap();
    let shifted = binary(NodeKind::DateAdd, &date, &interval).unwrap();
    assert_eq!(shifted.output_dtype().unwrap(), DataType::Date);
}

#[test]
fn test_case_defaults_and_lengths() {
    let t = people();
    let id = table_column(&t, "id").unwrap();
    let case = Node::builder(NodeKind::SimpleCase)
        .arg(&id)
        .arg(vec![1i64, 2])
        .arg(vec!["a", "b"])
        .build()
        .unwrap();
    let default = case.child("default").unwrap();
    assert_eq!(default.literal_value(), Some(&Value::Null));
    assert_eq!(case.output_dtype().unwrap(), DataType::String);
    assert_eq!(case.output_shape().unwrap(), Shape::Columnar);

    let err = Node::builder(NodeKind::SimpleCase)
        .arg(&id)
        .arg(vec![1i64, 2])
        .arg(vec!["a"])
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("SimpleCase.results"));
}

#[test]
fn test_relational_schemas() {
    let t = people();
    let id = table_column(&t, "id").unwrap();
    let score = table_column(&t, "score").unwrap();

    let sel = Node::builder(NodeKind::Selection)
        .arg(&t)
        .kwarg("selections", vec![Arg::from(&id), Arg::from(alias(&score, "s").unwrap())])
        .kwarg("sort_keys", vec![Arg::from(&id)])
        .build()
        .unwrap();
    assert_eq!(sel.output_schema().unwrap().column_names(), vec!["id", "s"]);
    let keys = sel.children_of("sort_keys").unwrap();
    let key = keys[0];
    assert_eq!(key.kind(), NodeKind::SortKey);
    assert!(key.bool_field("ascending").unwrap());

    let agg = Node::builder(NodeKind::Aggregation)
        .arg(&t)
        .kwarg("metrics", vec![alias(unary(NodeKind::Mean, &score).unwrap(), "avg").unwrap()])
        .kwarg("by", vec![&id])
        .build()
        .unwrap();
    assert_eq!(agg.output_schema().unwrap().column_names(), vec!["id", "avg"]);

    let other = database_table("other", Schema::from_pairs([("id", DataType::Int64)])).unwrap();
    let pred = binary(NodeKind::Equals, &id, &table_column(&other, "id").unwrap()).unwrap();
    let join = Node::builder(NodeKind::InnerJoin)
        .arg(&t)
        .arg(&other)
        .arg(vec![pred.clone()])
        .build()
        .unwrap();
    assert_eq!(
        join.output_schema().unwrap().column_names(),
        vec!["id", "name", "score", "born", "id_right"]
    );

    let semi = Node::builder(NodeKind::LeftSemiJoin)
        .arg(&t)
        .arg(&other)
        .arg(vec![pred])
        .build()
        .unwrap();
    assert_eq!(semi.output_schema().unwrap().len(), 4);

    assert!(id.output_schema().is_err());
}

#[test]
fn test_duplicate_selection_names_rejected() {
    let t = people();
    let id = table_column(&t, "id").unwrap();
    let err = Node::builder(NodeKind::Selection)
        .arg(&t)
        .kwarg("selections", vec![Arg::from(&t), Arg::from(&id)])
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("duplicate column name"));
}

#[test]
fn test_to_expr_tags_shape() {
    let t = people();
    let id = table_column(&t, "id").unwrap();
    assert!(matches!(id.to_expr().unwrap(), Expr::Column(_)));
    assert!(matches!(literal(1i64).unwrap().to_expr().unwrap(), Expr::Scalar(_)));
    assert!(matches!(t.to_expr().unwrap(), Expr::Table(_)));
}

#[test]
fn test_explain_tree() {
    let t = people();
    let neg = unary(NodeKind::Negate, &table_column(&t, "id").unwrap()).unwrap();
    let text = neg.explain();
    assert!(text.starts_with("Negate (:: int64)\n"));
    assert!(text.contains("└─ TableColumn (name=\"id\", :: int64)"));
}

#[test]
fn test_in_memory_table_checks_rows_against_schema() {
    let schema = Schema::from_pairs([("k", DataType::Int32), ("v", DataType::String)]);
    let rows = vec![
        vec![Value::Int64(1), Value::String("a".into())],
        vec![Value::Int64(2), Value::Null],
    ];
    let t = ops::in_memory_table("lookup", schema.clone(), rows).unwrap();
    assert_eq!(t.output_schema().unwrap(), &schema);
    assert_eq!(t.name().unwrap(), "lookup");
    assert_eq!(table_column(&t, "k").unwrap().output_dtype().unwrap(), DataType::Int32);

    let short = ops::in_memory_table("lookup", schema.clone(), vec![vec![Value::Int64(1)]]);
    assert!(short.unwrap_err().to_string().contains("expected 2 values"));

    let mistyped = ops::in_memory_table(
        "lookup",
        schema,
        vec![vec![Value::String("x".into()), Value::Null]],
    );
    assert!(matches!(mistyped, Err(TesseraError::Validation { .. })));
}

#[test]
fn test_array_node_types() {
    let t = database_table(
        "posts",
        Schema::from_pairs([
            ("tags", DataType::Array(Box::new(DataType::String))),
            ("a", DataType::Int32),
            ("b", DataType::Float64),
        ]),
    )
    .unwrap();
    let tags = table_column(&t, "tags").unwrap();
    let (a, b) = (table_column(&t, "a").unwrap(), table_column(&t, "b").unwrap());

    let len = unary(NodeKind::ArrayLength, &tags).unwrap();
    assert_eq!(len.output_dtype().unwrap(), DataType::Int64);
    assert!(unary(NodeKind::ArrayLength, &a).is_err());

    let both = binary(NodeKind::ArrayConcat, &tags, &tags).unwrap();
    assert_eq!(both.output_dtype().unwrap(), DataType::Array(Box::new(DataType::String)));
    assert!(binary(NodeKind::ArrayConcat, &tags, &a).is_err());

    let pair = ops::call(NodeKind::ArrayColumn, vec![Arg::from(&a), Arg::from(&b)]).unwrap();
    assert_eq!(pair.output_dtype().unwrap(), DataType::Array(Box::new(DataType::Float64)));
    assert_eq!(pair.shape(), Some(Shape::Columnar));
    assert!(ops::call(NodeKind::ArrayColumn, vec![]).is_err());

    let collected = unary(NodeKind::ArrayCollect, &a).unwrap();
    assert_eq!(collected.output_dtype().unwrap(), DataType::Array(Box::new(DataType::Int32)));
    assert_eq!(collected.shape(), Some(Shape::Scalar));
}

#[test]
fn test_numeric_and_temporal_constructors() {
    let t = people();
    let id = table_column(&t, "id").unwrap();
    let angle = binary(NodeKind::Atan2, &id, 1i64).unwrap();
    assert_eq!(angle.output_dtype().unwrap(), DataType::Float64);

    let parts: Vec<Arg> = [2024i64, 2, 29, 12, 30, 15].into_iter().map(Arg::from).collect();
    let at = ops::call(NodeKind::TimestampFromYmdhms, parts).unwrap();
    assert_eq!(
        at.output_dtype().unwrap(),
        DataType::Timestamp(tessera_core::TimeUnit::Second)
    );
    assert_eq!(at.shape(), Some(Shape::Scalar));

    let days = |n: i64| ops::call(NodeKind::IntervalFromInteger, vec![Arg::from(n), Arg::from("D")]);
    let gap = binary(NodeKind::IntervalSubtract, days(3).unwrap(), days(1).unwrap()).unwrap();
    assert_eq!(gap.output_dtype().unwrap(), DataType::Interval(IntervalUnit::Day));
    assert!(binary(NodeKind::IntervalSubtract, &id, days(1).unwrap()).is_err());
}
