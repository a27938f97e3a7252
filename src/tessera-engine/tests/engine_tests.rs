//! End-to-end lowering and execution of IR trees on the embedded engine.

use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, Float64Array, Int64Array, ListArray, StringArray, TimestampSecondArray,
};
use arrow::record_batch::RecordBatch;
use proptest::prelude::*;

use common_config::{EngineConfig, TesseraConfig};
use common_error::TesseraError;
use tessera_core::{DataType, Schema, Value};
use tessera_engine::{to_arrow_schema, Catalog, EngineCompiler};
use tessera_ir::ops::{
    alias, binary, call, database_table, in_memory_table, sort_key, table_column, unary,
};
use tessera_ir::{Arg, Node, NodeKind};

fn people_schema() -> Schema {
    Schema::from_pairs([
        ("id", DataType::Int64),
        ("name", DataType::String),
        ("age", DataType::Int64),
        ("dept", DataType::String),
    ])
}

fn people() -> Node {
    database_table("people", people_schema()).unwrap()
}

fn orders() -> Node {
    database_table(
        "orders",
        Schema::from_pairs([("id", DataType::Int64), ("amount", DataType::Float64)]),
    )
    .unwrap()
}

fn people_batch() -> RecordBatch {
    RecordBatch::try_new(
        Arc::new(to_arrow_schema(&people_schema())),
        vec![
            Arc::new(Int64Array::from(vec![1, 2, 3, 4])),
            Arc::new(StringArray::from(vec![Some("ann"), Some("bob"), None, Some("dee")])),
            Arc::new(Int64Array::from(vec![Some(34), None, Some(19), Some(52)])),
            Arc::new(StringArray::from(vec!["eng", "ops", "eng", "ops"])),
        ],
    )
    .unwrap()
}

fn orders_batch() -> RecordBatch {
    RecordBatch::try_new(
        Arc::new(to_arrow_schema(&Schema::from_pairs([
            ("id", DataType::Int64),
            ("amount", DataType::Float64),
        ]))),
        vec![
            Arc::new(Int64Array::from(vec![2, 9])),
            Arc::new(Float64Array::from(vec![10.0, 20.0])),
        ],
    )
    .unwrap()
}

fn catalog() -> Catalog {
    let mut catalog = Catalog::new();
    catalog.register("people", people_batch());
    catalog.register("orders", orders_batch());
    catalog
}

fn col(table: &Node, name: &str) -> Node {
    table_column(table, name).unwrap()
}

fn run(node: &Node) -> Result<RecordBatch, TesseraError> {
    EngineCompiler::default().execute(node, &catalog())
}

fn column<'a>(batch: &'a RecordBatch, name: &str) -> &'a ArrayRef {
    batch.column(batch.schema().index_of(name).unwrap())
}

fn ints(batch: &RecordBatch, name: &str) -> Vec<Option<i64>> {
    let array = column(batch, name).as_any().downcast_ref::<Int64Array>().unwrap();
    array.iter().collect()
}

fn strings(batch: &RecordBatch, name: &str) -> Vec<Option<String>> {
    let array = column(batch, name).as_any().downcast_ref::<StringArray>().unwrap();
    array.iter().map(|v| v.map(str::to_string)).collect()
}

fn names(batch: &RecordBatch) -> Vec<String> {
    batch.schema().fields().iter().map(|f| f.name().clone()).collect()
}

fn select(table: &Node, selections: Vec<Arg>) -> Node {
    Node::builder(NodeKind::Selection)
        .arg(table)
        .kwarg("selections", Arg::Seq(selections))
        .build()
        .unwrap()
}

#[test]
fn test_right_join_runs_as_swapped_left_join() {
    let (p, o) = (people(), orders());
    let predicate = binary(NodeKind::Equals, &col(&p, "id"), &col(&o, "id")).unwrap();
    let join = Node::builder(NodeKind::RightJoin)
        .arg(&p)
        .arg(&o)
        .arg(Arg::Seq(vec![Arg::from(predicate)]))
        .build()
        .unwrap();
    let out = run(&join).unwrap();

    assert_eq!(names(&out), vec!["id", "name", "age", "dept", "id_right", "amount"]);
    assert_eq!(ints(&out, "id"), vec![Some(2), None]);
    assert_eq!(strings(&out, "name"), vec![Some("bob".to_string()), None]);
    assert_eq!(ints(&out, "id_right"), vec![Some(2), Some(9)]);
}

#[test]
fn test_simple_case_picks_first_match_or_default() {
    let t = people();
    let case = call(
        NodeKind::SimpleCase,
        vec![
            Arg::from(&col(&t, "id")),
            Arg::Seq(vec![Arg::from(1i64), Arg::from(2i64)]),
            Arg::Seq(vec![Arg::from("a"), Arg::from("b")]),
            Arg::from("z"),
        ],
    )
    .unwrap();
    let node = select(&t, vec![Arg::from(alias(&case, "label").unwrap())]);
    let out = run(&node).unwrap();
    let labels: Vec<_> = strings(&out, "label").into_iter().flatten().collect();
    assert_eq!(labels, vec!["a", "b", "z", "z"]);
}

#[test]
fn test_non_literal_pad_is_unsupported() {
    let t = people();
    let padded = call(
        NodeKind::LPad,
        vec![
            Arg::from(&col(&t, "name")),
            Arg::from(6i64),
            Arg::from(&col(&t, "dept")),
        ],
    )
    .unwrap();
    let err = run(&select(&t, vec![Arg::from(padded)])).unwrap_err();
    match err {
        TesseraError::UnsupportedArgument {
            node,
            field,
            backend,
        } => {
            assert_eq!((node.as_str(), field.as_str()), ("LPad", "pad"));
            assert_eq!(backend, "engine");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_literal_pad_executes() {
    let t = people();
    let padded = call(
        NodeKind::RPad,
        vec![Arg::from(&col(&t, "dept")), Arg::from(5i64), Arg::from(".")],
    )
    .unwrap();
    let out = run(&select(&t, vec![Arg::from(alias(&padded, "d").unwrap())])).unwrap();
    assert_eq!(strings(&out, "d")[0].as_deref(), Some("eng.."));
}

#[test]
fn test_substring_with_huge_length_runs_to_the_end() {
    let t = people();
    let rest = call(
        NodeKind::Substring,
        vec![Arg::from(&col(&t, "name")), Arg::from(1i64), Arg::from(i64::MAX)],
    )
    .unwrap();
    let out = run(&select(&t, vec![Arg::from(alias(&rest, "rest").unwrap())])).unwrap();
    assert_eq!(
        strings(&out, "rest"),
        vec![Some("nn".to_string()), Some("ob".to_string()), None, Some("ee".to_string())]
    );
}

#[test]
fn test_whole_relation_aggregation_yields_one_row() {
    let t = people();
    let age = col(&t, "age");
    let nobody = binary(NodeKind::Greater, &age, 100i64).unwrap();
    let count = alias(call(NodeKind::Count, vec![Arg::from(&age)]).unwrap(), "n").unwrap();
    let total = alias(call(NodeKind::Sum, vec![Arg::from(&age)]).unwrap(), "total").unwrap();
    let aggregate = |predicates: Vec<Arg>| {
        Node::builder(NodeKind::Aggregation)
            .arg(&t)
            .kwarg(
                "metrics",
                Arg::Seq(vec![Arg::from(&count), Arg::from(&total)]),
            )
            .kwarg("predicates", Arg::Seq(predicates))
            .build()
            .unwrap()
    };

    let out = run(&aggregate(vec![])).unwrap();
    assert_eq!(out.num_rows(), 1);
    assert_eq!(ints(&out, "n"), vec![Some(3)]);
    assert_eq!(ints(&out, "total"), vec![Some(105)]);

    let empty = run(&aggregate(vec![Arg::from(&nobody)])).unwrap();
    assert_eq!(empty.num_rows(), 1);
    assert_eq!(ints(&empty, "n"), vec![Some(0)]);
    assert_eq!(ints(&empty, "total"), vec![None]);
}

#[test]
fn test_grouped_aggregation_names_unaliased_metrics() {
    let t = people();
    let ids = call(NodeKind::Sum, vec![Arg::from(&col(&t, "id"))]).unwrap();
    let node = Node::builder(NodeKind::Aggregation)
        .arg(&t)
        .kwarg("metrics", Arg::Seq(vec![Arg::from(&ids)]))
        .kwarg("by", Arg::Seq(vec![Arg::from(&col(&t, "dept"))]))
        .build()
        .unwrap();
    let expected = tessera_ir::Relational::output_schema(&node)
        .unwrap()
        .column_names()
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>();

    let out = run(&node).unwrap();
    assert_eq!(names(&out), expected);
    assert_eq!(strings(&out, "dept"), vec![Some("eng".into()), Some("ops".into())]);
    assert_eq!(ints(&out, &expected[1]), vec![Some(4), Some(6)]);
}

fn list_lengths(batch: &RecordBatch, name: &str) -> Vec<usize> {
    let lists = column(batch, name).as_any().downcast_ref::<ListArray>().unwrap();
    (0..lists.len()).map(|row| lists.value_length(row) as usize).collect()
}

#[test]
fn test_in_memory_table_joins_catalog_table() {
    let floors = in_memory_table(
        "floors",
        Schema::from_pairs([("dept", DataType::String), ("floor", DataType::Int64)]),
        vec![
            vec![Value::from("eng"), Value::Int64(3)],
            vec![Value::from("ops"), Value::Null],
        ],
    )
    .unwrap();
    assert_eq!(ints(&run(&floors).unwrap(), "floor"), vec![Some(3), None]);

    let p = people();
    let predicate = binary(NodeKind::Equals, &col(&p, "dept"), &col(&floors, "dept")).unwrap();
    let join = Node::builder(NodeKind::InnerJoin)
        .arg(&p)
        .arg(&floors)
        .arg(Arg::Seq(vec![Arg::from(predicate)]))
        .build()
        .unwrap();
    let sorted = Node::builder(NodeKind::Selection)
        .arg(&join)
        .kwarg("sort_keys", vec![sort_key(&col(&join, "id"), true).unwrap()])
        .build()
        .unwrap();
    let out = run(&sorted).unwrap();
    assert_eq!(ints(&out, "floor"), vec![Some(3), None, Some(3), None]);
    assert_eq!(names(&out).last().map(String::as_str), Some("floor"));
}

#[test]
fn test_array_functions_execute() {
    let t = people();
    let pair = call(
        NodeKind::ArrayColumn,
        vec![Arg::from(&col(&t, "id")), Arg::from(&col(&t, "age"))],
    )
    .unwrap();
    let node = select(
        &t,
        vec![
            Arg::from(alias(&pair, "pair").unwrap()),
            Arg::from(alias(unary(NodeKind::ArrayLength, &pair).unwrap(), "n").unwrap()),
            Arg::from(alias(binary(NodeKind::ArrayConcat, &pair, &pair).unwrap(), "twice").unwrap()),
        ],
    );
    let out = run(&node).unwrap();
    assert_eq!(ints(&out, "n"), vec![Some(2); 4]);
    assert_eq!(list_lengths(&out, "twice"), vec![4; 4]);
    let pairs = column(&out, "pair").as_any().downcast_ref::<ListArray>().unwrap();
    let second = pairs.value(1);
    let second = second.as_any().downcast_ref::<Int64Array>().unwrap();
    assert_eq!(second.iter().collect::<Vec<_>>(), vec![Some(2), None]);
}

#[test]
fn test_collect_gathers_each_group() {
    let t = people();
    let names_of = call(NodeKind::ArrayCollect, vec![Arg::from(&col(&t, "name"))]).unwrap();
    let node = Node::builder(NodeKind::Aggregation)
        .arg(&t)
        .kwarg("metrics", vec![alias(&names_of, "names").unwrap()])
        .kwarg("by", vec![col(&t, "dept")])
        .build()
        .unwrap();
    let out = run(&node).unwrap();
    assert_eq!(strings(&out, "dept"), vec![Some("eng".into()), Some("ops".into())]);
    assert_eq!(list_lengths(&out, "names"), vec![1, 2]);
}

#[test]
fn test_atan2_timestamp_parts_and_interval_difference() {
    let t = people();
    let (id, age) = (col(&t, "id"), col(&t, "age"));
    let parts: Vec<Arg> = [2024i64, 2, 29, 12, 30, 15].into_iter().map(Arg::from).collect();
    let days = call(NodeKind::IntervalFromInteger, vec![Arg::from(&age), Arg::from("D")]).unwrap();
    let hours = call(NodeKind::IntervalFromInteger, vec![Arg::from(&id), Arg::from("h")]).unwrap();
    let node = select(
        &t,
        vec![
            Arg::from(alias(binary(NodeKind::Atan2, &age, &age).unwrap(), "angle").unwrap()),
            Arg::from(alias(call(NodeKind::TimestampFromYmdhms, parts).unwrap(), "at").unwrap()),
            Arg::from(alias(binary(NodeKind::IntervalSubtract, &days, &hours).unwrap(), "gap").unwrap()),
        ],
    );
    let out = run(&node).unwrap();

    let angles = column(&out, "angle").as_any().downcast_ref::<Float64Array>().unwrap();
    assert!((angles.value(0) - std::f64::consts::FRAC_PI_4).abs() < 1e-12);
    assert!(angles.is_null(1));

    let at = column(&out, "at").as_any().downcast_ref::<TimestampSecondArray>().unwrap();
    assert_eq!(at.len(), 4);
    assert_eq!(at.value(3), 1_709_209_815);

    // Whole days remain after taking `id` hours off `age` days.
    assert_eq!(ints(&out, "gap"), vec![Some(33), None, Some(18), Some(51)]);
}

#[test]
fn test_filter_sort_and_offset_limit() {
    let t = people();
    let age = col(&t, "age");
    let adults = binary(NodeKind::Greater, &age, 18i64).unwrap();
    let sorted = Node::builder(NodeKind::Selection)
        .arg(&t)
        .kwarg("predicates", Arg::Seq(vec![Arg::from(&adults)]))
        .kwarg(
            "sort_keys",
            Arg::Seq(vec![Arg::from(sort_key(&age, false).unwrap())]),
        )
        .build()
        .unwrap();
    let out = run(&sorted).unwrap();
    assert_eq!(ints(&out, "age"), vec![Some(52), Some(34), Some(19)]);

    let page = Node::builder(NodeKind::Limit)
        .arg(&sorted)
        .arg(1i64)
        .kwarg("offset", 1i64)
        .build()
        .unwrap();
    assert_eq!(ints(&run(&page).unwrap(), "id"), vec![Some(1)]);
}

#[test]
fn test_dropna_policies() {
    let t = people();
    let any = Node::builder(NodeKind::DropNa).arg(&t).build().unwrap();
    assert_eq!(ints(&run(&any).unwrap(), "id"), vec![Some(1), Some(4)]);

    let by_name = Node::builder(NodeKind::DropNa)
        .arg(&t)
        .kwarg("subset", Arg::Seq(vec![Arg::from(&col(&t, "name"))]))
        .build()
        .unwrap();
    assert_eq!(
        ints(&run(&by_name).unwrap(), "id"),
        vec![Some(1), Some(2), Some(4)]
    );

    let empty_subset = Node::builder(NodeKind::DropNa)
        .arg(&t)
        .kwarg("subset", Arg::Seq(vec![]))
        .build()
        .unwrap();
    assert_eq!(run(&empty_subset).unwrap().num_rows(), 4);

    let all = Node::builder(NodeKind::DropNa)
        .arg(&t)
        .kwarg("how", "all")
        .build()
        .unwrap();
    assert!(matches!(
        run(&all),
        Err(TesseraError::UnsupportedArgument { .. })
    ));
}

#[test]
fn test_fillna_by_column_and_by_scalar() {
    let t = people();
    let by_column = Node::builder(NodeKind::FillNa)
        .arg(&t)
        .arg(Arg::Map(vec![("name".to_string(), Arg::from("?"))]))
        .build()
        .unwrap();
    let out = run(&by_column).unwrap();
    assert_eq!(strings(&out, "name")[2].as_deref(), Some("?"));
    assert_eq!(ints(&out, "age")[1], None);
    assert_eq!(names(&out), names(&people_batch()));

    let scalar = Node::builder(NodeKind::FillNa)
        .arg(&t)
        .arg(0i64)
        .build()
        .unwrap();
    let out = run(&scalar).unwrap();
    assert_eq!(ints(&out, "age"), vec![Some(34), Some(0), Some(19), Some(52)]);
    assert_eq!(strings(&out, "name")[2], None);

    let unknown = Node::builder(NodeKind::FillNa)
        .arg(&t)
        .arg(Arg::Map(vec![("salary".to_string(), Arg::from(0i64))]))
        .build()
        .unwrap();
    assert!(matches!(run(&unknown), Err(TesseraError::Translation(_))));
}

#[test]
fn test_non_equality_join_is_a_translation_error() {
    let (p, o) = (people(), orders());
    let predicate = binary(NodeKind::GreaterEqual, &col(&p, "id"), &col(&o, "id")).unwrap();
    let join = Node::builder(NodeKind::InnerJoin)
        .arg(&p)
        .arg(&o)
        .arg(Arg::Seq(vec![Arg::from(predicate)]))
        .build()
        .unwrap();
    assert!(matches!(run(&join), Err(TesseraError::Translation(_))));
}

#[test]
fn test_null_join_keys_follow_catalog_config() {
    let t = people();
    let other = database_table("people2", people_schema()).unwrap();
    let predicate = binary(NodeKind::Equals, &col(&t, "age"), &col(&other, "age")).unwrap();
    let join = Node::builder(NodeKind::InnerJoin)
        .arg(&t)
        .arg(&other)
        .arg(Arg::Seq(vec![Arg::from(predicate)]))
        .build()
        .unwrap();

    let config = TesseraConfig {
        engine: EngineConfig {
            null_join_keys_match: true,
        },
        ..TesseraConfig::default()
    };
    let compiler = EngineCompiler::new(config);
    let mut catalog = compiler.catalog();
    catalog.register("people", people_batch());
    catalog.register("people2", people_batch());
    assert_eq!(compiler.execute(&join, &catalog).unwrap().num_rows(), 4);

    let mut strict = Catalog::new();
    strict.register("people", people_batch());
    strict.register("people2", people_batch());
    assert_eq!(
        EngineCompiler::default().execute(&join, &strict).unwrap().num_rows(),
        3
    );
}

proptest! {
    #[test]
    fn prop_filter_keeps_exactly_matching_rows(
        ages in prop::collection::vec(prop::option::of(-50i64..50), 0..40),
        threshold in -60i64..60,
    ) {
        let schema = Schema::from_pairs([("age", DataType::Int64)]);
        let table = database_table("t", schema.clone()).unwrap();
        let batch = RecordBatch::try_new(
            Arc::new(to_arrow_schema(&schema)),
            vec![Arc::new(Int64Array::from(ages.clone())) as ArrayRef],
        )
        .unwrap();
        let mut catalog = Catalog::new();
        catalog.register("t", batch);

        let predicate =
            binary(NodeKind::Greater, &table_column(&table, "age").unwrap(), threshold).unwrap();
        let node = Node::builder(NodeKind::Selection)
            .arg(&table)
            .kwarg("predicates", Arg::Seq(vec![Arg::from(predicate)]))
            .build()
            .unwrap();
        let out = EngineCompiler::default().execute(&node, &catalog).unwrap();

        let expected = ages.iter().flatten().filter(|age| **age > threshold).count();
        prop_assert_eq!(out.num_rows(), expected);
    }
}
