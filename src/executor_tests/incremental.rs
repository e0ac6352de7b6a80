use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use futures::StreamExt as _;
use pretty_assertions::assert_eq;

use crate::{
    ast::{InputValue, Selection, Type},
    executor::{execute, ExecutionArgs, PathSegment, Response, ResponsePayload},
    graphql_value,
    meta::{Field as FieldMeta, ObjectMeta},
    resolve::ResolvedValue,
    SchemaType, Value,
};

use super::support::*;

fn int_field(name: &str, value: i32) -> FieldMeta<S> {
    FieldMeta::new(name, Type::named("Int"))
        .resolver(move |_, _, _, _| Ok(ResolvedValue::ready(value)))
}

fn defer_dir() -> Vec<crate::ast::Spanning<crate::ast::Directive<S>>> {
    vec![directive("defer", vec![])]
}

#[tokio::test]
async fn deferred_fragment_arrives_after_initial_payload() {
    let schema = query_schema(vec![int_field("a", 1), int_field("b", 2)]);
    let doc = query_doc(vec![
        field("a"),
        inline(None, defer_dir(), vec![field("b")]),
    ]);

    let payloads = collect_payloads(&schema, &doc).await;

    assert_eq!(payloads.len(), 2);
    let initial = payloads[0].as_initial().expect("initial payload first");
    assert_eq!(initial.data, Some(graphql_value!({"a": 1})));
    assert_eq!(initial.has_next, Some(true));

    let patch = payloads[1].as_patch().expect("patch payload second");
    assert_eq!(patch.data, Some(graphql_value!({"b": 2})));
    assert_eq!(patch.path, Some(vec![]));
    assert_eq!(patch.label, None);
    assert!(!patch.has_next);
}

#[tokio::test]
async fn deferred_fragment_labels_are_reported() {
    let schema = query_schema(vec![int_field("a", 1), int_field("b", 2)]);
    let doc = query_doc(vec![
        field("a"),
        inline(
            None,
            vec![directive(
                "defer",
                vec![("label", InputValue::scalar("slow"))],
            )],
            vec![field("b")],
        ),
    ]);

    let payloads = collect_payloads(&schema, &doc).await;

    let patch = payloads[1].as_patch().expect("patch payload");
    assert_eq!(patch.label.as_deref(), Some("slow"));
}

#[tokio::test]
async fn defer_disabled_with_if_false_stays_inline() {
    let schema = query_schema(vec![int_field("a", 1), int_field("b", 2)]);
    let doc = query_doc(vec![
        field("a"),
        inline(
            None,
            vec![directive("defer", vec![("if", InputValue::scalar(false))])],
            vec![field("b")],
        ),
    ]);

    let result = run_sync(&schema, &doc);
    assert_eq!(result.data, Some(graphql_value!({"a": 1, "b": 2})));
    assert_eq!(result.has_next, None);
}

#[tokio::test]
async fn nested_deferred_patches_respect_parent_order() {
    let obj = ObjectMeta::new("Obj", vec![int_field("c", 3)]);
    let query = ObjectMeta::new(
        "Query",
        vec![
            int_field("a", 1),
            int_field("b", 2),
            FieldMeta::new("obj", Type::named("Obj"))
                .resolver(|_, _, _, _| Ok(ResolvedValue::ready(graphql_value!({})))),
        ],
    );
    let schema: SchemaType<S> = SchemaType::new(
        vec![obj.into_meta(), query.into_meta()],
        "Query",
        None,
        None,
    )
    .unwrap();
    let doc = query_doc(vec![
        field("a"),
        inline(
            None,
            defer_dir(),
            vec![
                field("b"),
                field_with(
                    "obj",
                    vec![inline(None, defer_dir(), vec![field("c")])],
                ),
            ],
        ),
    ]);

    let payloads = collect_payloads(&schema, &doc).await;

    assert_eq!(payloads.len(), 3);
    let outer = payloads[1].as_patch().expect("outer patch");
    assert_eq!(outer.data, Some(graphql_value!({"b": 2, "obj": {}})));
    assert_eq!(outer.path, Some(vec![]));
    assert!(outer.has_next);

    let inner = payloads[2].as_patch().expect("inner patch");
    assert_eq!(inner.data, Some(graphql_value!({"c": 3})));
    assert_eq!(
        inner.path,
        Some(vec![PathSegment::Field("obj".into())]),
    );
    assert!(!inner.has_next);

    // The parent patch's path is a prefix of its child's.
    let outer_path = outer.path.as_ref().unwrap();
    let inner_path = inner.path.as_ref().unwrap();
    assert!(inner_path.starts_with(outer_path));
}

#[tokio::test]
async fn deferred_errors_attach_to_the_patch() {
    let schema = query_schema(vec![
        int_field("a", 1),
        FieldMeta::new("boom", Type::non_null_named("Int"))
            .resolver(|_, _, _, _| Err("kaput".into())),
    ]);
    let doc = query_doc(vec![
        field("a"),
        inline(None, defer_dir(), vec![field("boom")]),
    ]);

    let payloads = collect_payloads(&schema, &doc).await;

    let initial = payloads[0].as_initial().expect("initial payload");
    assert_eq!(initial.errors, None);
    assert_eq!(initial.data, Some(graphql_value!({"a": 1})));

    let patch = payloads[1].as_patch().expect("patch payload");
    assert_eq!(patch.data, Some(Value::Null));
    let errors = patch.errors.as_ref().expect("patch errors");
    assert_eq!(errors[0].error().message(), "kaput");
    assert_eq!(errors[0].path(), [PathSegment::Field("boom".into())]);
}

fn list_schema(items: Vec<i32>) -> SchemaType<S> {
    query_schema(vec![FieldMeta::new(
        "list",
        Type::list(Type::named("Int")),
    )
    .resolver(move |_, _, _, _| {
        Ok(ResolvedValue::ready(Value::list(
            items.iter().copied().map(Value::scalar).collect(),
        )))
    })])
}

fn stream_field(initial_count: i32) -> Selection {
    field_full(
        None,
        "list",
        vec![],
        vec![directive(
            "stream",
            vec![("initialCount", InputValue::scalar(initial_count))],
        )],
        None,
    )
}

#[tokio::test]
async fn streamed_list_yields_items_beyond_initial_count() {
    let schema = list_schema(vec![10, 20, 30, 40]);
    let doc = query_doc(vec![stream_field(2)]);

    let payloads = collect_payloads(&schema, &doc).await;

    assert_eq!(payloads.len(), 3);
    let initial = payloads[0].as_initial().expect("initial payload");
    assert_eq!(initial.data, Some(graphql_value!({"list": [10, 20]})));
    assert_eq!(initial.has_next, Some(true));

    let third = payloads[1].as_patch().expect("first streamed patch");
    assert_eq!(third.data, Some(graphql_value!(30)));
    assert_eq!(
        third.path,
        Some(vec![PathSegment::Field("list".into()), PathSegment::Index(2)]),
    );
    assert!(third.has_next);

    let fourth = payloads[2].as_patch().expect("second streamed patch");
    assert_eq!(fourth.data, Some(graphql_value!(40)));
    assert_eq!(
        fourth.path,
        Some(vec![PathSegment::Field("list".into()), PathSegment::Index(3)]),
    );
    assert!(!fourth.has_next);
}

#[tokio::test]
async fn streamed_non_null_item_error_bubbles_into_its_patch() {
    let schema = query_schema(vec![FieldMeta::new(
        "list",
        Type::list(Type::non_null_named("Int")),
    )
    .resolver(|_, _, _, _| Ok(ResolvedValue::ready(graphql_value!([1, 2, null, 4]))))]);
    let doc = query_doc(vec![stream_field(2)]);

    let payloads = collect_payloads(&schema, &doc).await;

    assert_eq!(payloads.len(), 3);
    let initial = payloads[0].as_initial().expect("initial payload");
    assert_eq!(initial.data, Some(graphql_value!({"list": [1, 2]})));
    assert_eq!(initial.errors, None);

    let failed = payloads[1].as_patch().expect("patch for index 2");
    assert_eq!(failed.data, Some(Value::Null));
    let errors = failed.errors.as_ref().expect("patch errors");
    assert_eq!(
        errors[0].error().message(),
        "Cannot return null for non-nullable field Query.list.",
    );
    assert_eq!(
        errors[0].path(),
        [PathSegment::Field("list".into()), PathSegment::Index(2)],
    );
    assert!(failed.has_next);

    let fourth = payloads[2].as_patch().expect("patch for index 3");
    assert_eq!(fourth.data, Some(graphql_value!(4)));
    assert_eq!(fourth.errors, None);
    assert!(!fourth.has_next);
}

#[tokio::test]
async fn async_streamed_non_null_item_error_bubbles_into_its_patch() {
    let schema = query_schema(vec![FieldMeta::new(
        "list",
        Type::list(Type::non_null_named("Int")),
    )
    .resolver(|_, _, _, _| {
        Ok(ResolvedValue::stream(futures::stream::iter(vec![
            Ok(ResolvedValue::ready(1)),
            Ok(ResolvedValue::null()),
            Ok(ResolvedValue::ready(3)),
        ])))
    })]);
    let doc = query_doc(vec![stream_field(1)]);

    let payloads = collect_payloads(&schema, &doc).await;

    assert_eq!(payloads.len(), 4);
    let initial = payloads[0].as_initial().expect("initial payload");
    assert_eq!(initial.data, Some(graphql_value!({"list": [1]})));

    let failed = payloads[1].as_patch().expect("patch for index 1");
    assert_eq!(failed.data, Some(Value::Null));
    let errors = failed.errors.as_ref().expect("patch errors");
    assert_eq!(
        errors[0].error().message(),
        "Cannot return null for non-nullable field Query.list.",
    );
    assert_eq!(
        errors[0].path(),
        [PathSegment::Field("list".into()), PathSegment::Index(1)],
    );
    assert!(failed.has_next);

    let third = payloads[2].as_patch().expect("patch for index 2");
    assert_eq!(third.data, Some(graphql_value!(3)));

    let terminal = payloads[3].as_patch().expect("terminal payload");
    assert!(!terminal.has_next);
}

#[tokio::test]
async fn streamed_patch_indices_strictly_increase() {
    let schema = list_schema((0..8).collect());
    let doc = query_doc(vec![stream_field(3)]);

    let payloads = collect_payloads(&schema, &doc).await;

    let indices: Vec<_> = payloads
        .iter()
        .filter_map(|p| p.as_patch())
        .filter_map(|p| p.path.as_ref())
        .filter_map(|path| match path.last() {
            Some(PathSegment::Index(i)) => Some(*i),
            _ => None,
        })
        .collect();
    assert_eq!(indices, [3, 4, 5, 6, 7]);
}

#[tokio::test]
async fn stream_disabled_with_if_false_stays_inline() {
    let schema = list_schema(vec![1, 2, 3]);
    let doc = query_doc(vec![field_full(
        None,
        "list",
        vec![],
        vec![directive(
            "stream",
            vec![
                ("if", InputValue::scalar(false)),
                ("initialCount", InputValue::scalar(1)),
            ],
        )],
        None,
    )]);

    let result = run(&schema, &doc).await;
    assert_eq!(result.data, Some(graphql_value!({"list": [1, 2, 3]})));
}

#[tokio::test]
async fn negative_initial_count_is_a_field_error() {
    let schema = list_schema(vec![1, 2, 3]);
    let doc = query_doc(vec![field_full(
        None,
        "list",
        vec![],
        vec![directive(
            "stream",
            vec![("initialCount", InputValue::scalar(-1))],
        )],
        None,
    )]);

    let result = run(&schema, &doc).await;

    assert_eq!(result.data, Some(graphql_value!({"list": null})));
    assert_eq!(
        result.errors.expect("errors present")[0].error().message(),
        "initialCount must be a non-negative integer",
    );
}

fn async_list_schema(items: Vec<i32>) -> SchemaType<S> {
    query_schema(vec![FieldMeta::new(
        "list",
        Type::list(Type::named("Int")),
    )
    .resolver(move |_, _, _, _| {
        let items = items.clone();
        Ok(ResolvedValue::stream(futures::stream::iter(
            items.into_iter().map(|i| Ok(ResolvedValue::ready(i))),
        )))
    })])
}

#[tokio::test]
async fn async_iterator_streams_one_payload_per_item() {
    let schema = async_list_schema(vec![10, 20, 30]);
    let doc = query_doc(vec![stream_field(1)]);

    let payloads = collect_payloads(&schema, &doc).await;

    // Initial prefix, one patch per remaining item, and the standalone
    // terminal payload produced when the exhausted iterator is discovered.
    assert_eq!(payloads.len(), 4);
    let initial = payloads[0].as_initial().expect("initial payload");
    assert_eq!(initial.data, Some(graphql_value!({"list": [10]})));

    let second = payloads[1].as_patch().expect("patch for index 1");
    assert_eq!(second.data, Some(graphql_value!(20)));
    assert_eq!(
        second.path,
        Some(vec![PathSegment::Field("list".into()), PathSegment::Index(1)]),
    );
    assert!(second.has_next);

    let third = payloads[2].as_patch().expect("patch for index 2");
    assert_eq!(third.data, Some(graphql_value!(30)));
    assert!(third.has_next);

    let terminal = payloads[3].as_patch().expect("terminal payload");
    assert_eq!(terminal.data, None);
    assert_eq!(terminal.path, None);
    assert!(!terminal.has_next);
}

#[tokio::test]
async fn async_iterator_without_stream_directive_drains_fully() {
    let schema = async_list_schema(vec![1, 2, 3]);
    let doc = query_doc(vec![field("list")]);

    let result = run(&schema, &doc).await;
    assert_eq!(result.errors, None);
    assert_eq!(result.data, Some(graphql_value!({"list": [1, 2, 3]})));
}

#[tokio::test]
async fn non_iterable_value_for_list_field_raises() {
    let schema = query_schema(vec![FieldMeta::new(
        "list",
        Type::list(Type::named("Int")),
    )
    .resolver(|_, _, _, _| Ok(ResolvedValue::ready(1)))]);
    let doc = query_doc(vec![field("list")]);

    let result = run(&schema, &doc).await;

    assert_eq!(result.data, Some(graphql_value!({"list": null})));
    assert_eq!(
        result.errors.expect("errors present")[0].error().message(),
        "Expected Iterable, but did not find one for field `Query.list`.",
    );
}

struct DropCounter(Arc<AtomicUsize>);

impl Drop for DropCounter {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn dropping_the_yielder_cancels_the_source_iterator() {
    let drops = Arc::new(AtomicUsize::new(0));
    let drops_in_resolver = Arc::clone(&drops);

    let schema = query_schema(vec![FieldMeta::new(
        "list",
        Type::list(Type::named("Int")),
    )
    .resolver(move |_, _, _, _| {
        let guard = DropCounter(Arc::clone(&drops_in_resolver));
        Ok(ResolvedValue::stream(
            futures::stream::iter((0..100).map(|i| Ok(ResolvedValue::ready(i)))).map(
                move |item| {
                    let _held = &guard;
                    item
                },
            ),
        ))
    })]);
    let doc = query_doc(vec![stream_field(1)]);

    let mut payloads = match execute(ExecutionArgs::new(&schema, &doc)).await {
        Response::Incremental(stream) => stream,
        Response::Single(..) => panic!("expected an incremental response"),
    };

    let initial = payloads.next().await.expect("initial payload");
    assert!(matches!(initial, ResponsePayload::Initial(..)));
    assert_eq!(drops.load(Ordering::SeqCst), 0);

    drop(payloads);
    assert_eq!(drops.load(Ordering::SeqCst), 1);
}
