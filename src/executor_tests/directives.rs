use pretty_assertions::assert_eq;

use crate::{
    ast::{InputValue, OperationType, Type},
    graphql_value, graphql_vars,
    meta::Field as FieldMeta,
    resolve::ResolvedValue,
};

use super::support::*;

fn schema() -> crate::SchemaType<S> {
    query_schema(vec![
        FieldMeta::new("a", Type::named("Int")).resolver(|_, _, _, _| Ok(ResolvedValue::ready(1))),
        FieldMeta::new("b", Type::named("Int")).resolver(|_, _, _, _| Ok(ResolvedValue::ready(2))),
    ])
}

#[test]
fn skip_true_removes_field() {
    let doc = query_doc(vec![
        field("a"),
        field_full(
            None,
            "b",
            vec![],
            vec![directive("skip", vec![("if", InputValue::scalar(true))])],
            None,
        ),
    ]);

    let result = run_sync(&schema(), &doc);
    assert_eq!(result.data, Some(graphql_value!({"a": 1})));
}

#[test]
fn skip_false_keeps_field() {
    let doc = query_doc(vec![
        field("a"),
        field_full(
            None,
            "b",
            vec![],
            vec![directive("skip", vec![("if", InputValue::scalar(false))])],
            None,
        ),
    ]);

    let result = run_sync(&schema(), &doc);
    assert_eq!(result.data, Some(graphql_value!({"a": 1, "b": 2})));
}

#[test]
fn include_false_removes_field() {
    let doc = query_doc(vec![
        field("a"),
        field_full(
            None,
            "b",
            vec![],
            vec![directive("include", vec![("if", InputValue::scalar(false))])],
            None,
        ),
    ]);

    let result = run_sync(&schema(), &doc);
    assert_eq!(result.data, Some(graphql_value!({"a": 1})));
}

#[test]
fn include_condition_resolves_variables() {
    let doc = vec![named_operation(
        "Q",
        OperationType::Query,
        vec![("cond", Type::non_null_named("Boolean"), None)],
        vec![
            field("a"),
            field_full(
                None,
                "b",
                vec![],
                vec![directive("include", vec![("if", InputValue::variable("cond"))])],
                None,
            ),
        ],
    )];

    let included = run_sync_with_vars(&schema(), &doc, &graphql_vars! {"cond": true});
    assert_eq!(included.data, Some(graphql_value!({"a": 1, "b": 2})));

    let excluded = run_sync_with_vars(&schema(), &doc, &graphql_vars! {"cond": false});
    assert_eq!(excluded.data, Some(graphql_value!({"a": 1})));
}

#[test]
fn skip_applies_to_fragment_spreads() {
    let doc = vec![
        operation(
            OperationType::Query,
            vec![
                field("a"),
                spread(
                    "rest",
                    vec![directive("skip", vec![("if", InputValue::scalar(true))])],
                ),
            ],
        ),
        fragment_def("rest", "Query", vec![field("b")]),
    ];

    let result = run_sync(&schema(), &doc);
    assert_eq!(result.data, Some(graphql_value!({"a": 1})));
}

#[test]
fn include_applies_to_inline_fragments() {
    let doc = query_doc(vec![
        field("a"),
        inline(
            Some("Query"),
            vec![directive("include", vec![("if", InputValue::scalar(false))])],
            vec![field("b")],
        ),
    ]);

    let result = run_sync(&schema(), &doc);
    assert_eq!(result.data, Some(graphql_value!({"a": 1})));
}
