use pretty_assertions::assert_eq;

use crate::{
    ast::{InputValue, OperationType, Type},
    graphql_value, graphql_vars,
    meta::{Argument, EnumMeta, EnumValue, Field as FieldMeta, InputObjectMeta, ObjectMeta},
    resolve::ResolvedValue,
    SchemaType, Value, Variables,
};

use super::support::*;

/// A schema whose single field echoes its `x` argument back as a string.
fn echo_schema() -> SchemaType<S> {
    query_schema(vec![FieldMeta::new("echo", Type::named("String"))
        .argument(Argument::new("x", Type::named("Int")))
        .resolver(|_, args, _, _| {
            Ok(ResolvedValue::ready(Value::scalar(
                args.get("x")
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "<absent>".into()),
            )))
        })])
}

fn echo_doc(var_type: Type, default: Option<InputValue<S>>) -> Vec<crate::ast::Definition<S>> {
    vec![named_operation(
        "Q",
        OperationType::Query,
        vec![("x", var_type, default)],
        vec![field_args("echo", vec![("x", InputValue::variable("x"))])],
    )]
}

#[test]
fn provided_variable_is_substituted() {
    let result = run_sync_with_vars(
        &echo_schema(),
        &echo_doc(Type::named("Int"), None),
        &graphql_vars! {"x": 42},
    );
    assert_eq!(result.errors, None);
    assert_eq!(result.data, Some(graphql_value!({"echo": "42"})));
}

#[test]
fn default_value_fills_missing_variable() {
    let result = run_sync_with_vars(
        &echo_schema(),
        &echo_doc(Type::named("Int"), Some(InputValue::scalar(7))),
        &Variables::new(),
    );
    assert_eq!(result.data, Some(graphql_value!({"echo": "7"})));
}

#[test]
fn missing_required_variable_is_a_request_error() {
    let result = run_sync_with_vars(
        &echo_schema(),
        &echo_doc(Type::non_null_named("Int"), None),
        &Variables::new(),
    );

    assert_eq!(result.data, None);
    let errors = result.errors.expect("errors present");
    assert_eq!(
        errors[0].error().message(),
        "Variable \"$x\" of required type \"Int!\" was not provided.",
    );
}

#[test]
fn null_for_non_null_variable_is_a_request_error() {
    let result = run_sync_with_vars(
        &echo_schema(),
        &echo_doc(Type::non_null_named("Int"), None),
        &graphql_vars! {"x": null},
    );

    assert_eq!(result.data, None);
    assert_eq!(
        result.errors.expect("errors present")[0].error().message(),
        "Variable \"$x\" of non-null type \"Int!\" must not be null.",
    );
}

#[test]
fn mistyped_variable_is_a_request_error() {
    let result = run_sync_with_vars(
        &echo_schema(),
        &echo_doc(Type::named("Int"), None),
        &graphql_vars! {"x": "not an int"},
    );

    assert_eq!(result.data, None);
    let errors = result.errors.expect("errors present");
    assert!(errors[0]
        .error()
        .message()
        .starts_with("Variable \"$x\" got invalid value"));
}

#[test]
fn single_value_coerces_to_list() {
    let schema = query_schema(vec![FieldMeta::new("echo", Type::named("String"))
        .argument(Argument::new("x", Type::list(Type::named("Int"))))
        .resolver(|_, args, _, _| {
            Ok(ResolvedValue::ready(Value::scalar(
                args.get("x").map(|v| v.to_string()).unwrap_or_default(),
            )))
        })]);
    let doc = vec![named_operation(
        "Q",
        OperationType::Query,
        vec![("x", Type::list(Type::named("Int")), None)],
        vec![field_args("echo", vec![("x", InputValue::variable("x"))])],
    )];

    let result = run_sync_with_vars(&schema, &doc, &graphql_vars! {"x": 3});
    assert_eq!(result.data, Some(graphql_value!({"echo": "[3]"})));
}

#[test]
fn enum_variables_accept_external_names() {
    let color = EnumMeta::new(
        "Color",
        vec![EnumValue::new("RED"), EnumValue::new("GREEN")],
    );
    let query = ObjectMeta::new(
        "Query",
        vec![FieldMeta::new("echo", Type::named("String"))
            .argument(Argument::new("c", Type::named("Color")))
            .resolver(|_, args, _, _| {
                Ok(ResolvedValue::ready(Value::scalar(
                    args.get("c")
                        .and_then(InputValue::as_enum_value)
                        .unwrap_or("<none>")
                        .to_owned(),
                )))
            })],
    );
    let schema: SchemaType<S> = SchemaType::new(
        vec![color.into_meta(), query.into_meta()],
        "Query",
        None,
        None,
    )
    .unwrap();
    let doc = vec![named_operation(
        "Q",
        OperationType::Query,
        vec![("c", Type::named("Color"), None)],
        vec![field_args("echo", vec![("c", InputValue::variable("c"))])],
    )];

    let ok = run_sync_with_vars(&schema, &doc, &graphql_vars! {"c": "RED"});
    assert_eq!(ok.data, Some(graphql_value!({"echo": "RED"})));

    let bad = run_sync_with_vars(&schema, &doc, &graphql_vars! {"c": "BLUE"});
    assert_eq!(bad.data, None);
    assert!(bad.errors.expect("errors present")[0]
        .error()
        .message()
        .contains("does not exist in \"Color\" enum"));
}

#[test]
fn input_objects_reject_unknown_fields() {
    let point = InputObjectMeta::new(
        "Point",
        vec![
            Argument::new("x", Type::non_null_named("Int")),
            Argument::new("y", Type::named("Int")).default_value(InputValue::scalar(0)),
        ],
    );
    let query = ObjectMeta::new(
        "Query",
        vec![FieldMeta::new("echo", Type::named("String"))
            .argument(Argument::new("p", Type::named("Point")))
            .resolver(|_, args, _, _| {
                Ok(ResolvedValue::ready(Value::scalar(
                    args.get("p").map(|v| v.to_string()).unwrap_or_default(),
                )))
            })],
    );
    let schema: SchemaType<S> = SchemaType::new(
        vec![point.into_meta(), query.into_meta()],
        "Query",
        None,
        None,
    )
    .unwrap();
    let doc = vec![named_operation(
        "Q",
        OperationType::Query,
        vec![("p", Type::named("Point"), None)],
        vec![field_args("echo", vec![("p", InputValue::variable("p"))])],
    )];

    // Defaults fill omitted fields.
    let ok = run_sync_with_vars(&schema, &doc, &graphql_vars! {"p": {"x": 1}});
    assert_eq!(ok.data, Some(graphql_value!({"echo": "{x: 1, y: 0}"})));

    let unknown = run_sync_with_vars(&schema, &doc, &graphql_vars! {"p": {"x": 1, "z": 2}});
    assert_eq!(unknown.data, None);
    assert!(unknown.errors.expect("errors present")[0]
        .error()
        .message()
        .contains("\"z\" is not defined by type \"Point\""));

    let missing = run_sync_with_vars(&schema, &doc, &graphql_vars! {"p": {"y": 2}});
    assert_eq!(missing.data, None);
    assert!(missing.errors.expect("errors present")[0]
        .error()
        .message()
        .contains("Field \"x\" of required type \"Int!\" was not provided."));
}

#[test]
fn argument_defaults_apply_without_query_arguments() {
    let schema = query_schema(vec![FieldMeta::new("echo", Type::named("String"))
        .argument(Argument::new("x", Type::named("Int")).default_value(InputValue::scalar(5)))
        .resolver(|_, args, _, _| {
            Ok(ResolvedValue::ready(Value::scalar(
                args.get("x").map(|v| v.to_string()).unwrap_or_default(),
            )))
        })]);
    let doc = query_doc(vec![field("echo")]);

    let result = run_sync(&schema, &doc);
    assert_eq!(result.data, Some(graphql_value!({"echo": "5"})));
}

#[test]
fn missing_required_argument_is_a_field_error() {
    let schema = query_schema(vec![FieldMeta::new("echo", Type::named("String"))
        .argument(Argument::new("x", Type::non_null_named("Int")))
        .resolver(|_, _, _, _| Ok(ResolvedValue::ready("unreachable")))]);
    let doc = query_doc(vec![field("echo")]);

    let result = run_sync(&schema, &doc);

    assert_eq!(result.data, Some(graphql_value!({"echo": null})));
    assert_eq!(
        result.errors.expect("errors present")[0].error().message(),
        "Argument \"x\" of required type \"Int!\" was not provided.",
    );
}
