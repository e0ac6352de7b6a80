use pretty_assertions::assert_eq;

use crate::{
    graphql_value,
    ast::Type,
    meta::{Field as FieldMeta, InterfaceMeta, ObjectMeta, UnionMeta},
    resolve::{Deferrable, ResolvedValue},
    SchemaType, Value,
};

use super::support::*;

fn node_schema() -> SchemaType<S> {
    let node = InterfaceMeta::new(
        "Node",
        vec![FieldMeta::new("name", Type::named("String"))],
    );
    let user = ObjectMeta::new(
        "User",
        vec![FieldMeta::new("name", Type::named("String"))],
    )
    .interfaces(&["Node"]);
    let query = ObjectMeta::new(
        "Query",
        vec![FieldMeta::new("node", Type::named("Node")).resolver(|_, _, _, _| {
            Ok(ResolvedValue::ready(graphql_value!({
                "__typename": "User",
                "name": "Ada",
            })))
        })],
    );
    SchemaType::new(
        vec![node.into_meta(), user.into_meta(), query.into_meta()],
        "Query",
        None,
        None,
    )
    .unwrap()
}

#[test]
fn interface_resolves_concrete_type_from_typename() {
    let schema = node_schema();
    let doc = query_doc(vec![field_with(
        "node",
        vec![inline(Some("User"), vec![], vec![field("name")])],
    )]);

    let result = run_sync(&schema, &doc);

    assert_eq!(result.errors, None);
    assert_eq!(result.data, Some(graphql_value!({"node": {"name": "Ada"}})));
}

#[test]
fn typename_meta_field_reports_runtime_type() {
    let schema = node_schema();
    let doc = query_doc(vec![field_with(
        "node",
        vec![field("__typename"), inline(Some("User"), vec![], vec![field("name")])],
    )]);

    let result = run_sync(&schema, &doc);

    assert_eq!(
        result.data,
        Some(graphql_value!({"node": {"__typename": "User", "name": "Ada"}})),
    );
}

#[test]
fn interface_fields_resolve_without_type_condition() {
    let schema = node_schema();
    let doc = query_doc(vec![field_with("node", vec![field("name")])]);

    let result = run_sync(&schema, &doc);

    assert_eq!(result.data, Some(graphql_value!({"node": {"name": "Ada"}})));
}

#[test]
fn union_resolves_through_is_type_of() {
    let cat = ObjectMeta::new(
        "Cat",
        vec![FieldMeta::new("meows", Type::named("Boolean"))],
    )
    .is_type_of(|value, _| {
        Deferrable::Value(
            value
                .as_object_value()
                .map(|o| o.contains_field("meows"))
                .unwrap_or(false),
        )
    });
    let dog = ObjectMeta::new(
        "Dog",
        vec![FieldMeta::new("barks", Type::named("Boolean"))],
    )
    .is_type_of(|value, _| {
        Deferrable::Value(
            value
                .as_object_value()
                .map(|o| o.contains_field("barks"))
                .unwrap_or(false),
        )
    });
    let pet = UnionMeta::new("Pet", &["Cat", "Dog"]);
    let query = ObjectMeta::new(
        "Query",
        vec![FieldMeta::new("pet", Type::named("Pet")).resolver(|_, _, _, _| {
            Ok(ResolvedValue::ready(graphql_value!({"barks": true})))
        })],
    );
    let schema: SchemaType<S> = SchemaType::new(
        vec![
            cat.into_meta(),
            dog.into_meta(),
            pet.into_meta(),
            query.into_meta(),
        ],
        "Query",
        None,
        None,
    )
    .unwrap();

    let doc = query_doc(vec![field_with(
        "pet",
        vec![
            inline(Some("Cat"), vec![], vec![field("meows")]),
            inline(Some("Dog"), vec![], vec![field("barks")]),
        ],
    )]);

    let result = run_sync(&schema, &doc);

    assert_eq!(result.errors, None);
    assert_eq!(result.data, Some(graphql_value!({"pet": {"barks": true}})));
}

#[test]
fn unresolvable_abstract_type_raises() {
    let node = InterfaceMeta::new(
        "Node",
        vec![FieldMeta::new("name", Type::named("String"))],
    );
    let user = ObjectMeta::new(
        "User",
        vec![FieldMeta::new("name", Type::named("String"))],
    )
    .interfaces(&["Node"]);
    let query = ObjectMeta::new(
        "Query",
        vec![FieldMeta::new("node", Type::named("Node"))
            .resolver(|_, _, _, _| Ok(ResolvedValue::ready(graphql_value!({"name": "Ada"}))))],
    );
    let schema: SchemaType<S> = SchemaType::new(
        vec![node.into_meta(), user.into_meta(), query.into_meta()],
        "Query",
        None,
        None,
    )
    .unwrap();
    let doc = query_doc(vec![field_with("node", vec![field("name")])]);

    let result = run_sync(&schema, &doc);

    assert_eq!(result.data, Some(graphql_value!({"node": null})));
    let errors = result.errors.expect("errors present");
    assert!(errors[0]
        .error()
        .message()
        .contains("Abstract type `Node` must resolve to an Object type at runtime"));
}

#[test]
fn runtime_type_must_exist_in_schema() {
    let node = InterfaceMeta::new(
        "Node",
        vec![FieldMeta::new("name", Type::named("String"))],
    );
    let user = ObjectMeta::new(
        "User",
        vec![FieldMeta::new("name", Type::named("String"))],
    )
    .interfaces(&["Node"]);
    let query = ObjectMeta::new(
        "Query",
        vec![FieldMeta::new("node", Type::named("Node")).resolver(|_, _, _, _| {
            Ok(ResolvedValue::ready(graphql_value!({
                "__typename": "Ghost",
                "name": "Ada",
            })))
        })],
    );
    let schema: SchemaType<S> = SchemaType::new(
        vec![node.into_meta(), user.into_meta(), query.into_meta()],
        "Query",
        None,
        None,
    )
    .unwrap();
    let doc = query_doc(vec![field_with("node", vec![field("name")])]);

    let result = run_sync(&schema, &doc);

    assert_eq!(result.data, Some(graphql_value!({"node": null})));
    assert!(result.errors.expect("errors present")[0]
        .error()
        .message()
        .contains("resolved to a type `Ghost` that does not exist"));
}

#[test]
fn runtime_type_must_be_possible_for_the_abstract_type() {
    let node = InterfaceMeta::new(
        "Node",
        vec![FieldMeta::new("name", Type::named("String"))],
    );
    let user = ObjectMeta::new(
        "User",
        vec![FieldMeta::new("name", Type::named("String"))],
    )
    .interfaces(&["Node"]);
    // An object type that exists but does not implement `Node`.
    let stranger = ObjectMeta::new(
        "Stranger",
        vec![FieldMeta::new("name", Type::named("String"))],
    );
    let query = ObjectMeta::new(
        "Query",
        vec![FieldMeta::new("node", Type::named("Node")).resolver(|_, _, _, _| {
            Ok(ResolvedValue::ready(graphql_value!({
                "__typename": "Stranger",
                "name": "Ada",
            })))
        })],
    );
    let schema: SchemaType<S> = SchemaType::new(
        vec![
            node.into_meta(),
            user.into_meta(),
            stranger.into_meta(),
            query.into_meta(),
        ],
        "Query",
        None,
        None,
    )
    .unwrap();
    let doc = query_doc(vec![field_with("node", vec![field("name")])]);

    let result = run_sync(&schema, &doc);

    assert_eq!(result.data, Some(graphql_value!({"node": null})));
    assert!(result.errors.expect("errors present")[0]
        .error()
        .message()
        .contains("is not a possible type for `Node`"));
}

#[test]
fn is_type_of_mismatch_raises_on_object_completion() {
    let user = ObjectMeta::new(
        "User",
        vec![FieldMeta::new("name", Type::named("String"))],
    )
    .is_type_of(|_, _| Deferrable::Value(false));
    let query = ObjectMeta::new(
        "Query",
        vec![FieldMeta::new("user", Type::named("User"))
            .resolver(|_, _, _, _| Ok(ResolvedValue::ready(graphql_value!({"name": "Ada"}))))],
    );
    let schema: SchemaType<S> = SchemaType::new(
        vec![user.into_meta(), query.into_meta()],
        "Query",
        None,
        None,
    )
    .unwrap();
    let doc = query_doc(vec![field_with("user", vec![field("name")])]);

    let result = run_sync(&schema, &doc);

    assert_eq!(result.data, Some(graphql_value!({"user": null})));
    assert!(result.errors.expect("errors present")[0]
        .error()
        .message()
        .starts_with("Expected value of type `User`"));
}

#[tokio::test]
async fn async_is_type_of_predicates_race_in_declaration_order() {
    let cat = ObjectMeta::new(
        "Cat",
        vec![FieldMeta::new("meows", Type::named("Boolean"))],
    )
    .is_type_of(|value, _| {
        let is_cat = value
            .as_object_value()
            .map(|o| o.contains_field("meows"))
            .unwrap_or(false);
        Deferrable::Future(Box::pin(async move {
            tokio::task::yield_now().await;
            Ok(is_cat)
        }))
    });
    let dog = ObjectMeta::new(
        "Dog",
        vec![FieldMeta::new("barks", Type::named("Boolean"))],
    )
    .is_type_of(|value, _| {
        let is_dog = value
            .as_object_value()
            .map(|o| o.contains_field("barks"))
            .unwrap_or(false);
        Deferrable::Future(Box::pin(async move { Ok(is_dog) }))
    });
    let pet = UnionMeta::new("Pet", &["Cat", "Dog"]);
    let query = ObjectMeta::new(
        "Query",
        vec![FieldMeta::new("pet", Type::named("Pet")).resolver(|_, _, _, _| {
            Ok(ResolvedValue::ready(graphql_value!({"meows": true})))
        })],
    );
    let schema: SchemaType<S> = SchemaType::new(
        vec![
            cat.into_meta(),
            dog.into_meta(),
            pet.into_meta(),
            query.into_meta(),
        ],
        "Query",
        None,
        None,
    )
    .unwrap();
    let doc = query_doc(vec![field_with(
        "pet",
        vec![inline(Some("Cat"), vec![], vec![field("meows")])],
    )]);

    let result = run(&schema, &doc).await;

    assert_eq!(result.errors, None);
    assert_eq!(result.data, Some(graphql_value!({"pet": {"meows": true}})));
}

#[test]
fn value_display_appears_in_is_type_of_error() {
    let user = ObjectMeta::new("User", vec![FieldMeta::new("name", Type::named("String"))])
        .is_type_of(|_, _| Deferrable::Value(false));
    let query = ObjectMeta::new(
        "Query",
        vec![FieldMeta::new("user", Type::non_null_named("User"))
            .resolver(|_, _, _, _| Ok(ResolvedValue::ready(graphql_value!({"name": "Ada"}))))],
    );
    let schema: SchemaType<S> = SchemaType::new(
        vec![user.into_meta(), query.into_meta()],
        "Query",
        None,
        None,
    )
    .unwrap();
    let doc = query_doc(vec![field_with("user", vec![field("name")])]);

    let result = run_sync(&schema, &doc);

    // The non-null field propagates the failure to the root.
    assert_eq!(result.data, Some(Value::Null));
    assert!(result.errors.expect("errors present")[0]
        .error()
        .message()
        .contains("\"name\": \"Ada\""));
}
