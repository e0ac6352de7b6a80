//! The introspection meta types and the reserved `__typename`, `__schema`
//! and `__type` fields.
//!
//! Type references are encoded as compact `{kind, name, ofType}` values;
//! anything deeper (fields, members, enum values) is expanded lazily by
//! `__Type` field resolvers through by-name schema lookups, so recursive
//! schemas terminate.

use arcstr::ArcStr;

use crate::{
    ast::{InputValue, Type},
    resolve::{ResolveInfo, ResolvedValue},
    schema::{
        meta::{
            Argument, EnumMeta, EnumValue, Field, MetaType, ObjectMeta,
        },
        model::{DirectiveType, SchemaType},
    },
    value::{Object, ScalarValue, Value},
};

/// The `__typename` meta field, resolvable on any object type.
pub(crate) fn typename_meta_field<S: ScalarValue>() -> Field<S> {
    Field::new("__typename", Type::non_null_named("String"))
        .description("The name of the current Object type at runtime.")
        .resolver(|_, _, _, info| {
            Ok(ResolvedValue::Ready(Value::scalar(
                info.parent_type.name.to_string(),
            )))
        })
}

/// The `__schema` meta field, resolvable on the query root only.
pub(crate) fn schema_meta_field<S: ScalarValue>() -> Field<S> {
    Field::new("__schema", Type::non_null_named("__Schema"))
        .description("Access the current type schema of this server.")
        .resolver(|_, _, _, info| Ok(ResolvedValue::Ready(schema_value(info.schema))))
}

/// The `__type` meta field, resolvable on the query root only.
pub(crate) fn type_meta_field<S: ScalarValue>() -> Field<S> {
    Field::new("__type", Type::named("__Type"))
        .description("Request the type information of a single type.")
        .argument(Argument::new("name", Type::non_null_named("String")))
        .resolver(|_, args, _, info| {
            let reference = args
                .get("name")
                .and_then(InputValue::as_string_value)
                .filter(|name| info.schema.type_by_name(name).is_some())
                .map(|name| named_type_ref(info.schema, name))
                .unwrap_or(Value::Null);
            Ok(ResolvedValue::Ready(reference))
        })
}

/// The meta types every schema registers automatically.
pub(crate) fn meta_types<S: ScalarValue>() -> Vec<MetaType<S>> {
    vec![
        schema_meta_type().into_meta(),
        type_meta_type().into_meta(),
        field_meta_type().into_meta(),
        input_value_meta_type().into_meta(),
        enum_value_meta_type().into_meta(),
        directive_meta_type().into_meta(),
        type_kind_meta_type().into_meta(),
        directive_location_meta_type().into_meta(),
    ]
}

fn schema_meta_type<S: ScalarValue>() -> ObjectMeta<S> {
    ObjectMeta::new(
        "__Schema",
        vec![
            Field::new("description", Type::named("String")),
            Field::new(
                "types",
                Type::non_null_list(Type::non_null_named("__Type")),
            ),
            Field::new("queryType", Type::non_null_named("__Type")),
            Field::new("mutationType", Type::named("__Type")),
            Field::new("subscriptionType", Type::named("__Type")),
            Field::new(
                "directives",
                Type::non_null_list(Type::non_null_named("__Directive")),
            ),
        ],
    )
}

fn type_meta_type<S: ScalarValue>() -> ObjectMeta<S> {
    ObjectMeta::new(
        "__Type",
        vec![
            Field::new("kind", Type::non_null_named("__TypeKind")),
            Field::new("name", Type::named("String")),
            Field::new("description", Type::named("String")).resolver(|source, _, _, info| {
                let description = source_type(source, info)
                    .and_then(|meta| meta.description())
                    .map(|d| Value::scalar(d.to_string()))
                    .unwrap_or(Value::Null);
                Ok(ResolvedValue::Ready(description))
            }),
            Field::new("fields", Type::list(Type::non_null_named("__Field")))
                .argument(
                    Argument::new("includeDeprecated", Type::named("Boolean"))
                        .default_value(InputValue::scalar(false)),
                )
                .resolver(|source, args, _, info| {
                    let include_deprecated = args
                        .get("includeDeprecated")
                        .and_then(InputValue::as_boolean_value)
                        .unwrap_or(false);
                    let fields = match source_type(source, info) {
                        Some(MetaType::Object(o)) => &o.fields,
                        Some(MetaType::Interface(i)) => &i.fields,
                        _ => return Ok(ResolvedValue::null()),
                    };
                    Ok(ResolvedValue::Ready(Value::list(
                        fields
                            .iter()
                            .filter(|f| {
                                include_deprecated || !f.deprecation_status.is_deprecated()
                            })
                            .map(|f| field_value(info.schema, f))
                            .collect(),
                    )))
                }),
            Field::new("interfaces", Type::list(Type::non_null_named("__Type"))).resolver(
                |source, _, _, info| {
                    let interfaces = match source_type(source, info) {
                        Some(MetaType::Object(o)) => o
                            .interface_names
                            .iter()
                            .map(|n| named_type_ref(info.schema, n))
                            .collect(),
                        Some(MetaType::Interface(..)) => vec![],
                        _ => return Ok(ResolvedValue::null()),
                    };
                    Ok(ResolvedValue::Ready(Value::list(interfaces)))
                },
            ),
            Field::new("possibleTypes", Type::list(Type::non_null_named("__Type"))).resolver(
                |source, _, _, info| {
                    match source_type(source, info) {
                        Some(meta) if meta.is_abstract() => {
                            Ok(ResolvedValue::Ready(Value::list(
                                info.schema
                                    .possible_types(meta.name())
                                    .into_iter()
                                    .map(|o| named_type_ref(info.schema, &o.name))
                                    .collect(),
                            )))
                        }
                        _ => Ok(ResolvedValue::null()),
                    }
                },
            ),
            Field::new(
                "enumValues",
                Type::list(Type::non_null_named("__EnumValue")),
            )
            .argument(
                Argument::new("includeDeprecated", Type::named("Boolean"))
                    .default_value(InputValue::scalar(false)),
            )
            .resolver(|source, args, _, info| {
                let include_deprecated = args
                    .get("includeDeprecated")
                    .and_then(InputValue::as_boolean_value)
                    .unwrap_or(false);
                match source_type(source, info) {
                    Some(MetaType::Enum(e)) => Ok(ResolvedValue::Ready(Value::list(
                        e.values
                            .iter()
                            .filter(|v| {
                                include_deprecated || !v.deprecation_status.is_deprecated()
                            })
                            .map(enum_value_value)
                            .collect(),
                    ))),
                    _ => Ok(ResolvedValue::null()),
                }
            }),
            Field::new(
                "inputFields",
                Type::list(Type::non_null_named("__InputValue")),
            )
            .resolver(|source, _, _, info| match source_type(source, info) {
                Some(MetaType::InputObject(io)) => Ok(ResolvedValue::Ready(Value::list(
                    io.input_fields
                        .iter()
                        .map(|f| input_value_value(info.schema, f))
                        .collect(),
                ))),
                _ => Ok(ResolvedValue::null()),
            }),
            Field::new("ofType", Type::named("__Type")),
        ],
    )
}

fn field_meta_type<S: ScalarValue>() -> ObjectMeta<S> {
    ObjectMeta::new(
        "__Field",
        vec![
            Field::new("name", Type::non_null_named("String")),
            Field::new("description", Type::named("String")),
            Field::new(
                "args",
                Type::non_null_list(Type::non_null_named("__InputValue")),
            ),
            Field::new("type", Type::non_null_named("__Type")),
            Field::new("isDeprecated", Type::non_null_named("Boolean")),
            Field::new("deprecationReason", Type::named("String")),
        ],
    )
}

fn input_value_meta_type<S: ScalarValue>() -> ObjectMeta<S> {
    ObjectMeta::new(
        "__InputValue",
        vec![
            Field::new("name", Type::non_null_named("String")),
            Field::new("description", Type::named("String")),
            Field::new("type", Type::non_null_named("__Type")),
            Field::new("defaultValue", Type::named("String")),
        ],
    )
}

fn enum_value_meta_type<S: ScalarValue>() -> ObjectMeta<S> {
    ObjectMeta::new(
        "__EnumValue",
        vec![
            Field::new("name", Type::non_null_named("String")),
            Field::new("description", Type::named("String")),
            Field::new("isDeprecated", Type::non_null_named("Boolean")),
            Field::new("deprecationReason", Type::named("String")),
        ],
    )
}

fn directive_meta_type<S: ScalarValue>() -> ObjectMeta<S> {
    ObjectMeta::new(
        "__Directive",
        vec![
            Field::new("name", Type::non_null_named("String")),
            Field::new("description", Type::named("String")),
            Field::new(
                "locations",
                Type::non_null_list(Type::non_null_named("__DirectiveLocation")),
            ),
            Field::new(
                "args",
                Type::non_null_list(Type::non_null_named("__InputValue")),
            ),
        ],
    )
}

fn type_kind_meta_type() -> EnumMeta {
    EnumMeta::new(
        "__TypeKind",
        [
            "SCALAR",
            "OBJECT",
            "INTERFACE",
            "UNION",
            "ENUM",
            "INPUT_OBJECT",
            "LIST",
            "NON_NULL",
        ]
        .into_iter()
        .map(EnumValue::new)
        .collect(),
    )
}

fn directive_location_meta_type() -> EnumMeta {
    EnumMeta::new(
        "__DirectiveLocation",
        [
            "QUERY",
            "MUTATION",
            "SUBSCRIPTION",
            "FIELD",
            "FRAGMENT_DEFINITION",
            "FRAGMENT_SPREAD",
            "INLINE_FRAGMENT",
        ]
        .into_iter()
        .map(EnumValue::new)
        .collect(),
    )
}

/// The schema meta type, looked up from a type-reference source value.
fn source_type<'s, S: ScalarValue>(
    source: &Value<S>,
    info: ResolveInfo<'s, S>,
) -> Option<&'s MetaType<S>> {
    source
        .as_object_value()
        .and_then(|o| o.get_field_value("name"))
        .and_then(Value::as_string_value)
        .and_then(|name| info.schema.type_by_name(name))
}

fn schema_value<S: ScalarValue>(schema: &SchemaType<S>) -> Value<S> {
    let query_ref = named_type_ref(schema, &schema.query_type().name);
    let mutation_ref = schema
        .mutation_type()
        .map(|t| named_type_ref(schema, &t.name))
        .unwrap_or(Value::Null);
    let subscription_ref = schema
        .subscription_type()
        .map(|t| named_type_ref(schema, &t.name))
        .unwrap_or(Value::Null);

    Value::Object(Object::from_iter([
        ("queryType", query_ref),
        ("mutationType", mutation_ref),
        ("subscriptionType", subscription_ref),
        (
            "types",
            Value::list(
                schema
                    .type_list()
                    .map(|t| named_type_ref(schema, t.name()))
                    .collect(),
            ),
        ),
        (
            "directives",
            Value::list(
                schema
                    .directive_list()
                    .map(|d| directive_value(schema, d))
                    .collect(),
            ),
        ),
    ]))
}

/// A compact reference to a named type: `{kind, name}`.
fn named_type_ref<S: ScalarValue>(schema: &SchemaType<S>, name: &str) -> Value<S> {
    let kind = schema
        .type_by_name(name)
        .map(|meta| meta.type_kind().as_str())
        .unwrap_or("SCALAR");
    Value::Object(Object::from_iter([
        ("kind", Value::scalar(kind.to_string())),
        ("name", Value::scalar(name.to_string())),
        ("ofType", Value::Null),
    ]))
}

/// A compact reference to a possibly wrapped type: `{kind, ofType}` chains
/// ending in a named reference.
fn type_ref<S: ScalarValue>(schema: &SchemaType<S>, ty: &Type) -> Value<S> {
    fn wrapper<S: ScalarValue>(kind: &str, of_type: Value<S>) -> Value<S> {
        Value::Object(Object::from_iter([
            ("kind", Value::scalar(kind.to_string())),
            ("name", Value::Null),
            ("ofType", of_type),
        ]))
    }

    match ty {
        Type::Named(name) => named_type_ref(schema, name),
        Type::NonNullNamed(name) => wrapper("NON_NULL", named_type_ref(schema, name)),
        Type::List(inner) => wrapper("LIST", type_ref(schema, inner)),
        Type::NonNullList(inner) => wrapper("NON_NULL", wrapper("LIST", type_ref(schema, inner))),
    }
}

fn field_value<S: ScalarValue>(schema: &SchemaType<S>, field: &Field<S>) -> Value<S> {
    Value::Object(Object::from_iter([
        ("name", Value::scalar(field.name.to_string())),
        ("description", opt_str(field.description.as_ref())),
        (
            "args",
            Value::list(
                field
                    .arguments
                    .as_deref()
                    .unwrap_or_default()
                    .iter()
                    .map(|a| input_value_value(schema, a))
                    .collect(),
            ),
        ),
        ("type", type_ref(schema, &field.field_type)),
        (
            "isDeprecated",
            Value::scalar(field.deprecation_status.is_deprecated()),
        ),
        (
            "deprecationReason",
            field
                .deprecation_status
                .reason()
                .map(|r| Value::scalar(r.to_string()))
                .unwrap_or(Value::Null),
        ),
    ]))
}

fn input_value_value<S: ScalarValue>(schema: &SchemaType<S>, arg: &Argument<S>) -> Value<S> {
    Value::Object(Object::from_iter([
        ("name", Value::scalar(arg.name.to_string())),
        ("description", opt_str(arg.description.as_ref())),
        ("type", type_ref(schema, &arg.arg_type)),
        (
            "defaultValue",
            arg.default_value
                .as_ref()
                .map(|v| Value::scalar(v.to_string()))
                .unwrap_or(Value::Null),
        ),
    ]))
}

fn enum_value_value<S: ScalarValue>(value: &EnumValue) -> Value<S> {
    Value::Object(Object::from_iter([
        ("name", Value::scalar(value.name.to_string())),
        ("description", opt_str(value.description.as_ref())),
        (
            "isDeprecated",
            Value::scalar(value.deprecation_status.is_deprecated()),
        ),
        (
            "deprecationReason",
            value
                .deprecation_status
                .reason()
                .map(|r| Value::scalar(r.to_string()))
                .unwrap_or(Value::Null),
        ),
    ]))
}

fn directive_value<S: ScalarValue>(schema: &SchemaType<S>, directive: &DirectiveType<S>) -> Value<S> {
    Value::Object(Object::from_iter([
        ("name", Value::scalar(directive.name.to_string())),
        ("description", opt_str(directive.description.as_ref())),
        (
            "locations",
            Value::list(
                directive
                    .locations
                    .iter()
                    .map(|l| Value::scalar(l.as_str().to_string()))
                    .collect(),
            ),
        ),
        (
            "args",
            Value::list(
                directive
                    .arguments
                    .iter()
                    .map(|a| input_value_value(schema, a))
                    .collect(),
            ),
        ),
    ]))
}

fn opt_str<S: ScalarValue>(value: Option<&ArcStr>) -> Value<S> {
    value
        .map(|s| Value::scalar(s.to_string()))
        .unwrap_or(Value::Null)
}
