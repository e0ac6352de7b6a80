//! The read-only schema model the execution engine consumes.

use arcstr::ArcStr;
use derive_more::with_trait::Display;
use indexmap::IndexMap;

use crate::{
    ast::{InputValue, OperationType, Type},
    introspection,
    schema::meta::{Argument, Field, MetaType, ObjectMeta, ScalarMeta},
    value::{DefaultScalarValue, ScalarValue, Value},
};

/// An error preventing a [`SchemaType`] from being constructed.
///
/// Schema validity is a precondition of execution, so these surface
/// immediately from [`SchemaType::new`] instead of being reported through a
/// response.
#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub enum SchemaError {
    /// The named root operation type is not defined in the schema.
    #[display("root {_0} type `{_1}` is not defined in the schema")]
    UndefinedRootType(OperationType, ArcStr),

    /// The named root operation type is not an object type.
    #[display("root {_0} type `{_1}` is not an object type")]
    RootTypeNotObject(OperationType, ArcStr),

    /// A field, argument, or input field references an undefined type.
    #[display("type `{_0}` references undefined type `{_1}`")]
    UndefinedTypeReference(ArcStr, ArcStr),

    /// A union lists a member that is not an object type.
    #[display("union `{_0}` member `{_1}` is not an object type")]
    UnionMemberNotObject(ArcStr, ArcStr),

    /// An object implements something that is not a defined interface.
    #[display("object `{_0}` implements undefined or non-interface type `{_1}`")]
    InvalidInterfaceReference(ArcStr, ArcStr),

    /// Two types share a name.
    #[display("duplicate definition of type `{_0}`")]
    DuplicateType(ArcStr),
}

impl std::error::Error for SchemaError {}

/// Metadata for a schema: the type map, the root operation types, and the
/// directives known to the execution engine.
pub struct SchemaType<S = DefaultScalarValue> {
    types: IndexMap<ArcStr, MetaType<S>>,
    query_type_name: ArcStr,
    mutation_type_name: Option<ArcStr>,
    subscription_type_name: Option<ArcStr>,
    directives: IndexMap<ArcStr, DirectiveType<S>>,
    typename_field: Field<S>,
    schema_field: Field<S>,
    type_field: Field<S>,
}

/// A directive known to the schema.
#[derive(Debug)]
pub struct DirectiveType<S = DefaultScalarValue> {
    /// Name of this directive, without the `@`.
    pub name: ArcStr,

    /// Optional description of this directive.
    pub description: Option<ArcStr>,

    /// The locations this directive may appear in.
    pub locations: Vec<DirectiveLocation>,

    /// The arguments this directive accepts.
    pub arguments: Vec<Argument<S>>,
}

/// A location a directive may appear in.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[allow(missing_docs)]
pub enum DirectiveLocation {
    Query,
    Mutation,
    Subscription,
    Field,
    FragmentDefinition,
    FragmentSpread,
    InlineFragment,
}

impl DirectiveLocation {
    /// The name of this location as it appears in introspection output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Query => "QUERY",
            Self::Mutation => "MUTATION",
            Self::Subscription => "SUBSCRIPTION",
            Self::Field => "FIELD",
            Self::FragmentDefinition => "FRAGMENT_DEFINITION",
            Self::FragmentSpread => "FRAGMENT_SPREAD",
            Self::InlineFragment => "INLINE_FRAGMENT",
        }
    }
}

impl<S: ScalarValue> SchemaType<S> {
    /// Constructs a new schema out of the provided `types` and root type
    /// names, validating it in the process.
    ///
    /// The built-in scalars (`Int`, `Float`, `String`, `Boolean`, `ID`),
    /// the introspection meta types, and the built-in directives (`@skip`,
    /// `@include`, `@defer`, `@stream`) are registered automatically unless
    /// the caller supplied their own definitions.
    pub fn new(
        types: Vec<MetaType<S>>,
        query: &str,
        mutation: Option<&str>,
        subscription: Option<&str>,
    ) -> Result<Self, SchemaError> {
        let mut type_map = IndexMap::with_capacity(types.len());
        for t in types {
            let name = t.name().clone();
            if type_map.insert(name.clone(), t).is_some() {
                return Err(SchemaError::DuplicateType(name));
            }
        }

        for builtin in builtin_scalars::<S>() {
            type_map.entry(builtin.name().clone()).or_insert(builtin);
        }
        for meta in introspection::meta_types::<S>() {
            type_map.entry(meta.name().clone()).or_insert(meta);
        }

        let mut directives = IndexMap::new();
        for d in [
            DirectiveType::new_skip(),
            DirectiveType::new_include(),
            DirectiveType::new_defer(),
            DirectiveType::new_stream(),
        ] {
            directives.insert(d.name.clone(), d);
        }

        let schema = Self {
            types: type_map,
            query_type_name: query.into(),
            mutation_type_name: mutation.map(Into::into),
            subscription_type_name: subscription.map(Into::into),
            directives,
            typename_field: introspection::typename_meta_field(),
            schema_field: introspection::schema_meta_field(),
            type_field: introspection::type_meta_field(),
        };
        schema.validate()?;
        Ok(schema)
    }

    fn validate(&self) -> Result<(), SchemaError> {
        self.validate_root(OperationType::Query, Some(&self.query_type_name))?;
        self.validate_root(OperationType::Mutation, self.mutation_type_name.as_ref())?;
        self.validate_root(
            OperationType::Subscription,
            self.subscription_type_name.as_ref(),
        )?;

        for meta in self.types.values() {
            match meta {
                MetaType::Object(o) => {
                    self.validate_fields(&o.name, &o.fields)?;
                    for iface in &o.interface_names {
                        match self.types.get(iface) {
                            Some(MetaType::Interface(..)) => {}
                            _ => {
                                return Err(SchemaError::InvalidInterfaceReference(
                                    o.name.clone(),
                                    iface.clone(),
                                ))
                            }
                        }
                    }
                }
                MetaType::Interface(i) => self.validate_fields(&i.name, &i.fields)?,
                MetaType::Union(u) => {
                    for member in &u.of_type_names {
                        match self.types.get(member) {
                            Some(MetaType::Object(..)) => {}
                            _ => {
                                return Err(SchemaError::UnionMemberNotObject(
                                    u.name.clone(),
                                    member.clone(),
                                ))
                            }
                        }
                    }
                }
                MetaType::InputObject(io) => {
                    for field in &io.input_fields {
                        self.validate_reference(&io.name, &field.arg_type)?;
                    }
                }
                MetaType::Scalar(..) | MetaType::Enum(..) => {}
            }
        }
        Ok(())
    }

    fn validate_root(&self, kind: OperationType, name: Option<&ArcStr>) -> Result<(), SchemaError> {
        if let Some(name) = name {
            match self.types.get(name) {
                Some(MetaType::Object(..)) => Ok(()),
                Some(..) => Err(SchemaError::RootTypeNotObject(kind, name.clone())),
                None => Err(SchemaError::UndefinedRootType(kind, name.clone())),
            }
        } else {
            Ok(())
        }
    }

    fn validate_fields(&self, on: &ArcStr, fields: &[Field<S>]) -> Result<(), SchemaError> {
        for field in fields {
            self.validate_reference(on, &field.field_type)?;
            if let Some(args) = &field.arguments {
                for arg in args {
                    self.validate_reference(on, &arg.arg_type)?;
                }
            }
        }
        Ok(())
    }

    fn validate_reference(&self, on: &ArcStr, ty: &Type) -> Result<(), SchemaError> {
        let name = ty.innermost_name();
        if self.types.contains_key(name) {
            Ok(())
        } else {
            Err(SchemaError::UndefinedTypeReference(on.clone(), name.into()))
        }
    }

    /// Looks a type up by `name`.
    pub fn type_by_name(&self, name: &str) -> Option<&MetaType<S>> {
        self.types.get(name)
    }

    /// Looks a type up by `name`.
    ///
    /// Alias kept for symmetry with wrapped-type lookups.
    pub fn concrete_type_by_name(&self, name: &str) -> Option<&MetaType<S>> {
        self.types.get(name)
    }

    /// The root query type of this schema.
    pub fn query_type(&self) -> &ObjectMeta<S> {
        match self.types.get(&self.query_type_name) {
            Some(MetaType::Object(o)) => o,
            _ => panic!("Query type does not exist in schema"),
        }
    }

    /// The root mutation type of this schema, if any.
    pub fn mutation_type(&self) -> Option<&ObjectMeta<S>> {
        self.mutation_type_name.as_ref().map(|name| {
            match self.types.get(name) {
                Some(MetaType::Object(o)) => o,
                _ => panic!("Mutation type does not exist in schema"),
            }
        })
    }

    /// The root subscription type of this schema, if any.
    pub fn subscription_type(&self) -> Option<&ObjectMeta<S>> {
        self.subscription_type_name.as_ref().map(|name| {
            match self.types.get(name) {
                Some(MetaType::Object(o)) => o,
                _ => panic!("Subscription type does not exist in schema"),
            }
        })
    }

    /// Whether `object` is the root query type of this schema.
    pub fn is_query_root(&self, object: &ObjectMeta<S>) -> bool {
        object.name == self.query_type_name
    }

    /// Resolves the definition of the field named `name` on `parent`.
    ///
    /// Three reserved fields are handled here: `__typename` on any type,
    /// and `__schema` / `__type` on the query root only.
    pub fn field_definition<'s>(
        &'s self,
        parent: &'s ObjectMeta<S>,
        name: &str,
    ) -> Option<&'s Field<S>> {
        match name {
            "__typename" => Some(&self.typename_field),
            "__schema" if self.is_query_root(parent) => Some(&self.schema_field),
            "__type" if self.is_query_root(parent) => Some(&self.type_field),
            _ => parent.field_by_name(name),
        }
    }

    /// All concrete object types the given abstract type could resolve to,
    /// in declaration order.
    ///
    /// Returns an empty list for non-abstract or unknown type names.
    pub fn possible_types(&self, abstract_name: &str) -> Vec<&ObjectMeta<S>> {
        match self.types.get(abstract_name) {
            Some(MetaType::Union(u)) => u
                .of_type_names
                .iter()
                .filter_map(|n| match self.types.get(n) {
                    Some(MetaType::Object(o)) => Some(o),
                    _ => None,
                })
                .collect(),
            Some(MetaType::Interface(i)) => self
                .types
                .values()
                .filter_map(|t| match t {
                    MetaType::Object(o) if o.interface_names.iter().any(|n| *n == i.name) => {
                        Some(o)
                    }
                    _ => None,
                })
                .collect(),
            _ => vec![],
        }
    }

    /// Whether `type_name` is one of the possible runtime types of
    /// `abstract_name`.
    pub fn is_possible_type(&self, abstract_name: &str, type_name: &str) -> bool {
        self.possible_types(abstract_name)
            .iter()
            .any(|o| o.name == type_name)
    }

    /// Whether `sub_type_name` names the same type as, or a possible type
    /// of, `super_type_name`.
    pub fn is_named_subtype(&self, sub_type_name: &str, super_type_name: &str) -> bool {
        sub_type_name == super_type_name || self.is_possible_type(super_type_name, sub_type_name)
    }

    /// Iterates over every type registered in this schema, in declaration
    /// order.
    pub fn type_list(&self) -> impl Iterator<Item = &MetaType<S>> {
        self.types.values()
    }

    /// Looks a directive up by `name`.
    pub fn directive_by_name(&self, name: &str) -> Option<&DirectiveType<S>> {
        self.directives.get(name)
    }

    /// Iterates over every directive known to this schema.
    pub fn directive_list(&self) -> impl Iterator<Item = &DirectiveType<S>> {
        self.directives.values()
    }
}

impl<S> DirectiveType<S> {
    /// Constructs a new [`DirectiveType`] valid in the provided
    /// `locations`.
    pub fn new(
        name: impl Into<ArcStr>,
        locations: &[DirectiveLocation],
        arguments: Vec<Argument<S>>,
    ) -> Self {
        Self {
            name: name.into(),
            description: None,
            locations: locations.to_vec(),
            arguments,
        }
    }

    /// Sets the `description` of this directive.
    #[must_use]
    pub fn description(mut self, description: impl Into<ArcStr>) -> Self {
        self.description = Some(description.into());
        self
    }

    fn new_skip() -> Self {
        Self::new(
            "skip",
            &[
                DirectiveLocation::Field,
                DirectiveLocation::FragmentSpread,
                DirectiveLocation::InlineFragment,
            ],
            vec![Argument::new("if", Type::non_null_named("Boolean"))],
        )
    }

    fn new_include() -> Self {
        Self::new(
            "include",
            &[
                DirectiveLocation::Field,
                DirectiveLocation::FragmentSpread,
                DirectiveLocation::InlineFragment,
            ],
            vec![Argument::new("if", Type::non_null_named("Boolean"))],
        )
    }

    fn new_defer() -> Self
    where
        S: From<bool>,
    {
        Self::new(
            "defer",
            &[
                DirectiveLocation::FragmentSpread,
                DirectiveLocation::InlineFragment,
            ],
            vec![
                Argument::new("if", Type::non_null_named("Boolean"))
                    .default_value(InputValue::scalar(true)),
                Argument::new("label", Type::named("String")),
            ],
        )
    }

    fn new_stream() -> Self
    where
        S: From<bool> + From<i32>,
    {
        Self::new(
            "stream",
            &[DirectiveLocation::Field],
            vec![
                Argument::new("if", Type::non_null_named("Boolean"))
                    .default_value(InputValue::scalar(true)),
                Argument::new("label", Type::named("String")),
                Argument::new("initialCount", Type::named("Int"))
                    .default_value(InputValue::scalar(0)),
            ],
        )
    }
}

fn builtin_scalars<S: ScalarValue>() -> Vec<MetaType<S>> {
    vec![
        ScalarMeta::new("Int")
            .description("The `Int` scalar type represents non-fractional signed whole numeric values.")
            .parse_fn(int_input_parse::<S>)
            .serialize_fn(int_serialize::<S>)
            .into_meta(),
        ScalarMeta::new("Float")
            .description("The `Float` scalar type represents signed double-precision fractional values.")
            .parse_fn(float_input_parse::<S>)
            .serialize_fn(float_serialize::<S>)
            .into_meta(),
        ScalarMeta::new("String")
            .description("The `String` scalar type represents textual data, represented as UTF-8 character sequences.")
            .parse_fn(string_input_parse::<S>)
            .serialize_fn(string_serialize::<S>)
            .into_meta(),
        ScalarMeta::new("Boolean")
            .description("The `Boolean` scalar type represents `true` or `false`.")
            .parse_fn(boolean_input_parse::<S>)
            .serialize_fn(boolean_serialize::<S>)
            .into_meta(),
        ScalarMeta::new("ID")
            .description("The `ID` scalar type represents a unique identifier.")
            .parse_fn(id_input_parse::<S>)
            .serialize_fn(id_serialize::<S>)
            .into_meta(),
    ]
}

fn int_input_parse<S: ScalarValue>(v: &InputValue<S>) -> Result<(), crate::executor::FieldError<S>> {
    match v.as_int_value() {
        Some(_) => Ok(()),
        None => Err(format!("Expected `Int`, found: {v}").into()),
    }
}

fn int_serialize<S: ScalarValue>(v: &Value<S>) -> Option<Value<S>> {
    v.as_scalar().and_then(S::as_int).map(Value::scalar)
}

fn float_input_parse<S: ScalarValue>(
    v: &InputValue<S>,
) -> Result<(), crate::executor::FieldError<S>> {
    match v.as_scalar().and_then(S::as_float) {
        Some(_) => Ok(()),
        None => Err(format!("Expected `Float`, found: {v}").into()),
    }
}

fn float_serialize<S: ScalarValue>(v: &Value<S>) -> Option<Value<S>> {
    v.as_scalar().and_then(S::as_float).map(Value::scalar)
}

fn string_input_parse<S: ScalarValue>(
    v: &InputValue<S>,
) -> Result<(), crate::executor::FieldError<S>> {
    match v.as_string_value() {
        Some(_) => Ok(()),
        None => Err(format!("Expected `String`, found: {v}").into()),
    }
}

fn string_serialize<S: ScalarValue>(v: &Value<S>) -> Option<Value<S>> {
    let s = v.as_scalar()?;
    if s.as_str().is_some() {
        Some(v.clone())
    } else if let Some(i) = s.as_int() {
        Some(Value::scalar(i.to_string()))
    } else if let Some(f) = s.as_float() {
        Some(Value::scalar(f.to_string()))
    } else {
        s.as_boolean().map(|b| Value::scalar(b.to_string()))
    }
}

fn boolean_input_parse<S: ScalarValue>(
    v: &InputValue<S>,
) -> Result<(), crate::executor::FieldError<S>> {
    match v.as_boolean_value() {
        Some(_) => Ok(()),
        None => Err(format!("Expected `Boolean`, found: {v}").into()),
    }
}

fn boolean_serialize<S: ScalarValue>(v: &Value<S>) -> Option<Value<S>> {
    v.as_scalar().and_then(S::as_boolean).map(Value::scalar)
}

fn id_input_parse<S: ScalarValue>(v: &InputValue<S>) -> Result<(), crate::executor::FieldError<S>> {
    if v.as_string_value().is_some() || v.as_int_value().is_some() {
        Ok(())
    } else {
        Err(format!("Expected `ID`, found: {v}").into())
    }
}

fn id_serialize<S: ScalarValue>(v: &Value<S>) -> Option<Value<S>> {
    let s = v.as_scalar()?;
    if s.as_str().is_some() {
        Some(v.clone())
    } else {
        s.as_int().map(|i| Value::scalar(i.to_string()))
    }
}
