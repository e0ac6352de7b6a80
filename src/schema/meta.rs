//! Types used to describe a GraphQL schema.

use std::fmt;

use arcstr::ArcStr;

use crate::{
    ast::{InputValue, Type},
    executor::FieldError,
    resolve::{BoxResolver, BoxTypeResolver, IsTypeOfFn},
    value::{DefaultScalarValue, Value},
};

/// GraphQL type kind.
///
/// The GraphQL specification defines a number of type kinds — the meta type
/// of a type.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TypeKind {
    /// Scalar types appear as the leaf nodes of GraphQL queries. Strings,
    /// numbers, and booleans are the built-in ones.
    Scalar,

    /// The most common type: objects have fields and can implement
    /// interfaces.
    Object,

    /// Interface types represent overlapping fields between multiple types,
    /// and can be queried for their concrete type.
    Interface,

    /// Unions are similar to interfaces but cannot contain any fields on
    /// their own.
    Union,

    /// Like scalars, enum types appear as the leaf nodes of GraphQL
    /// queries.
    Enum,

    /// Represents complex values provided in queries _into_ the system.
    InputObject,

    /// Represents lists of other types.
    List,

    /// In GraphQL, nullable types are the default. By putting a `!` after a
    /// type, it becomes non-nullable.
    NonNull,
}

impl TypeKind {
    /// The name of this kind as it appears in introspection output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scalar => "SCALAR",
            Self::Object => "OBJECT",
            Self::Interface => "INTERFACE",
            Self::Union => "UNION",
            Self::Enum => "ENUM",
            Self::InputObject => "INPUT_OBJECT",
            Self::List => "LIST",
            Self::NonNull => "NON_NULL",
        }
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an item is deprecated, with context.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum DeprecationStatus {
    /// The field/variant is not deprecated.
    Current,

    /// The field/variant is deprecated, with an optional reason.
    Deprecated(Option<ArcStr>),
}

impl DeprecationStatus {
    /// If this deprecation status indicates the item is deprecated.
    pub fn is_deprecated(&self) -> bool {
        match self {
            Self::Current => false,
            Self::Deprecated(_) => true,
        }
    }

    /// An optional reason for the deprecation, or none if `Current`.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Current => None,
            Self::Deprecated(rsn) => rsn.as_deref(),
        }
    }
}

/// Shortcut for an [`InputValue`] validation function.
pub type InputValueParseFn<S> = fn(&InputValue<S>) -> Result<(), FieldError<S>>;

/// Shortcut for a leaf-value serialization function.
///
/// Converts the value a resolver produced into its external scalar form, or
/// returns [`None`] when the value cannot be represented by the scalar.
pub type SerializeFn<S> = fn(&Value<S>) -> Option<Value<S>>;

fn identity_serialize<S: Clone>(v: &Value<S>) -> Option<Value<S>> {
    match v {
        Value::Null => None,
        v => Some(v.clone()),
    }
}

fn any_input_parse<S>(_: &InputValue<S>) -> Result<(), FieldError<S>> {
    Ok(())
}

/// Scalar type metadata.
pub struct ScalarMeta<S = DefaultScalarValue> {
    /// Name of this type.
    pub name: ArcStr,

    /// Optional description of this type.
    pub description: Option<ArcStr>,

    pub(crate) try_parse_fn: InputValueParseFn<S>,
    pub(crate) serialize_fn: SerializeFn<S>,
}

impl<S: Clone + 'static> ScalarMeta<S> {
    /// Builds a new [`ScalarMeta`] with the provided `name`.
    ///
    /// The default serialization passes any non-`null` value through
    /// unchanged, and the default input validation accepts everything.
    pub fn new(name: impl Into<ArcStr>) -> Self {
        Self {
            name: name.into(),
            description: None,
            try_parse_fn: any_input_parse::<S>,
            serialize_fn: identity_serialize::<S>,
        }
    }

    /// Sets the `description` of this type.
    #[must_use]
    pub fn description(mut self, description: impl Into<ArcStr>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the input validation function of this type.
    #[must_use]
    pub fn parse_fn(mut self, f: InputValueParseFn<S>) -> Self {
        self.try_parse_fn = f;
        self
    }

    /// Sets the serialization function of this type.
    #[must_use]
    pub fn serialize_fn(mut self, f: SerializeFn<S>) -> Self {
        self.serialize_fn = f;
        self
    }

    /// Wraps this [`ScalarMeta`] into a generic [`MetaType`].
    pub fn into_meta(self) -> MetaType<S> {
        MetaType::Scalar(self)
    }
}

impl<S> fmt::Debug for ScalarMeta<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScalarMeta")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// A single value of an enum type.
#[derive(Clone, Debug)]
pub struct EnumValue {
    /// Name of this value.
    pub name: ArcStr,

    /// Optional description of this value.
    pub description: Option<ArcStr>,

    /// Whether this value is deprecated.
    pub deprecation_status: DeprecationStatus,
}

impl EnumValue {
    /// Constructs a new [`EnumValue`] with the provided `name`.
    pub fn new(name: impl Into<ArcStr>) -> Self {
        Self {
            name: name.into(),
            description: None,
            deprecation_status: DeprecationStatus::Current,
        }
    }

    /// Sets the `description` of this value.
    #[must_use]
    pub fn description(mut self, description: impl Into<ArcStr>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Marks this value as deprecated with an optional `reason`.
    #[must_use]
    pub fn deprecated(mut self, reason: Option<&str>) -> Self {
        self.deprecation_status = DeprecationStatus::Deprecated(reason.map(Into::into));
        self
    }
}

/// Enum type metadata.
#[derive(Clone, Debug)]
pub struct EnumMeta {
    /// Name of this type.
    pub name: ArcStr,

    /// Optional description of this type.
    pub description: Option<ArcStr>,

    /// The values this enum can represent.
    pub values: Vec<EnumValue>,
}

impl EnumMeta {
    /// Builds a new [`EnumMeta`] out of the provided `values`.
    pub fn new(name: impl Into<ArcStr>, values: Vec<EnumValue>) -> Self {
        Self {
            name: name.into(),
            description: None,
            values,
        }
    }

    /// Sets the `description` of this type.
    #[must_use]
    pub fn description(mut self, description: impl Into<ArcStr>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Whether `name` is one of the values of this enum.
    pub fn has_value(&self, name: &str) -> bool {
        self.values.iter().any(|v| v.name == name)
    }

    /// Wraps this [`EnumMeta`] into a generic [`MetaType`].
    pub fn into_meta<S>(self) -> MetaType<S> {
        MetaType::Enum(self)
    }
}

/// Metadata for an argument to a field, or for an input object field.
#[derive(Clone)]
pub struct Argument<S = DefaultScalarValue> {
    /// Name of this argument.
    pub name: ArcStr,

    /// Optional description of this argument.
    pub description: Option<ArcStr>,

    /// Type of this argument.
    pub arg_type: Type,

    /// Default value of this argument, if any.
    pub default_value: Option<InputValue<S>>,
}

impl<S> Argument<S> {
    /// Constructs a new [`Argument`] of the provided `arg_type`.
    pub fn new(name: impl Into<ArcStr>, arg_type: Type) -> Self {
        Self {
            name: name.into(),
            description: None,
            arg_type,
            default_value: None,
        }
    }

    /// Sets the `description` of this argument.
    #[must_use]
    pub fn description(mut self, description: impl Into<ArcStr>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the default value of this argument.
    #[must_use]
    pub fn default_value(mut self, value: InputValue<S>) -> Self {
        self.default_value = Some(value);
        self
    }
}

impl<S: fmt::Debug> fmt::Debug for Argument<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Argument")
            .field("name", &self.name)
            .field("arg_type", &self.arg_type)
            .field("default_value", &self.default_value)
            .finish_non_exhaustive()
    }
}

/// Metadata for a field of an object or interface type.
pub struct Field<S = DefaultScalarValue> {
    /// Name of this field.
    pub name: ArcStr,

    /// Optional description of this field.
    pub description: Option<ArcStr>,

    /// Arguments accepted by this field, if any.
    pub arguments: Option<Vec<Argument<S>>>,

    /// The declared return type of this field.
    pub field_type: Type,

    /// Whether this field is deprecated.
    pub deprecation_status: DeprecationStatus,

    pub(crate) resolver: Option<BoxResolver<S>>,
}

impl<S> Field<S> {
    /// Constructs a new [`Field`] of the provided `field_type`.
    ///
    /// A field without an attached resolver falls back to the execution's
    /// default field resolver.
    pub fn new(name: impl Into<ArcStr>, field_type: Type) -> Self {
        Self {
            name: name.into(),
            description: None,
            arguments: None,
            field_type,
            deprecation_status: DeprecationStatus::Current,
            resolver: None,
        }
    }

    /// Sets the `description` of this field.
    #[must_use]
    pub fn description(mut self, description: impl Into<ArcStr>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds an `argument` to this field.
    #[must_use]
    pub fn argument(mut self, argument: Argument<S>) -> Self {
        match self.arguments {
            Some(ref mut args) => args.push(argument),
            None => self.arguments = Some(vec![argument]),
        }
        self
    }

    /// Marks this field as deprecated with an optional `reason`.
    #[must_use]
    pub fn deprecated(mut self, reason: Option<&str>) -> Self {
        self.deprecation_status = DeprecationStatus::Deprecated(reason.map(Into::into));
        self
    }

    /// Attaches a resolver to this field.
    #[must_use]
    pub fn resolver<F>(mut self, f: F) -> Self
    where
        F: for<'a> Fn(
                &'a Value<S>,
                &'a crate::resolve::Arguments<S>,
                &'a (dyn std::any::Any + Send + Sync),
                crate::resolve::ResolveInfo<'a, S>,
            ) -> crate::executor::FieldResult<crate::resolve::ResolvedValue<S>, S>
            + Send
            + Sync
            + 'static,
    {
        self.resolver = Some(std::sync::Arc::new(f));
        self
    }

    /// Returns true if the field belongs to GraphQL's introspection system.
    pub fn is_builtin(&self) -> bool {
        self.name.starts_with("__")
    }
}

impl<S: fmt::Debug> fmt::Debug for Field<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("field_type", &self.field_type)
            .field("arguments", &self.arguments)
            .finish_non_exhaustive()
    }
}

/// Object type metadata.
pub struct ObjectMeta<S = DefaultScalarValue> {
    /// Name of this type.
    pub name: ArcStr,

    /// Optional description of this type.
    pub description: Option<ArcStr>,

    /// The fields of this type, in declaration order.
    pub fields: Vec<Field<S>>,

    /// The names of the interfaces this type implements.
    pub interface_names: Vec<ArcStr>,

    pub(crate) is_type_of: Option<IsTypeOfFn<S>>,
}

impl<S> ObjectMeta<S> {
    /// Builds a new [`ObjectMeta`] with the provided `fields`.
    pub fn new(name: impl Into<ArcStr>, fields: Vec<Field<S>>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields,
            interface_names: vec![],
            is_type_of: None,
        }
    }

    /// Sets the `description` of this type.
    #[must_use]
    pub fn description(mut self, description: impl Into<ArcStr>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Declares the interfaces this type implements.
    #[must_use]
    pub fn interfaces(mut self, names: &[&str]) -> Self {
        self.interface_names = names.iter().map(|n| ArcStr::from(*n)).collect();
        self
    }

    /// Attaches a predicate deciding whether a value belongs to this type,
    /// consulted during abstract-type resolution and object completion.
    #[must_use]
    pub fn is_type_of<F>(mut self, f: F) -> Self
    where
        F: for<'a> Fn(
                &'a Value<S>,
                &'a (dyn std::any::Any + Send + Sync),
            ) -> crate::resolve::Deferrable<bool, S>
            + Send
            + Sync
            + 'static,
    {
        self.is_type_of = Some(std::sync::Arc::new(f));
        self
    }

    /// Looks a field of this type up by `name`.
    pub fn field_by_name(&self, name: &str) -> Option<&Field<S>> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Wraps this [`ObjectMeta`] into a generic [`MetaType`].
    pub fn into_meta(self) -> MetaType<S> {
        MetaType::Object(self)
    }
}

impl<S: fmt::Debug> fmt::Debug for ObjectMeta<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectMeta")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("interface_names", &self.interface_names)
            .finish_non_exhaustive()
    }
}

/// Interface type metadata.
pub struct InterfaceMeta<S = DefaultScalarValue> {
    /// Name of this type.
    pub name: ArcStr,

    /// Optional description of this type.
    pub description: Option<ArcStr>,

    /// The fields of this type, in declaration order.
    pub fields: Vec<Field<S>>,

    pub(crate) resolve_type: Option<BoxTypeResolver<S>>,
}

impl<S> InterfaceMeta<S> {
    /// Builds a new [`InterfaceMeta`] with the provided `fields`.
    pub fn new(name: impl Into<ArcStr>, fields: Vec<Field<S>>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields,
            resolve_type: None,
        }
    }

    /// Sets the `description` of this type.
    #[must_use]
    pub fn description(mut self, description: impl Into<ArcStr>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attaches a runtime-type resolver to this interface.
    ///
    /// Without one, the execution's default type resolver is consulted.
    #[must_use]
    pub fn resolve_type(mut self, f: BoxTypeResolver<S>) -> Self {
        self.resolve_type = Some(f);
        self
    }

    /// Looks a field of this type up by `name`.
    pub fn field_by_name(&self, name: &str) -> Option<&Field<S>> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Wraps this [`InterfaceMeta`] into a generic [`MetaType`].
    pub fn into_meta(self) -> MetaType<S> {
        MetaType::Interface(self)
    }
}

impl<S: fmt::Debug> fmt::Debug for InterfaceMeta<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterfaceMeta")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

/// Union type metadata.
pub struct UnionMeta<S = DefaultScalarValue> {
    /// Name of this type.
    pub name: ArcStr,

    /// Optional description of this type.
    pub description: Option<ArcStr>,

    /// Names of the member types, in declaration order.
    pub of_type_names: Vec<ArcStr>,

    pub(crate) resolve_type: Option<BoxTypeResolver<S>>,
}

impl<S> UnionMeta<S> {
    /// Builds a new [`UnionMeta`] of the provided member type names.
    pub fn new(name: impl Into<ArcStr>, of_type_names: &[&str]) -> Self {
        Self {
            name: name.into(),
            description: None,
            of_type_names: of_type_names.iter().map(|n| ArcStr::from(*n)).collect(),
            resolve_type: None,
        }
    }

    /// Sets the `description` of this type.
    #[must_use]
    pub fn description(mut self, description: impl Into<ArcStr>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attaches a runtime-type resolver to this union.
    ///
    /// Without one, the execution's default type resolver is consulted.
    #[must_use]
    pub fn resolve_type(mut self, f: BoxTypeResolver<S>) -> Self {
        self.resolve_type = Some(f);
        self
    }

    /// Wraps this [`UnionMeta`] into a generic [`MetaType`].
    pub fn into_meta(self) -> MetaType<S> {
        MetaType::Union(self)
    }
}

impl<S> fmt::Debug for UnionMeta<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnionMeta")
            .field("name", &self.name)
            .field("of_type_names", &self.of_type_names)
            .finish_non_exhaustive()
    }
}

/// Input object type metadata.
#[derive(Clone, Debug)]
pub struct InputObjectMeta<S = DefaultScalarValue> {
    /// Name of this type.
    pub name: ArcStr,

    /// Optional description of this type.
    pub description: Option<ArcStr>,

    /// The fields of this input type, in declaration order.
    pub input_fields: Vec<Argument<S>>,
}

impl<S> InputObjectMeta<S> {
    /// Builds a new [`InputObjectMeta`] with the provided `input_fields`.
    pub fn new(name: impl Into<ArcStr>, input_fields: Vec<Argument<S>>) -> Self {
        Self {
            name: name.into(),
            description: None,
            input_fields,
        }
    }

    /// Sets the `description` of this type.
    #[must_use]
    pub fn description(mut self, description: impl Into<ArcStr>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Wraps this [`InputObjectMeta`] into a generic [`MetaType`].
    pub fn into_meta(self) -> MetaType<S> {
        MetaType::InputObject(self)
    }
}

/// Generic type metadata.
#[derive(Debug)]
#[allow(missing_docs)]
pub enum MetaType<S = DefaultScalarValue> {
    Scalar(ScalarMeta<S>),
    Object(ObjectMeta<S>),
    Enum(EnumMeta),
    Interface(InterfaceMeta<S>),
    Union(UnionMeta<S>),
    InputObject(InputObjectMeta<S>),
}

impl<S> MetaType<S> {
    /// The name of the described type.
    pub fn name(&self) -> &ArcStr {
        match self {
            Self::Scalar(ScalarMeta { name, .. })
            | Self::Object(ObjectMeta { name, .. })
            | Self::Enum(EnumMeta { name, .. })
            | Self::Interface(InterfaceMeta { name, .. })
            | Self::Union(UnionMeta { name, .. })
            | Self::InputObject(InputObjectMeta { name, .. }) => name,
        }
    }

    /// The description of the described type, if any.
    pub fn description(&self) -> Option<&ArcStr> {
        match self {
            Self::Scalar(ScalarMeta { description, .. })
            | Self::Object(ObjectMeta { description, .. })
            | Self::Enum(EnumMeta { description, .. })
            | Self::Interface(InterfaceMeta { description, .. })
            | Self::Union(UnionMeta { description, .. })
            | Self::InputObject(InputObjectMeta { description, .. }) => description.as_ref(),
        }
    }

    /// The introspection kind of the described type.
    pub fn type_kind(&self) -> TypeKind {
        match self {
            Self::Scalar(..) => TypeKind::Scalar,
            Self::Object(..) => TypeKind::Object,
            Self::Enum(..) => TypeKind::Enum,
            Self::Interface(..) => TypeKind::Interface,
            Self::Union(..) => TypeKind::Union,
            Self::InputObject(..) => TypeKind::InputObject,
        }
    }

    /// Whether the described type is a leaf (scalar or enum) output type.
    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Scalar(..) | Self::Enum(..))
    }

    /// Whether the described type is abstract (interface or union).
    pub fn is_abstract(&self) -> bool {
        matches!(self, Self::Interface(..) | Self::Union(..))
    }

    /// Whether the described type can only appear in input positions.
    pub fn is_input(&self) -> bool {
        matches!(self, Self::InputObject(..))
    }

    /// Looks a field up by `name` on an object or interface type.
    pub fn field_by_name(&self, name: &str) -> Option<&Field<S>> {
        match self {
            Self::Object(o) => o.field_by_name(name),
            Self::Interface(i) => i.field_by_name(name),
            _ => None,
        }
    }
}

impl<S> From<ScalarMeta<S>> for MetaType<S> {
    fn from(s: ScalarMeta<S>) -> Self {
        Self::Scalar(s)
    }
}

impl<S> From<ObjectMeta<S>> for MetaType<S> {
    fn from(o: ObjectMeta<S>) -> Self {
        Self::Object(o)
    }
}

impl<S> From<EnumMeta> for MetaType<S> {
    fn from(e: EnumMeta) -> Self {
        Self::Enum(e)
    }
}

impl<S> From<InterfaceMeta<S>> for MetaType<S> {
    fn from(i: InterfaceMeta<S>) -> Self {
        Self::Interface(i)
    }
}

impl<S> From<UnionMeta<S>> for MetaType<S> {
    fn from(u: UnionMeta<S>) -> Self {
        Self::Union(u)
    }
}

impl<S> From<InputObjectMeta<S>> for MetaType<S> {
    fn from(io: InputObjectMeta<S>) -> Self {
        Self::InputObject(io)
    }
}
