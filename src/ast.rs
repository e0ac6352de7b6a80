//! The operation document model consumed by the execution engine.
//!
//! Documents are produced by an external parser (or built programmatically)
//! and are assumed to have passed static validation. Every node is wrapped
//! in a [`Spanning`] so errors raised during execution can point back into
//! the source text.

use std::fmt;

use arcstr::ArcStr;

use crate::{
    executor::Variables,
    value::{DefaultScalarValue, ScalarValue},
};

/// A reference to a line and column in an input source file.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct SourcePosition {
    index: usize,
    line: usize,
    col: usize,
}

impl SourcePosition {
    #[doc(hidden)]
    pub fn new(index: usize, line: usize, col: usize) -> Self {
        assert!(index >= line + col);
        Self { index, line, col }
    }

    #[doc(hidden)]
    pub fn new_origin() -> Self {
        Self {
            index: 0,
            line: 0,
            col: 0,
        }
    }

    /// The index of the character in the input source.
    ///
    /// Zero-based index. Take a substring of the original source starting at
    /// this index to access the item pointed to by this [`SourcePosition`].
    pub fn index(&self) -> usize {
        self.index
    }

    /// The line of the character in the input source.
    ///
    /// Zero-based index: the first line is line zero.
    pub fn line(&self) -> usize {
        self.line
    }

    /// The column of the character in the input source.
    ///
    /// Zero-based index: the first column is column zero.
    pub fn column(&self) -> usize {
        self.col
    }
}

/// A range of characters in the input source, starting at the character
/// pointed by the `start` field and ending just before the `end` marker.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Span {
    /// Start position of the span.
    pub start: SourcePosition,

    /// End position of the span.
    ///
    /// This points to the first source position _after_ the span.
    pub end: SourcePosition,
}

impl Span {
    #[doc(hidden)]
    pub fn new(start: SourcePosition, end: SourcePosition) -> Self {
        Self { start, end }
    }

    #[doc(hidden)]
    pub fn zero_width(pos: SourcePosition) -> Self {
        Self::new(pos, pos)
    }

    #[doc(hidden)]
    pub fn unlocated() -> Self {
        Self {
            start: SourcePosition::new_origin(),
            end: SourcePosition::new_origin(),
        }
    }
}

/// Data structure used to wrap items with start and end markers in the input
/// source.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Spanning<T> {
    /// The wrapped item.
    pub item: T,

    /// The span of the wrapped item in the input source.
    pub span: Span,
}

impl<T> Spanning<T> {
    #[doc(hidden)]
    pub fn new(span: Span, item: T) -> Self {
        Self { item, span }
    }

    /// Wraps the `item` without any location information.
    ///
    /// Used when the document is constructed programmatically rather than
    /// parsed from a source text.
    pub fn unlocated(item: T) -> Self {
        Self::new(Span::unlocated(), item)
    }

    /// The start position of the wrapped item in the input source.
    pub fn start(&self) -> &SourcePosition {
        &self.span.start
    }

    /// Modify the contents of the spanned item.
    pub fn map<O, F: Fn(T) -> O>(self, f: F) -> Spanning<O> {
        Spanning::new(self.span, f(self.item))
    }

    /// Modifies the contents of the spanned item in case `f` returns
    /// [`Some`], or returns [`None`] otherwise.
    pub fn and_then<O, F: Fn(T) -> Option<O>>(self, f: F) -> Option<Spanning<O>> {
        f(self.item).map(|item| Spanning::new(self.span, item))
    }
}

/// Type literal in a syntax tree.
///
/// Carries no semantic information and might refer to types that don't
/// exist.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
#[allow(missing_docs)]
pub enum Type {
    Named(ArcStr),
    List(Box<Type>),
    NonNullNamed(ArcStr),
    NonNullList(Box<Type>),
}

impl Type {
    /// Creates a `null`able named [`Type`].
    pub fn named(name: impl Into<ArcStr>) -> Self {
        Self::Named(name.into())
    }

    /// Creates a non-`null` named [`Type`].
    pub fn non_null_named(name: impl Into<ArcStr>) -> Self {
        Self::NonNullNamed(name.into())
    }

    /// Wraps the [`Type`] into a `null`able list.
    pub fn list(inner: Type) -> Self {
        Self::List(Box::new(inner))
    }

    /// Wraps the [`Type`] into a non-`null` list.
    pub fn non_null_list(inner: Type) -> Self {
        Self::NonNullList(Box::new(inner))
    }

    /// Returns the name of this [`Type`], if it is a named one.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Named(n) | Self::NonNullNamed(n) => Some(n),
            Self::List(..) | Self::NonNullList(..) => None,
        }
    }

    /// Returns the innermost name of this [`Type`] by unpacking lists.
    ///
    /// All [`Type`] literals contain exactly one name.
    pub fn innermost_name(&self) -> &str {
        match self {
            Self::Named(n) | Self::NonNullNamed(n) => n,
            Self::List(l) | Self::NonNullList(l) => l.innermost_name(),
        }
    }

    /// Indicates whether this [`Type`] can only represent non-`null` values.
    pub fn is_non_null(&self) -> bool {
        matches!(self, Self::NonNullNamed(..) | Self::NonNullList(..))
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(n) => write!(f, "{n}"),
            Self::NonNullNamed(n) => write!(f, "{n}!"),
            Self::List(t) => write!(f, "[{t}]"),
            Self::NonNullList(t) => write!(f, "[{t}]!"),
        }
    }
}

/// A JSON-like value that can be passed into the query execution, either
/// out-of-band, or in-band as default variable values. These are _not_
/// constant and might contain variables.
///
/// Lists and objects variants are _spanned_: they contain a reference to
/// their position in the source file, if available.
#[derive(Clone, Debug, PartialEq)]
#[allow(missing_docs)]
pub enum InputValue<S = DefaultScalarValue> {
    Null,
    Scalar(S),
    Enum(ArcStr),
    Variable(ArcStr),
    List(Vec<Spanning<InputValue<S>>>),
    Object(Vec<(Spanning<ArcStr>, Spanning<InputValue<S>>)>),
}

impl<S> InputValue<S> {
    /// Construct a `null` value.
    pub fn null() -> Self {
        Self::Null
    }

    /// Construct a scalar value.
    pub fn scalar<T: Into<S>>(v: T) -> Self {
        Self::Scalar(v.into())
    }

    /// Construct an enum value.
    pub fn enum_value(s: impl Into<ArcStr>) -> Self {
        Self::Enum(s.into())
    }

    /// Construct a variable value.
    pub fn variable(v: impl Into<ArcStr>) -> Self {
        Self::Variable(v.into())
    }

    /// Construct a [`Spanning::unlocated`] list.
    ///
    /// Convenience function to make each [`InputValue`] in the input vector
    /// not contain any location information.
    pub fn list(l: Vec<Self>) -> Self {
        Self::List(l.into_iter().map(Spanning::unlocated).collect())
    }

    /// Construct a located list.
    pub fn parsed_list(l: Vec<Spanning<Self>>) -> Self {
        Self::List(l)
    }

    /// Construct a [`Spanning::unlocated`] object.
    pub fn object<K: Into<ArcStr>>(o: Vec<(K, Self)>) -> Self {
        Self::Object(
            o.into_iter()
                .map(|(k, v)| (Spanning::unlocated(k.into()), Spanning::unlocated(v)))
                .collect(),
        )
    }

    /// Construct a located object.
    pub fn parsed_object(o: Vec<(Spanning<ArcStr>, Spanning<Self>)>) -> Self {
        Self::Object(o)
    }

    /// Resolves all variables of this [`InputValue`] to their actual
    /// `values`.
    ///
    /// If a variable is not present in the `values`:
    /// - Returns [`None`] in case this is an [`InputValue::Variable`].
    /// - Skips the field in case of an [`InputValue::Object`] field.
    /// - Replaces with an [`InputValue::Null`] in case of an
    ///   [`InputValue::List`] element.
    ///
    /// This is done, because for an [`InputValue::Variable`] (or an
    /// [`InputValue::Object`] field) a default value can be used later, if
    /// it's provided. While on contrary, a single [`InputValue::List`]
    /// element cannot have a default value.
    #[must_use]
    pub fn into_const(self, values: &Variables<S>) -> Option<Self>
    where
        S: Clone,
    {
        match self {
            Self::Variable(v) => values.get(v.as_str()).cloned(),
            Self::List(l) => Some(Self::List(
                l.into_iter()
                    .map(|s| s.map(|v| v.into_const(values).unwrap_or_else(Self::null)))
                    .collect(),
            )),
            Self::Object(o) => Some(Self::Object(
                o.into_iter()
                    .filter_map(|(sk, sv)| sv.and_then(|v| v.into_const(values)).map(|sv| (sk, sv)))
                    .collect(),
            )),
            v => Some(v),
        }
    }

    /// Does the value represent `null`?
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Does the value represent a variable?
    pub fn is_variable(&self) -> bool {
        matches!(self, Self::Variable(_))
    }

    /// View the underlying enum value, if present.
    pub fn as_enum_value(&self) -> Option<&str> {
        match self {
            Self::Enum(e) => Some(e.as_str()),
            _ => None,
        }
    }

    /// View the underlying scalar value, if present.
    pub fn as_scalar(&self) -> Option<&S> {
        match self {
            Self::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// View the underlying string value, if present.
    pub fn as_string_value(&self) -> Option<&str>
    where
        S: ScalarValue,
    {
        self.as_scalar().and_then(S::as_str)
    }

    /// View the underlying integer value, if present.
    pub fn as_int_value(&self) -> Option<i32>
    where
        S: ScalarValue,
    {
        self.as_scalar().and_then(S::as_int)
    }

    /// View the underlying boolean value, if present.
    pub fn as_boolean_value(&self) -> Option<bool>
    where
        S: ScalarValue,
    {
        self.as_scalar().and_then(S::as_boolean)
    }

    /// Converts this [`InputValue`] to a list of its members, if it is a
    /// list.
    pub fn to_list_value(&self) -> Option<Vec<&Self>> {
        match self {
            Self::List(l) => Some(l.iter().map(|s| &s.item).collect()),
            _ => None,
        }
    }

    /// Converts this [`InputValue`] to its object fields, if it is an
    /// object.
    pub fn to_object_value(&self) -> Option<Vec<(&str, &Self)>> {
        match self {
            Self::Object(o) => Some(
                o.iter()
                    .map(|(sk, sv)| (sk.item.as_str(), &sv.item))
                    .collect(),
            ),
            _ => None,
        }
    }

    /// Compares equality with another [`InputValue`] ignoring any source
    /// position information.
    pub fn unlocated_eq(&self, other: &Self) -> bool
    where
        S: PartialEq,
    {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Scalar(s1), Self::Scalar(s2)) => s1 == s2,
            (Self::Enum(s1), Self::Enum(s2)) | (Self::Variable(s1), Self::Variable(s2)) => s1 == s2,
            (Self::List(l1), Self::List(l2)) => {
                l1.len() == l2.len()
                    && l1
                        .iter()
                        .zip(l2.iter())
                        .all(|(v1, v2)| v1.item.unlocated_eq(&v2.item))
            }
            (Self::Object(o1), Self::Object(o2)) => {
                o1.len() == o2.len()
                    && o1.iter().all(|(sk1, sv1)| {
                        o2.iter().any(|(sk2, sv2)| {
                            sk1.item == sk2.item && sv1.item.unlocated_eq(&sv2.item)
                        })
                    })
            }
            _ => false,
        }
    }
}

impl<S: ScalarValue> fmt::Display for InputValue<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Scalar(s) => {
                if let Some(string) = s.as_str() {
                    write!(f, "\"{string}\"")
                } else {
                    write!(f, "{s}")
                }
            }
            Self::Enum(v) => write!(f, "{v}"),
            Self::Variable(v) => write!(f, "${v}"),
            Self::List(v) => {
                write!(f, "[")?;
                for (i, spanning) in v.iter().enumerate() {
                    spanning.item.fmt(f)?;
                    if i < v.len() - 1 {
                        write!(f, ", ")?;
                    }
                }
                write!(f, "]")
            }
            Self::Object(o) => {
                write!(f, "{{")?;
                for (i, (k, v)) in o.iter().enumerate() {
                    write!(f, "{}: ", k.item)?;
                    v.item.fmt(f)?;
                    if i < o.len() - 1 {
                        write!(f, ", ")?;
                    }
                }
                write!(f, "}}")
            }
        }
    }
}

impl<'a, S: From<String>> From<&'a str> for InputValue<S> {
    fn from(s: &'a str) -> Self {
        Self::scalar(s.to_owned())
    }
}

impl<S: From<String>> From<String> for InputValue<S> {
    fn from(s: String) -> Self {
        Self::scalar(s)
    }
}

impl<S: From<i32>> From<i32> for InputValue<S> {
    fn from(i: i32) -> Self {
        Self::scalar(i)
    }
}

impl<S: From<f64>> From<f64> for InputValue<S> {
    fn from(f: f64) -> Self {
        Self::scalar(f)
    }
}

impl<S: From<bool>> From<bool> for InputValue<S> {
    fn from(b: bool) -> Self {
        Self::scalar(b)
    }
}

impl<S, T> From<Option<T>> for InputValue<S>
where
    Self: From<T>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Self::Null,
        }
    }
}

/// Definition of a single operation variable.
#[derive(Clone, Debug, PartialEq)]
pub struct VariableDefinition<S> {
    /// Type of this variable.
    pub var_type: Spanning<Type>,

    /// Default value of this variable, if any.
    pub default_value: Option<Spanning<InputValue<S>>>,

    /// Directives on this variable definition, if any.
    pub directives: Option<Vec<Spanning<Directive<S>>>>,
}

/// Arguments of a field or a directive.
#[derive(Clone, Debug, PartialEq)]
pub struct Arguments<S> {
    /// Alternating name/value pairs in document order.
    pub items: Vec<(Spanning<ArcStr>, Spanning<InputValue<S>>)>,
}

impl<S> Arguments<S> {
    /// Looks up an argument value by `key`.
    pub fn get(&self, key: &str) -> Option<&Spanning<InputValue<S>>> {
        self.items
            .iter()
            .find(|(k, _)| k.item.as_str() == key)
            .map(|(_, v)| v)
    }

    /// Iterates over all name/value pairs.
    pub fn iter(&self) -> std::slice::Iter<'_, (Spanning<ArcStr>, Spanning<InputValue<S>>)> {
        self.items.iter()
    }
}

/// Variable definitions of an operation.
#[derive(Clone, Debug, PartialEq)]
pub struct VariablesDefinition<S> {
    /// Named definitions in document order.
    pub items: Vec<(Spanning<ArcStr>, VariableDefinition<S>)>,
}

impl<S> VariablesDefinition<S> {
    /// Iterates over all named definitions.
    pub fn iter(&self) -> std::slice::Iter<'_, (Spanning<ArcStr>, VariableDefinition<S>)> {
        self.items.iter()
    }
}

/// A single field selection.
#[derive(Clone, Debug, PartialEq)]
pub struct Field<S> {
    /// The alias under which the value appears in the response, if any.
    pub alias: Option<Spanning<ArcStr>>,

    /// The name of the selected field.
    pub name: Spanning<ArcStr>,

    /// The arguments passed to the field, if any.
    pub arguments: Option<Spanning<Arguments<S>>>,

    /// The directives on the selection, if any.
    pub directives: Option<Vec<Spanning<Directive<S>>>>,

    /// The sub-selection, present for fields of composite types.
    pub selection_set: Option<Vec<Selection<S>>>,
}

impl<S> Field<S> {
    /// The response name of this field: its alias if set, else its name.
    pub fn response_name(&self) -> &ArcStr {
        self.alias.as_ref().map(|a| &a.item).unwrap_or(&self.name.item)
    }
}

/// A fragment spread selection (`...name`).
#[derive(Clone, Debug, PartialEq)]
pub struct FragmentSpread<S> {
    /// Name of the spread fragment.
    pub name: Spanning<ArcStr>,

    /// The directives on the spread, if any.
    pub directives: Option<Vec<Spanning<Directive<S>>>>,
}

/// An inline fragment selection (`...on Type { … }`).
#[derive(Clone, Debug, PartialEq)]
pub struct InlineFragment<S> {
    /// The type condition, if any.
    pub type_condition: Option<Spanning<ArcStr>>,

    /// The directives on the fragment, if any.
    pub directives: Option<Vec<Spanning<Directive<S>>>>,

    /// The selections of this fragment.
    pub selection_set: Vec<Selection<S>>,
}

/// Entry in a GraphQL selection set.
///
/// This enum represents one of the three variants of a selection that exist
/// in GraphQL: a field, a fragment spread, or an inline fragment. Each of
/// the variants references their location in the query source.
///
/// ```text
/// {
///   field(withArg: 123) { subField }
///   ...fragmentSpread
///   ...on User {
///     inlineFragmentField
///   }
/// }
/// ```
#[derive(Clone, Debug, PartialEq)]
#[allow(missing_docs)]
pub enum Selection<S = DefaultScalarValue> {
    Field(Spanning<Field<S>>),
    FragmentSpread(Spanning<FragmentSpread<S>>),
    InlineFragment(Spanning<InlineFragment<S>>),
}

/// A directive applied to a selection or a fragment.
#[derive(Clone, Debug, PartialEq)]
pub struct Directive<S> {
    /// Name of the directive, without the `@`.
    pub name: Spanning<ArcStr>,

    /// The arguments passed to the directive, if any.
    pub arguments: Option<Spanning<Arguments<S>>>,
}

/// The kind of an executable operation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[allow(missing_docs)]
pub enum OperationType {
    Query,
    Mutation,
    Subscription,
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Query => "query",
            Self::Mutation => "mutation",
            Self::Subscription => "subscription",
        })
    }
}

/// A single executable operation definition.
#[derive(Clone, Debug, PartialEq)]
pub struct Operation<S> {
    /// The kind of this operation.
    pub operation_type: OperationType,

    /// The name of this operation, if any.
    pub name: Option<Spanning<ArcStr>>,

    /// The variable definitions of this operation, if any.
    pub variable_definitions: Option<Spanning<VariablesDefinition<S>>>,

    /// The directives on this operation, if any.
    pub directives: Option<Vec<Spanning<Directive<S>>>>,

    /// The root selections of this operation.
    pub selection_set: Vec<Selection<S>>,
}

/// A fragment definition.
#[derive(Clone, Debug, PartialEq)]
pub struct Fragment<S> {
    /// Name of this fragment.
    pub name: Spanning<ArcStr>,

    /// The type this fragment applies to.
    pub type_condition: Spanning<ArcStr>,

    /// The directives on this fragment, if any.
    pub directives: Option<Vec<Spanning<Directive<S>>>>,

    /// The selections of this fragment.
    pub selection_set: Vec<Selection<S>>,
}

/// A top-level definition in an executable document.
#[derive(Clone, Debug, PartialEq)]
#[allow(missing_docs)]
pub enum Definition<S = DefaultScalarValue> {
    Operation(Spanning<Operation<S>>),
    Fragment(Spanning<Fragment<S>>),
}

/// A borrowed executable document.
pub type Document<S> = [Definition<S>];

/// An owned executable document.
pub type OwnedDocument<S> = Vec<Definition<S>>;
