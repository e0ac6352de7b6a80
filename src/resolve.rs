//! The resolver surface: values returned by resolvers, the closures a schema
//! carries, and the informational bundle handed to every invocation.

use std::{any::Any, fmt, sync::Arc};

use arcstr::ArcStr;
use fnv::FnvHashMap;
use futures::{future::BoxFuture, stream::BoxStream};
use indexmap::IndexMap;

use crate::{
    ast::{Fragment, InputValue, Operation, Spanning, Type},
    executor::{FieldPath, FieldResult, Variables},
    schema::{
        meta::{Argument, ObjectMeta},
        model::SchemaType,
    },
    value::{DefaultScalarValue, ScalarValue, Value},
};

/// A value produced by a resolver.
///
/// Mirrors the shapes a resolver may hand back to the engine: an eagerly
/// available [`Value`], a synchronous iterable whose items may themselves be
/// eager or deferred, a future, or an asynchronous iterable driving a
/// streamed list.
pub enum ResolvedValue<S = DefaultScalarValue> {
    /// An eagerly available value.
    Ready(Value<S>),

    /// A synchronous iterable. Unlike [`ResolvedValue::Ready`] holding a
    /// [`Value::List`], the items may be futures.
    List(Vec<ResolvedValue<S>>),

    /// A value that becomes available later.
    Future(ResolvedFuture<S>),

    /// An asynchronous iterable, e.g. for a `@stream`ed list.
    Stream(ResolvedStream<S>),
}

/// A [`ResolvedValue`] that becomes available later.
pub type ResolvedFuture<S> = BoxFuture<'static, FieldResult<ResolvedValue<S>, S>>;

/// An asynchronous sequence of [`ResolvedValue`]s.
pub type ResolvedStream<S> = BoxStream<'static, FieldResult<ResolvedValue<S>, S>>;

impl<S> ResolvedValue<S> {
    /// Constructs an eagerly available value.
    pub fn ready(value: impl Into<Value<S>>) -> Self {
        Self::Ready(value.into())
    }

    /// Constructs an eagerly available `null`.
    pub fn null() -> Self {
        Self::Ready(Value::Null)
    }

    /// Constructs a value that becomes available later.
    pub fn future<F>(future: F) -> Self
    where
        F: std::future::Future<Output = FieldResult<ResolvedValue<S>, S>> + Send + 'static,
    {
        Self::Future(Box::pin(future))
    }

    /// Constructs an asynchronous sequence of values.
    pub fn stream<T>(stream: T) -> Self
    where
        T: futures::Stream<Item = FieldResult<ResolvedValue<S>, S>> + Send + 'static,
    {
        Self::Stream(Box::pin(stream))
    }

    /// Converts into a plain [`Value`], if every part of this
    /// [`ResolvedValue`] is eagerly available.
    pub(crate) fn try_into_value(self) -> Option<Value<S>> {
        match self {
            Self::Ready(v) => Some(v),
            Self::List(items) => items
                .into_iter()
                .map(Self::try_into_value)
                .collect::<Option<Vec<_>>>()
                .map(Value::List),
            Self::Future(..) | Self::Stream(..) => None,
        }
    }
}

impl<S: fmt::Debug> fmt::Debug for ResolvedValue<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(v) => f.debug_tuple("Ready").field(v).finish(),
            Self::List(items) => f.debug_tuple("List").field(items).finish(),
            Self::Future(..) => f.write_str("Future(..)"),
            Self::Stream(..) => f.write_str("Stream(..)"),
        }
    }
}

impl<S, T> From<T> for ResolvedValue<S>
where
    Value<S>: From<T>,
{
    fn from(value: T) -> Self {
        Self::Ready(value.into())
    }
}

/// Either an immediately available value or a future resolving to one.
///
/// Used for the auxiliary resolution points that may suspend: abstract-type
/// resolution and `is_type_of` predicates.
pub enum Deferrable<T, S = DefaultScalarValue> {
    /// The immediately available value.
    Value(T),

    /// A future resolving to the value.
    Future(BoxFuture<'static, FieldResult<T, S>>),
}

impl<T: Send, S> Deferrable<T, S> {
    pub(crate) async fn resolve(self) -> FieldResult<T, S> {
        match self {
            Self::Value(v) => Ok(v),
            Self::Future(f) => f.await,
        }
    }
}

/// Container for the coerced arguments of one field invocation.
#[derive(Debug)]
pub struct Arguments<S = DefaultScalarValue> {
    args: Option<IndexMap<ArcStr, InputValue<S>>>,
}

impl<S> Arguments<S> {
    /// Builds an [`Arguments`] container out of already coerced `args`,
    /// substituting the `meta_args` defaults for arguments that were not
    /// provided or were provided as explicit `null`.
    pub fn new(
        mut args: Option<IndexMap<ArcStr, InputValue<S>>>,
        meta_args: &Option<Vec<Argument<S>>>,
    ) -> Self
    where
        S: Clone,
    {
        if meta_args.is_some() && args.is_none() {
            args = Some(IndexMap::new());
        }

        if let (Some(args), Some(meta_args)) = (&mut args, meta_args) {
            for arg in meta_args {
                if !args.contains_key(&arg.name) || args[arg.name.as_str()].is_null() {
                    if let Some(default_value) = &arg.default_value {
                        args.insert(arg.name.clone(), default_value.clone());
                    } else {
                        args.insert(arg.name.clone(), InputValue::null());
                    }
                }
            }
        }

        Self { args }
    }

    /// Gets an argument value by `key`.
    ///
    /// Absent arguments of `null`able types without defaults are reported as
    /// [`InputValue::Null`] rather than [`None`].
    pub fn get(&self, key: &str) -> Option<&InputValue<S>> {
        self.args.as_ref().and_then(|args| args.get(key))
    }
}

/// Snapshot describing the current field invocation, passed to each
/// resolver.
///
/// Purely informational; resolvers cannot mutate it.
pub struct ResolveInfo<'a, S = DefaultScalarValue> {
    /// Name of the resolved field (not its response name).
    pub field_name: &'a str,

    /// All selection nodes grouped under the resolved response name.
    pub field_nodes: &'a [&'a Spanning<crate::ast::Field<S>>],

    /// The declared return type of the field.
    pub return_type: &'a Type,

    /// The object type the field is resolved on.
    pub parent_type: &'a ObjectMeta<S>,

    /// Response path of the field.
    pub path: &'a FieldPath,

    /// The schema the operation executes against.
    pub schema: &'a SchemaType<S>,

    /// Fragment definitions of the executed document, by name.
    pub fragments: &'a FnvHashMap<ArcStr, &'a Fragment<S>>,

    /// The root value the execution started from.
    pub root_value: &'a Value<S>,

    /// The executed operation.
    pub operation: &'a Spanning<Operation<S>>,

    /// The coerced variable values of this execution.
    pub variable_values: &'a Variables<S>,
}

impl<S> Clone for ResolveInfo<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for ResolveInfo<'_, S> {}

/// A field resolver carried by a schema field or supplied as the execution
/// default.
///
/// Invoked with the parent source value, the coerced arguments, the opaque
/// context value, and the invocation snapshot.
pub type BoxResolver<S> = Arc<
    dyn for<'a> Fn(
            &'a Value<S>,
            &'a Arguments<S>,
            &'a (dyn Any + Send + Sync),
            ResolveInfo<'a, S>,
        ) -> FieldResult<ResolvedValue<S>, S>
        + Send
        + Sync,
>;

/// A runtime-type resolver for abstract (interface or union) types.
///
/// Returns the *name* of the concrete object type the value belongs to, or
/// [`None`] if it could not be determined.
pub type BoxTypeResolver<S> = Arc<
    dyn for<'a> Fn(
            &'a Value<S>,
            &'a (dyn Any + Send + Sync),
            ResolveInfo<'a, S>,
            &'a str,
        ) -> FieldResult<Deferrable<Option<ArcStr>, S>, S>
        + Send
        + Sync,
>;

/// A predicate deciding whether a value belongs to an object type.
pub type IsTypeOfFn<S> =
    Arc<dyn for<'a> Fn(&'a Value<S>, &'a (dyn Any + Send + Sync)) -> Deferrable<bool, S> + Send + Sync>;

/// Wraps a closure into a [`BoxResolver`].
///
/// Useful where closure type inference needs the exact higher-ranked
/// signature spelled out once.
pub fn resolver_fn<S, F>(f: F) -> BoxResolver<S>
where
    F: for<'a> Fn(
            &'a Value<S>,
            &'a Arguments<S>,
            &'a (dyn Any + Send + Sync),
            ResolveInfo<'a, S>,
        ) -> FieldResult<ResolvedValue<S>, S>
        + Send
        + Sync
        + 'static,
{
    Arc::new(f)
}

/// The default field resolver: looks the field up as a property of the
/// source value, resolving to `null` when the source is not
/// property-accessible.
pub fn default_field_resolver<S: ScalarValue>() -> BoxResolver<S> {
    Arc::new(|source, _, _, info| {
        Ok(ResolvedValue::Ready(
            source
                .as_object_value()
                .and_then(|o| o.get_field_value(info.field_name))
                .cloned()
                .unwrap_or(Value::Null),
        ))
    })
}

/// The default runtime-type resolver for abstract types.
///
/// Inspects a `__typename` property of the value first; otherwise tries
/// each possible type's `is_type_of` predicate in declaration order. If any
/// predicate suspends, all suspended predicates are awaited together and
/// the first truthy one (still in declaration order) wins.
pub fn default_type_resolver<S: ScalarValue>() -> BoxTypeResolver<S> {
    Arc::new(|value, context, info, abstract_name| {
        if let Some(name) = value
            .as_object_value()
            .and_then(|o| o.get_field_value("__typename"))
            .and_then(Value::as_string_value)
        {
            return Ok(Deferrable::Value(Some(name.into())));
        }

        let mut pending: Vec<(ArcStr, BoxFuture<'static, FieldResult<bool, S>>)> = vec![];
        for possible in info.schema.possible_types(abstract_name) {
            if let Some(predicate) = &possible.is_type_of {
                match predicate(value, context) {
                    Deferrable::Value(true) => return Ok(Deferrable::Value(Some(possible.name.clone()))),
                    Deferrable::Value(false) => {}
                    Deferrable::Future(f) => pending.push((possible.name.clone(), f)),
                }
            }
        }

        if pending.is_empty() {
            return Ok(Deferrable::Value(None));
        }

        Ok(Deferrable::Future(Box::pin(async move {
            let (names, futures): (Vec<_>, Vec<_>) = pending.into_iter().unzip();
            let results = futures::future::join_all(futures).await;
            for (name, result) in names.into_iter().zip(results) {
                if result? {
                    return Ok(Some(name));
                }
            }
            Ok(None)
        })))
    })
}

/// The default subscription field resolver.
///
/// The execution core treats a subscription's initial payload exactly like
/// a query; the subscribe resolver is consumed by the external
/// source-stream layer, which falls back to plain property access too.
pub fn default_subscribe_field_resolver<S: ScalarValue>() -> BoxResolver<S> {
    default_field_resolver()
}
