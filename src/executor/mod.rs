//! Resolve the document to values.

pub(crate) mod collector;
pub(crate) mod completer;
pub(crate) mod incremental;
pub(crate) mod variables;

use std::{
    any::Any,
    cmp::Ordering,
    collections::HashMap,
    fmt::Display,
    mem,
    sync::{Arc, Mutex, RwLock},
};

use arcstr::ArcStr;
use fnv::FnvHashMap;
use futures::{stream::FuturesOrdered, FutureExt as _, StreamExt as _};
use tracing::instrument;

use crate::{
    ast::{
        Definition, Document, Fragment, InputValue, Operation, OperationType, SourcePosition,
        Spanning,
    },
    resolve::{
        default_field_resolver, default_subscribe_field_resolver, default_type_resolver,
        BoxResolver, BoxTypeResolver, ResolveInfo,
    },
    schema::{
        meta::{Field as FieldMeta, ObjectMeta},
        model::SchemaType,
    },
    value::{DefaultScalarValue, Object, ScalarValue, Value},
    GraphQLError,
};

pub use self::incremental::SubsequentPayloads;
pub(crate) use self::{
    collector::{CollectedFields, FieldNodes},
    incremental::{PayloadContext, PendingPayload},
};

/// The map of variables used for substitution during query execution.
pub type Variables<S = DefaultScalarValue> = HashMap<String, InputValue<S>>;

/// Error type for errors that occur during field resolution.
///
/// Field errors are represented by a human-readable error message and an
/// optional [`Value`] structure containing additional information.
///
/// They can be converted to from any type that implements
/// [`std::fmt::Display`], which makes error chaining with the `?` operator
/// a breeze:
///
/// ```rust
/// # use graphql_exec::FieldError;
/// fn get_string(data: Vec<u8>) -> Result<String, FieldError> {
///     let s = String::from_utf8(data)?;
///     Ok(s)
/// }
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct FieldError<S = DefaultScalarValue> {
    message: String,
    extensions: Value<S>,
}

impl<T: Display, S> From<T> for FieldError<S> {
    fn from(e: T) -> Self {
        Self {
            message: e.to_string(),
            extensions: Value::Null,
        }
    }
}

impl<S> FieldError<S> {
    /// Constructs a new [`FieldError`] with additional data.
    ///
    /// The `extensions` parameter will be added to the `"extensions"` field
    /// of the error object in the response. If it is [`Value::Null`], no
    /// extra data will be included.
    #[must_use]
    pub fn new<T: Display>(e: T, extensions: Value<S>) -> Self {
        Self {
            message: e.to_string(),
            extensions,
        }
    }

    /// Returns the `"message"` field of this [`FieldError`].
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the `"extensions"` field of this [`FieldError`].
    ///
    /// If there is no `"extensions"`, then [`Value::Null`] will be
    /// returned.
    #[must_use]
    pub fn extensions(&self) -> &Value<S> {
        &self.extensions
    }
}

/// The result of resolving the value of a field of type `T`.
pub type FieldResult<T, S = DefaultScalarValue> = Result<T, FieldError<S>>;

/// One segment of a response path: a response name or a list index.
#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd)]
#[allow(missing_docs)]
pub enum PathSegment {
    Field(ArcStr),
    Index(usize),
}

/// The response coordinates of the currently executed field.
///
/// A persistent chain of segments, created by extension and never mutated.
/// Field segments additionally carry the name of the object type declaring
/// the field, for error reporting.
#[derive(Clone, Debug)]
pub enum FieldPath {
    /// The root of the response.
    Root,

    /// A field, keyed in the response by its response name, declared on the
    /// named object type.
    Field(ArcStr, ArcStr, Arc<FieldPath>),

    /// An index in a list value.
    Index(usize, Arc<FieldPath>),
}

impl FieldPath {
    fn construct_path(&self, acc: &mut Vec<PathSegment>) {
        match self {
            Self::Root => {}
            Self::Field(name, _, parent) => {
                parent.construct_path(acc);
                acc.push(PathSegment::Field(name.clone()));
            }
            Self::Index(index, parent) => {
                parent.construct_path(acc);
                acc.push(PathSegment::Index(*index));
            }
        }
    }

    /// Serializes this path into an ordered sequence of segments.
    pub fn to_segments(&self) -> Vec<PathSegment> {
        let mut acc = Vec::new();
        self.construct_path(&mut acc);
        acc
    }
}

/// Error type for errors that occur during query execution.
///
/// All execution errors contain the source positions of the field nodes
/// that failed to resolve, and the response path of the field as it was
/// when the error was raised (before any `null` bubbling).
#[derive(Clone, Debug, PartialEq)]
pub struct ExecutionError<S = DefaultScalarValue> {
    locations: Vec<SourcePosition>,
    path: Vec<PathSegment>,
    error: FieldError<S>,
}

impl<S> Eq for ExecutionError<S> where Self: PartialEq {}

impl<S> ExecutionError<S> {
    #[doc(hidden)]
    pub fn new(
        locations: Vec<SourcePosition>,
        path: Vec<PathSegment>,
        error: FieldError<S>,
    ) -> Self {
        Self {
            locations,
            path,
            error,
        }
    }

    /// Constructs a new execution error occurring at the beginning of the
    /// query.
    pub fn at_origin(error: FieldError<S>) -> Self {
        Self {
            locations: vec![SourcePosition::new_origin()],
            path: Vec::new(),
            error,
        }
    }

    /// The error message and extensions.
    pub fn error(&self) -> &FieldError<S> {
        &self.error
    }

    /// The source locations _in the query_ of the field that failed to
    /// resolve.
    pub fn locations(&self) -> &[SourcePosition] {
        &self.locations
    }

    /// The response path leading to the field that generated this error.
    pub fn path(&self) -> &[PathSegment] {
        &self.path
    }
}

impl<S> PartialOrd for ExecutionError<S>
where
    Self: PartialEq,
{
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<S> Ord for ExecutionError<S>
where
    Self: Eq,
{
    fn cmp(&self, other: &Self) -> Ordering {
        (&self.locations, &self.path, &self.error.message).cmp(&(
            &other.locations,
            &other.path,
            &other.error.message,
        ))
    }
}

/// An append-only log of [`ExecutionError`]s.
///
/// The "active" log is either the execution's primary log or the log of the
/// incremental-delivery record currently being produced; it is threaded
/// down the completion recursion as an explicit parameter.
pub(crate) type ErrorLog<S> = RwLock<Vec<ExecutionError<S>>>;

pub(crate) fn push_error<S>(log: &ErrorLog<S>, error: ExecutionError<S>) {
    log.write().unwrap().push(error);
}

/// The primary payload of an execution.
///
/// `data` is present exactly when the root execution produced a value, even
/// if that value is `null` from error bubbling; `errors` is present exactly
/// when non-empty; `has_next` is present exactly when incremental payloads
/// follow.
#[derive(Clone, Debug, PartialEq)]
pub struct ExecutionResult<S = DefaultScalarValue> {
    /// The errors collected for this payload, in settlement order.
    pub errors: Option<Vec<ExecutionError<S>>>,

    /// The response tree, if the root execution produced one.
    pub data: Option<Value<S>>,

    /// Whether incremental payloads follow this one.
    pub has_next: Option<bool>,

    /// Optional free-form extensions.
    pub extensions: Option<Object<S>>,
}

impl<S> ExecutionResult<S> {
    pub(crate) fn from_data(data: Value<S>, errors: Vec<ExecutionError<S>>, has_next: Option<bool>) -> Self {
        Self {
            errors: (!errors.is_empty()).then_some(errors),
            data: Some(data),
            has_next,
            extensions: None,
        }
    }

    /// A pre-flight failure: `errors` only, and no `data` key at all.
    pub(crate) fn request_errors(errors: Vec<ExecutionError<S>>) -> Self {
        Self {
            errors: Some(errors),
            data: None,
            has_next: None,
            extensions: None,
        }
    }
}

/// One incremental-delivery payload following the primary one.
#[derive(Clone, Debug, PartialEq)]
pub struct ExecutionPatchResult<S = DefaultScalarValue> {
    /// The errors collected for this payload, in settlement order.
    pub errors: Option<Vec<ExecutionError<S>>>,

    /// The value this patch inserts at `path`.
    pub data: Option<Value<S>>,

    /// Where in the response tree this patch belongs. Absent only on the
    /// standalone terminal payload.
    pub path: Option<Vec<PathSegment>>,

    /// The label of the `@defer`/`@stream` directive that produced this
    /// patch, if one was given.
    pub label: Option<ArcStr>,

    /// Whether further payloads follow this one.
    pub has_next: bool,

    /// Optional free-form extensions.
    pub extensions: Option<Object<S>>,
}

impl<S> ExecutionPatchResult<S> {
    /// The standalone `{"hasNext": false}` terminal payload.
    pub(crate) fn terminal() -> Self {
        Self {
            errors: None,
            data: None,
            path: None,
            label: None,
            has_next: false,
            extensions: None,
        }
    }
}

/// One element of the response sequence of an incremental execution.
#[derive(Clone, Debug, PartialEq)]
#[allow(missing_docs)]
pub enum ResponsePayload<S = DefaultScalarValue> {
    Initial(ExecutionResult<S>),
    Patch(ExecutionPatchResult<S>),
}

impl<S> ResponsePayload<S> {
    /// The initial payload, if this is one.
    pub fn as_initial(&self) -> Option<&ExecutionResult<S>> {
        match self {
            Self::Initial(r) => Some(r),
            Self::Patch(..) => None,
        }
    }

    /// The patch payload, if this is one.
    pub fn as_patch(&self) -> Option<&ExecutionPatchResult<S>> {
        match self {
            Self::Initial(..) => None,
            Self::Patch(p) => Some(p),
        }
    }
}

/// Everything [`execute`] needs to run one operation.
pub struct ExecutionArgs<'a, S = DefaultScalarValue> {
    /// The validated schema to execute against.
    pub schema: &'a SchemaType<S>,

    /// The parsed, validated operation document.
    pub document: &'a Document<S>,

    /// Selects the operation to execute; required when the document
    /// contains more than one.
    pub operation_name: Option<&'a str>,

    /// The value the root type resolves fields on. Defaults to `null`.
    pub root_value: Option<Value<S>>,

    /// Opaque value passed through to every resolver.
    pub context_value: Option<&'a (dyn Any + Send + Sync)>,

    /// The raw variable values, coerced against the operation's variable
    /// definitions before execution starts.
    pub variable_values: Option<&'a Variables<S>>,

    /// Overrides the default field resolver.
    pub field_resolver: Option<BoxResolver<S>>,

    /// Overrides the default abstract-type resolver.
    pub type_resolver: Option<BoxTypeResolver<S>>,

    /// Overrides the default subscribe field resolver, consumed by the
    /// external subscription source-stream layer.
    pub subscribe_field_resolver: Option<BoxResolver<S>>,
}

impl<'a, S> ExecutionArgs<'a, S> {
    /// Constructs [`ExecutionArgs`] out of the two required inputs, leaving
    /// every optional one unset.
    pub fn new(schema: &'a SchemaType<S>, document: &'a Document<S>) -> Self {
        Self {
            schema,
            document,
            operation_name: None,
            root_value: None,
            context_value: None,
            variable_values: None,
            field_resolver: None,
            type_resolver: None,
            subscribe_field_resolver: None,
        }
    }
}

/// The outcome of [`execute`]: either a single complete result, or the
/// initial result followed by incremental patches.
pub enum Response<'a, S = DefaultScalarValue> {
    /// The execution finished without incremental delivery.
    Single(ExecutionResult<S>),

    /// The execution produced deferred or streamed payloads; iterate the
    /// contained sequence to receive the initial result and the patches.
    Incremental(SubsequentPayloads<'a, S>),
}

impl<'a, S> Response<'a, S> {
    /// The single complete result, if no incremental payloads follow.
    pub fn into_single(self) -> Option<ExecutionResult<S>> {
        match self {
            Self::Single(r) => Some(r),
            Self::Incremental(..) => None,
        }
    }

    /// The incremental payload sequence, if the execution produced one.
    pub fn into_incremental(self) -> Option<SubsequentPayloads<'a, S>> {
        match self {
            Self::Single(..) => None,
            Self::Incremental(s) => Some(s),
        }
    }
}

static NULL_CONTEXT: () = ();

/// The state of one execution.
///
/// Immutable after construction except for two append-only registries: the
/// primary error log and the pending incremental payloads.
pub struct ExecutionContext<'a, S = DefaultScalarValue> {
    pub(crate) schema: &'a SchemaType<S>,
    pub(crate) fragments: FnvHashMap<ArcStr, &'a Fragment<S>>,
    pub(crate) operation: &'a Spanning<Operation<S>>,
    pub(crate) root_type: &'a ObjectMeta<S>,
    pub(crate) variables: Variables<S>,
    pub(crate) root_value: Value<S>,
    pub(crate) context_value: &'a (dyn Any + Send + Sync),
    pub(crate) field_resolver: BoxResolver<S>,
    pub(crate) type_resolver: BoxTypeResolver<S>,
    subscribe_field_resolver: BoxResolver<S>,
    pub(crate) errors: ErrorLog<S>,
    pub(crate) pending: Mutex<Vec<PendingPayload<'a, S>>>,
    pub(crate) subfield_cache: RwLock<FnvHashMap<(ArcStr, usize), Arc<CollectedFields<'a, S>>>>,
}

impl<'a, S: ScalarValue> ExecutionContext<'a, S> {
    fn new(args: ExecutionArgs<'a, S>) -> Result<Self, Vec<ExecutionError<S>>> {
        let mut fragments = FnvHashMap::default();
        let mut operation = None;
        let mut multiple = false;

        for def in args.document {
            match def {
                Definition::Operation(op) => {
                    if args.operation_name.is_none() && operation.is_some() {
                        multiple = true;
                    }
                    let selected = match args.operation_name {
                        None => true,
                        Some(name) => {
                            op.item.name.as_ref().map(|n| n.item.as_str()) == Some(name)
                        }
                    };
                    if selected {
                        operation = Some(op);
                    }
                }
                Definition::Fragment(f) => {
                    fragments.insert(f.item.name.item.clone(), &f.item);
                }
            }
        }

        if multiple {
            return Err(vec![ExecutionError::at_origin(
                "Must provide operation name if query contains multiple operations.".into(),
            )]);
        }
        let operation = operation.ok_or_else(|| {
            vec![ExecutionError::at_origin(match args.operation_name {
                Some(name) => format!("Unknown operation named \"{name}\".").into(),
                None => "Must provide an operation.".into(),
            })]
        })?;

        let root_type = match operation.item.operation_type {
            OperationType::Query => Some(args.schema.query_type()),
            OperationType::Mutation => args.schema.mutation_type(),
            OperationType::Subscription => args.schema.subscription_type(),
        };
        let root_type = root_type.ok_or_else(|| {
            vec![ExecutionError::new(
                vec![operation.span.start],
                vec![],
                format!(
                    "Schema is not configured to execute {} operation.",
                    operation.item.operation_type,
                )
                .into(),
            )]
        })?;

        let empty_variables = Variables::new();
        let variables = variables::coerce_variable_values(
            args.schema,
            operation,
            args.variable_values.unwrap_or(&empty_variables),
        )?;

        Ok(Self {
            schema: args.schema,
            fragments,
            operation,
            root_type,
            variables,
            root_value: args.root_value.unwrap_or(Value::Null),
            context_value: args.context_value.unwrap_or(&NULL_CONTEXT),
            field_resolver: args.field_resolver.unwrap_or_else(default_field_resolver),
            type_resolver: args.type_resolver.unwrap_or_else(default_type_resolver),
            subscribe_field_resolver: args
                .subscribe_field_resolver
                .unwrap_or_else(default_subscribe_field_resolver),
            errors: ErrorLog::default(),
            pending: Mutex::default(),
            subfield_cache: RwLock::default(),
        })
    }

    /// The schema this execution runs against.
    pub fn schema(&self) -> &'a SchemaType<S> {
        self.schema
    }

    /// The executed operation.
    pub fn operation(&self) -> &'a Spanning<Operation<S>> {
        self.operation
    }

    /// The coerced variable values of this execution.
    pub fn variables(&self) -> &Variables<S> {
        &self.variables
    }

    /// Looks a fragment definition up by name.
    pub fn fragment_by_name(&self, name: &str) -> Option<&'a Fragment<S>> {
        self.fragments.get(name).copied()
    }

    /// The opaque context value resolvers receive.
    pub fn context_value(&self) -> &'a (dyn Any + Send + Sync) {
        self.context_value
    }

    /// The subscribe field resolver carried for the external subscription
    /// source-stream layer.
    pub fn subscribe_field_resolver(&self) -> &BoxResolver<S> {
        &self.subscribe_field_resolver
    }
}

impl<'a, S> ExecutionContext<'a, S> {
    pub(crate) fn push_payload(&self, payload: PendingPayload<'a, S>) {
        self.pending.lock().unwrap().push(payload);
    }

    pub(crate) fn take_pending(&self) -> Vec<PendingPayload<'a, S>> {
        mem::take(&mut *self.pending.lock().unwrap())
    }
}

/// The grouped field currently being completed: its selection nodes, the
/// object type declaring it, and its definition.
pub(crate) struct FieldRef<'a, S> {
    pub nodes: FieldNodes<'a, S>,
    pub parent_type: &'a ObjectMeta<S>,
    pub def: &'a FieldMeta<S>,
}

impl<S> Clone for FieldRef<'_, S> {
    fn clone(&self) -> Self {
        Self {
            nodes: Arc::clone(&self.nodes),
            parent_type: self.parent_type,
            def: self.def,
        }
    }
}

/// Converts a [`FieldError`] raised at `path` into a located
/// [`ExecutionError`] carrying the source positions of the originating
/// field nodes.
pub(crate) fn located_error<S>(
    error: FieldError<S>,
    nodes: &[&Spanning<crate::ast::Field<S>>],
    path: &FieldPath,
) -> ExecutionError<S> {
    ExecutionError::new(
        nodes.iter().map(|n| *n.start()).collect(),
        path.to_segments(),
        error,
    )
}

/// Executes the operation the `args` describe.
///
/// Pre-flight failures (operation selection, variable coercion, an
/// unconfigured root type) come back as a [`Response::Single`] carrying
/// `errors` and no `data`. A schema that fails validation cannot be
/// constructed in the first place, so it cannot reach this function.
///
/// The returned future completes on its first poll when no resolver
/// suspends; [`execute_sync`] relies on exactly that.
pub async fn execute<'a, S: ScalarValue>(args: ExecutionArgs<'a, S>) -> Response<'a, S> {
    let ctx = match ExecutionContext::new(args) {
        Ok(ctx) => Arc::new(ctx),
        Err(errors) => return Response::Single(ExecutionResult::request_errors(errors)),
    };

    let data = execute_operation(&ctx).await;

    let errors = mem::take(&mut *ctx.errors.write().unwrap());
    if ctx.pending.lock().unwrap().is_empty() {
        Response::Single(ExecutionResult::from_data(data, errors, None))
    } else {
        let initial = ExecutionResult::from_data(data, errors, Some(true));
        Response::Incremental(SubsequentPayloads::new(Arc::clone(&ctx), initial))
    }
}

/// Executes the operation the `args` describe, requiring it to finish
/// without suspending.
///
/// Returns [`GraphQLError::NotSynchronous`] when a resolver suspends or
/// when the execution produces incremental payloads.
pub fn execute_sync<S: ScalarValue>(
    args: ExecutionArgs<'_, S>,
) -> Result<ExecutionResult<S>, GraphQLError> {
    match execute(args).now_or_never() {
        Some(Response::Single(result)) => Ok(result),
        Some(Response::Incremental(..)) | None => Err(GraphQLError::NotSynchronous),
    }
}

#[instrument(level = "debug", skip_all, fields(operation_type = %ctx.operation.item.operation_type))]
async fn execute_operation<'a, S: ScalarValue>(ctx: &Arc<ExecutionContext<'a, S>>) -> Value<S> {
    let operation = &ctx.operation.item;
    let root_type = ctx.root_type;
    let root_path = Arc::new(FieldPath::Root);

    let collected = collector::collect_fields(
        ctx.schema,
        &ctx.fragments,
        &ctx.variables,
        root_type,
        &operation.selection_set,
    );
    for patch in collected.patches {
        incremental::defer_fields(
            ctx,
            root_type,
            ctx.root_value.clone(),
            patch.label,
            patch.fields,
            Arc::clone(&root_path),
            None,
        );
    }

    let result = match operation.operation_type {
        OperationType::Mutation => {
            execute_fields_serially(
                ctx,
                root_type,
                &ctx.root_value,
                &root_path,
                &collected.fields,
                &ctx.errors,
                None,
            )
            .await
        }
        OperationType::Query | OperationType::Subscription => {
            execute_fields(
                ctx,
                root_type,
                &ctx.root_value,
                &root_path,
                &collected.fields,
                &ctx.errors,
                None,
            )
            .await
        }
    };

    match result {
        Ok(value) => value,
        Err(error) => {
            // A non-null root field bubbled all the way up.
            push_error(&ctx.errors, error);
            Value::Null
        }
    }
}

/// Executes a grouped field set in parallel: every field execution is
/// launched in document order, and the result map preserves the original
/// response-name order.
///
/// An error bubbling out of a non-null field aborts the assembly and
/// re-propagates outward.
#[allow(clippy::too_many_arguments)]
pub(crate) async fn execute_fields<'a, S: ScalarValue>(
    ctx: &Arc<ExecutionContext<'a, S>>,
    parent_type: &'a ObjectMeta<S>,
    source: &Value<S>,
    path: &Arc<FieldPath>,
    fields: &indexmap::IndexMap<ArcStr, FieldNodes<'a, S>>,
    errors: &ErrorLog<S>,
    payload: Option<&PayloadContext<S>>,
) -> Result<Value<S>, ExecutionError<S>> {
    let mut pending = FuturesOrdered::new();
    for (response_name, nodes) in fields {
        pending.push_back(async move {
            let result =
                execute_field(ctx, parent_type, source, response_name, nodes, path, errors, payload)
                    .await;
            (response_name, result)
        });
    }

    let mut object = Object::with_capacity(fields.len());
    while let Some((response_name, result)) = pending.next().await {
        match result {
            Ok(Some(value)) => {
                object.add_field(response_name.clone(), value);
            }
            Ok(None) => {}
            Err(error) => return Err(error),
        }
    }
    Ok(Value::Object(object))
}

/// Executes a grouped field set serially: each field execution starts only
/// after the previous one's value has settled.
#[allow(clippy::too_many_arguments)]
pub(crate) async fn execute_fields_serially<'a, S: ScalarValue>(
    ctx: &Arc<ExecutionContext<'a, S>>,
    parent_type: &'a ObjectMeta<S>,
    source: &Value<S>,
    path: &Arc<FieldPath>,
    fields: &indexmap::IndexMap<ArcStr, FieldNodes<'a, S>>,
    errors: &ErrorLog<S>,
    payload: Option<&PayloadContext<S>>,
) -> Result<Value<S>, ExecutionError<S>> {
    let mut object = Object::with_capacity(fields.len());
    for (response_name, nodes) in fields {
        let result =
            execute_field(ctx, parent_type, source, response_name, nodes, path, errors, payload)
                .await;
        match result {
            Ok(Some(value)) => {
                object.add_field(response_name.clone(), value);
            }
            Ok(None) => {}
            Err(error) => return Err(error),
        }
    }
    Ok(Value::Object(object))
}

/// Resolves and completes one grouped field.
///
/// Returns `Ok(None)` when the field is not defined on `parent_type` (the
/// entry is then omitted from the result map), and `Err` when a raised
/// error must propagate past this field's non-null boundary.
#[allow(clippy::too_many_arguments)]
async fn execute_field<'a, S: ScalarValue>(
    ctx: &Arc<ExecutionContext<'a, S>>,
    parent_type: &'a ObjectMeta<S>,
    source: &Value<S>,
    response_name: &ArcStr,
    nodes: &FieldNodes<'a, S>,
    parent_path: &Arc<FieldPath>,
    errors: &ErrorLog<S>,
    payload: Option<&PayloadContext<S>>,
) -> Result<Option<Value<S>>, ExecutionError<S>> {
    let first = nodes[0];
    let field_name = &first.item.name.item;

    let Some(field_def) = ctx.schema.field_definition(parent_type, field_name) else {
        return Ok(None);
    };

    let path = Arc::new(FieldPath::Field(
        response_name.clone(),
        parent_type.name.clone(),
        Arc::clone(parent_path),
    ));

    let args = match variables::coerce_argument_values(field_def, &first.item, &ctx.variables) {
        Ok(args) => args,
        Err(e) => {
            return handle_field_error(
                located_error(e, nodes, &path),
                &field_def.field_type,
                errors,
            );
        }
    };

    let info = ResolveInfo {
        field_name,
        field_nodes: &nodes[..],
        return_type: &field_def.field_type,
        parent_type,
        path: &path,
        schema: ctx.schema,
        fragments: &ctx.fragments,
        root_value: &ctx.root_value,
        operation: ctx.operation,
        variable_values: &ctx.variables,
    };

    let resolver = field_def.resolver.as_ref().unwrap_or(&ctx.field_resolver);
    let resolved = resolver(source, &args, ctx.context_value, info);

    let field = FieldRef {
        nodes: Arc::clone(nodes),
        parent_type,
        def: field_def,
    };
    let completed = match resolved {
        Ok(resolved) => {
            completer::complete_value(
                ctx,
                &field,
                &field_def.field_type,
                &path,
                resolved,
                errors,
                payload,
            )
            .await
        }
        Err(e) => Err(located_error(e, nodes, &path)),
    };

    match completed {
        Ok(value) => Ok(Some(value)),
        Err(error) => handle_field_error(error, &field_def.field_type, errors),
    }
}

/// Handles a located error raised at a field of type `ty`: re-raised past a
/// non-null boundary, or appended to the active log exactly once with the
/// field becoming `null`.
fn handle_field_error<S>(
    error: ExecutionError<S>,
    ty: &crate::ast::Type,
    errors: &ErrorLog<S>,
) -> Result<Option<Value<S>>, ExecutionError<S>> {
    if ty.is_non_null() {
        Err(error)
    } else {
        push_error(errors, error);
        Ok(Some(Value::Null))
    }
}
