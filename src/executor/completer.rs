//! Type-directed completion of resolved values.

use std::sync::Arc;

use arcstr::ArcStr;
use futures::{future::BoxFuture, stream::FuturesOrdered, StreamExt as _};

use crate::{
    ast::{Field as AstField, Spanning, Type},
    executor::{
        collector, incremental, located_error, push_error, ErrorLog, ExecutionContext,
        ExecutionError, FieldPath, FieldRef, PayloadContext, Variables,
    },
    resolve::{ResolvedStream, ResolvedValue},
    schema::meta::{EnumMeta, MetaType, ObjectMeta, ScalarMeta},
    value::{ScalarValue, Value},
};

/// Arguments of an active `@stream` directive.
pub(crate) struct StreamArgs {
    pub initial_count: usize,
    pub label: Option<ArcStr>,
}

/// Completes a resolved value against its declared return type.
///
/// Dispatch is purely by the static type shape: non-null wrapping, `null`
/// short-circuit, list, leaf, abstract, or object completion. A boxed
/// future is returned because the completion recurses through sub-selection
/// execution, and `async fn`s cannot be recursive.
#[allow(clippy::too_many_arguments)]
pub(crate) fn complete_value<'a, 'c, S: ScalarValue>(
    ctx: &'c Arc<ExecutionContext<'a, S>>,
    field: &'c FieldRef<'a, S>,
    return_type: &'a Type,
    path: &'c Arc<FieldPath>,
    resolved: ResolvedValue<S>,
    errors: &'c ErrorLog<S>,
    payload: Option<&'c PayloadContext<S>>,
) -> BoxFuture<'c, Result<Value<S>, ExecutionError<S>>>
where
    'a: 'c,
{
    Box::pin(async move {
        // A future settles before any type-directed branching happens.
        let resolved = match resolved {
            ResolvedValue::Future(f) => match f.await {
                Ok(resolved) => resolved,
                Err(e) => return Err(located_error(e, &field.nodes, path)),
            },
            resolved => resolved,
        };
        let is_null = matches!(resolved, ResolvedValue::Ready(Value::Null));

        match return_type {
            Type::NonNullNamed(name) => {
                if is_null {
                    return Err(non_null_violation(field, path));
                }
                let value = complete_named(ctx, field, name, path, resolved, errors, payload).await?;
                if value.is_null() {
                    Err(non_null_violation(field, path))
                } else {
                    Ok(value)
                }
            }
            Type::NonNullList(inner) => {
                if is_null {
                    return Err(non_null_violation(field, path));
                }
                let value = complete_list(ctx, field, inner, path, resolved, errors, payload).await?;
                if value.is_null() {
                    Err(non_null_violation(field, path))
                } else {
                    Ok(value)
                }
            }
            Type::Named(name) => {
                if is_null {
                    Ok(Value::Null)
                } else {
                    complete_named(ctx, field, name, path, resolved, errors, payload).await
                }
            }
            Type::List(inner) => {
                if is_null {
                    Ok(Value::Null)
                } else {
                    complete_list(ctx, field, inner, path, resolved, errors, payload).await
                }
            }
        }
    })
}

fn non_null_violation<S>(field: &FieldRef<'_, S>, path: &FieldPath) -> ExecutionError<S> {
    located_error(
        format!(
            "Cannot return null for non-nullable field {}.{}.",
            field.parent_type.name, field.def.name,
        )
        .into(),
        &field.nodes,
        path,
    )
}

#[allow(clippy::too_many_arguments)]
async fn complete_named<'a, S: ScalarValue>(
    ctx: &Arc<ExecutionContext<'a, S>>,
    field: &FieldRef<'a, S>,
    name: &str,
    path: &Arc<FieldPath>,
    resolved: ResolvedValue<S>,
    errors: &ErrorLog<S>,
    payload: Option<&PayloadContext<S>>,
) -> Result<Value<S>, ExecutionError<S>> {
    match ctx.schema.concrete_type_by_name(name) {
        Some(MetaType::Scalar(meta)) => complete_scalar(field, meta, path, resolved),
        Some(MetaType::Enum(meta)) => complete_enum(field, meta, path, resolved),
        Some(MetaType::Object(meta)) => {
            let value = object_value(field, &meta.name, path, resolved)?;
            complete_object(ctx, field, meta, path, value, errors, payload).await
        }
        Some(meta @ (MetaType::Interface(..) | MetaType::Union(..))) => {
            complete_abstract(ctx, field, meta, path, resolved, errors, payload).await
        }
        Some(MetaType::InputObject(..)) => Err(located_error(
            format!("Cannot complete value of input type `{name}`.").into(),
            &field.nodes,
            path,
        )),
        None => Err(located_error(
            format!("Cannot find type `{name}` in schema.").into(),
            &field.nodes,
            path,
        )),
    }
}

fn complete_scalar<S: ScalarValue>(
    field: &FieldRef<'_, S>,
    meta: &ScalarMeta<S>,
    path: &Arc<FieldPath>,
    resolved: ResolvedValue<S>,
) -> Result<Value<S>, ExecutionError<S>> {
    let raw = resolved.try_into_value();
    let serialized = raw.as_ref().and_then(|v| (meta.serialize_fn)(v));
    serialized.ok_or_else(|| {
        let display = raw.map(|v| v.to_string()).unwrap_or_else(|| "<stream>".into());
        located_error(
            format!(
                "Expected `{}.serialize({display})` to return non-nullable value, returned: null",
                meta.name,
            )
            .into(),
            &field.nodes,
            path,
        )
    })
}

fn complete_enum<S: ScalarValue>(
    field: &FieldRef<'_, S>,
    meta: &EnumMeta,
    path: &Arc<FieldPath>,
    resolved: ResolvedValue<S>,
) -> Result<Value<S>, ExecutionError<S>> {
    let raw = resolved.try_into_value();
    let member = raw
        .as_ref()
        .and_then(Value::as_string_value)
        .filter(|name| meta.has_value(name));
    match member {
        Some(_) => Ok(raw.unwrap_or(Value::Null)),
        None => {
            let display = raw.map(|v| v.to_string()).unwrap_or_else(|| "<stream>".into());
            Err(located_error(
                format!("Enum `{}` cannot represent value: {display}", meta.name).into(),
                &field.nodes,
                path,
            ))
        }
    }
}

/// Reduces a resolved value to the plain [`Value`] an object completion
/// resolves sub-fields on.
fn object_value<S: ScalarValue>(
    field: &FieldRef<'_, S>,
    type_name: &ArcStr,
    path: &Arc<FieldPath>,
    resolved: ResolvedValue<S>,
) -> Result<Value<S>, ExecutionError<S>> {
    resolved.try_into_value().ok_or_else(|| {
        located_error(
            format!("Expected value of type `{type_name}` but got an async stream.").into(),
            &field.nodes,
            path,
        )
    })
}

#[allow(clippy::too_many_arguments)]
async fn complete_abstract<'a, S: ScalarValue>(
    ctx: &Arc<ExecutionContext<'a, S>>,
    field: &FieldRef<'a, S>,
    meta: &'a MetaType<S>,
    path: &Arc<FieldPath>,
    resolved: ResolvedValue<S>,
    errors: &ErrorLog<S>,
    payload: Option<&PayloadContext<S>>,
) -> Result<Value<S>, ExecutionError<S>> {
    let (abstract_name, own_resolver) = match meta {
        MetaType::Interface(i) => (&i.name, i.resolve_type.as_ref()),
        MetaType::Union(u) => (&u.name, u.resolve_type.as_ref()),
        _ => unreachable!("`complete_abstract` is only entered for abstract types"),
    };
    let value = object_value(field, abstract_name, path, resolved)?;

    let info = crate::resolve::ResolveInfo {
        field_name: &field.def.name,
        field_nodes: &field.nodes[..],
        return_type: &field.def.field_type,
        parent_type: field.parent_type,
        path,
        schema: ctx.schema,
        fragments: &ctx.fragments,
        root_value: &ctx.root_value,
        operation: ctx.operation,
        variable_values: &ctx.variables,
    };
    let resolver = own_resolver.unwrap_or(&ctx.type_resolver);
    let runtime_name = resolver(&value, ctx.context_value, info, abstract_name)
        .map_err(|e| located_error(e, &field.nodes, path))?
        .resolve()
        .await
        .map_err(|e| located_error(e, &field.nodes, path))?;

    let Some(runtime_name) = runtime_name else {
        return Err(located_error(
            format!(
                "Abstract type `{abstract_name}` must resolve to an Object type at runtime for \
                 field `{}.{}`. Either the `{abstract_name}` type should provide a \
                 `resolve_type` function or each possible type should provide an `is_type_of` \
                 function.",
                field.parent_type.name, field.def.name,
            )
            .into(),
            &field.nodes,
            path,
        ));
    };

    let runtime_type = match ctx.schema.concrete_type_by_name(&runtime_name) {
        Some(MetaType::Object(o)) => o,
        Some(..) => {
            return Err(located_error(
                format!(
                    "Abstract type `{abstract_name}` was resolved to a non-object type \
                     `{runtime_name}`.",
                )
                .into(),
                &field.nodes,
                path,
            ))
        }
        None => {
            return Err(located_error(
                format!(
                    "Abstract type `{abstract_name}` was resolved to a type `{runtime_name}` \
                     that does not exist inside the schema.",
                )
                .into(),
                &field.nodes,
                path,
            ))
        }
    };
    if !ctx.schema.is_possible_type(abstract_name, &runtime_type.name) {
        return Err(located_error(
            format!(
                "Runtime Object type `{runtime_name}` is not a possible type for \
                 `{abstract_name}`.",
            )
            .into(),
            &field.nodes,
            path,
        ));
    }

    complete_object(ctx, field, runtime_type, path, value, errors, payload).await
}

#[allow(clippy::too_many_arguments)]
async fn complete_object<'a, S: ScalarValue>(
    ctx: &Arc<ExecutionContext<'a, S>>,
    field: &FieldRef<'a, S>,
    object_type: &'a ObjectMeta<S>,
    path: &Arc<FieldPath>,
    value: Value<S>,
    errors: &ErrorLog<S>,
    payload: Option<&PayloadContext<S>>,
) -> Result<Value<S>, ExecutionError<S>> {
    if let Some(predicate) = &object_type.is_type_of {
        let belongs = predicate(&value, ctx.context_value)
            .resolve()
            .await
            .map_err(|e| located_error(e, &field.nodes, path))?;
        if !belongs {
            return Err(located_error(
                format!("Expected value of type `{}` but got: {value}.", object_type.name).into(),
                &field.nodes,
                path,
            ));
        }
    }

    let subfields = collector::collect_subfields(ctx, object_type, &field.nodes);
    for patch in &subfields.patches {
        incremental::defer_fields(
            ctx,
            object_type,
            value.clone(),
            patch.label.clone(),
            patch.fields.clone(),
            Arc::clone(path),
            payload,
        );
    }

    crate::executor::execute_fields(
        ctx,
        object_type,
        &value,
        path,
        &subfields.fields,
        errors,
        payload,
    )
    .await
}

#[allow(clippy::too_many_arguments)]
async fn complete_list<'a, S: ScalarValue>(
    ctx: &Arc<ExecutionContext<'a, S>>,
    field: &FieldRef<'a, S>,
    item_type: &'a Type,
    path: &Arc<FieldPath>,
    resolved: ResolvedValue<S>,
    errors: &ErrorLog<S>,
    payload: Option<&PayloadContext<S>>,
) -> Result<Value<S>, ExecutionError<S>> {
    let stream_args = stream_directive(field.nodes[0], &ctx.variables)
        .map_err(|e| located_error(e, &field.nodes, path))?;

    let items = match resolved {
        ResolvedValue::Stream(stream) => {
            return complete_async_list(
                ctx,
                field,
                item_type,
                path,
                stream,
                stream_args,
                errors,
                payload,
            )
            .await;
        }
        ResolvedValue::Ready(Value::List(items)) => {
            items.into_iter().map(ResolvedValue::Ready).collect()
        }
        ResolvedValue::List(items) => items,
        ResolvedValue::Ready(..) | ResolvedValue::Future(..) => {
            return Err(located_error(
                format!(
                    "Expected Iterable, but did not find one for field `{}.{}`.",
                    field.parent_type.name, field.def.name,
                )
                .into(),
                &field.nodes,
                path,
            ));
        }
    };

    let mut completed = FuturesOrdered::new();
    let mut previous_gate = None;
    for (index, item) in items.into_iter().enumerate() {
        if let Some(stream) = &stream_args {
            if index >= stream.initial_count {
                previous_gate = Some(incremental::stream_sync_item(
                    ctx,
                    field.clone(),
                    item_type,
                    item,
                    index,
                    Arc::clone(path),
                    stream.label.clone(),
                    previous_gate.take(),
                    payload,
                ));
                continue;
            }
        }
        let item_path = Arc::new(FieldPath::Index(index, Arc::clone(path)));
        completed.push_back(async move {
            let result =
                complete_value(ctx, field, item_type, &item_path, item, errors, payload).await;
            handle_item_error(result, item_type, errors)
        });
    }

    let mut out = Vec::new();
    while let Some(item) = completed.next().await {
        out.push(item?);
    }
    Ok(Value::List(out))
}

#[allow(clippy::too_many_arguments)]
async fn complete_async_list<'a, S: ScalarValue>(
    ctx: &Arc<ExecutionContext<'a, S>>,
    field: &FieldRef<'a, S>,
    item_type: &'a Type,
    path: &Arc<FieldPath>,
    stream: ResolvedStream<S>,
    stream_args: Option<StreamArgs>,
    errors: &ErrorLog<S>,
    payload: Option<&PayloadContext<S>>,
) -> Result<Value<S>, ExecutionError<S>> {
    let mut stream = stream;
    let mut completed = FuturesOrdered::new();
    let mut index = 0;
    let mut trailing_null = false;
    loop {
        if let Some(args) = &stream_args {
            if index >= args.initial_count {
                incremental::stream_from_iterator(
                    ctx,
                    field.clone(),
                    item_type,
                    stream,
                    index,
                    Arc::clone(path),
                    args.label.clone(),
                    payload,
                );
                break;
            }
        }
        match stream.next().await {
            Some(Ok(item)) => {
                let item_path = Arc::new(FieldPath::Index(index, Arc::clone(path)));
                completed.push_back(async move {
                    let result =
                        complete_value(ctx, field, item_type, &item_path, item, errors, payload)
                            .await;
                    handle_item_error(result, item_type, errors)
                });
                index += 1;
            }
            Some(Err(e)) => {
                let item_path = Arc::new(FieldPath::Index(index, Arc::clone(path)));
                let located = located_error(e, &field.nodes, &item_path);
                if item_type.is_non_null() {
                    return Err(located);
                }
                push_error(errors, located);
                trailing_null = true;
                break;
            }
            None => break,
        }
    }

    let mut out = Vec::new();
    while let Some(item) = completed.next().await {
        out.push(item?);
    }
    if trailing_null {
        out.push(Value::Null);
    }
    Ok(Value::List(out))
}

/// A raised item error becomes `null` for a nullable item type, and bubbles
/// into the enclosing list for a non-null one.
pub(crate) fn handle_item_error<S>(
    result: Result<Value<S>, ExecutionError<S>>,
    item_type: &Type,
    errors: &ErrorLog<S>,
) -> Result<Value<S>, ExecutionError<S>> {
    match result {
        Ok(value) => Ok(value),
        Err(error) => {
            if item_type.is_non_null() {
                Err(error)
            } else {
                push_error(errors, error);
                Ok(Value::Null)
            }
        }
    }
}

/// Reads the `@stream` directive of a field selection, validating its
/// arguments.
fn stream_directive<S: ScalarValue>(
    node: &Spanning<AstField<S>>,
    variables: &Variables<S>,
) -> Result<Option<StreamArgs>, crate::executor::FieldError<S>> {
    for directive in node.item.directives.as_deref().unwrap_or_default() {
        if directive.item.name.item != "stream" {
            continue;
        }
        let args = directive.item.arguments.as_ref();
        let enabled = args
            .and_then(|args| args.item.get("if"))
            .and_then(|v| v.item.clone().into_const(variables))
            .and_then(|v| v.as_boolean_value())
            .unwrap_or(true);
        if !enabled {
            return Ok(None);
        }
        let label = args
            .and_then(|args| args.item.get("label"))
            .and_then(|v| v.item.clone().into_const(variables))
            .and_then(|v| v.as_string_value().map(ArcStr::from));
        let initial_count = match args
            .and_then(|args| args.item.get("initialCount"))
            .and_then(|v| v.item.clone().into_const(variables))
        {
            None => 0,
            Some(v) => match v.as_int_value() {
                Some(count) if count >= 0 => count as usize,
                _ => {
                    return Err("initialCount must be a non-negative integer".into());
                }
            },
        };
        return Ok(Some(StreamArgs {
            initial_count,
            label,
        }));
    }
    Ok(None)
}
