//! Flattening of selection sets into response-ordered grouped field sets.

use std::sync::Arc;

use arcstr::ArcStr;
use fnv::{FnvHashMap, FnvHashSet};
use indexmap::IndexMap;

use crate::{
    ast::{Directive, Field, Fragment, Selection, Spanning},
    executor::{ExecutionContext, Variables},
    schema::{meta::MetaType, meta::ObjectMeta, model::SchemaType},
    value::ScalarValue,
};

/// All selection nodes grouped under one response name, in document order.
pub(crate) type FieldNodes<'a, S> = Arc<Vec<&'a Spanning<Field<S>>>>;

/// A grouped field set: response names to their selection nodes, in
/// first-appearance order, plus the deferred patches discovered while
/// collecting.
pub(crate) struct CollectedFields<'a, S> {
    pub fields: IndexMap<ArcStr, FieldNodes<'a, S>>,
    pub patches: Vec<DeferredGroup<'a, S>>,
}

/// Fields that appeared under an active `@defer` directive.
pub(crate) struct DeferredGroup<'a, S> {
    pub label: Option<ArcStr>,
    pub fields: IndexMap<ArcStr, FieldNodes<'a, S>>,
}

/// Flattens `selection_set` under the runtime type `on_type` into a grouped
/// field set.
pub(crate) fn collect_fields<'a, S: ScalarValue>(
    schema: &SchemaType<S>,
    fragments: &FnvHashMap<ArcStr, &'a Fragment<S>>,
    variables: &Variables<S>,
    on_type: &ObjectMeta<S>,
    selection_set: &'a [Selection<S>],
) -> CollectedFields<'a, S> {
    let mut fields = IndexMap::new();
    let mut patches = Vec::new();
    let mut visited = FnvHashSet::default();
    collect_into(
        schema,
        fragments,
        variables,
        on_type,
        selection_set,
        &mut fields,
        &mut patches,
        &mut visited,
    );
    CollectedFields {
        fields: freeze(fields),
        patches,
    }
}

/// Collects the merged sub-selections of every node grouped under one
/// response name.
///
/// Memoized per execution on `(runtime type, field-group identity)`,
/// because list completion re-enters with identical arguments for every
/// element.
pub(crate) fn collect_subfields<'a, S: ScalarValue>(
    ctx: &ExecutionContext<'a, S>,
    on_type: &'a ObjectMeta<S>,
    nodes: &FieldNodes<'a, S>,
) -> Arc<CollectedFields<'a, S>> {
    let key = (
        on_type.name.clone(),
        nodes
            .first()
            .map(|n| *n as *const Spanning<Field<S>> as usize)
            .unwrap_or_default(),
    );
    if let Some(cached) = ctx.subfield_cache.read().unwrap().get(&key) {
        return Arc::clone(cached);
    }

    let mut fields = IndexMap::new();
    let mut patches = Vec::new();
    let mut visited = FnvHashSet::default();
    for node in nodes.iter() {
        if let Some(selection_set) = &node.item.selection_set {
            collect_into(
                ctx.schema,
                &ctx.fragments,
                &ctx.variables,
                on_type,
                selection_set,
                &mut fields,
                &mut patches,
                &mut visited,
            );
        }
    }
    let collected = Arc::new(CollectedFields {
        fields: freeze(fields),
        patches,
    });
    ctx.subfield_cache
        .write()
        .unwrap()
        .insert(key, Arc::clone(&collected));
    collected
}

#[allow(clippy::too_many_arguments)]
fn collect_into<'a, S: ScalarValue>(
    schema: &SchemaType<S>,
    fragments: &FnvHashMap<ArcStr, &'a Fragment<S>>,
    variables: &Variables<S>,
    on_type: &ObjectMeta<S>,
    selection_set: &'a [Selection<S>],
    fields: &mut IndexMap<ArcStr, Vec<&'a Spanning<Field<S>>>>,
    patches: &mut Vec<DeferredGroup<'a, S>>,
    visited: &mut FnvHashSet<ArcStr>,
) {
    for selection in selection_set {
        match selection {
            Selection::Field(field) => {
                if is_excluded(&field.item.directives, variables) {
                    continue;
                }
                fields
                    .entry(field.item.response_name().clone())
                    .or_default()
                    .push(field);
            }
            Selection::FragmentSpread(spread) => {
                if is_excluded(&spread.item.directives, variables) {
                    continue;
                }
                let name = &spread.item.name.item;
                // An unknown fragment is rejected by upstream validation.
                let Some(fragment) = fragments.get(name.as_str()) else {
                    continue;
                };
                if !does_type_apply(schema, &fragment.type_condition.item, on_type) {
                    continue;
                }
                if !visited.insert(name.clone()) {
                    continue;
                }
                match should_defer(&spread.item.directives, variables) {
                    Some(label) => {
                        let mut deferred = IndexMap::new();
                        collect_into(
                            schema,
                            fragments,
                            variables,
                            on_type,
                            &fragment.selection_set,
                            &mut deferred,
                            patches,
                            visited,
                        );
                        patches.push(DeferredGroup {
                            label,
                            fields: freeze(deferred),
                        });
                    }
                    None => collect_into(
                        schema,
                        fragments,
                        variables,
                        on_type,
                        &fragment.selection_set,
                        fields,
                        patches,
                        visited,
                    ),
                }
            }
            Selection::InlineFragment(inline) => {
                if is_excluded(&inline.item.directives, variables) {
                    continue;
                }
                if let Some(condition) = &inline.item.type_condition {
                    if !does_type_apply(schema, &condition.item, on_type) {
                        continue;
                    }
                }
                match should_defer(&inline.item.directives, variables) {
                    Some(label) => {
                        let mut deferred = IndexMap::new();
                        collect_into(
                            schema,
                            fragments,
                            variables,
                            on_type,
                            &inline.item.selection_set,
                            &mut deferred,
                            patches,
                            visited,
                        );
                        patches.push(DeferredGroup {
                            label,
                            fields: freeze(deferred),
                        });
                    }
                    None => collect_into(
                        schema,
                        fragments,
                        variables,
                        on_type,
                        &inline.item.selection_set,
                        fields,
                        patches,
                        visited,
                    ),
                }
            }
        }
    }
}

fn freeze<'a, S>(
    fields: IndexMap<ArcStr, Vec<&'a Spanning<Field<S>>>>,
) -> IndexMap<ArcStr, FieldNodes<'a, S>> {
    fields.into_iter().map(|(k, v)| (k, Arc::new(v))).collect()
}

/// Whether a `@skip(if: true)` or `@include(if: false)` directive removes
/// the selection.
pub(crate) fn is_excluded<S: ScalarValue>(
    directives: &Option<Vec<Spanning<Directive<S>>>>,
    variables: &Variables<S>,
) -> bool {
    if let Some(directives) = directives {
        for directive in directives {
            let name = directive.item.name.item.as_str();
            if name != "skip" && name != "include" {
                continue;
            }
            let condition = directive
                .item
                .arguments
                .as_ref()
                .and_then(|args| args.item.get("if"))
                .and_then(|v| v.item.clone().into_const(variables))
                .and_then(|v| v.as_boolean_value());
            if (name == "skip" && condition == Some(true))
                || (name == "include" && condition == Some(false))
            {
                return true;
            }
        }
    }
    false
}

/// Whether an active `@defer` directive routes the selection into a patch.
///
/// `Some(label)` when deferred, [`None`] when the directive is absent or
/// disabled with `if: false`.
fn should_defer<S: ScalarValue>(
    directives: &Option<Vec<Spanning<Directive<S>>>>,
    variables: &Variables<S>,
) -> Option<Option<ArcStr>> {
    for directive in directives.as_deref().unwrap_or_default() {
        if directive.item.name.item != "defer" {
            continue;
        }
        let args = directive.item.arguments.as_ref();
        let enabled = args
            .and_then(|args| args.item.get("if"))
            .and_then(|v| v.item.clone().into_const(variables))
            .and_then(|v| v.as_boolean_value())
            .unwrap_or(true);
        if !enabled {
            return None;
        }
        let label = args
            .and_then(|args| args.item.get("label"))
            .and_then(|v| v.item.clone().into_const(variables))
            .and_then(|v| v.as_string_value().map(ArcStr::from));
        return Some(label);
    }
    None
}

/// Whether the fragment type condition named `condition` is satisfied by
/// the runtime type `on_type`: the object itself, an interface it
/// implements, or a union it belongs to.
fn does_type_apply<S: ScalarValue>(
    schema: &SchemaType<S>,
    condition: &str,
    on_type: &ObjectMeta<S>,
) -> bool {
    if on_type.name == condition {
        return true;
    }
    match schema.type_by_name(condition) {
        Some(MetaType::Interface(..)) => {
            on_type.interface_names.iter().any(|n| *n == condition)
        }
        Some(MetaType::Union(u)) => u.of_type_names.iter().any(|n| *n == on_type.name),
        _ => false,
    }
}
