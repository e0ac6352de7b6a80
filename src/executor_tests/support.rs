//! Shared helpers for building documents and schemas in tests.

use futures::StreamExt as _;

use crate::{
    ast::{
        Arguments as AstArguments, Definition, Directive, Field as AstField, Fragment,
        InlineFragment, FragmentSpread, InputValue, Operation, OperationType, OwnedDocument,
        Selection, Spanning, Type, VariableDefinition, VariablesDefinition,
    },
    execute, execute_sync,
    executor::{ExecutionArgs, ExecutionResult, Response, ResponsePayload, Variables},
    meta::{Field as FieldMeta, ObjectMeta},
    DefaultScalarValue, SchemaType,
};

pub(crate) type S = DefaultScalarValue;

pub(crate) fn arguments(args: Vec<(&str, InputValue<S>)>) -> Option<Spanning<AstArguments<S>>> {
    if args.is_empty() {
        None
    } else {
        Some(Spanning::unlocated(AstArguments {
            items: args
                .into_iter()
                .map(|(k, v)| (Spanning::unlocated(k.into()), Spanning::unlocated(v)))
                .collect(),
        }))
    }
}

pub(crate) fn directive(name: &str, args: Vec<(&str, InputValue<S>)>) -> Spanning<Directive<S>> {
    Spanning::unlocated(Directive {
        name: Spanning::unlocated(name.into()),
        arguments: arguments(args),
    })
}

pub(crate) fn field_full(
    alias: Option<&str>,
    name: &str,
    args: Vec<(&str, InputValue<S>)>,
    directives: Vec<Spanning<Directive<S>>>,
    selection_set: Option<Vec<Selection<S>>>,
) -> Selection<S> {
    Selection::Field(Spanning::unlocated(AstField {
        alias: alias.map(|a| Spanning::unlocated(a.into())),
        name: Spanning::unlocated(name.into()),
        arguments: arguments(args),
        directives: if directives.is_empty() {
            None
        } else {
            Some(directives)
        },
        selection_set,
    }))
}

pub(crate) fn field(name: &str) -> Selection<S> {
    field_full(None, name, vec![], vec![], None)
}

pub(crate) fn aliased(alias: &str, name: &str) -> Selection<S> {
    field_full(Some(alias), name, vec![], vec![], None)
}

pub(crate) fn field_with(name: &str, selection_set: Vec<Selection<S>>) -> Selection<S> {
    field_full(None, name, vec![], vec![], Some(selection_set))
}

pub(crate) fn field_args(name: &str, args: Vec<(&str, InputValue<S>)>) -> Selection<S> {
    field_full(None, name, args, vec![], None)
}

pub(crate) fn spread(name: &str, directives: Vec<Spanning<Directive<S>>>) -> Selection<S> {
    Selection::FragmentSpread(Spanning::unlocated(FragmentSpread {
        name: Spanning::unlocated(name.into()),
        directives: if directives.is_empty() {
            None
        } else {
            Some(directives)
        },
    }))
}

pub(crate) fn inline(
    type_condition: Option<&str>,
    directives: Vec<Spanning<Directive<S>>>,
    selection_set: Vec<Selection<S>>,
) -> Selection<S> {
    Selection::InlineFragment(Spanning::unlocated(InlineFragment {
        type_condition: type_condition.map(|c| Spanning::unlocated(c.into())),
        directives: if directives.is_empty() {
            None
        } else {
            Some(directives)
        },
        selection_set,
    }))
}

pub(crate) fn fragment_def(name: &str, on: &str, selection_set: Vec<Selection<S>>) -> Definition<S> {
    Definition::Fragment(Spanning::unlocated(Fragment {
        name: Spanning::unlocated(name.into()),
        type_condition: Spanning::unlocated(on.into()),
        directives: None,
        selection_set,
    }))
}

pub(crate) fn operation(operation_type: OperationType, selection_set: Vec<Selection<S>>) -> Definition<S> {
    Definition::Operation(Spanning::unlocated(Operation {
        operation_type,
        name: None,
        variable_definitions: None,
        directives: None,
        selection_set,
    }))
}

pub(crate) fn named_operation(
    name: &str,
    operation_type: OperationType,
    variables: Vec<(&str, Type, Option<InputValue<S>>)>,
    selection_set: Vec<Selection<S>>,
) -> Definition<S> {
    Definition::Operation(Spanning::unlocated(Operation {
        operation_type,
        name: Some(Spanning::unlocated(name.into())),
        variable_definitions: if variables.is_empty() {
            None
        } else {
            Some(Spanning::unlocated(VariablesDefinition {
                items: variables
                    .into_iter()
                    .map(|(name, var_type, default_value)| {
                        (
                            Spanning::unlocated(name.into()),
                            VariableDefinition {
                                var_type: Spanning::unlocated(var_type),
                                default_value: default_value.map(Spanning::unlocated),
                                directives: None,
                            },
                        )
                    })
                    .collect(),
            }))
        },
        directives: None,
        selection_set,
    }))
}

pub(crate) fn query_doc(selection_set: Vec<Selection<S>>) -> OwnedDocument<S> {
    vec![operation(OperationType::Query, selection_set)]
}

pub(crate) fn query_schema(fields: Vec<FieldMeta<S>>) -> SchemaType<S> {
    SchemaType::new(
        vec![ObjectMeta::new("Query", fields).into_meta()],
        "Query",
        None,
        None,
    )
    .expect("schema should be valid")
}

pub(crate) fn run_sync(schema: &SchemaType<S>, document: &[Definition<S>]) -> ExecutionResult<S> {
    execute_sync(ExecutionArgs::new(schema, document)).expect("execution should not suspend")
}

pub(crate) fn run_sync_with_vars(
    schema: &SchemaType<S>,
    document: &[Definition<S>],
    variables: &Variables<S>,
) -> ExecutionResult<S> {
    let mut args = ExecutionArgs::new(schema, document);
    args.variable_values = Some(variables);
    execute_sync(args).expect("execution should not suspend")
}

pub(crate) async fn run(schema: &SchemaType<S>, document: &[Definition<S>]) -> ExecutionResult<S> {
    match execute(ExecutionArgs::new(schema, document)).await {
        Response::Single(result) => result,
        Response::Incremental(..) => panic!("expected a single response"),
    }
}

pub(crate) async fn collect_payloads(
    schema: &SchemaType<S>,
    document: &[Definition<S>],
) -> Vec<ResponsePayload<S>> {
    match execute(ExecutionArgs::new(schema, document)).await {
        Response::Single(result) => panic!("expected an incremental response, got {result:?}"),
        Response::Incremental(stream) => stream.collect().await,
    }
}
