//! Coercion of variable and argument values against their declared input
//! types.

use arcstr::ArcStr;
use indexmap::IndexMap;

use crate::{
    ast::{Field as AstField, InputValue, Operation, Spanning, Type},
    executor::{ExecutionError, FieldError, Variables},
    resolve::Arguments,
    schema::{
        meta::{Field as FieldMeta, MetaType},
        model::SchemaType,
    },
    value::ScalarValue,
};

/// Variable-coercion errors beyond this count abort the coercion.
const MAX_COERCION_ERRORS: usize = 50;

/// Coerces the raw `inputs` against the operation's variable definitions.
///
/// Applies defaults, enforces non-null requirements, and validates values
/// recursively against their input types. All failures are collected (up to
/// [`MAX_COERCION_ERRORS`]) and reported together as request errors.
pub(crate) fn coerce_variable_values<S: ScalarValue>(
    schema: &SchemaType<S>,
    operation: &Spanning<Operation<S>>,
    inputs: &Variables<S>,
) -> Result<Variables<S>, Vec<ExecutionError<S>>> {
    let mut coerced = Variables::new();
    let mut errors = Vec::new();

    let Some(definitions) = &operation.item.variable_definitions else {
        return Ok(coerced);
    };

    'defs: for (name, definition) in definitions.item.iter() {
        if errors.len() >= MAX_COERCION_ERRORS {
            errors.push(ExecutionError::new(
                vec![operation.span.start],
                vec![],
                "Too many errors processing variables, error limit reached. Execution aborted."
                    .into(),
            ));
            break;
        }

        let var_type = &definition.var_type.item;
        let location = *name.start();

        match inputs.get(name.item.as_str()) {
            None => {
                if let Some(default) = &definition.default_value {
                    coerced.insert(name.item.to_string(), default.item.clone());
                } else if var_type.is_non_null() {
                    errors.push(ExecutionError::new(
                        vec![location],
                        vec![],
                        format!(
                            "Variable \"${}\" of required type \"{var_type}\" was not provided.",
                            name.item,
                        )
                        .into(),
                    ));
                }
            }
            Some(value) => {
                if value.is_null() && var_type.is_non_null() {
                    errors.push(ExecutionError::new(
                        vec![location],
                        vec![],
                        format!(
                            "Variable \"${}\" of non-null type \"{var_type}\" must not be null.",
                            name.item,
                        )
                        .into(),
                    ));
                    continue;
                }
                match coerce_input_value(schema, value, var_type) {
                    Ok(value) => {
                        coerced.insert(name.item.to_string(), value);
                    }
                    Err(reasons) => {
                        for reason in reasons {
                            if errors.len() >= MAX_COERCION_ERRORS {
                                continue 'defs;
                            }
                            errors.push(ExecutionError::new(
                                vec![location],
                                vec![],
                                format!(
                                    "Variable \"${}\" got invalid value {value}; {reason}",
                                    name.item,
                                )
                                .into(),
                            ));
                        }
                    }
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(coerced)
    } else {
        Err(errors)
    }
}

/// Validates and normalizes one input value against its declared type.
///
/// Returns the human-readable reasons of every mismatch found.
fn coerce_input_value<S: ScalarValue>(
    schema: &SchemaType<S>,
    value: &InputValue<S>,
    ty: &Type,
) -> Result<InputValue<S>, Vec<String>> {
    match ty {
        Type::NonNullNamed(name) => {
            if value.is_null() {
                Err(vec![format!(
                    "Expected non-nullable type \"{name}!\" not to be null."
                )])
            } else {
                coerce_named(schema, value, name)
            }
        }
        Type::NonNullList(inner) => {
            if value.is_null() {
                Err(vec![format!(
                    "Expected non-nullable type \"{ty}\" not to be null."
                )])
            } else {
                coerce_list(schema, value, inner)
            }
        }
        Type::Named(name) => {
            if value.is_null() {
                Ok(InputValue::Null)
            } else {
                coerce_named(schema, value, name)
            }
        }
        Type::List(inner) => {
            if value.is_null() {
                Ok(InputValue::Null)
            } else {
                coerce_list(schema, value, inner)
            }
        }
    }
}

fn coerce_list<S: ScalarValue>(
    schema: &SchemaType<S>,
    value: &InputValue<S>,
    item_type: &Type,
) -> Result<InputValue<S>, Vec<String>> {
    match value.to_list_value() {
        Some(items) => {
            let mut out = Vec::with_capacity(items.len());
            let mut reasons = Vec::new();
            for (index, item) in items.into_iter().enumerate() {
                match coerce_input_value(schema, item, item_type) {
                    Ok(item) => out.push(item),
                    Err(item_reasons) => reasons.extend(
                        item_reasons
                            .into_iter()
                            .map(|r| format!("At element {index}: {r}")),
                    ),
                }
            }
            if reasons.is_empty() {
                Ok(InputValue::list(out))
            } else {
                Err(reasons)
            }
        }
        // A single value coerces to a list of that value.
        None => coerce_input_value(schema, value, item_type).map(|v| InputValue::list(vec![v])),
    }
}

fn coerce_named<S: ScalarValue>(
    schema: &SchemaType<S>,
    value: &InputValue<S>,
    name: &str,
) -> Result<InputValue<S>, Vec<String>> {
    match schema.type_by_name(name) {
        Some(MetaType::Scalar(meta)) => match (meta.try_parse_fn)(value) {
            Ok(()) => Ok(value.clone()),
            Err(e) => Err(vec![e.message().to_string()]),
        },
        Some(MetaType::Enum(meta)) => {
            let member = value
                .as_enum_value()
                .or_else(|| value.as_string_value())
                .filter(|n| meta.has_value(n));
            match member {
                Some(member) => Ok(InputValue::enum_value(member)),
                None => Err(vec![format!(
                    "Value {value} does not exist in \"{name}\" enum."
                )]),
            }
        }
        Some(MetaType::InputObject(meta)) => {
            let Some(fields) = value.to_object_value() else {
                return Err(vec![format!("Expected type \"{name}\" to be an object.")]);
            };

            let mut out = Vec::with_capacity(meta.input_fields.len());
            let mut reasons = Vec::new();

            for (key, _) in &fields {
                if !meta.input_fields.iter().any(|f| f.name == *key) {
                    reasons.push(format!("Field \"{key}\" is not defined by type \"{name}\"."));
                }
            }

            for input_field in &meta.input_fields {
                let provided = fields
                    .iter()
                    .find(|(key, _)| input_field.name == *key)
                    .map(|(_, v)| *v);
                match provided {
                    Some(v) => match coerce_input_value(schema, v, &input_field.arg_type) {
                        Ok(v) => out.push((input_field.name.clone(), v)),
                        Err(field_reasons) => reasons.extend(
                            field_reasons
                                .into_iter()
                                .map(|r| format!("In field \"{}\": {r}", input_field.name)),
                        ),
                    },
                    None => {
                        if let Some(default) = &input_field.default_value {
                            out.push((input_field.name.clone(), default.clone()));
                        } else if input_field.arg_type.is_non_null() {
                            reasons.push(format!(
                                "Field \"{}\" of required type \"{}\" was not provided.",
                                input_field.name, input_field.arg_type,
                            ));
                        }
                    }
                }
            }

            if reasons.is_empty() {
                Ok(InputValue::object(out))
            } else {
                Err(reasons)
            }
        }
        Some(..) => Err(vec![format!("Type \"{name}\" is not an input type.")]),
        None => Err(vec![format!("Unknown input type \"{name}\".")]),
    }
}

/// Computes the coerced argument values of one field invocation from the
/// first field node's argument AST, resolving variable references and
/// substituting defaults.
pub(crate) fn coerce_argument_values<S: ScalarValue>(
    field_def: &FieldMeta<S>,
    node: &AstField<S>,
    variables: &Variables<S>,
) -> Result<Arguments<S>, FieldError<S>> {
    let mut args: Option<IndexMap<ArcStr, InputValue<S>>> = None;
    if let Some(node_args) = &node.arguments {
        let map = args.get_or_insert_with(IndexMap::new);
        for (key, value) in node_args.item.iter() {
            if let Some(value) = value.item.clone().into_const(variables) {
                map.insert(key.item.clone(), value);
            }
        }
    }

    if let Some(meta_args) = &field_def.arguments {
        for arg in meta_args {
            let provided = args
                .as_ref()
                .and_then(|map| map.get(&arg.name))
                .map_or(false, |v| !v.is_null());
            if !provided && arg.default_value.is_none() && arg.arg_type.is_non_null() {
                return Err(format!(
                    "Argument \"{}\" of required type \"{}\" was not provided.",
                    arg.name, arg.arg_type,
                )
                .into());
            }
        }
    }

    Ok(Arguments::new(args, &field_def.arguments))
}
