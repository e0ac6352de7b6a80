//! GraphQL query execution engine with incremental delivery.
//!
//! This crate implements the *Execution* section of the GraphQL
//! specification over a dynamic schema: types are data, resolvers are
//! closures attached to fields, and documents arrive pre-parsed and
//! pre-validated from an external frontend. On top of plain queries,
//! mutations, and subscription initial payloads, the engine implements the
//! incremental-delivery extensions: `@defer`red fragments and `@stream`ed
//! lists, delivered through a lazy sequence of patch payloads.
//!
//! # Example
//!
//! ```rust
//! use graphql_exec::{
//!     ast::{Definition, Field, Operation, OperationType, Selection, Spanning, Type},
//!     execute_sync, graphql_value,
//!     meta::{Field as FieldMeta, ObjectMeta},
//!     ExecutionArgs, ResolvedValue, SchemaType,
//! };
//!
//! let schema: SchemaType = SchemaType::new(
//!     vec![ObjectMeta::new(
//!         "Query",
//!         vec![FieldMeta::new("hello", Type::named("String"))
//!             .resolver(|_, _, _, _| Ok(ResolvedValue::ready("world")))],
//!     )
//!     .into_meta()],
//!     "Query",
//!     None,
//!     None,
//! )
//! .unwrap();
//!
//! let document = vec![Definition::Operation(Spanning::unlocated(Operation {
//!     operation_type: OperationType::Query,
//!     name: None,
//!     variable_definitions: None,
//!     directives: None,
//!     selection_set: vec![Selection::Field(Spanning::unlocated(Field {
//!         alias: None,
//!         name: Spanning::unlocated("hello".into()),
//!         arguments: None,
//!         directives: None,
//!         selection_set: None,
//!     }))],
//! }))];
//!
//! let result = execute_sync(ExecutionArgs::new(&schema, &document)).unwrap();
//! assert_eq!(result.data, Some(graphql_value!({"hello": "world"})));
//! ```

#[macro_use]
mod macros;

pub mod ast;
pub mod executor;
pub mod integrations;
mod introspection;
pub mod resolve;
pub mod schema;
mod value;

#[cfg(test)]
mod executor_tests;

use derive_more::with_trait::{Display, From};

pub use crate::{
    executor::{
        execute, execute_sync, ExecutionArgs, ExecutionContext, ExecutionError,
        ExecutionPatchResult, ExecutionResult, FieldError, FieldPath, FieldResult, PathSegment,
        Response, ResponsePayload, SubsequentPayloads, Variables,
    },
    resolve::{
        default_field_resolver, default_subscribe_field_resolver, default_type_resolver,
        resolver_fn, Arguments, BoxResolver, BoxTypeResolver, Deferrable, IsTypeOfFn,
        ResolveInfo, ResolvedFuture, ResolvedStream, ResolvedValue,
    },
    schema::{
        meta,
        model::{DirectiveLocation, DirectiveType, SchemaError, SchemaType},
    },
    value::{DefaultScalarValue, Object, ScalarValue, Value},
};

/// An error that prevented query execution.
///
/// Everything recoverable is reported through the response instead; these
/// are the programmer errors of the external interface.
#[derive(Clone, Debug, Display, Eq, From, PartialEq)]
pub enum GraphQLError {
    /// The schema failed validation.
    #[display("{_0}")]
    Schema(SchemaError),

    /// [`execute_sync`] was asked to run an execution that suspended or
    /// produced incremental payloads.
    #[display("GraphQL execution failed to complete synchronously")]
    NotSynchronous,
}

impl std::error::Error for GraphQLError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Schema(e) => Some(e),
            Self::NotSynchronous => None,
        }
    }
}
