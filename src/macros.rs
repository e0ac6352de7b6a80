//! Convenience macros for constructing [`Value`]s, [`InputValue`]s and
//! [`Variables`] with JSON-like syntax.
//!
//! The grammar is deliberately small: object keys are string literals, and
//! every value position takes a single token tree — a literal, `null`, a
//! nested `[…]` array or `{…}` object, or a parenthesized Rust expression.
//! That covers everything response and variable values are made of; enum
//! and variable input values have no literal syntax here and are built with
//! [`InputValue::enum_value`] and [`InputValue::variable`].
//!
//! [`Value`]: crate::Value
//! [`InputValue`]: crate::ast::InputValue
//! [`InputValue::enum_value`]: crate::ast::InputValue::enum_value
//! [`InputValue::variable`]: crate::ast::InputValue::variable
//! [`Variables`]: crate::Variables

/// Construct [`Value`]s by using JSON syntax.
///
/// # Example
///
/// ```rust
/// # use graphql_exec::{graphql_value, DefaultScalarValue, Value};
/// # type V = Value<DefaultScalarValue>;
/// #
/// # let _: V =
/// graphql_value!(null);
/// # let _: V =
/// graphql_value!(1234);
/// # let _: V =
/// graphql_value!("test");
/// # let _: V =
/// graphql_value!([1234, "test", true]);
/// # let _: V =
/// graphql_value!({"key": "value", "foo": 1234});
/// ```
///
/// [`Value`]: crate::Value
#[macro_export]
macro_rules! graphql_value {
    (null) => {
        $crate::Value::null()
    };

    ([ $($elem:tt),* $(,)? ]) => {
        $crate::Value::list(vec![ $( $crate::graphql_value!($elem) ),* ])
    };

    ({ $($key:literal : $val:tt),* $(,)? }) => {{
        #[allow(unused_mut)]
        let mut object = $crate::Object::with_capacity(0);
        $( let _ = object.add_field($key, $crate::graphql_value!($val)); )*
        $crate::Value::object(object)
    }};

    ($e:expr) => {
        $crate::Value::from($e)
    };
}

/// Construct [`InputValue`]s by using JSON syntax.
///
/// Lists and objects are wrapped without location information, as if built
/// with [`InputValue::list`] and [`InputValue::object`].
///
/// # Example
///
/// ```rust
/// # use graphql_exec::{graphql_input_value, ast::InputValue, DefaultScalarValue};
/// # type V = InputValue<DefaultScalarValue>;
/// #
/// # let _: V =
/// graphql_input_value!(null);
/// # let _: V =
/// graphql_input_value!("test");
/// # let _: V =
/// graphql_input_value!([123, null]);
/// # let _: V =
/// graphql_input_value!({"min": 1, "max": 10});
/// ```
///
/// [`InputValue`]: crate::ast::InputValue
/// [`InputValue::list`]: crate::ast::InputValue::list
/// [`InputValue::object`]: crate::ast::InputValue::object
#[macro_export]
macro_rules! graphql_input_value {
    (null) => {
        $crate::ast::InputValue::null()
    };

    ([ $($elem:tt),* $(,)? ]) => {
        $crate::ast::InputValue::list(vec![ $( $crate::graphql_input_value!($elem) ),* ])
    };

    ({ $($key:literal : $val:tt),* $(,)? }) => {
        $crate::ast::InputValue::object::<&str>(vec![
            $( ($key, $crate::graphql_input_value!($val)) ),*
        ])
    };

    ($e:expr) => {
        $crate::ast::InputValue::from($e)
    };
}

/// Construct [`Variables`] by using JSON syntax.
///
/// # Example
///
/// ```rust
/// # use graphql_exec::{graphql_vars, Variables};
/// #
/// let vars: Variables = graphql_vars! {
///     "key": "value",
///     "min": 1,
/// };
/// ```
///
/// [`Variables`]: crate::Variables
#[macro_export]
macro_rules! graphql_vars {
    () => ($crate::Variables::new());

    ( $( $key:tt : $val:tt ),* $(,)? ) => {
        [$( ($key.into(), $crate::graphql_input_value!($val)), )*]
            .into_iter()
            .collect::<$crate::Variables<_>>()
    };
}
