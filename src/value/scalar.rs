use std::fmt::{self, Debug, Display};

use serde::{de, ser::Serialize, Serialize as SerializeDerive};

/// A trait marking a type that could be used as internal representation of
/// scalar values in the execution engine.
///
/// The main objective of this abstraction is to allow other libraries to
/// replace the default representation with something that better fits their
/// needs, e.g. a representation carrying 64-bit integers.
///
/// The engine itself only ever inspects scalars through the `as_*` accessors
/// and constructs them through the `From` conversions required here.
pub trait ScalarValue:
    Debug
    + Display
    + PartialEq
    + Clone
    + Serialize
    + Send
    + Sync
    + From<String>
    + From<bool>
    + From<i32>
    + From<f64>
    + 'static
where
    for<'a> Self: From<&'a str>,
{
    /// Represents this [`ScalarValue`] as an integer value, if it is one.
    ///
    /// This function is used for implementing `GraphQL` introspection and
    /// directive argument lookup, which expects `Int` scalars.
    fn as_int(&self) -> Option<i32>;

    /// Represents this [`ScalarValue`] as a [`String`] value, if it is one.
    fn as_string(&self) -> Option<String>;

    /// Represents this [`ScalarValue`] as a [`str`] value, if it is one.
    fn as_str(&self) -> Option<&str>;

    /// Represents this [`ScalarValue`] as a float value, if it is one.
    ///
    /// An integer value must be convertible here as well, as `GraphQL`
    /// `Float` input accepts integer literals.
    fn as_float(&self) -> Option<f64>;

    /// Represents this [`ScalarValue`] as a boolean value, if it is one.
    fn as_boolean(&self) -> Option<bool>;
}

/// The default [`ScalarValue`] representation.
///
/// These types closely follow the [GraphQL specification][0]: `Int` is a
/// signed 32-bit integer, `Float` a double, and `String` and `Boolean` are
/// what they say on the tin.
///
/// [0]: https://spec.graphql.org/October2021
#[derive(Clone, Debug, PartialEq, SerializeDerive)]
#[serde(untagged)]
#[allow(missing_docs)]
pub enum DefaultScalarValue {
    Int(i32),
    Float(f64),
    String(String),
    Boolean(bool),
}

impl ScalarValue for DefaultScalarValue {
    fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    fn as_string(&self) -> Option<String> {
        match self {
            Self::String(s) => Some(s.clone()),
            _ => None,
        }
    }

    fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    fn as_float(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(f64::from(*i)),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    fn as_boolean(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

impl Display for DefaultScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => Display::fmt(i, f),
            Self::Float(v) => Display::fmt(v, f),
            Self::String(s) => Display::fmt(s, f),
            Self::Boolean(b) => Display::fmt(b, f),
        }
    }
}

impl From<i32> for DefaultScalarValue {
    fn from(i: i32) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for DefaultScalarValue {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<String> for DefaultScalarValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl<'a> From<&'a str> for DefaultScalarValue {
    fn from(s: &'a str) -> Self {
        Self::String(s.into())
    }
}

impl From<bool> for DefaultScalarValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl<'de> de::Deserialize<'de> for DefaultScalarValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        struct Visitor;

        impl<'de> de::Visitor<'de> for Visitor {
            type Value = DefaultScalarValue;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a valid scalar value")
            }

            fn visit_bool<E>(self, value: bool) -> Result<Self::Value, E> {
                Ok(DefaultScalarValue::Boolean(value))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                if value >= i64::from(i32::MIN) && value <= i64::from(i32::MAX) {
                    Ok(DefaultScalarValue::Int(value as i32))
                } else {
                    // Browser's `JSON.stringify` serializes all numbers
                    // having no fractional part as integers (no decimal
                    // point), so large integers must be parsed as floating
                    // point to avoid erroring on them.
                    Ok(DefaultScalarValue::Float(value as f64))
                }
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                if value <= i32::MAX as u64 {
                    Ok(DefaultScalarValue::Int(value as i32))
                } else {
                    Ok(DefaultScalarValue::Float(value as f64))
                }
            }

            fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E> {
                Ok(DefaultScalarValue::Float(value))
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(DefaultScalarValue::String(value.into()))
            }

            fn visit_string<E>(self, value: String) -> Result<Self::Value, E> {
                Ok(DefaultScalarValue::String(value))
            }
        }

        deserializer.deserialize_any(Visitor)
    }
}
