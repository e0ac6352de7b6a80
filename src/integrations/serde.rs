//! Serialization of response types into the GraphQL-over-JSON shape.

use std::fmt;

use serde::{
    de,
    ser::{self, SerializeMap, SerializeSeq},
};

use crate::{
    ast::{InputValue, SourcePosition, Spanning},
    executor::{
        ExecutionError, ExecutionPatchResult, ExecutionResult, PathSegment, ResponsePayload,
    },
    value::{Object, ScalarValue, Value},
};

impl<S: ser::Serialize> ser::Serialize for Value<S> {
    fn serialize<Ser>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error>
    where
        Ser: ser::Serializer,
    {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Scalar(s) => s.serialize(serializer),
            Self::List(l) => {
                let mut seq = serializer.serialize_seq(Some(l.len()))?;
                for item in l {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Object(o) => o.serialize(serializer),
        }
    }
}

impl<S: ser::Serialize> ser::Serialize for Object<S> {
    fn serialize<Ser>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error>
    where
        Ser: ser::Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.field_count()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key.as_str(), value)?;
        }
        map.end()
    }
}

impl<S: ser::Serialize> ser::Serialize for InputValue<S> {
    fn serialize<Ser>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error>
    where
        Ser: ser::Serializer,
    {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Scalar(s) => s.serialize(serializer),
            Self::Enum(e) => serializer.serialize_str(e),
            Self::Variable(v) => serializer.serialize_str(v),
            Self::List(l) => {
                let mut seq = serializer.serialize_seq(Some(l.len()))?;
                for item in l {
                    seq.serialize_element(&item.item)?;
                }
                seq.end()
            }
            Self::Object(o) => {
                let mut map = serializer.serialize_map(Some(o.len()))?;
                for (key, value) in o {
                    map.serialize_entry(key.item.as_str(), &value.item)?;
                }
                map.end()
            }
        }
    }
}

impl<'de, S: ScalarValue> de::Deserialize<'de> for InputValue<S> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        struct Visitor<S>(std::marker::PhantomData<S>);

        impl<'de, S: ScalarValue> de::Visitor<'de> for Visitor<S> {
            type Value = InputValue<S>;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a valid input value")
            }

            fn visit_bool<E>(self, value: bool) -> Result<Self::Value, E> {
                Ok(InputValue::scalar(S::from(value)))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                if value >= i64::from(i32::MIN) && value <= i64::from(i32::MAX) {
                    Ok(InputValue::scalar(S::from(value as i32)))
                } else {
                    // Browser's `JSON.stringify` serializes all numbers
                    // having no fractional part as integers, so large
                    // integers must be accepted as floating point.
                    Ok(InputValue::scalar(S::from(value as f64)))
                }
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                if value <= i32::MAX as u64 {
                    Ok(InputValue::scalar(S::from(value as i32)))
                } else {
                    Ok(InputValue::scalar(S::from(value as f64)))
                }
            }

            fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E> {
                Ok(InputValue::scalar(S::from(value)))
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(InputValue::scalar(S::from(value.to_owned())))
            }

            fn visit_string<E>(self, value: String) -> Result<Self::Value, E> {
                Ok(InputValue::scalar(S::from(value)))
            }

            fn visit_none<E>(self) -> Result<Self::Value, E> {
                Ok(InputValue::Null)
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E> {
                Ok(InputValue::Null)
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: de::SeqAccess<'de>,
            {
                let mut items = Vec::new();
                while let Some(item) = seq.next_element::<InputValue<S>>()? {
                    items.push(item);
                }
                Ok(InputValue::list(items))
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: de::MapAccess<'de>,
            {
                let mut fields = Vec::new();
                while let Some((key, value)) = map.next_entry::<String, InputValue<S>>()? {
                    fields.push((key, value));
                }
                Ok(InputValue::object(fields))
            }
        }

        deserializer.deserialize_any(Visitor(std::marker::PhantomData))
    }
}

impl ser::Serialize for SourcePosition {
    fn serialize<Ser>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error>
    where
        Ser: ser::Serializer,
    {
        let mut map = serializer.serialize_map(Some(2))?;
        // Positions are zero-indexed internally, but the response format is
        // 1-indexed.
        map.serialize_entry("line", &(self.line() + 1))?;
        map.serialize_entry("column", &(self.column() + 1))?;
        map.end()
    }
}

impl ser::Serialize for PathSegment {
    fn serialize<Ser>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error>
    where
        Ser: ser::Serializer,
    {
        match self {
            Self::Field(name) => serializer.serialize_str(name),
            Self::Index(index) => serializer.serialize_u64(*index as u64),
        }
    }
}

impl<S: ScalarValue> ser::Serialize for ExecutionError<S> {
    fn serialize<Ser>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error>
    where
        Ser: ser::Serializer,
    {
        let mut map = serializer.serialize_map(Some(4))?;

        map.serialize_entry("message", self.error().message())?;
        map.serialize_entry("locations", self.locations())?;
        map.serialize_entry("path", self.path())?;

        if !self.error().extensions().is_null() {
            map.serialize_entry("extensions", self.error().extensions())?;
        }

        map.end()
    }
}

impl<S: ScalarValue> ser::Serialize for ExecutionResult<S> {
    fn serialize<Ser>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error>
    where
        Ser: ser::Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        if let Some(errors) = &self.errors {
            map.serialize_entry("errors", errors)?;
        }
        if let Some(data) = &self.data {
            map.serialize_entry("data", data)?;
        }
        if let Some(has_next) = self.has_next {
            map.serialize_entry("hasNext", &has_next)?;
        }
        if let Some(extensions) = &self.extensions {
            map.serialize_entry("extensions", extensions)?;
        }
        map.end()
    }
}

impl<S: ScalarValue> ser::Serialize for ExecutionPatchResult<S> {
    fn serialize<Ser>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error>
    where
        Ser: ser::Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        if let Some(errors) = &self.errors {
            map.serialize_entry("errors", errors)?;
        }
        if let Some(data) = &self.data {
            map.serialize_entry("data", data)?;
        }
        if let Some(path) = &self.path {
            map.serialize_entry("path", path)?;
        }
        if let Some(label) = &self.label {
            map.serialize_entry("label", label.as_str())?;
        }
        map.serialize_entry("hasNext", &self.has_next)?;
        if let Some(extensions) = &self.extensions {
            map.serialize_entry("extensions", extensions)?;
        }
        map.end()
    }
}

impl<S: ScalarValue> ser::Serialize for ResponsePayload<S> {
    fn serialize<Ser>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error>
    where
        Ser: ser::Serializer,
    {
        match self {
            Self::Initial(r) => r.serialize(serializer),
            Self::Patch(p) => p.serialize(serializer),
        }
    }
}

// `Spanning` is transparent for serialization purposes.
impl<T: ser::Serialize> ser::Serialize for Spanning<T> {
    fn serialize<Ser>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error>
    where
        Ser: ser::Serializer,
    {
        self.item.serialize(serializer)
    }
}
