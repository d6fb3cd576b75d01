//! JSON bridge for plain values
//!
//! Handy for fixtures and logging. Integers come in as `Long`, other
//! numbers as `Double`; native objects go out through their own serde
//! representation.

use serde::ser::{Error as _, SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::Value as JsonValue;

use super::value::{PlainMap, PlainValue};

impl PlainValue {
    /// Convert a JSON value
    ///
    /// # Example
    /// ```
    /// use firebase_common::encoding::PlainValue;
    /// use serde_json::json;
    ///
    /// let value = PlainValue::from_json(json!({"n": 1, "x": 1.5}));
    /// assert_eq!(value.get("n"), Some(&PlainValue::Long(1)));
    /// assert_eq!(value.get("x"), Some(&PlainValue::Double(1.5)));
    /// ```
    pub fn from_json(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => Self::Null,
            JsonValue::Bool(b) => Self::Boolean(b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Self::Long(i),
                None => Self::Double(n.as_f64().unwrap_or(f64::NAN)),
            },
            JsonValue::String(s) => Self::String(s),
            JsonValue::Array(items) => Self::List(items.into_iter().map(Self::from_json).collect()),
            JsonValue::Object(fields) => Self::Map(
                fields
                    .into_iter()
                    .map(|(key, value)| (key, Self::from_json(value)))
                    .collect::<PlainMap>(),
            ),
        }
    }

    /// Convert to a JSON value
    ///
    /// Non-finite floats become `null`, as in JSON itself.
    pub fn to_json(&self) -> serde_json::Result<JsonValue> {
        serde_json::to_value(self)
    }
}

impl Serialize for PlainValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Boolean(b) => serializer.serialize_bool(*b),
            Self::Byte(n) => serializer.serialize_i8(*n),
            Self::Short(n) => serializer.serialize_i16(*n),
            Self::Int(n) => serializer.serialize_i32(*n),
            Self::Long(n) => serializer.serialize_i64(*n),
            Self::Float(n) => serializer.serialize_f32(*n),
            Self::Double(n) => serializer.serialize_f64(*n),
            Self::String(s) => serializer.serialize_str(s),
            Self::Char(c) => serializer.serialize_char(*c),
            Self::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Map(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (key, value) in fields {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            Self::Special(native) => native
                .object()
                .to_json()
                .map_err(S::Error::custom)?
                .serialize(serializer),
        }
    }
}
