//! Dynamic values
//!
//! [`AnyValue`] carries a value whose type is only known at runtime, like a
//! heterogeneous `{"name": "x", "tags": [...], "at": Timestamp}` payload.
//! It has no static schema, so the encoder resolves it per call.

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use super::decoder::{Decodable, Decoder};
use super::descriptor::SchemaDescriptor;
use super::encoder::{Encodable, Encoder};
use super::schema::Schema;
use super::value::{NativeValue, PlainMap, PlainValue};
use crate::error::EncodingError;

/// String-keyed map of dynamic values
pub type AnyMap = IndexMap<String, AnyValue>;

/// Type-erased value resolved at encode time
///
/// # Example
/// ```
/// use firebase_common::encoding::{encode, AnyMap, AnyValue, EncodeSettings, PlainValue};
///
/// let mut payload = AnyMap::new();
/// payload.insert("name".to_string(), AnyValue::from("Ada"));
/// payload.insert("age".to_string(), AnyValue::from(36i64));
///
/// let encoded = encode(&AnyValue::from(payload), &EncodeSettings::default()).unwrap();
/// assert_eq!(encoded.get("age"), Some(&PlainValue::Long(36)));
/// ```
#[derive(Clone)]
pub struct AnyValue {
    value: Option<Arc<dyn Any + Send + Sync>>,
    type_name: &'static str,
}

impl AnyValue {
    /// Wrap a value
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            value: Some(Arc::new(value)),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Null value
    pub fn null() -> Self {
        Self {
            value: None,
            type_name: "null",
        }
    }

    /// Check if this is the null entry
    pub fn is_null(&self) -> bool {
        self.value.is_none()
    }

    /// Rust type name of the wrapped value
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Borrow the wrapped value as a concrete type
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.as_deref()?.downcast_ref::<T>()
    }

    /// Borrow a wrapped string
    pub fn as_str(&self) -> Option<&str> {
        self.downcast_ref::<String>().map(String::as_str)
    }

    /// Borrow a wrapped list
    pub fn as_list(&self) -> Option<&[AnyValue]> {
        self.downcast_ref::<Vec<AnyValue>>().map(Vec::as_slice)
    }

    /// Borrow a wrapped map
    pub fn as_map(&self) -> Option<&AnyMap> {
        self.downcast_ref::<AnyMap>()
    }

    fn encode_entries<'a, I>(entries: I, encoder: &Encoder<'_>) -> Result<PlainValue, EncodingError>
    where
        I: IntoIterator<Item = (&'a String, &'a AnyValue)>,
    {
        let mut map = PlainMap::new();
        for (key, value) in entries {
            let encoded = encoder
                .encode_value(value)
                .map_err(|err| err.within("Map", key.as_str()))?;
            map.insert(key.clone(), encoded);
        }
        Ok(PlainValue::Map(map))
    }

}

impl fmt::Debug for AnyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(list) = self.as_list() {
            return f.debug_list().entries(list).finish();
        }
        if let Some(map) = self.as_map() {
            return f.debug_map().entries(map).finish();
        }
        write!(f, "AnyValue({})", self.type_name)
    }
}

/// Nullable, so `AnyMap` and `Vec<AnyValue>` hold nulls like any other entry
impl Schema for AnyValue {
    fn descriptor() -> SchemaDescriptor {
        SchemaDescriptor::dynamic("AnyValue").nullable()
    }
}

impl Encodable for AnyValue {
    fn encode(&self, encoder: &Encoder<'_>) -> Result<PlainValue, EncodingError> {
        let Some(inner) = self.value.as_deref() else {
            return Ok(PlainValue::Null);
        };
        let inner: &dyn Any = inner;
        let registry = encoder.settings().registry();

        if let Some(native) = registry.special_values().to_native(inner) {
            return Ok(PlainValue::Special(native));
        }

        macro_rules! builtin {
            ($($ty:ty),*) => {
                $(
                    if let Some(value) = inner.downcast_ref::<$ty>() {
                        return encoder.encode_value(value);
                    }
                )*
            };
        }
        builtin!(bool, i8, i16, i32, i64, u8, u16, u32, f32, f64, char, String, PlainValue, NativeValue);

        if let Some(text) = inner.downcast_ref::<&'static str>() {
            return Ok(PlainValue::String((*text).to_string()));
        }
        if let Some(items) = inner.downcast_ref::<Vec<AnyValue>>() {
            return items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    encoder
                        .encode_value(item)
                        .map_err(|err| err.within("List", index.to_string()))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(PlainValue::List);
        }
        if let Some(map) = inner.downcast_ref::<AnyMap>() {
            return Self::encode_entries(map, encoder);
        }
        if let Some(map) = inner.downcast_ref::<HashMap<String, AnyValue>>() {
            return Self::encode_entries(map, encoder);
        }
        if let Some(map) = inner.downcast_ref::<BTreeMap<String, AnyValue>>() {
            return Self::encode_entries(map, encoder);
        }

        match registry.contextual(inner.type_id()) {
            Some(codec) => codec.encode(inner, encoder),
            None => Err(EncodingError::unsupported_type(self.type_name)),
        }
    }
}

impl Decodable for AnyValue {
    fn decode(value: &PlainValue, decoder: &Decoder<'_>) -> Result<Self, EncodingError> {
        let decoded = match value {
            PlainValue::Null => AnyValue::null(),
            PlainValue::Boolean(b) => AnyValue::new(*b),
            PlainValue::Byte(n) => AnyValue::new(*n),
            PlainValue::Short(n) => AnyValue::new(*n),
            PlainValue::Int(n) => AnyValue::new(*n),
            PlainValue::Long(n) => AnyValue::new(*n),
            PlainValue::Float(n) => AnyValue::new(*n),
            PlainValue::Double(n) => AnyValue::new(*n),
            PlainValue::String(s) => AnyValue::new(s.clone()),
            PlainValue::Char(c) => AnyValue::new(*c),
            PlainValue::List(items) => AnyValue::new(
                items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| {
                        decoder
                            .decode_value::<AnyValue>(item)
                            .map_err(|err| err.within("List", index.to_string()))
                    })
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            PlainValue::Map(map) => AnyValue::new(
                map.iter()
                    .map(|(key, item)| {
                        decoder
                            .decode_value::<AnyValue>(item)
                            .map(|decoded| (key.clone(), decoded))
                            .map_err(|err| err.within("Map", key.as_str()))
                    })
                    .collect::<Result<AnyMap, _>>()?,
            ),
            PlainValue::Special(native) => {
                if !decoder.settings().registry().special_values().recognizes(native) {
                    return Err(EncodingError::unrecognized_special_value(native.type_name()));
                }
                AnyValue::new(native.clone())
            }
        };
        Ok(decoded)
    }
}

macro_rules! any_value_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for AnyValue {
                fn from(value: $ty) -> Self {
                    AnyValue::new(value)
                }
            }
        )*
    };
}

any_value_from!(bool, i32, i64, f64, char, String, Vec<AnyValue>, AnyMap, NativeValue, PlainValue);

impl From<&str> for AnyValue {
    fn from(value: &str) -> Self {
        AnyValue::new(value.to_string())
    }
}
