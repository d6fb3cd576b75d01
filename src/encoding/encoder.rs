//! Structural encoder
//!
//! Walks a typed value through its schema and produces a [`PlainValue`]
//! tree. Every value, at every depth, is first offered to the special-value
//! registry; only values the registry does not claim are decomposed.

use std::any::Any;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use indexmap::IndexMap;
use tracing::trace;

use super::descriptor::SchemaDescriptor;
use super::polymorphic::Polymorphic;
use super::schema::{ClassSchema, EnumSchema, Schema};
use super::settings::EncodeSettings;
use super::value::{NativeValue, PlainMap, PlainValue};
use crate::error::EncodingError;

/// Type that can be encoded into a [`PlainValue`]
pub trait Encodable: Schema + Sized {
    /// Encode this value.
    ///
    /// Implementations recurse through [`Encoder::encode_value`] so nested
    /// values get the special-value check and path decoration.
    fn encode(&self, encoder: &Encoder<'_>) -> Result<PlainValue, EncodingError>;
}

/// Encode a value with the given settings
///
/// # Example
/// ```
/// use firebase_common::encoding::{encode, EncodeSettings, PlainValue};
///
/// let encoded = encode(&vec!["a".to_string()], &EncodeSettings::default()).unwrap();
/// assert_eq!(encoded, PlainValue::List(vec![PlainValue::from("a")]));
/// ```
pub fn encode<T: Encodable + Any>(
    value: &T,
    settings: &EncodeSettings,
) -> Result<PlainValue, EncodingError> {
    Encoder::new(settings).encode_value(value)
}

/// Encode a value that must come out as a map
///
/// Used where an operation needs an object-shaped payload, such as a
/// partial document update.
///
/// # Errors
/// `InvalidArgument` when the value encodes to anything but a map.
pub fn encode_as_object<T: Encodable + Any>(
    value: &T,
    settings: &EncodeSettings,
) -> Result<PlainMap, EncodingError> {
    match encode(value, settings)? {
        PlainValue::Map(map) => Ok(map),
        other => Err(EncodingError::invalid_argument(format!(
            "{} encoded to {}, but an object was required",
            T::descriptor().serial_name(),
            other.kind_name()
        ))),
    }
}

/// Encoding context for one call
///
/// Holds nothing but the settings, so nested values share it by reference.
#[derive(Debug, Clone, Copy)]
pub struct Encoder<'s> {
    settings: &'s EncodeSettings,
}

impl<'s> Encoder<'s> {
    /// Create an encoder over the settings
    pub fn new(settings: &'s EncodeSettings) -> Self {
        Self { settings }
    }

    /// Settings of this call
    pub fn settings(&self) -> &'s EncodeSettings {
        self.settings
    }

    /// Encode any value: special values pass through, everything else is
    /// encoded by its own schema.
    ///
    /// # Errors
    /// `InvalidValue` when the result is null but `T` is not nullable.
    pub fn encode_value<T: Encodable + Any>(&self, value: &T) -> Result<PlainValue, EncodingError> {
        let special_values = self.settings.registry().special_values();
        let encoded = match special_values.to_native(value) {
            Some(native) => PlainValue::Special(native),
            None => value.encode(self)?,
        };

        if encoded.is_null() {
            let descriptor = T::descriptor();
            if !descriptor.is_nullable() {
                return Err(EncodingError::invalid_value(descriptor.serial_name()));
            }
        }
        Ok(encoded)
    }

    /// Encode an ordered object as a map of its fields
    pub fn encode_class<T: ClassSchema>(&self, value: &T) -> Result<PlainValue, EncodingError> {
        let mut fields = ClassEncoder::new(self, T::class_descriptor());
        value.encode_fields(&mut fields)?;
        Ok(PlainValue::Map(fields.finish()))
    }

    /// Encode items in order as a list
    pub fn encode_list<'v, T, I>(&self, items: I) -> Result<PlainValue, EncodingError>
    where
        T: Encodable + Any,
        I: IntoIterator<Item = &'v T>,
    {
        items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                self.encode_value(item)
                    .map_err(|err| err.within("List", index.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(PlainValue::List)
    }

    /// Encode entries in iteration order as a map
    ///
    /// # Errors
    /// `InvalidKeyType` when a key does not encode to a string, char or integer.
    pub fn encode_map<'v, K, V, I>(&self, entries: I) -> Result<PlainValue, EncodingError>
    where
        K: Encodable + Any,
        V: Encodable + Any,
        I: IntoIterator<Item = (&'v K, &'v V)>,
    {
        let entries = entries.into_iter();
        let mut map = PlainMap::with_capacity(entries.size_hint().0);
        for (key, value) in entries {
            let key = self.encode_key(key)?;
            let value = self
                .encode_value(value)
                .map_err(|err| err.within("Map", key.clone()))?;
            map.insert(key, value);
        }
        Ok(PlainValue::Map(map))
    }

    fn encode_key<K: Encodable + Any>(&self, key: &K) -> Result<String, EncodingError> {
        match self.encode_value(key)? {
            PlainValue::String(s) => Ok(s),
            PlainValue::Char(c) => Ok(c.to_string()),
            PlainValue::Byte(n) => Ok(n.to_string()),
            PlainValue::Short(n) => Ok(n.to_string()),
            PlainValue::Int(n) => Ok(n.to_string()),
            PlainValue::Long(n) => Ok(n.to_string()),
            other => Err(EncodingError::invalid_key_type(other.describe())),
        }
    }

    /// Encode an enum case by its serial name
    pub fn encode_enum<E: EnumSchema>(&self, value: &E) -> Result<PlainValue, EncodingError> {
        Ok(PlainValue::String(value.case_name().to_string()))
    }

    /// Encode a polymorphic value as its runtime subtype, tagged with the
    /// base's discriminator as the first key.
    ///
    /// # Errors
    /// `UnsupportedType` when the runtime subtype is not registered for the
    /// base; `InvalidArgument` when the subtype declares a field named like
    /// the discriminator.
    pub fn encode_polymorphic<B: Polymorphic>(&self, value: &B) -> Result<PlainValue, EncodingError> {
        let base = B::base_descriptor();
        let table = self.settings.registry().polymorphic_table::<B>();
        let Some(subtype) = table.subtype_of(value) else {
            return Err(EncodingError::unsupported_type(format!(
                "unregistered subtype of {}",
                base.serial_name()
            )));
        };

        let discriminator = base.discriminator();
        if subtype.descriptor().element_index(discriminator).is_some() {
            return Err(EncodingError::invalid_argument(format!(
                "{} has a field named '{}', which clashes with the discriminator of {}",
                subtype.serial_name(),
                discriminator,
                base.serial_name()
            )));
        }
        trace!(
            base = base.serial_name(),
            subtype = subtype.serial_name(),
            "encoding polymorphic value"
        );

        let mut fields = ClassEncoder::new(self, subtype.descriptor().clone());
        fields.insert_raw(discriminator, PlainValue::String(subtype.serial_name().to_string()));
        subtype
            .encode_fields(value.as_subtype(), &mut fields)
            .map_err(|err| err.within(base.serial_name_owned(), subtype.serial_name()))?;
        Ok(PlainValue::Map(fields.finish()))
    }
}

/// Accumulator for the fields of one ordered object
///
/// Created per object and dropped when the object is finished, so no field
/// state is shared between calls.
pub struct ClassEncoder<'a> {
    encoder: &'a Encoder<'a>,
    descriptor: SchemaDescriptor,
    fields: PlainMap,
}

impl<'a> ClassEncoder<'a> {
    pub(crate) fn new(encoder: &'a Encoder<'a>, descriptor: SchemaDescriptor) -> Self {
        let fields = PlainMap::with_capacity(descriptor.element_count() + 1);
        Self {
            encoder,
            descriptor,
            fields,
        }
    }

    /// Descriptor of the object being encoded
    pub fn descriptor(&self) -> &SchemaDescriptor {
        &self.descriptor
    }

    /// Encoder of the enclosing call
    pub fn encoder(&self) -> &Encoder<'a> {
        self.encoder
    }

    /// Encode a field that has no declared default
    pub fn field<T: Encodable + Any>(&mut self, name: &str, value: &T) -> Result<(), EncodingError> {
        debug_assert!(
            self.descriptor.element_index(name).is_some(),
            "{} declares no field '{}'",
            self.descriptor.serial_name(),
            name
        );
        let encoded = self
            .encoder
            .encode_value(value)
            .map_err(|err| err.within(self.descriptor.serial_name_owned(), name))?;
        self.fields.insert(name.to_string(), encoded);
        Ok(())
    }

    /// Encode a field with a declared default.
    ///
    /// Skipped entirely when `encode_defaults` is off and the value equals
    /// the default.
    pub fn field_with_default<T, F>(&mut self, name: &str, value: &T, default: F) -> Result<(), EncodingError>
    where
        T: Encodable + Any + PartialEq,
        F: FnOnce() -> T,
    {
        if !self.encoder.settings().encode_defaults() && *value == default() {
            return Ok(());
        }
        self.field(name, value)
    }

    pub(crate) fn insert_raw(&mut self, key: &str, value: PlainValue) {
        self.fields.insert(key.to_string(), value);
    }

    pub(crate) fn finish(self) -> PlainMap {
        self.fields
    }
}

macro_rules! primitive_encodable {
    ($($ty:ty => |$v:ident| $expr:expr;)*) => {
        $(
            impl Encodable for $ty {
                fn encode(&self, _encoder: &Encoder<'_>) -> Result<PlainValue, EncodingError> {
                    let $v = self;
                    Ok($expr)
                }
            }
        )*
    };
}

primitive_encodable! {
    bool => |v| PlainValue::Boolean(*v);
    i8 => |v| PlainValue::Byte(*v);
    i16 => |v| PlainValue::Short(*v);
    i32 => |v| PlainValue::Int(*v);
    i64 => |v| PlainValue::Long(*v);
    u8 => |v| PlainValue::Short(i16::from(*v));
    u16 => |v| PlainValue::Int(i32::from(*v));
    u32 => |v| PlainValue::Long(i64::from(*v));
    f32 => |v| PlainValue::Float(*v);
    f64 => |v| PlainValue::Double(*v);
    char => |v| PlainValue::Char(*v);
    String => |v| PlainValue::String(v.clone());
}

impl<T: Encodable + Any> Encodable for Option<T> {
    fn encode(&self, encoder: &Encoder<'_>) -> Result<PlainValue, EncodingError> {
        match self {
            Some(value) => encoder.encode_value(value),
            None => Ok(PlainValue::Null),
        }
    }
}

impl<T: Encodable + Any> Encodable for Vec<T> {
    fn encode(&self, encoder: &Encoder<'_>) -> Result<PlainValue, EncodingError> {
        encoder.encode_list(self)
    }
}

impl<T: Encodable + Any> Encodable for VecDeque<T> {
    fn encode(&self, encoder: &Encoder<'_>) -> Result<PlainValue, EncodingError> {
        encoder.encode_list(self)
    }
}

impl<T: Encodable + Any> Encodable for HashSet<T> {
    fn encode(&self, encoder: &Encoder<'_>) -> Result<PlainValue, EncodingError> {
        encoder.encode_list(self)
    }
}

impl<T: Encodable + Any> Encodable for BTreeSet<T> {
    fn encode(&self, encoder: &Encoder<'_>) -> Result<PlainValue, EncodingError> {
        encoder.encode_list(self)
    }
}

impl<K: Encodable + Any, V: Encodable + Any> Encodable for HashMap<K, V> {
    fn encode(&self, encoder: &Encoder<'_>) -> Result<PlainValue, EncodingError> {
        encoder.encode_map(self)
    }
}

impl<K: Encodable + Any, V: Encodable + Any> Encodable for BTreeMap<K, V> {
    fn encode(&self, encoder: &Encoder<'_>) -> Result<PlainValue, EncodingError> {
        encoder.encode_map(self)
    }
}

impl<K: Encodable + Any, V: Encodable + Any> Encodable for IndexMap<K, V> {
    fn encode(&self, encoder: &Encoder<'_>) -> Result<PlainValue, EncodingError> {
        encoder.encode_map(self)
    }
}

impl Encodable for PlainValue {
    fn encode(&self, _encoder: &Encoder<'_>) -> Result<PlainValue, EncodingError> {
        Ok(self.clone())
    }
}

impl Encodable for NativeValue {
    fn encode(&self, _encoder: &Encoder<'_>) -> Result<PlainValue, EncodingError> {
        Ok(PlainValue::Special(self.clone()))
    }
}
