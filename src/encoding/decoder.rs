//! Structural decoder
//!
//! The dual of the encoder: turns a [`PlainValue`] back into a typed value.
//! Object fields are looked up by name, so field order in the input does
//! not matter and unknown keys are ignored. Scalars are coerced leniently
//! (numbers from strings, booleans from numbers) because stored documents
//! may have been written by other clients.

use std::any::Any;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::hash::Hash;
use std::str::FromStr;

use indexmap::IndexMap;
use tracing::debug;

use super::descriptor::SchemaDescriptor;
use super::polymorphic::Polymorphic;
use super::schema::{ClassSchema, EnumSchema, Schema};
use super::settings::DecodeSettings;
use super::value::{NativeValue, PlainMap, PlainValue};
use crate::error::EncodingError;

/// Type that can be decoded from a [`PlainValue`]
pub trait Decodable: Schema + Sized {
    /// Decode a value.
    ///
    /// Null and special-value inputs are already screened by
    /// [`Decoder::decode_value`] before this is called.
    fn decode(value: &PlainValue, decoder: &Decoder<'_>) -> Result<Self, EncodingError>;
}

/// Decode a value with the given settings
///
/// # Example
/// ```
/// use firebase_common::encoding::{decode, DecodeSettings, PlainValue};
///
/// let n: i32 = decode(&PlainValue::from("42"), &DecodeSettings::default()).unwrap();
/// assert_eq!(n, 42);
/// ```
pub fn decode<T: Decodable + Any>(value: &PlainValue, settings: &DecodeSettings) -> Result<T, EncodingError> {
    Decoder::new(settings).decode_value(value)
}

/// Error for a value no coercion accepts
///
/// Special values get their own error kind so a foreign native object is not
/// reported as a plain type mismatch.
pub(crate) fn mismatch(expected: &str, value: &PlainValue) -> EncodingError {
    match value {
        PlainValue::Special(native) => EncodingError::unrecognized_special_value(native.type_name()),
        other => EncodingError::type_mismatch(expected, other.describe()),
    }
}

/// Decoding context for one call
#[derive(Debug, Clone, Copy)]
pub struct Decoder<'s> {
    settings: &'s DecodeSettings,
}

impl<'s> Decoder<'s> {
    /// Create a decoder over the settings
    pub fn new(settings: &'s DecodeSettings) -> Self {
        Self { settings }
    }

    /// Settings of this call
    pub fn settings(&self) -> &'s DecodeSettings {
        self.settings
    }

    /// Decode any value.
    ///
    /// Null is rejected for non-nullable targets; special inputs go to the
    /// special-value codec registered for `T`, when there is one.
    pub fn decode_value<T: Decodable + Any>(&self, value: &PlainValue) -> Result<T, EncodingError> {
        if value.is_null() {
            let descriptor = T::descriptor();
            if !descriptor.is_nullable() {
                return Err(EncodingError::unexpected_null(descriptor.serial_name()));
            }
        }

        if let PlainValue::Special(native) = value {
            match self.settings.registry().special_values().from_native::<T>(native) {
                Some(Some(decoded)) => return Ok(decoded),
                Some(None) => return Err(EncodingError::unrecognized_special_value(native.type_name())),
                None => {}
            }
        }

        T::decode(value, self)
    }

    /// Decode an ordered object by looking up each field by name
    pub fn decode_class<T: ClassSchema>(&self, value: &PlainValue) -> Result<T, EncodingError> {
        let descriptor = T::class_descriptor();
        let Some(map) = value.as_map() else {
            return Err(mismatch(descriptor.serial_name(), value));
        };
        T::decode_fields(&ClassDecoder::new(self, descriptor, map))
    }

    /// Decode every item of a list in order
    pub fn decode_list<T, C>(&self, value: &PlainValue) -> Result<C, EncodingError>
    where
        T: Decodable + Any,
        C: FromIterator<T>,
    {
        let Some(items) = value.as_list() else {
            return Err(mismatch("List", value));
        };
        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                self.decode_value(item)
                    .map_err(|err| err.within("List", index.to_string()))
            })
            .collect()
    }

    /// Decode every entry of a map; keys are decoded from their string form
    pub fn decode_map<K, V, C>(&self, value: &PlainValue) -> Result<C, EncodingError>
    where
        K: Decodable + Any,
        V: Decodable + Any,
        C: FromIterator<(K, V)>,
    {
        let Some(map) = value.as_map() else {
            return Err(mismatch("Map", value));
        };
        map.iter()
            .map(|(key, item)| {
                let decoded_key = self
                    .decode_value::<K>(&PlainValue::String(key.clone()))
                    .map_err(|err| err.within("Map", key.as_str()))?;
                let decoded = self
                    .decode_value::<V>(item)
                    .map_err(|err| err.within("Map", key.as_str()))?;
                Ok((decoded_key, decoded))
            })
            .collect()
    }

    /// Decode an enum case by name, case-insensitively, or by legacy ordinal
    pub fn decode_enum<E: EnumSchema>(&self, value: &PlainValue) -> Result<E, EncodingError> {
        if let PlainValue::String(name) = value {
            let exact = E::CASES.iter().find(|(case, _)| *case == name.as_str());
            let found = exact.or_else(|| E::CASES.iter().find(|(case, _)| case.eq_ignore_ascii_case(name)));
            return match found {
                Some((_, case)) => Ok(*case),
                None => Err(EncodingError::unknown_enum_case(E::SERIAL_NAME, name.as_str())),
            };
        }

        let Some(ordinal) = value.as_i64() else {
            return Err(mismatch(E::SERIAL_NAME, value));
        };
        let case = usize::try_from(ordinal).ok().and_then(|index| E::CASES.get(index));
        match case {
            Some((name, case)) => {
                debug!(enum_name = E::SERIAL_NAME, ordinal, case = name, "decoded enum from legacy ordinal");
                Ok(*case)
            }
            None => Err(EncodingError::unknown_enum_case(E::SERIAL_NAME, ordinal.to_string())),
        }
    }

    /// Decode a polymorphic value by its discriminator.
    ///
    /// # Errors
    /// `MissingField` without a discriminator, `TypeMismatch` when it is not
    /// a string, `UnknownPolymorphicType` when it names no registered subtype.
    pub fn decode_polymorphic<B: Polymorphic>(&self, value: &PlainValue) -> Result<B, EncodingError> {
        let base = B::base_descriptor();
        let Some(map) = value.as_map() else {
            return Err(mismatch(base.serial_name(), value));
        };

        let discriminator = base.discriminator();
        let tag = match map.get(discriminator) {
            Some(PlainValue::String(tag)) => tag,
            Some(other) => {
                return Err(EncodingError::type_mismatch("String", other.describe())
                    .within(base.serial_name_owned(), discriminator))
            }
            None => {
                return Err(EncodingError::missing_field(discriminator)
                    .within(base.serial_name_owned(), discriminator))
            }
        };

        let table = self.settings.registry().polymorphic_table::<B>();
        let Some(subtype) = table.by_name(tag) else {
            return Err(EncodingError::unknown_polymorphic_type(base.serial_name(), tag.as_str()));
        };

        let fields = ClassDecoder::new(self, subtype.descriptor().clone(), map);
        subtype
            .decode_fields(&fields)
            .map_err(|err| err.within(base.serial_name_owned(), tag.as_str()))
    }
}

/// Field lookup for one ordered object
pub struct ClassDecoder<'a> {
    decoder: &'a Decoder<'a>,
    descriptor: SchemaDescriptor,
    map: &'a PlainMap,
}

impl<'a> ClassDecoder<'a> {
    pub(crate) fn new(decoder: &'a Decoder<'a>, descriptor: SchemaDescriptor, map: &'a PlainMap) -> Self {
        Self {
            decoder,
            descriptor,
            map,
        }
    }

    /// Descriptor of the object being decoded
    pub fn descriptor(&self) -> &SchemaDescriptor {
        &self.descriptor
    }

    /// Decoder of the enclosing call
    pub fn decoder(&self) -> &Decoder<'a> {
        self.decoder
    }

    /// Whether the input carries a key
    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    /// Decode a field without a declared default
    ///
    /// # Errors
    /// `MissingField` when the key is absent.
    pub fn required<T: Decodable + Any>(&self, name: &str) -> Result<T, EncodingError> {
        let Some(value) = self.map.get(name) else {
            return Err(EncodingError::missing_field(name).within(self.descriptor.serial_name_owned(), name));
        };
        self.decode_field(name, value)
    }

    /// Decode a field with a declared default, used when the key is absent
    pub fn optional<T, F>(&self, name: &str, default: F) -> Result<T, EncodingError>
    where
        T: Decodable + Any,
        F: FnOnce() -> T,
    {
        match self.map.get(name) {
            Some(value) => self.decode_field(name, value),
            None => Ok(default()),
        }
    }

    fn decode_field<T: Decodable + Any>(&self, name: &str, value: &PlainValue) -> Result<T, EncodingError> {
        self.decoder
            .decode_value(value)
            .map_err(|err| err.within(self.descriptor.serial_name_owned(), name))
    }
}

fn whole_number(value: f64) -> Option<i64> {
    // i64::MAX is not representable as f64; the exclusive bound keeps the cast exact
    let in_range = value >= i64::MIN as f64 && value < i64::MAX as f64;
    (value.is_finite() && value.fract() == 0.0 && in_range).then_some(value as i64)
}

fn coerce_integer<I>(expected: &str, value: &PlainValue) -> Result<I, EncodingError>
where
    I: TryFrom<i64> + FromStr,
{
    let wide = match value {
        PlainValue::String(text) => return text.parse::<I>().map_err(|_| mismatch(expected, value)),
        PlainValue::Float(n) => whole_number(f64::from(*n)),
        PlainValue::Double(n) => whole_number(*n),
        other => other.as_i64(),
    };
    wide.and_then(|n| I::try_from(n).ok())
        .ok_or_else(|| mismatch(expected, value))
}

fn coerce_double(expected: &str, value: &PlainValue) -> Result<f64, EncodingError> {
    match value {
        PlainValue::Double(n) => Ok(*n),
        PlainValue::Float(n) => Ok(f64::from(*n)),
        PlainValue::String(text) => text.parse().map_err(|_| mismatch(expected, value)),
        other => other
            .as_i64()
            .map(|n| n as f64)
            .ok_or_else(|| mismatch(expected, value)),
    }
}

macro_rules! integer_decodable {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            impl Decodable for $ty {
                fn decode(value: &PlainValue, _decoder: &Decoder<'_>) -> Result<Self, EncodingError> {
                    coerce_integer($name, value)
                }
            }
        )*
    };
}

integer_decodable! {
    i8 => "Byte",
    i16 => "Short",
    i32 => "Int",
    i64 => "Long",
    u8 => "UByte",
    u16 => "UShort",
    u32 => "UInt",
}

impl Decodable for f64 {
    fn decode(value: &PlainValue, _decoder: &Decoder<'_>) -> Result<Self, EncodingError> {
        coerce_double("Double", value)
    }
}

impl Decodable for f32 {
    fn decode(value: &PlainValue, _decoder: &Decoder<'_>) -> Result<Self, EncodingError> {
        if let PlainValue::Float(n) = value {
            return Ok(*n);
        }
        let wide = coerce_double("Float", value)?;
        let narrow = wide as f32;
        // Overflow to infinity is lossy; infinities and NaN in the input pass through
        if wide.is_finite() && !narrow.is_finite() {
            return Err(mismatch("Float", value));
        }
        Ok(narrow)
    }
}

impl Decodable for bool {
    fn decode(value: &PlainValue, _decoder: &Decoder<'_>) -> Result<Self, EncodingError> {
        match value {
            PlainValue::Boolean(b) => Ok(*b),
            PlainValue::String(text) if text.eq_ignore_ascii_case("true") => Ok(true),
            PlainValue::String(text) if text.eq_ignore_ascii_case("false") => Ok(false),
            PlainValue::Float(n) => Ok(*n != 0.0),
            PlainValue::Double(n) => Ok(*n != 0.0),
            other => other
                .as_i64()
                .map(|n| n != 0)
                .ok_or_else(|| mismatch("Boolean", other)),
        }
    }
}

impl Decodable for char {
    fn decode(value: &PlainValue, _decoder: &Decoder<'_>) -> Result<Self, EncodingError> {
        let decoded = match value {
            PlainValue::Char(c) => Some(*c),
            PlainValue::String(text) => {
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(c),
                    _ => None,
                }
            }
            other => other
                .as_i64()
                .and_then(|n| u32::try_from(n).ok())
                .and_then(char::from_u32),
        };
        decoded.ok_or_else(|| mismatch("Char", value))
    }
}

impl Decodable for String {
    fn decode(value: &PlainValue, _decoder: &Decoder<'_>) -> Result<Self, EncodingError> {
        match value {
            PlainValue::String(text) => Ok(text.clone()),
            PlainValue::Char(c) => Ok(c.to_string()),
            other => Err(mismatch("String", other)),
        }
    }
}

impl<T: Decodable + Any> Decodable for Option<T> {
    fn decode(value: &PlainValue, decoder: &Decoder<'_>) -> Result<Self, EncodingError> {
        if value.is_null() {
            return Ok(None);
        }
        decoder.decode_value(value).map(Some)
    }
}

impl<T: Decodable + Any> Decodable for Vec<T> {
    fn decode(value: &PlainValue, decoder: &Decoder<'_>) -> Result<Self, EncodingError> {
        decoder.decode_list(value)
    }
}

impl<T: Decodable + Any> Decodable for VecDeque<T> {
    fn decode(value: &PlainValue, decoder: &Decoder<'_>) -> Result<Self, EncodingError> {
        decoder.decode_list(value)
    }
}

impl<T: Decodable + Any + Eq + Hash> Decodable for HashSet<T> {
    fn decode(value: &PlainValue, decoder: &Decoder<'_>) -> Result<Self, EncodingError> {
        decoder.decode_list(value)
    }
}

impl<T: Decodable + Any + Ord> Decodable for BTreeSet<T> {
    fn decode(value: &PlainValue, decoder: &Decoder<'_>) -> Result<Self, EncodingError> {
        decoder.decode_list(value)
    }
}

impl<K: Decodable + Any + Eq + Hash, V: Decodable + Any> Decodable for HashMap<K, V> {
    fn decode(value: &PlainValue, decoder: &Decoder<'_>) -> Result<Self, EncodingError> {
        decoder.decode_map(value)
    }
}

impl<K: Decodable + Any + Ord, V: Decodable + Any> Decodable for BTreeMap<K, V> {
    fn decode(value: &PlainValue, decoder: &Decoder<'_>) -> Result<Self, EncodingError> {
        decoder.decode_map(value)
    }
}

impl<K: Decodable + Any + Eq + Hash, V: Decodable + Any> Decodable for IndexMap<K, V> {
    fn decode(value: &PlainValue, decoder: &Decoder<'_>) -> Result<Self, EncodingError> {
        decoder.decode_map(value)
    }
}

impl Decodable for PlainValue {
    fn decode(value: &PlainValue, _decoder: &Decoder<'_>) -> Result<Self, EncodingError> {
        Ok(value.clone())
    }
}

impl Decodable for NativeValue {
    fn decode(value: &PlainValue, _decoder: &Decoder<'_>) -> Result<Self, EncodingError> {
        match value {
            PlainValue::Special(native) => Ok(native.clone()),
            other => Err(mismatch("NativeValue", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn settings() -> DecodeSettings {
        DecodeSettings::default()
    }

    fn decode_as<T: Decodable + Any>(value: PlainValue) -> Result<T, EncodingError> {
        decode(&value, &settings())
    }

    #[test]
    fn test_decode_integer_coercions() {
        assert_eq!(decode_as::<i32>(PlainValue::Long(7)).unwrap(), 7);
        assert_eq!(decode_as::<i32>(PlainValue::from("42")).unwrap(), 42);
        assert_eq!(decode_as::<i64>(PlainValue::Double(3.0)).unwrap(), 3);
        assert_eq!(decode_as::<u8>(PlainValue::Short(255)).unwrap(), 255);
    }

    #[test]
    fn test_decode_integer_rejects_lossy_input() {
        let err = decode_as::<i32>(PlainValue::Double(1.5)).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::TypeMismatch { expected, .. } if expected == "Int"));

        let err = decode_as::<i8>(PlainValue::Int(300)).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::TypeMismatch { .. }));

        let err = decode_as::<i32>(PlainValue::from("abc")).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::TypeMismatch { found, .. } if found.contains("abc")));
    }

    #[test]
    fn test_decode_float_coercions() {
        assert_eq!(decode_as::<f64>(PlainValue::Int(2)).unwrap(), 2.0);
        assert_eq!(decode_as::<f64>(PlainValue::from("2.5")).unwrap(), 2.5);
        assert_eq!(decode_as::<f32>(PlainValue::Double(0.5)).unwrap(), 0.5);
        assert_eq!(decode_as::<f32>(PlainValue::from("2.5")).unwrap(), 2.5);
    }

    #[test]
    fn test_decode_f32_rejects_overflow() {
        let err = decode_as::<f32>(PlainValue::Double(1e300)).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::TypeMismatch { expected, .. } if expected == "Float"));

        let err = decode_as::<f32>(PlainValue::from("-1e300")).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::TypeMismatch { .. }));

        assert_eq!(decode_as::<f32>(PlainValue::Double(f64::INFINITY)).unwrap(), f32::INFINITY);
        assert_eq!(decode_as::<f32>(PlainValue::Double(f64::from(f32::MAX))).unwrap(), f32::MAX);
    }

    #[test]
    fn test_decode_bool_coercions() {
        assert!(decode_as::<bool>(PlainValue::Boolean(true)).unwrap());
        assert!(decode_as::<bool>(PlainValue::Int(5)).unwrap());
        assert!(!decode_as::<bool>(PlainValue::Long(0)).unwrap());
        assert!(decode_as::<bool>(PlainValue::from("TRUE")).unwrap());
        assert!(!decode_as::<bool>(PlainValue::from("false")).unwrap());
        assert!(decode_as::<bool>(PlainValue::from("yes")).is_err());
    }

    #[test]
    fn test_decode_char_coercions() {
        assert_eq!(decode_as::<char>(PlainValue::from("x")).unwrap(), 'x');
        assert_eq!(decode_as::<char>(PlainValue::Int(65)).unwrap(), 'A');
        assert_eq!(decode_as::<char>(PlainValue::Char('z')).unwrap(), 'z');
        assert!(decode_as::<char>(PlainValue::from("xy")).is_err());
    }

    #[test]
    fn test_decode_null() {
        let err = decode_as::<i32>(PlainValue::Null).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::UnexpectedNull(name) if name == "Int"));
        assert_eq!(decode_as::<Option<i32>>(PlainValue::Null).unwrap(), None);
        assert_eq!(decode_as::<Option<i32>>(PlainValue::Int(1)).unwrap(), Some(1));
    }

    #[test]
    fn test_decode_list_error_path() {
        let value = PlainValue::List(vec![PlainValue::Int(1), PlainValue::from("two")]);
        let err = decode_as::<Vec<i32>>(value).unwrap_err();
        assert_eq!(err.path().len(), 1);
        assert_eq!(err.path()[0].descriptor, "List");
        assert_eq!(err.path()[0].element, "1");
    }

    #[test]
    fn test_decode_map_with_integer_keys() {
        let mut map = PlainMap::new();
        map.insert("1".to_string(), PlainValue::Int(10));
        map.insert("2".to_string(), PlainValue::Long(20));

        let decoded: BTreeMap<i32, i32> = decode_as(PlainValue::Map(map)).unwrap();
        assert_eq!(decoded, BTreeMap::from([(1, 10), (2, 20)]));
    }

    #[test]
    fn test_decode_map_keys_are_not_trimmed() {
        let mut map = PlainMap::new();
        map.insert(" 1".to_string(), PlainValue::Int(10));

        let err = decode_as::<HashMap<i32, i32>>(PlainValue::Map(map)).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::TypeMismatch { .. }));
        assert_eq!(err.path()[0].element, " 1");
    }

    #[test]
    fn test_decode_foreign_special_value() {
        #[derive(Debug, PartialEq, serde::Serialize)]
        struct Foreign;

        let value = PlainValue::Special(NativeValue::new(Foreign));
        let err = decode_as::<String>(value.clone()).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::UnrecognizedSpecialValue(_)));

        let native: NativeValue = decode_as(value.clone()).unwrap();
        assert!(native.is::<Foreign>());
    }

    #[test]
    fn test_decode_wrong_container_kind() {
        let err = decode_as::<Vec<i32>>(PlainValue::Int(1)).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::TypeMismatch { expected, .. } if expected == "List"));
    }
}
