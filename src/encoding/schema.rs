//! Schema traits
//!
//! Every encodable type declares its [`SchemaDescriptor`] ahead of time.
//! Ordered objects additionally expose their fields through [`ClassSchema`],
//! and C-like enums their cases through [`EnumSchema`].

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use indexmap::IndexMap;

use super::decoder::ClassDecoder;
use super::descriptor::{PrimitiveKind, SchemaDescriptor};
use super::encoder::ClassEncoder;
use super::value::{NativeValue, PlainValue};
use crate::error::EncodingError;

/// Type with an ahead-of-time descriptor
pub trait Schema {
    /// Descriptor of this type
    fn descriptor() -> SchemaDescriptor;
}

/// Ordered object encoded as a map of named fields
///
/// Usually generated by [`firestore_class!`](crate::firestore_class).
pub trait ClassSchema: Sized + 'static {
    /// Descriptor listing the fields in declaration order
    fn class_descriptor() -> SchemaDescriptor;

    /// Write each field into the class encoder
    fn encode_fields(&self, fields: &mut ClassEncoder<'_>) -> Result<(), EncodingError>;

    /// Read each field back by name
    fn decode_fields(fields: &ClassDecoder<'_>) -> Result<Self, EncodingError>;
}

/// C-like enum encoded by case name
///
/// Usually generated by [`firestore_enum!`](crate::firestore_enum).
pub trait EnumSchema: Sized + Copy + 'static {
    /// Serial name of the enum
    const SERIAL_NAME: &'static str;

    /// Cases in declaration order with their serial names
    const CASES: &'static [(&'static str, Self)];

    /// Serial name of this case
    fn case_name(&self) -> &'static str;
}

macro_rules! primitive_schema {
    ($($ty:ty => $name:literal, $kind:ident;)*) => {
        $(
            impl Schema for $ty {
                fn descriptor() -> SchemaDescriptor {
                    SchemaDescriptor::primitive($name, PrimitiveKind::$kind)
                }
            }
        )*
    };
}

primitive_schema! {
    bool => "Boolean", Boolean;
    i8 => "Byte", Byte;
    i16 => "Short", Short;
    i32 => "Int", Int;
    i64 => "Long", Long;
    u8 => "UByte", Short;
    u16 => "UShort", Int;
    u32 => "UInt", Long;
    f32 => "Float", Float;
    f64 => "Double", Double;
    char => "Char", Char;
    String => "String", String;
}

impl<T: Schema> Schema for Option<T> {
    fn descriptor() -> SchemaDescriptor {
        T::descriptor().nullable()
    }
}

impl<T: Schema> Schema for Vec<T> {
    fn descriptor() -> SchemaDescriptor {
        SchemaDescriptor::list(T::descriptor)
    }
}

impl<T: Schema> Schema for VecDeque<T> {
    fn descriptor() -> SchemaDescriptor {
        SchemaDescriptor::list(T::descriptor)
    }
}

impl<T: Schema> Schema for HashSet<T> {
    fn descriptor() -> SchemaDescriptor {
        SchemaDescriptor::list(T::descriptor)
    }
}

impl<T: Schema> Schema for BTreeSet<T> {
    fn descriptor() -> SchemaDescriptor {
        SchemaDescriptor::list(T::descriptor)
    }
}

impl<K: Schema, V: Schema> Schema for HashMap<K, V> {
    fn descriptor() -> SchemaDescriptor {
        SchemaDescriptor::map(K::descriptor, V::descriptor)
    }
}

impl<K: Schema, V: Schema> Schema for BTreeMap<K, V> {
    fn descriptor() -> SchemaDescriptor {
        SchemaDescriptor::map(K::descriptor, V::descriptor)
    }
}

impl<K: Schema, V: Schema> Schema for IndexMap<K, V> {
    fn descriptor() -> SchemaDescriptor {
        SchemaDescriptor::map(K::descriptor, V::descriptor)
    }
}

impl Schema for PlainValue {
    fn descriptor() -> SchemaDescriptor {
        SchemaDescriptor::dynamic("PlainValue").nullable()
    }
}

impl Schema for NativeValue {
    fn descriptor() -> SchemaDescriptor {
        SchemaDescriptor::special("NativeValue")
    }
}
