//! Polymorphic dispatch
//!
//! A polymorphic base resolves its concrete subtype through a lookup table
//! built once: by runtime `TypeId` when encoding, by discriminator value
//! when decoding. Sealed hierarchies ship their own table; open bases get
//! theirs from the extension registry.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use indexmap::IndexMap;

use super::decoder::ClassDecoder;
use super::descriptor::SchemaDescriptor;
use super::encoder::ClassEncoder;
use super::schema::ClassSchema;
use crate::error::EncodingError;

/// Sealed or abstract base type
///
/// Implemented by [`firestore_sealed!`](crate::firestore_sealed) for sealed
/// enums; open bases (for example a newtype around `Box<dyn Trait>`)
/// implement it by hand and register their subtypes with
/// [`ExtensionRegistryBuilder::polymorphic`](super::registry::ExtensionRegistryBuilder::polymorphic).
pub trait Polymorphic: Sized + 'static {
    /// Descriptor of the base, carrying the discriminator key
    fn base_descriptor() -> SchemaDescriptor;

    /// The concrete subtype value behind this base
    fn as_subtype(&self) -> &dyn Any;

    /// Subtypes known at compile time
    fn sealed_subtypes() -> Option<Arc<PolymorphicTable<Self>>> {
        None
    }
}

trait SubtypeCodec<B>: Send + Sync {
    fn encode_fields(&self, value: &dyn Any, fields: &mut ClassEncoder<'_>) -> Result<(), EncodingError>;
    fn decode_fields(&self, fields: &ClassDecoder<'_>) -> Result<B, EncodingError>;
}

struct TypedSubtype<S, B> {
    wrap: fn(S) -> B,
    _subtype: PhantomData<fn() -> S>,
}

impl<S: ClassSchema, B: 'static> SubtypeCodec<B> for TypedSubtype<S, B> {
    fn encode_fields(&self, value: &dyn Any, fields: &mut ClassEncoder<'_>) -> Result<(), EncodingError> {
        let Some(value) = value.downcast_ref::<S>() else {
            return Err(EncodingError::unsupported_type(std::any::type_name::<S>()));
        };
        value.encode_fields(fields)
    }

    fn decode_fields(&self, fields: &ClassDecoder<'_>) -> Result<B, EncodingError> {
        S::decode_fields(fields).map(self.wrap)
    }
}

/// One registered subtype of a base
pub struct SubtypeEntry<B> {
    serial_name: String,
    descriptor: SchemaDescriptor,
    codec: Box<dyn SubtypeCodec<B>>,
}

impl<B> SubtypeEntry<B> {
    /// Serial name written to the discriminator
    pub fn serial_name(&self) -> &str {
        &self.serial_name
    }

    /// Descriptor of the subtype's fields
    pub fn descriptor(&self) -> &SchemaDescriptor {
        &self.descriptor
    }

    pub(crate) fn encode_fields(
        &self,
        value: &dyn Any,
        fields: &mut ClassEncoder<'_>,
    ) -> Result<(), EncodingError> {
        self.codec.encode_fields(value, fields)
    }

    pub(crate) fn decode_fields(&self, fields: &ClassDecoder<'_>) -> Result<B, EncodingError> {
        self.codec.decode_fields(fields)
    }
}

impl<B> fmt::Debug for SubtypeEntry<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubtypeEntry")
            .field("serial_name", &self.serial_name)
            .field("fields", &self.descriptor.element_count())
            .finish()
    }
}

/// Discriminator-to-subtype lookup table for base `B`
///
/// # Example
/// ```
/// use firebase_common::encoding::PolymorphicTable;
/// use firebase_common::firestore_class;
///
/// firestore_class! {
///     #[derive(Debug, Clone, PartialEq)]
///     pub struct Circle as "circle" { pub radius: f64 }
/// }
///
/// #[derive(Debug)]
/// enum Shape { Circle(Circle) }
///
/// let mut table = PolymorphicTable::<Shape>::new();
/// table.subtype(Shape::Circle);
/// assert!(table.by_name("circle").is_some());
/// ```
pub struct PolymorphicTable<B> {
    by_name: IndexMap<String, Arc<SubtypeEntry<B>>>,
    by_type: HashMap<TypeId, Arc<SubtypeEntry<B>>>,
}

impl<B: 'static> PolymorphicTable<B> {
    /// Empty table
    pub fn new() -> Self {
        Self {
            by_name: IndexMap::new(),
            by_type: HashMap::new(),
        }
    }

    /// Register subtype `S` under its own serial name
    pub fn subtype<S: ClassSchema>(&mut self, wrap: fn(S) -> B) -> &mut Self {
        let serial_name = S::class_descriptor().serial_name().to_string();
        self.subtype_named(serial_name, wrap)
    }

    /// Register subtype `S` under an explicit serial name
    pub fn subtype_named<S: ClassSchema>(&mut self, serial_name: impl Into<String>, wrap: fn(S) -> B) -> &mut Self {
        let serial_name = serial_name.into();
        let entry = Arc::new(SubtypeEntry {
            serial_name: serial_name.clone(),
            descriptor: S::class_descriptor(),
            codec: Box::new(TypedSubtype {
                wrap,
                _subtype: PhantomData,
            }),
        });
        self.by_type.insert(TypeId::of::<S>(), Arc::clone(&entry));
        self.by_name.insert(serial_name, entry);
        self
    }

    /// Subtype registered under a discriminator value
    pub fn by_name(&self, serial_name: &str) -> Option<&SubtypeEntry<B>> {
        self.by_name.get(serial_name).map(Arc::as_ref)
    }

    /// Subtype registered for a runtime type
    pub fn by_type(&self, type_id: TypeId) -> Option<&SubtypeEntry<B>> {
        self.by_type.get(&type_id).map(Arc::as_ref)
    }

    /// Serial names in registration order
    pub fn serial_names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }

    /// Number of registered subtypes
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Whether no subtype is registered
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

impl<B: Polymorphic> PolymorphicTable<B> {
    /// Subtype of a concrete base value
    pub fn subtype_of(&self, value: &B) -> Option<&SubtypeEntry<B>> {
        self.by_type(value.as_subtype().type_id())
    }
}

impl<B: 'static> Default for PolymorphicTable<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B> Clone for PolymorphicTable<B> {
    fn clone(&self) -> Self {
        Self {
            by_name: self.by_name.clone(),
            by_type: self.by_type.clone(),
        }
    }
}

impl<B> fmt::Debug for PolymorphicTable<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolymorphicTable")
            .field("subtypes", &self.by_name.keys().collect::<Vec<_>>())
            .finish()
    }
}
