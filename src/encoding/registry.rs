//! Extension registry
//!
//! Built once, then shared read-only behind an `Arc` by every encode and
//! decode call. Holds the special-value registry, contextual codecs for
//! dynamic values, and polymorphic subtype tables for open bases.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use once_cell::sync::Lazy;
use tracing::debug;

use super::encoder::{Encodable, Encoder};
use super::polymorphic::{Polymorphic, PolymorphicTable};
use super::special::{SpecialValueCodec, SpecialValueRegistry};
use super::value::{NativeObject, PlainValue};
use crate::error::EncodingError;

static DEFAULT_REGISTRY: Lazy<Arc<ExtensionRegistry>> =
    Lazy::new(|| Arc::new(ExtensionRegistry::builder().with_firestore_types().build()));

/// Process-wide registry preloaded with the Firestore special types
pub fn default_registry() -> Arc<ExtensionRegistry> {
    Arc::clone(&DEFAULT_REGISTRY)
}

pub(crate) trait ContextualCodec: Send + Sync {
    fn type_name(&self) -> &'static str;
    fn encode(&self, value: &dyn Any, encoder: &Encoder<'_>) -> Result<PlainValue, EncodingError>;
}

struct TypedContextual<T>(PhantomData<fn() -> T>);

impl<T: Encodable + Any> ContextualCodec for TypedContextual<T> {
    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn encode(&self, value: &dyn Any, encoder: &Encoder<'_>) -> Result<PlainValue, EncodingError> {
        match value.downcast_ref::<T>() {
            Some(value) => encoder.encode_value(value),
            None => Err(EncodingError::unsupported_type(self.type_name())),
        }
    }
}

/// Registry of everything the engine cannot learn from a static schema
#[derive(Clone, Default)]
pub struct ExtensionRegistry {
    special_values: SpecialValueRegistry,
    contextual: HashMap<TypeId, Arc<dyn ContextualCodec>>,
    polymorphic: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl ExtensionRegistry {
    /// Registry with nothing registered, not even the Firestore types
    pub fn empty() -> Self {
        Self::default()
    }

    /// Start building a registry
    pub fn builder() -> ExtensionRegistryBuilder {
        ExtensionRegistryBuilder::default()
    }

    /// Special-value registry
    pub fn special_values(&self) -> &SpecialValueRegistry {
        &self.special_values
    }

    pub(crate) fn contextual(&self, type_id: TypeId) -> Option<&dyn ContextualCodec> {
        self.contextual.get(&type_id).map(Arc::as_ref)
    }

    /// Whether a contextual codec is registered for `T`
    pub fn has_contextual<T: Any>(&self) -> bool {
        self.contextual.contains_key(&TypeId::of::<T>())
    }

    /// Subtype table for base `B`.
    ///
    /// The registered table when one exists, else the base's sealed table,
    /// else an empty one.
    pub fn polymorphic_table<B: Polymorphic>(&self) -> Arc<PolymorphicTable<B>> {
        self.polymorphic
            .get(&TypeId::of::<B>())
            .and_then(|table| Arc::clone(table).downcast::<PolymorphicTable<B>>().ok())
            .or_else(B::sealed_subtypes)
            .unwrap_or_default()
    }
}

impl fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut contextual: Vec<&str> = self.contextual.values().map(|codec| codec.type_name()).collect();
        contextual.sort_unstable();
        f.debug_struct("ExtensionRegistry")
            .field("special_values", &self.special_values)
            .field("contextual", &contextual)
            .field("polymorphic", &self.polymorphic.len())
            .finish()
    }
}

/// Builder for [`ExtensionRegistry`]
///
/// # Example
/// ```
/// use firebase_common::encoding::ExtensionRegistry;
///
/// let registry = ExtensionRegistry::builder().with_firestore_types().build();
/// assert!(!registry.special_values().is_empty());
/// ```
#[derive(Default)]
pub struct ExtensionRegistryBuilder {
    registry: ExtensionRegistry,
}

impl ExtensionRegistryBuilder {
    /// Register a special-value codec
    pub fn special<T: Any + Send + Sync>(mut self, codec: SpecialValueCodec<T>) -> Self {
        self.registry.special_values.register(codec);
        self
    }

    /// Register a native object type the store may hand back
    pub fn native<N: NativeObject>(mut self) -> Self {
        self.registry.special_values.register_native::<N>();
        self
    }

    /// Let dynamic values of runtime type `T` encode through `T`'s schema
    pub fn contextual<T: Encodable + Any + Send + Sync>(mut self) -> Self {
        self.registry
            .contextual
            .insert(TypeId::of::<T>(), Arc::new(TypedContextual::<T>(PhantomData)));
        self
    }

    /// Register the subtypes of an open polymorphic base.
    ///
    /// Starts from the base's sealed subtypes, if any.
    pub fn polymorphic<B: Polymorphic>(mut self, configure: impl FnOnce(&mut PolymorphicTable<B>)) -> Self {
        let mut table = B::sealed_subtypes()
            .map(|sealed| sealed.as_ref().clone())
            .unwrap_or_default();
        configure(&mut table);
        debug!(
            base = B::base_descriptor().serial_name(),
            subtypes = table.len(),
            "registered polymorphic subtypes"
        );
        self.registry.polymorphic.insert(TypeId::of::<B>(), Arc::new(table));
        self
    }

    /// Finish building
    pub fn build(self) -> ExtensionRegistry {
        debug!(
            special_values = self.registry.special_values.len(),
            contextual = self.registry.contextual.len(),
            polymorphic = self.registry.polymorphic.len(),
            "extension registry built"
        );
        self.registry
    }
}

impl fmt::Debug for ExtensionRegistryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionRegistryBuilder")
            .field("registry", &self.registry)
            .finish()
    }
}
