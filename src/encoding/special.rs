//! Special-value registry
//!
//! Values the document store persists natively (timestamps, geopoints,
//! references, field-value sentinels) must reach it untouched. The registry
//! knows, by exact type identity, which Rust types convert to such a native
//! object and which native object types the store hands back.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use super::value::{NativeObject, NativeValue};

/// Conversion pair for one special type
///
/// Round-trip law: `from_native(&to_native(x)) == Some(x)` for every valid
/// `x`, except where the store normalizes on purpose (a pending
/// server-timestamp sentinel decodes to a placeholder).
pub struct SpecialValueCodec<T> {
    /// Serial name of the special type
    pub serial_name: &'static str,
    /// Convert to the store's native object
    pub to_native: fn(&T) -> NativeValue,
    /// Convert back; `None` when the native object is not one this codec claims
    pub from_native: fn(&NativeValue) -> Option<T>,
}

impl<T: Clone + NativeObject> SpecialValueCodec<T> {
    /// Codec for a type that is itself the native object
    pub fn identity(serial_name: &'static str) -> Self {
        Self {
            serial_name,
            to_native: |value| NativeValue::new(value.clone()),
            from_native: |native| native.downcast_ref::<T>().cloned(),
        }
    }
}

pub(crate) trait ErasedSpecialCodec: Send + Sync {
    fn serial_name(&self) -> &'static str;
    fn to_native(&self, value: &dyn Any) -> Option<NativeValue>;
    fn from_native(&self, native: &NativeValue) -> Option<Box<dyn Any>>;
}

impl<T: Any + Send + Sync> ErasedSpecialCodec for SpecialValueCodec<T> {
    fn serial_name(&self) -> &'static str {
        self.serial_name
    }

    fn to_native(&self, value: &dyn Any) -> Option<NativeValue> {
        value.downcast_ref::<T>().map(self.to_native)
    }

    fn from_native(&self, native: &NativeValue) -> Option<Box<dyn Any>> {
        (self.from_native)(native).map(|value| Box::new(value) as Box<dyn Any>)
    }
}

/// Registry of special types, keyed by `TypeId`
#[derive(Clone, Default)]
pub struct SpecialValueRegistry {
    codecs: HashMap<TypeId, Arc<dyn ErasedSpecialCodec>>,
    native_types: HashMap<TypeId, &'static str>,
}

impl SpecialValueRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the codec for a typed special value
    pub fn register<T: Any + Send + Sync>(&mut self, codec: SpecialValueCodec<T>) {
        self.codecs.insert(TypeId::of::<T>(), Arc::new(codec));
    }

    /// Register a native object type the store may return
    pub fn register_native<N: NativeObject>(&mut self) {
        self.native_types
            .insert(TypeId::of::<N>(), std::any::type_name::<N>());
    }

    /// Whether a runtime value must pass through unencoded.
    ///
    /// True for registered typed special values, registered native object
    /// types, and already-wrapped [`NativeValue`] handles.
    pub fn is_special(&self, value: &dyn Any) -> bool {
        let type_id = value.type_id();
        self.codecs.contains_key(&type_id)
            || self.native_types.contains_key(&type_id)
            || value.is::<NativeValue>()
    }

    /// Whether a native object is one the store is known to supply
    pub fn recognizes(&self, native: &NativeValue) -> bool {
        self.native_types.contains_key(&native.native_type_id())
    }

    /// Convert a runtime value to its native object, if its type is registered
    pub fn to_native(&self, value: &dyn Any) -> Option<NativeValue> {
        if let Some(native) = value.downcast_ref::<NativeValue>() {
            return Some(native.clone());
        }
        self.codecs.get(&value.type_id())?.to_native(value)
    }

    /// Whether a codec is registered for `T`
    pub fn has_codec<T: Any>(&self) -> bool {
        self.codecs.contains_key(&TypeId::of::<T>())
    }

    /// Serial name registered for `T`
    pub fn serial_name_of<T: Any>(&self) -> Option<&'static str> {
        self.codecs.get(&TypeId::of::<T>()).map(|codec| codec.serial_name())
    }

    /// Convert a native object back into `T`.
    ///
    /// `None` when no codec is registered for `T`; `Some(None)` when the
    /// codec exists but does not claim this native object.
    pub fn from_native<T: Any>(&self, native: &NativeValue) -> Option<Option<T>> {
        let codec = self.codecs.get(&TypeId::of::<T>())?;
        Some(
            codec
                .from_native(native)
                .and_then(|boxed| boxed.downcast::<T>().ok())
                .map(|boxed| *boxed),
        )
    }

    /// Number of registered typed codecs
    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    /// Whether no codecs are registered
    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }
}

impl std::fmt::Debug for SpecialValueRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.codecs.values().map(|codec| codec.serial_name()).collect();
        names.sort_unstable();
        f.debug_struct("SpecialValueRegistry")
            .field("codecs", &names)
            .field("native_types", &self.native_types.len())
            .finish()
    }
}
