//! Plain values
//!
//! `PlainValue` is the tree the encoder produces and the decoder consumes:
//! the subset of data a document store understands natively (scalars,
//! string-keyed maps, lists) plus opaque native objects owned by the store
//! (timestamps, geopoints, references, field-value sentinels).

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

/// String-keyed map that preserves insertion order
pub type PlainMap = IndexMap<String, PlainValue>;

/// Generic in-memory representation of an encoded value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PlainValue {
    /// Absent value
    #[default]
    Null,
    /// Boolean scalar
    Boolean(bool),
    /// 8-bit integer
    Byte(i8),
    /// 16-bit integer
    Short(i16),
    /// 32-bit integer
    Int(i32),
    /// 64-bit integer
    Long(i64),
    /// 32-bit float
    Float(f32),
    /// 64-bit float
    Double(f64),
    /// UTF-8 string
    String(String),
    /// Single character
    Char(char),
    /// Ordered map with unique string keys
    Map(PlainMap),
    /// Ordered sequence
    List(Vec<PlainValue>),
    /// Opaque native object, never decomposed
    Special(NativeValue),
}

impl PlainValue {
    /// Short name of the variant, used in error messages
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "Null",
            Self::Boolean(_) => "Boolean",
            Self::Byte(_) => "Byte",
            Self::Short(_) => "Short",
            Self::Int(_) => "Int",
            Self::Long(_) => "Long",
            Self::Float(_) => "Float",
            Self::Double(_) => "Double",
            Self::String(_) => "String",
            Self::Char(_) => "Char",
            Self::Map(_) => "Map",
            Self::List(_) => "List",
            Self::Special(_) => "Special",
        }
    }

    /// Check if this is `Null`
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Borrow the map, if this is one
    pub fn as_map(&self) -> Option<&PlainMap> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Take the map, if this is one
    pub fn into_map(self) -> Option<PlainMap> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Borrow the list, if this is one
    pub fn as_list(&self) -> Option<&[PlainValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Borrow the string, if this is one
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the native object, if this is one
    pub fn as_native(&self) -> Option<&NativeValue> {
        match self {
            Self::Special(native) => Some(native),
            _ => None,
        }
    }

    /// Integer value of any integer width
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Byte(v) => Some(i64::from(*v)),
            Self::Short(v) => Some(i64::from(*v)),
            Self::Int(v) => Some(i64::from(*v)),
            Self::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// Look up a key when this is a map
    pub fn get(&self, key: &str) -> Option<&PlainValue> {
        self.as_map().and_then(|map| map.get(key))
    }

    /// Compact rendering for error messages
    pub(crate) fn describe(&self) -> String {
        match self {
            Self::Map(map) => format!("Map({} entries)", map.len()),
            Self::List(items) => format!("List({} items)", items.len()),
            Self::Special(native) => format!("Special({})", native.type_name()),
            other => format!("{:?}", other),
        }
    }
}

impl From<bool> for PlainValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i32> for PlainValue {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<i64> for PlainValue {
    fn from(value: i64) -> Self {
        Self::Long(value)
    }
}

impl From<f64> for PlainValue {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<&str> for PlainValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for PlainValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<PlainMap> for PlainValue {
    fn from(value: PlainMap) -> Self {
        Self::Map(value)
    }
}

impl From<Vec<PlainValue>> for PlainValue {
    fn from(value: Vec<PlainValue>) -> Self {
        Self::List(value)
    }
}

impl From<NativeValue> for PlainValue {
    fn from(value: NativeValue) -> Self {
        Self::Special(value)
    }
}

/// Object the document store understands natively
///
/// Implemented for every `'static` type that is comparable, printable and
/// serde-serializable; the Firestore special types all qualify.
pub trait NativeObject: Any + fmt::Debug + Send + Sync {
    /// Upcast for downcasting by concrete type
    fn as_any(&self) -> &dyn Any;

    /// Value equality across the erased boundary
    fn native_eq(&self, other: &dyn NativeObject) -> bool;

    /// Rust type name of the native object
    fn type_name(&self) -> &'static str;

    /// JSON rendering through the object's own serde representation
    fn to_json(&self) -> serde_json::Result<serde_json::Value>;
}

impl<T> NativeObject for T
where
    T: Any + fmt::Debug + PartialEq + serde::Serialize + Send + Sync,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn native_eq(&self, other: &dyn NativeObject) -> bool {
        other.as_any().downcast_ref::<T>() == Some(self)
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

/// Shared handle to a native object
///
/// Cloning shares the same object, so a native value handed to the encoder
/// reaches the output as the very same allocation.
#[derive(Clone)]
pub struct NativeValue(Arc<dyn NativeObject>);

impl NativeValue {
    /// Wrap a native object
    pub fn new<T: NativeObject>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Borrow the native object as a concrete type
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }

    /// Check the concrete type of the native object
    pub fn is<T: Any>(&self) -> bool {
        self.0.as_any().is::<T>()
    }

    /// `TypeId` of the wrapped object
    pub fn native_type_id(&self) -> std::any::TypeId {
        self.0.as_any().type_id()
    }

    /// Rust type name of the wrapped object
    pub fn type_name(&self) -> &'static str {
        self.0.type_name()
    }

    /// Check whether both handles share one allocation
    pub fn ptr_eq(&self, other: &NativeValue) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn object(&self) -> &dyn NativeObject {
        self.0.as_ref()
    }
}

impl PartialEq for NativeValue {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.0.native_eq(other.0.as_ref())
    }
}

impl fmt::Debug for NativeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.0.as_ref(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, serde::Serialize)]
    struct Marker(u8);

    #[test]
    fn test_native_value_equality_by_value() {
        let a = NativeValue::new(Marker(1));
        let b = NativeValue::new(Marker(1));
        let c = NativeValue::new(Marker(2));

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(!a.ptr_eq(&b));
    }

    #[test]
    fn test_native_value_clone_shares_allocation() {
        let a = NativeValue::new(Marker(7));
        let b = a.clone();
        assert!(a.ptr_eq(&b));
        assert_eq!(b.downcast_ref::<Marker>(), Some(&Marker(7)));
    }

    #[test]
    fn test_native_values_of_different_types_differ() {
        let a = NativeValue::new(Marker(1));
        let b = NativeValue::new(1u8);
        assert_ne!(a, b);
        assert!(a.is::<Marker>());
        assert!(!b.is::<Marker>());
    }

    #[test]
    fn test_plain_value_accessors() {
        let mut map = PlainMap::new();
        map.insert("count".to_string(), PlainValue::Int(3));
        let value = PlainValue::Map(map);

        assert_eq!(value.get("count").and_then(PlainValue::as_i64), Some(3));
        assert!(value.get("missing").is_none());
        assert_eq!(value.kind_name(), "Map");
        assert!(PlainValue::default().is_null());
    }

    #[test]
    fn test_map_preserves_insertion_order() {
        let mut map = PlainMap::new();
        map.insert("z".to_string(), PlainValue::from(1));
        map.insert("a".to_string(), PlainValue::from(2));
        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, ["z", "a"]);
    }
}
