//! Field paths and field-level updates
//!
//! An update addresses nested fields with dotted paths (`"address.city"`).
//! [`FieldUpdates`] pairs each path with an encoded value, in call order.

use std::any::Any;
use std::fmt;

use crate::encoding::{Encodable, EncodeSettings, Encoder, PlainMap, PlainValue};
use crate::error::{FirebaseError, FirestoreError};

/// Path to a possibly nested field
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// Create a path from its segments
    pub fn new<I, S>(segments: I) -> Result<Self, FirestoreError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(FirestoreError::InvalidArgument("field path must not be empty".to_string()));
        }
        if segments.iter().any(String::is_empty) {
            return Err(FirestoreError::InvalidArgument(format!(
                "field path {:?} contains an empty segment",
                segments
            )));
        }
        Ok(Self { segments })
    }

    /// Parse a dotted path
    pub fn parse(dotted: &str) -> Result<Self, FirestoreError> {
        Self::new(dotted.split('.'))
    }

    /// Single-segment path naming a top-level key literally, dots included
    pub(crate) fn from_key(key: String) -> Self {
        Self { segments: vec![key] }
    }

    /// Segments from the top-level field down
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Read the addressed value out of a document
    pub fn lookup<'a>(&self, data: &'a PlainMap) -> Option<&'a PlainValue> {
        let (first, rest) = self.segments.split_first()?;
        rest.iter()
            .try_fold(data.get(first)?, |value, segment| value.get(segment))
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

/// Ordered field-level updates for one document
///
/// # Example
/// ```
/// use firebase_common::firestore::{FieldUpdates, FieldValue};
///
/// let updates = FieldUpdates::new()
///     .set("name", &"Ada".to_string())
///     .unwrap()
///     .set("visits", &FieldValue::increment(1))
///     .unwrap();
/// assert_eq!(updates.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FieldUpdates {
    settings: Option<EncodeSettings>,
    entries: Vec<(FieldPath, PlainValue)>,
}

impl FieldUpdates {
    /// Empty update set encoding with the default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty update set encoding with custom settings
    pub fn with_settings(settings: EncodeSettings) -> Self {
        Self {
            settings: Some(settings),
            entries: Vec::new(),
        }
    }

    /// Set a dotted field path to a typed value
    pub fn set<T: Encodable + Any>(self, field: &str, value: &T) -> Result<Self, FirebaseError> {
        let path = FieldPath::parse(field)?;
        self.set_path(path, value)
    }

    /// Set a field path to a typed value
    pub fn set_path<T: Encodable + Any>(mut self, path: FieldPath, value: &T) -> Result<Self, FirebaseError> {
        let settings = self.settings.clone().unwrap_or_default();
        let encoded = Encoder::new(&settings).encode_value(value)?;
        self.entries.push((path, encoded));
        Ok(self)
    }

    /// Number of updated fields
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no field is updated
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Updates in call order
    pub fn iter(&self) -> impl Iterator<Item = (&FieldPath, &PlainValue)> {
        self.entries.iter().map(|(path, value)| (path, value))
    }

    pub(crate) fn into_entries(self) -> Vec<(FieldPath, PlainValue)> {
        self.entries
    }
}
