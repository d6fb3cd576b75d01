//! Firestore field-value sentinels
//!
//! Sentinels are write intents the server resolves on commit ("delete this
//! field", "add 5"). They are never decomposed by the encoder.

use std::any::Any;

use serde::Serialize;

use crate::encoding::{encode, Encodable, EncodeSettings, PlainValue, SpecialValueCodec};
use crate::error::EncodingError;

/// Write-intent sentinel
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "sentinel", content = "operand", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldValue {
    /// Remove the field
    Delete,
    /// Set the field to the commit time
    ServerTimestamp,
    /// Add to an integer field
    Increment(i64),
    /// Add to a floating-point field
    IncrementDouble(f64),
    /// Append elements not already present
    ArrayUnion(Vec<PlainValue>),
    /// Remove every occurrence of the elements
    ArrayRemove(Vec<PlainValue>),
}

impl FieldValue {
    /// Delete sentinel
    pub fn delete() -> Self {
        Self::Delete
    }

    /// Server timestamp sentinel
    pub fn server_timestamp() -> Self {
        Self::ServerTimestamp
    }

    /// Integer increment
    pub fn increment(by: i64) -> Self {
        Self::Increment(by)
    }

    /// Floating-point increment
    pub fn increment_double(by: f64) -> Self {
        Self::IncrementDouble(by)
    }

    /// Array union of typed elements, encoded with the default settings
    pub fn array_union<T: Encodable + Any>(elements: &[T]) -> Result<Self, EncodingError> {
        encode_elements(elements).map(Self::ArrayUnion)
    }

    /// Array remove of typed elements, encoded with the default settings
    pub fn array_remove<T: Encodable + Any>(elements: &[T]) -> Result<Self, EncodingError> {
        encode_elements(elements).map(Self::ArrayRemove)
    }

    /// Whether this sentinel removes the field
    pub fn is_delete(&self) -> bool {
        matches!(self, Self::Delete)
    }

    pub(crate) fn codec() -> SpecialValueCodec<FieldValue> {
        SpecialValueCodec::identity("FieldValue")
    }
}

fn encode_elements<T: Encodable + Any>(elements: &[T]) -> Result<Vec<PlainValue>, EncodingError> {
    let settings = EncodeSettings::default();
    elements.iter().map(|element| encode(element, &settings)).collect()
}

super::special_type!(FieldValue, "FieldValue");
