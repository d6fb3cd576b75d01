//! Firestore DocumentSnapshot type

use std::any::Any;

use super::document_reference::DocumentReference;
use super::field_path::FieldPath;
use crate::encoding::{decode, Decodable, DecodeSettings, PlainMap, PlainValue};
use crate::error::{FirebaseError, FirestoreError};

/// Firestore document snapshot
#[derive(Debug, Clone)]
pub struct DocumentSnapshot {
    /// Document reference
    pub reference: DocumentReference,

    /// Document data (None if document doesn't exist)
    pub data: Option<PlainMap>,

    settings: DecodeSettings,
}

impl DocumentSnapshot {
    /// Create a snapshot
    pub fn new(reference: DocumentReference, data: Option<PlainMap>) -> Self {
        Self {
            reference,
            data,
            settings: DecodeSettings::default(),
        }
    }

    /// Decode with these settings in [`data`](Self::data) and [`get_as`](Self::get_as)
    pub fn with_decode_settings(mut self, settings: DecodeSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Check if document exists
    pub fn exists(&self) -> bool {
        self.data.is_some()
    }

    /// Get document ID
    pub fn id(&self) -> &str {
        self.reference.id()
    }

    /// Get a raw field value by dotted path
    pub fn get(&self, field: &str) -> Option<&PlainValue> {
        let Some(data) = &self.data else {
            return None;
        };
        FieldPath::parse(field).ok()?.lookup(data)
    }

    /// Decode the whole document, `None` if it does not exist
    pub fn data_as<T: Decodable + Any>(&self, settings: &DecodeSettings) -> Result<Option<T>, FirebaseError> {
        let Some(data) = &self.data else {
            return Ok(None);
        };
        // The decoder takes a value, so the map is wrapped once here
        let value = PlainValue::Map(data.clone());
        Ok(Some(decode(&value, settings)?))
    }

    /// Decode the whole document with the snapshot's settings
    pub fn data<T: Decodable + Any>(&self) -> Result<Option<T>, FirebaseError> {
        self.data_as(&self.settings)
    }

    /// Decode one field by dotted path
    ///
    /// # Errors
    /// `NotFound` when the document or the field does not exist.
    pub fn get_as<T: Decodable + Any>(&self, field: &str) -> Result<T, FirebaseError> {
        let path = FieldPath::parse(field)?;
        let Some(data) = &self.data else {
            return Err(FirestoreError::NotFound.into());
        };
        let Some(value) = path.lookup(data) else {
            return Err(FirestoreError::NotFound.into());
        };
        Ok(decode(value, &self.settings)?)
    }
}
