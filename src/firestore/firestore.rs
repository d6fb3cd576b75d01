//! Typed Firestore façade
//!
//! Encodes typed values into documents on the way in and decodes them on
//! the way out, over any [`DocumentStore`].

use std::any::Any;

use futures::future::try_join_all;
use rand::Rng;
use tracing::debug;

use super::document_reference::DocumentReference;
use super::document_snapshot::DocumentSnapshot;
use super::document_store::DocumentStore;
use super::field_path::FieldUpdates;
use super::write_batch::{WriteBatch, WriteOperation};
use crate::encoding::{
    decode, encode_as_object, reencode_transform, Decodable, DecodeSettings, Encodable, EncodeSettings, PlainValue,
};
use crate::error::{EncodingError, ErrorKind, FirebaseError, FirestoreError};

/// Length of generated document ids
const AUTO_ID_LENGTH: usize = 20;

/// Attempts before a contended transform gives up
pub const MAX_TRANSFORM_ATTEMPTS: usize = 5;

/// Firestore database client over a document store
///
/// # Example
/// ```
/// # tokio_test::block_on(async {
/// use firebase_common::firestore::{Firestore, InMemoryDocumentStore};
/// use firebase_common::firestore_class;
///
/// firestore_class! {
///     #[derive(Debug, Clone, PartialEq)]
///     pub struct City {
///         pub name: String,
///         pub capital: bool = false,
///     }
/// }
///
/// let db = Firestore::new(InMemoryDocumentStore::new());
/// let city = City { name: "Oslo".to_string(), capital: true };
/// db.set("cities/oslo", &city).await.unwrap();
///
/// let loaded: Option<City> = db.get("cities/oslo").await.unwrap();
/// assert_eq!(loaded, Some(city));
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct Firestore<S: DocumentStore> {
    store: S,
    encode_settings: EncodeSettings,
    decode_settings: DecodeSettings,
}

impl<S: DocumentStore> Firestore<S> {
    /// Create a client with the default settings
    pub fn new(store: S) -> Self {
        Self {
            store,
            encode_settings: EncodeSettings::default(),
            decode_settings: DecodeSettings::default(),
        }
    }

    /// Use custom encode settings for writes
    pub fn with_encode_settings(mut self, settings: EncodeSettings) -> Self {
        self.encode_settings = settings;
        self
    }

    /// Use custom decode settings for reads
    pub fn with_decode_settings(mut self, settings: DecodeSettings) -> Self {
        self.decode_settings = settings;
        self
    }

    /// Underlying document store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get a validated document reference
    pub fn document(&self, path: impl Into<String>) -> Result<DocumentReference, FirebaseError> {
        Ok(DocumentReference::new(path)?)
    }

    /// Create a write batch
    pub fn batch(&self) -> WriteBatch<'_, S> {
        WriteBatch::new(&self.store)
    }

    /// Overwrite a document with a typed value
    pub async fn set<T: Encodable + Any>(&self, path: &str, value: &T) -> Result<(), FirebaseError> {
        let reference = self.document(path)?;
        let data = encode_as_object(value, &self.encode_settings)?;
        self.commit_one(WriteOperation::Set {
            path: reference.path().to_string(),
            data,
            merge: false,
        })
        .await
    }

    /// Merge a typed value's top-level fields into a document
    pub async fn set_merge<T: Encodable + Any>(&self, path: &str, value: &T) -> Result<(), FirebaseError> {
        let reference = self.document(path)?;
        let data = encode_as_object(value, &self.encode_settings)?;
        self.commit_one(WriteOperation::Set {
            path: reference.path().to_string(),
            data,
            merge: true,
        })
        .await
    }

    /// Update an existing document with the fields of a typed value that
    /// differ from their declared defaults
    pub async fn update<T: Encodable + Any>(&self, path: &str, value: &T) -> Result<(), FirebaseError> {
        let reference = self.document(path)?;
        let sparse = self.encode_settings.with_encode_defaults(false);
        let data = encode_as_object(value, &sparse)?;
        self.commit_one(WriteOperation::update_from_map(reference.path(), data))
            .await
    }

    /// Update individual field paths of an existing document
    pub async fn update_fields(&self, path: &str, updates: FieldUpdates) -> Result<(), FirebaseError> {
        let reference = self.document(path)?;
        self.commit_one(WriteOperation::Update {
            path: reference.path().to_string(),
            fields: updates.into_entries(),
        })
        .await
    }

    /// Delete a document
    pub async fn delete(&self, path: &str) -> Result<(), FirebaseError> {
        let reference = self.document(path)?;
        self.commit_one(WriteOperation::Delete {
            path: reference.path().to_string(),
        })
        .await
    }

    /// Add a document with a generated id to a collection
    pub async fn add<T: Encodable + Any>(&self, collection: &str, value: &T) -> Result<DocumentReference, FirebaseError> {
        let auto_id: String = rand::thread_rng()
            .sample_iter(&rand::distributions::Alphanumeric)
            .take(AUTO_ID_LENGTH)
            .map(char::from)
            .collect();

        let reference = self.document(format!("{}/{}", collection.trim_matches('/'), auto_id))?;
        debug!(path = reference.path(), "adding document");
        self.set(reference.path(), value).await?;
        Ok(reference)
    }

    /// Read a document as a typed value, `None` when it does not exist
    pub async fn get<T: Decodable + Any>(&self, path: &str) -> Result<Option<T>, FirebaseError> {
        self.get_snapshot(path).await?.data()
    }

    /// Read several documents concurrently, in the order given
    pub async fn get_all<T: Decodable + Any>(&self, paths: &[&str]) -> Result<Vec<Option<T>>, FirebaseError> {
        try_join_all(paths.iter().map(|path| self.get::<T>(path))).await
    }

    /// Read a document snapshot
    pub async fn get_snapshot(&self, path: &str) -> Result<DocumentSnapshot, FirebaseError> {
        let reference = self.document(path)?;
        let data = self.store.get_document(reference.path()).await?;
        Ok(DocumentSnapshot::new(reference, data).with_decode_settings(self.decode_settings.clone()))
    }

    /// Read a document as `T`, apply a pure transform, write the result back
    ///
    /// The write only lands if the document still holds what was read;
    /// on contention the read and the transform run again, up to
    /// [`MAX_TRANSFORM_ATTEMPTS`] times.
    ///
    /// # Errors
    /// `NotFound` when the document does not exist, `Aborted` when every
    /// attempt lost a race; encoding errors from either direction
    /// propagate unchanged.
    pub async fn transform<T, F>(&self, path: &str, transform: F) -> Result<(), FirebaseError>
    where
        T: Decodable + Encodable + Any,
        F: Fn(T) -> T,
    {
        let reference = self.document(path)?;

        for attempt in 1..=MAX_TRANSFORM_ATTEMPTS {
            let Some(current) = self.store.get_document(reference.path()).await? else {
                return Err(FirestoreError::NotFound.into());
            };

            let updated = reencode_transform(
                &PlainValue::Map(current.clone()),
                &self.decode_settings,
                &self.encode_settings,
                |value| transform(value),
            )?;
            let data = match updated {
                PlainValue::Map(data) => data,
                other => {
                    return Err(EncodingError::new(ErrorKind::InvalidArgument(format!(
                        "transform of {} produced {}, but a document must be an object",
                        reference,
                        other.kind_name()
                    )))
                    .into())
                }
            };

            let writes = vec![
                WriteOperation::Verify {
                    path: reference.path().to_string(),
                    expected: Some(current),
                },
                WriteOperation::Set {
                    path: reference.path().to_string(),
                    data,
                    merge: false,
                },
            ];
            match self.store.commit(writes).await {
                Ok(()) => return Ok(()),
                Err(FirebaseError::Firestore(FirestoreError::Aborted(reason))) => {
                    debug!(path = reference.path(), attempt, %reason, "transform contended, retrying");
                }
                Err(e) => return Err(e),
            }
        }

        Err(FirestoreError::Aborted(format!(
            "transform of {} failed after {} attempts",
            reference, MAX_TRANSFORM_ATTEMPTS
        ))
        .into())
    }

    /// Decode an arbitrary stored value with this client's settings
    pub fn decode_value<T: Decodable + Any>(&self, value: &PlainValue) -> Result<T, FirebaseError> {
        Ok(decode(value, &self.decode_settings)?)
    }

    async fn commit_one(&self, write: WriteOperation) -> Result<(), FirebaseError> {
        self.store.commit(vec![write]).await
    }
}
