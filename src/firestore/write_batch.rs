//! Firestore WriteBatch type

use super::document_store::DocumentStore;
use super::field_path::{FieldPath, FieldUpdates};
use crate::encoding::{PlainMap, PlainValue};
use crate::error::{FirebaseError, FirestoreError};

/// Write operations for batch writes
///
/// Represents the different kinds of write a document store applies.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOperation {
    /// Set (overwrite or merge) a document
    Set {
        /// Document path
        path: String,
        /// Document data
        data: PlainMap,
        /// Merge top-level fields into the existing document instead of replacing it
        merge: bool,
    },
    /// Update specific fields in a document
    Update {
        /// Document path
        path: String,
        /// Field paths and their new values, in application order
        fields: Vec<(FieldPath, PlainValue)>,
    },
    /// Delete a document
    Delete {
        /// Document path to delete
        path: String,
    },
    /// Precondition: abort the whole commit unless the document still
    /// holds `expected` (`None`: it must not exist)
    Verify {
        /// Document path
        path: String,
        /// Data the document must hold at commit time
        expected: Option<PlainMap>,
    },
}

impl WriteOperation {
    /// Path of the document this operation writes
    pub fn path(&self) -> &str {
        match self {
            Self::Set { path, .. } | Self::Update { path, .. } | Self::Delete { path } | Self::Verify { path, .. } => {
                path
            }
        }
    }

    /// Update operation from a sparse object; each top-level key is one field
    pub fn update_from_map(path: impl Into<String>, data: PlainMap) -> Self {
        let fields = data
            .into_iter()
            .map(|(key, value)| (FieldPath::from_key(key), value))
            .collect();
        Self::Update {
            path: path.into(),
            fields,
        }
    }
}

/// Write batch for atomic operations
///
/// # Example
/// ```
/// # tokio_test::block_on(async {
/// use firebase_common::encoding::PlainMap;
/// use firebase_common::firestore::{DocumentStore, InMemoryDocumentStore, WriteBatch};
///
/// let store = InMemoryDocumentStore::new();
/// WriteBatch::new(&store)
///     .set("cities/LA", PlainMap::new())
///     .delete("cities/SF")
///     .commit()
///     .await
///     .unwrap();
/// assert!(store.get_document("cities/LA").await.unwrap().is_some());
/// # });
/// ```
pub struct WriteBatch<'s, S: DocumentStore> {
    store: &'s S,
    operations: Vec<WriteOperation>,
}

impl<'s, S: DocumentStore> WriteBatch<'s, S> {
    /// Create a new write batch against a store
    pub fn new(store: &'s S) -> Self {
        Self {
            store,
            operations: Vec::new(),
        }
    }

    /// Set document data (overwrites existing document)
    pub fn set(mut self, path: impl Into<String>, data: PlainMap) -> Self {
        self.operations.push(WriteOperation::Set {
            path: path.into(),
            data,
            merge: false,
        });
        self
    }

    /// Merge top-level fields into a document, creating it if needed
    pub fn set_merge(mut self, path: impl Into<String>, data: PlainMap) -> Self {
        self.operations.push(WriteOperation::Set {
            path: path.into(),
            data,
            merge: true,
        });
        self
    }

    /// Update document fields (document must exist)
    pub fn update(mut self, path: impl Into<String>, data: PlainMap) -> Self {
        self.operations.push(WriteOperation::update_from_map(path, data));
        self
    }

    /// Update individual field paths (document must exist)
    pub fn update_fields(mut self, path: impl Into<String>, updates: FieldUpdates) -> Self {
        self.operations.push(WriteOperation::Update {
            path: path.into(),
            fields: updates.into_entries(),
        });
        self
    }

    /// Delete document
    pub fn delete(mut self, path: impl Into<String>) -> Self {
        self.operations.push(WriteOperation::Delete { path: path.into() });
        self
    }

    /// Commit the batch
    ///
    /// Commits all batched write operations atomically. If any operation fails,
    /// none of the operations are applied.
    ///
    /// # Errors
    /// Returns `FirestoreError` if:
    /// - Batch is empty (nothing to commit)
    /// - Any write operation fails (entire batch is rolled back)
    pub async fn commit(self) -> Result<(), FirebaseError> {
        if self.operations.is_empty() {
            return Err(FirestoreError::InvalidArgument("Cannot commit empty batch".to_string()).into());
        }
        self.store.commit(self.operations).await
    }

    /// Check if batch is empty
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Get number of operations
    pub fn len(&self) -> usize {
        self.operations.len()
    }
}
