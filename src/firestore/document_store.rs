//! Document-store contract
//!
//! The engine never talks to a network. It hands encoded documents to a
//! [`DocumentStore`] and decodes what the store returns. The in-memory
//! implementation here is the store's test double: it keeps sentinels
//! unresolved, except `Delete`, which removes the targeted field.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, trace};

use super::field_path::FieldPath;
use super::field_value::FieldValue;
use super::write_batch::WriteOperation;
use crate::encoding::{PlainMap, PlainValue};
use crate::error::{FirebaseError, FirestoreError};

/// Backing store for encoded documents
pub trait DocumentStore: Send + Sync {
    /// Apply the writes atomically: all of them or none
    fn commit(&self, writes: Vec<WriteOperation>) -> impl Future<Output = Result<(), FirebaseError>> + Send;

    /// Current data of a document, `None` when it does not exist
    fn get_document(&self, path: &str) -> impl Future<Output = Result<Option<PlainMap>, FirebaseError>> + Send;
}

/// In-memory document store
///
/// Cloning shares the same documents.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocumentStore {
    documents: Arc<RwLock<HashMap<String, PlainMap>>>,
}

impl InMemoryDocumentStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    /// Whether the store holds no document
    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

impl DocumentStore for InMemoryDocumentStore {
    async fn commit(&self, writes: Vec<WriteOperation>) -> Result<(), FirebaseError> {
        let mut documents = self.documents.write().await;

        // Stage copies of the touched documents so a failing write leaves the store untouched
        let touched: HashSet<&str> = writes.iter().map(WriteOperation::path).collect();
        let mut staged: HashMap<String, PlainMap> = touched
            .iter()
            .filter_map(|path| documents.get(*path).map(|doc| (path.to_string(), doc.clone())))
            .collect();
        for write in &writes {
            apply(&mut staged, write)?;
        }
        for path in touched {
            match staged.remove(path) {
                Some(document) => {
                    documents.insert(path.to_string(), document);
                }
                None => {
                    documents.remove(path);
                }
            }
        }

        debug!(writes = writes.len(), "committed writes");
        Ok(())
    }

    async fn get_document(&self, path: &str) -> Result<Option<PlainMap>, FirebaseError> {
        Ok(self.documents.read().await.get(path).cloned())
    }
}

fn is_delete(value: &PlainValue) -> bool {
    value
        .as_native()
        .and_then(|native| native.downcast_ref::<FieldValue>())
        .is_some_and(FieldValue::is_delete)
}

/// Structural equality where a stored NaN still matches itself
fn same_value(a: &PlainValue, b: &PlainValue) -> bool {
    match (a, b) {
        (PlainValue::Double(x), PlainValue::Double(y)) => x.to_bits() == y.to_bits(),
        (PlainValue::Float(x), PlainValue::Float(y)) => x.to_bits() == y.to_bits(),
        (PlainValue::List(x), PlainValue::List(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(x, y)| same_value(x, y))
        }
        (PlainValue::Map(x), PlainValue::Map(y)) => same_map(x, y),
        _ => a == b,
    }
}

fn same_map(a: &PlainMap, b: &PlainMap) -> bool {
    a.len() == b.len()
        && a.iter()
            .all(|(key, value)| b.get(key).is_some_and(|other| same_value(value, other)))
}

fn apply(documents: &mut HashMap<String, PlainMap>, write: &WriteOperation) -> Result<(), FirestoreError> {
    trace!(path = write.path(), "applying write");
    match write {
        WriteOperation::Set { path, data, merge: false } => {
            if let Some((key, _)) = data.iter().find(|(_, value)| is_delete(value)) {
                return Err(FirestoreError::InvalidArgument(format!(
                    "FieldValue::Delete on '{}' needs a merge or an update",
                    key
                )));
            }
            documents.insert(path.clone(), data.clone());
        }
        WriteOperation::Set { path, data, merge: true } => {
            let document = documents.entry(path.clone()).or_default();
            for (key, value) in data {
                if is_delete(value) {
                    document.shift_remove(key);
                } else {
                    document.insert(key.clone(), value.clone());
                }
            }
        }
        WriteOperation::Update { path, fields } => {
            let Some(document) = documents.get_mut(path) else {
                return Err(FirestoreError::NotFound);
            };
            for (field, value) in fields {
                if is_delete(value) {
                    remove_field(document, field);
                } else {
                    set_field(document, field, value.clone());
                }
            }
        }
        WriteOperation::Delete { path } => {
            documents.remove(path);
        }
        WriteOperation::Verify { path, expected } => {
            let unchanged = match (documents.get(path), expected) {
                (Some(current), Some(expected)) => same_map(current, expected),
                (None, None) => true,
                _ => false,
            };
            if !unchanged {
                return Err(FirestoreError::Aborted(format!("document {} changed since it was read", path)));
            }
        }
    }
    Ok(())
}

fn set_field(document: &mut PlainMap, field: &FieldPath, value: PlainValue) {
    let Some((last, parents)) = field.segments().split_last() else {
        return;
    };
    let mut target = document;
    for segment in parents {
        let entry = target
            .entry(segment.clone())
            .or_insert_with(|| PlainValue::Map(PlainMap::new()));
        if !matches!(entry, PlainValue::Map(_)) {
            *entry = PlainValue::Map(PlainMap::new());
        }
        let PlainValue::Map(next) = entry else {
            return;
        };
        target = next;
    }
    target.insert(last.clone(), value);
}

fn remove_field(document: &mut PlainMap, field: &FieldPath) {
    let Some((last, parents)) = field.segments().split_last() else {
        return;
    };
    let mut target = document;
    for segment in parents {
        let Some(PlainValue::Map(next)) = target.get_mut(segment) else {
            return;
        };
        target = next;
    }
    target.shift_remove(last);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::NativeValue;

    fn doc(entries: &[(&str, PlainValue)]) -> PlainMap {
        entries
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect()
    }

    fn sentinel(value: FieldValue) -> PlainValue {
        PlainValue::Special(NativeValue::new(value))
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let store = InMemoryDocumentStore::new();
        let data = doc(&[("name", PlainValue::from("LA"))]);
        store
            .commit(vec![WriteOperation::Set {
                path: "cities/LA".to_string(),
                data: data.clone(),
                merge: false,
            }])
            .await
            .unwrap();

        assert_eq!(store.get_document("cities/LA").await.unwrap(), Some(data));
        assert_eq!(store.get_document("cities/SF").await.unwrap(), None);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_update_missing_document_fails_atomically() {
        let store = InMemoryDocumentStore::new();
        let err = store
            .commit(vec![
                WriteOperation::Set {
                    path: "a/1".to_string(),
                    data: PlainMap::new(),
                    merge: false,
                },
                WriteOperation::update_from_map("a/2", PlainMap::new()),
            ])
            .await
            .unwrap_err();

        assert!(matches!(err, FirebaseError::Firestore(FirestoreError::NotFound)));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_update_nested_and_delete_fields() {
        let store = InMemoryDocumentStore::new();
        let initial = doc(&[("keep", PlainValue::Int(1)), ("drop", PlainValue::Int(2))]);
        store
            .commit(vec![WriteOperation::Set {
                path: "d/1".to_string(),
                data: initial,
                merge: false,
            }])
            .await
            .unwrap();

        store
            .commit(vec![WriteOperation::Update {
                path: "d/1".to_string(),
                fields: vec![
                    (FieldPath::parse("address.city").unwrap(), PlainValue::from("Oslo")),
                    (FieldPath::parse("drop").unwrap(), sentinel(FieldValue::Delete)),
                ],
            }])
            .await
            .unwrap();

        let stored = store.get_document("d/1").await.unwrap().unwrap();
        assert_eq!(stored.get("keep"), Some(&PlainValue::Int(1)));
        assert!(stored.get("drop").is_none());
        assert_eq!(
            FieldPath::parse("address.city").unwrap().lookup(&stored),
            Some(&PlainValue::from("Oslo"))
        );
    }

    #[tokio::test]
    async fn test_merge_keeps_other_fields_and_sentinels() {
        let store = InMemoryDocumentStore::new();
        let path = "d/1".to_string();
        store
            .commit(vec![
                WriteOperation::Set {
                    path: path.clone(),
                    data: doc(&[("a", PlainValue::Int(1)), ("b", PlainValue::Int(2))]),
                    merge: false,
                },
                WriteOperation::Set {
                    path: path.clone(),
                    data: doc(&[("b", sentinel(FieldValue::Delete)), ("c", sentinel(FieldValue::increment(3)))]),
                    merge: true,
                },
            ])
            .await
            .unwrap();

        let stored = store.get_document(&path).await.unwrap().unwrap();
        assert_eq!(stored.keys().collect::<Vec<_>>(), ["a", "c"]);
        assert_eq!(stored["c"], sentinel(FieldValue::Increment(3)));
    }

    #[tokio::test]
    async fn test_verify_aborts_on_changed_document() {
        let store = InMemoryDocumentStore::new();
        let original = doc(&[("n", PlainValue::Int(0))]);
        let set = |path: &str, data: PlainMap| WriteOperation::Set {
            path: path.to_string(),
            data,
            merge: false,
        };
        store
            .commit(vec![set("c/1", original.clone()), set("c/2", original.clone())])
            .await
            .unwrap();

        let stale = doc(&[("n", PlainValue::Int(7))]);
        let err = store
            .commit(vec![
                WriteOperation::Verify {
                    path: "c/1".to_string(),
                    expected: Some(stale),
                },
                set("c/1", doc(&[("n", PlainValue::Int(1))])),
            ])
            .await
            .unwrap_err();
        assert!(matches!(err, FirebaseError::Firestore(FirestoreError::Aborted(_))));
        assert_eq!(store.get_document("c/1").await.unwrap(), Some(original.clone()));

        store
            .commit(vec![
                WriteOperation::Verify {
                    path: "c/1".to_string(),
                    expected: Some(original.clone()),
                },
                set("c/1", doc(&[("n", PlainValue::Int(1))])),
                WriteOperation::Verify {
                    path: "c/3".to_string(),
                    expected: None,
                },
            ])
            .await
            .unwrap();
        assert_eq!(store.get_document("c/1").await.unwrap(), Some(doc(&[("n", PlainValue::Int(1))])));
        assert_eq!(store.get_document("c/2").await.unwrap(), Some(original));
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_verify_matches_stored_nan() {
        let store = InMemoryDocumentStore::new();
        let data = doc(&[("x", PlainValue::Double(f64::NAN))]);
        store
            .commit(vec![WriteOperation::Set {
                path: "m/1".to_string(),
                data: data.clone(),
                merge: false,
            }])
            .await
            .unwrap();

        store
            .commit(vec![WriteOperation::Verify {
                path: "m/1".to_string(),
                expected: Some(data),
            }])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_failed_commit_keeps_touched_and_untouched_documents() {
        let store = InMemoryDocumentStore::new();
        let kept = doc(&[("k", PlainValue::Int(1))]);
        store
            .commit(vec![
                WriteOperation::Set {
                    path: "a/1".to_string(),
                    data: kept.clone(),
                    merge: false,
                },
                WriteOperation::Set {
                    path: "a/2".to_string(),
                    data: kept.clone(),
                    merge: false,
                },
            ])
            .await
            .unwrap();

        let err = store
            .commit(vec![
                WriteOperation::Delete {
                    path: "a/1".to_string(),
                },
                WriteOperation::update_from_map("a/missing", PlainMap::new()),
            ])
            .await
            .unwrap_err();
        assert!(matches!(err, FirebaseError::Firestore(FirestoreError::NotFound)));
        assert_eq!(store.get_document("a/1").await.unwrap(), Some(kept.clone()));
        assert_eq!(store.get_document("a/2").await.unwrap(), Some(kept));
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_set_without_merge_rejects_delete() {
        let store = InMemoryDocumentStore::new();
        let err = store
            .commit(vec![WriteOperation::Set {
                path: "d/1".to_string(),
                data: doc(&[("x", sentinel(FieldValue::Delete))]),
                merge: false,
            }])
            .await
            .unwrap_err();
        assert!(matches!(err, FirebaseError::Firestore(FirestoreError::InvalidArgument(_))));
    }
}
