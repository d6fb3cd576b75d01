//! Firestore DocumentReference type
//!
//! A reference is a slash-separated path alternating collection and
//! document ids, so it always has an even number of segments. Stored in a
//! document, it is a native value the store keeps as-is.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::encoding::SpecialValueCodec;
use crate::error::FirestoreError;

/// Reference to a Firestore document
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentReference {
    path: String,
}

impl DocumentReference {
    /// Create a reference from a document path such as `"users/alice"`
    pub fn new(path: impl Into<String>) -> Result<Self, FirestoreError> {
        let path = path.into();
        let trimmed = path.trim_matches('/');

        if trimmed.is_empty() {
            return Err(FirestoreError::InvalidArgument("document path must not be empty".to_string()));
        }

        let segments: Vec<&str> = trimmed.split('/').collect();
        if segments.iter().any(|segment| segment.is_empty()) {
            return Err(FirestoreError::InvalidArgument(format!(
                "document path '{}' contains an empty segment",
                path
            )));
        }
        if segments.len() % 2 != 0 {
            return Err(FirestoreError::InvalidArgument(format!(
                "document path '{}' must have an even number of segments, got {}",
                path,
                segments.len()
            )));
        }

        Ok(Self {
            path: trimmed.to_string(),
        })
    }

    /// Full document path (e.g., "users/alice")
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Get the document ID (last segment of path)
    pub fn id(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Get the parent collection path
    pub fn parent_path(&self) -> &str {
        self.path.rsplit_once('/').map_or("", |(parent, _)| parent)
    }

    /// Reference to a document in a subcollection of this one
    pub fn child(&self, collection: &str, document_id: &str) -> Result<Self, FirestoreError> {
        Self::new(format!("{}/{}/{}", self.path, collection, document_id))
    }

    pub(crate) fn codec() -> SpecialValueCodec<DocumentReference> {
        SpecialValueCodec::identity("DocumentReference")
    }
}

impl fmt::Display for DocumentReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

super::special_type!(DocumentReference, "DocumentReference");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_reference_parts() {
        let doc = DocumentReference::new("users/alice").unwrap();
        assert_eq!(doc.path(), "users/alice");
        assert_eq!(doc.id(), "alice");
        assert_eq!(doc.parent_path(), "users");
    }

    #[test]
    fn test_document_reference_trims_slashes() {
        let doc = DocumentReference::new("/users/alice/").unwrap();
        assert_eq!(doc.path(), "users/alice");
    }

    #[test]
    fn test_document_reference_rejects_collection_path() {
        assert!(DocumentReference::new("users").is_err());
        assert!(DocumentReference::new("users/alice/posts").is_err());
    }

    #[test]
    fn test_document_reference_rejects_empty_segments() {
        assert!(DocumentReference::new("").is_err());
        assert!(DocumentReference::new("users//alice").is_err());
    }

    #[test]
    fn test_child_reference() {
        let doc = DocumentReference::new("users/alice").unwrap();
        let post = doc.child("posts", "p1").unwrap();
        assert_eq!(post.path(), "users/alice/posts/p1");
        assert_eq!(post.parent_path(), "users/alice/posts");
    }
}
