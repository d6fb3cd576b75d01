//! Firebase error types
//!
//! Provides a unified error type hierarchy for encoding and Firestore operations.
//!
//! # Design
//! Uses thiserror for ergonomic error definitions. All errors implement
//! std::error::Error and can be converted to FirebaseError via From trait.
//!
//! Encoding failures carry the field path from the root value down to the
//! element that failed, so `MissingField` deep inside a nested document
//! reads as `missing required field 'zip' (at User.address / Address.zip)`.

use std::borrow::Cow;
use std::fmt;

use thiserror::Error;

/// Top-level Firebase error type
///
/// Wraps specific error types (Encoding, Firestore, etc.) into a unified type.
/// Supports conversion from all module-specific errors via `From` trait.
///
/// # Example
/// ```
/// use firebase_common::{FirebaseError, FirestoreError};
///
/// let err: FirebaseError = FirestoreError::NotFound.into();
/// ```
#[derive(Debug, Error)]
pub enum FirebaseError {
    /// Structural encode/decode errors
    #[error("Encoding error: {0}")]
    Encoding(#[from] EncodingError),

    /// Firestore-related errors
    #[error("Firestore error: {0}")]
    Firestore(#[from] FirestoreError),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl FirebaseError {
    /// Create an internal error from a string
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// The encoding error kind, if this is an encoding failure
    pub fn encoding_kind(&self) -> Option<&ErrorKind> {
        match self {
            Self::Encoding(err) => Some(err.kind()),
            _ => None,
        }
    }
}

/// Firestore errors
///
/// Raised by the document-store contract and by validating constructors of
/// the Firestore special types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FirestoreError {
    /// Document not found
    #[error("Document not found")]
    NotFound,

    /// A write precondition failed because the document changed concurrently
    #[error("Aborted: {0}")]
    Aborted(String),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Invalid data
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// What went wrong while encoding or decoding a value
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Null produced for a position whose schema is not nullable
    #[error("null value for non-nullable {0}")]
    InvalidValue(String),

    /// Map key that cannot be represented as a string key
    #[error("map keys must be strings, found {0}")]
    InvalidKeyType(String),

    /// No schema, special-value codec, or extension entry for a runtime type
    #[error("no serializer registered for type {0}")]
    UnsupportedType(String),

    /// Scalar coercion failed
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        /// Kind the target schema wanted
        expected: String,
        /// Rendering of the offending value
        found: String,
    },

    /// Null found where the target schema is not nullable
    #[error("unexpected null for non-nullable {0}")]
    UnexpectedNull(String),

    /// Decoded string or ordinal matches no declared enum case
    #[error("'{value}' is not a case of enum {enum_name}")]
    UnknownEnumCase {
        /// Serial name of the enum
        enum_name: String,
        /// The unmatched input
        value: String,
    },

    /// Required field absent from the decoded map
    #[error("missing required field '{0}'")]
    MissingField(String),

    /// Discriminator names no registered subtype
    #[error("'{serial_name}' is not a registered subtype of {base}")]
    UnknownPolymorphicType {
        /// Serial name of the polymorphic base
        base: String,
        /// Discriminator value found in the input
        serial_name: String,
    },

    /// Native value no special-value codec claims
    #[error("no special-value codec accepts native {0}")]
    UnrecognizedSpecialValue(String),

    /// Caller passed something the operation cannot accept
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// One step of the path from the root value to a failing element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    /// Serial name of the enclosing descriptor
    pub descriptor: Cow<'static, str>,
    /// Element name (field name, map key or list index)
    pub element: String,
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.descriptor, self.element)
    }
}

/// Error raised by the structural encoder and decoder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingError {
    kind: ErrorKind,
    path: Vec<PathSegment>,
}

impl EncodingError {
    /// Create an error with an empty path
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            path: Vec::new(),
        }
    }

    /// What went wrong
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Path from the root value to the failing element, root first
    pub fn path(&self) -> &[PathSegment] {
        &self.path
    }

    /// Prefix the path with the enclosing element.
    ///
    /// Called while the error unwinds, so segments arrive leaf first and are
    /// inserted at the front.
    pub fn within(
        mut self,
        descriptor: impl Into<Cow<'static, str>>,
        element: impl Into<String>,
    ) -> Self {
        self.path.insert(
            0,
            PathSegment {
                descriptor: descriptor.into(),
                element: element.into(),
            },
        );
        self
    }

    pub(crate) fn invalid_value(what: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidValue(what.into()))
    }

    pub(crate) fn invalid_key_type(found: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidKeyType(found.into()))
    }

    pub(crate) fn unsupported_type(type_name: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnsupportedType(type_name.into()))
    }

    pub(crate) fn type_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        })
    }

    pub(crate) fn unexpected_null(what: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnexpectedNull(what.into()))
    }

    pub(crate) fn unknown_enum_case(enum_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownEnumCase {
            enum_name: enum_name.into(),
            value: value.into(),
        })
    }

    pub(crate) fn missing_field(field: impl Into<String>) -> Self {
        Self::new(ErrorKind::MissingField(field.into()))
    }

    pub(crate) fn unknown_polymorphic_type(
        base: impl Into<String>,
        serial_name: impl Into<String>,
    ) -> Self {
        Self::new(ErrorKind::UnknownPolymorphicType {
            base: base.into(),
            serial_name: serial_name.into(),
        })
    }

    pub(crate) fn unrecognized_special_value(native: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnrecognizedSpecialValue(native.into()))
    }

    pub(crate) fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument(msg.into()))
    }
}

impl fmt::Display for EncodingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if !self.path.is_empty() {
            write!(f, " (at ")?;
            for (i, segment) in self.path.iter().enumerate() {
                if i > 0 {
                    write!(f, " / ")?;
                }
                write!(f, "{}", segment)?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

impl std::error::Error for EncodingError {}

impl From<ErrorKind> for EncodingError {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}
