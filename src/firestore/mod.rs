//! Cloud Firestore module
//!
//! Firestore's special value types (timestamps, geo points, document
//! references, field-value sentinels), the document-store contract, and a
//! typed [`Firestore`] client that encodes documents on write and decodes
//! them on read.
//!
//! Special types are carried through plain values untouched as
//! [`crate::encoding::NativeValue`]s; the codecs in
//! [`ExtensionRegistryBuilder::with_firestore_types`] tell the engine which
//! native types to leave alone.

use tracing::debug;

use crate::encoding::ExtensionRegistryBuilder;
use crate::error::EncodingError;

/// Implement the encoding traits for a type that only travels as a special
/// value. Encoding is handled by the registry, so reaching `encode` means
/// no codec was registered.
macro_rules! special_type {
    ($ty:ty, $name:literal) => {
        impl $crate::encoding::Schema for $ty {
            fn descriptor() -> $crate::encoding::SchemaDescriptor {
                $crate::encoding::SchemaDescriptor::special($name)
            }
        }

        impl $crate::encoding::Encodable for $ty {
            fn encode(
                &self,
                _encoder: &$crate::encoding::Encoder<'_>,
            ) -> Result<$crate::encoding::PlainValue, $crate::EncodingError> {
                Err($crate::firestore::unregistered($name))
            }
        }

        impl $crate::encoding::Decodable for $ty {
            fn decode(
                value: &$crate::encoding::PlainValue,
                _decoder: &$crate::encoding::Decoder<'_>,
            ) -> Result<Self, $crate::EncodingError> {
                match value {
                    $crate::encoding::PlainValue::Special(native) => native
                        .downcast_ref::<$ty>()
                        .cloned()
                        .ok_or_else(|| $crate::encoding::decoder::mismatch($name, value)),
                    other => Err($crate::encoding::decoder::mismatch($name, other)),
                }
            }
        }
    };
}
pub(crate) use special_type;

pub(crate) fn unregistered(name: &str) -> EncodingError {
    EncodingError::unsupported_type(format!("{} (no special-value codec registered)", name))
}

pub mod document_reference;
pub mod document_snapshot;
pub mod document_store;
pub mod field_path;
pub mod field_value;
/// Typed client over a document store
pub mod firestore;
pub mod geo_point;
pub mod timestamp;
pub mod write_batch;

pub use document_reference::DocumentReference;
pub use document_snapshot::DocumentSnapshot;
pub use document_store::{DocumentStore, InMemoryDocumentStore};
pub use field_path::{FieldPath, FieldUpdates};
pub use field_value::FieldValue;
pub use firestore::{Firestore, MAX_TRANSFORM_ATTEMPTS};
pub use geo_point::GeoPoint;
pub use timestamp::{Timestamp, TimestampValue};
pub use write_batch::{WriteBatch, WriteOperation};

impl ExtensionRegistryBuilder {
    /// Register the Firestore special value types
    ///
    /// Timestamps, geo points, document references and field-value
    /// sentinels pass through encoding as native values. `TimestampValue`
    /// maps its server-timestamp case to [`FieldValue::ServerTimestamp`],
    /// and `chrono::DateTime<Utc>` is stored as a [`Timestamp`].
    pub fn with_firestore_types(self) -> Self {
        debug!("registering Firestore special value types");
        self.special(Timestamp::codec())
            .native::<Timestamp>()
            .special(GeoPoint::codec())
            .native::<GeoPoint>()
            .special(DocumentReference::codec())
            .native::<DocumentReference>()
            .special(FieldValue::codec())
            .native::<FieldValue>()
            .special(TimestampValue::codec())
            .special(timestamp::datetime_codec())
    }
}
