//! Structural encode/decode engine
//!
//! Converts typed Rust values to and from [`PlainValue`] trees, the data
//! model a document store persists natively.
//!
//! - Special values (timestamps, geopoints, references, sentinels) pass
//!   through untouched, at any depth.
//! - Ordered objects become maps keyed by field name; sparse encoding
//!   omits fields equal to their declared default.
//! - Polymorphic bases are tagged with a discriminator key.
//!
//! # Example
//! ```
//! use firebase_common::encoding::{decode, encode, DecodeSettings, EncodeSettings};
//! use firebase_common::firestore_class;
//!
//! firestore_class! {
//!     #[derive(Debug, Clone, PartialEq)]
//!     pub struct Note {
//!         pub title: String,
//!         pub pinned: bool = false,
//!     }
//! }
//!
//! let note = Note { title: "hello".to_string(), pinned: false };
//! let sparse = EncodeSettings::builder().encode_defaults(false).build();
//! let encoded = encode(&note, &sparse).unwrap();
//! assert!(encoded.get("pinned").is_none());
//!
//! let decoded: Note = decode(&encoded, &DecodeSettings::default()).unwrap();
//! assert_eq!(decoded, note);
//! ```

pub mod decoder;
pub mod descriptor;
pub mod dynamic;
pub mod encoder;
mod json;
mod macros;
pub mod polymorphic;
pub mod reencode;
pub mod registry;
pub mod schema;
pub mod settings;
pub mod special;
pub mod value;

pub use decoder::{decode, ClassDecoder, Decodable, Decoder};
pub use descriptor::{ElementDescriptor, PrimitiveKind, SchemaDescriptor, SchemaKind, DEFAULT_DISCRIMINATOR};
pub use dynamic::{AnyMap, AnyValue};
pub use encoder::{encode, encode_as_object, ClassEncoder, Encodable, Encoder};
pub use polymorphic::{Polymorphic, PolymorphicTable, SubtypeEntry};
pub use reencode::reencode_transform;
pub use registry::{default_registry, ExtensionRegistry, ExtensionRegistryBuilder};
pub use schema::{ClassSchema, EnumSchema, Schema};
pub use settings::{DecodeSettings, DecodeSettingsBuilder, EncodeSettings, EncodeSettingsBuilder};
pub use special::{SpecialValueCodec, SpecialValueRegistry};
pub use value::{NativeObject, NativeValue, PlainMap, PlainValue};
