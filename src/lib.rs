//! Firebase common encoding
//!
//! Structural encode/decode engine between typed Rust values and the plain
//! value trees Firestore stores, plus the Firestore special types and a
//! typed document client built on it.
//!
//! # Example
//! ```
//! use firebase_common::encoding::{decode, encode, DecodeSettings, EncodeSettings, PlainValue};
//! use firebase_common::firestore_class;
//!
//! firestore_class! {
//!     #[derive(Debug, Clone, PartialEq)]
//!     pub struct User {
//!         pub name: String,
//!         pub age: Option<i32> = None,
//!     }
//! }
//!
//! let user = User { name: "Ada".to_string(), age: None };
//! let plain = encode(&user, &EncodeSettings::default()).unwrap();
//! assert_eq!(plain.get("name"), Some(&PlainValue::from("Ada")));
//!
//! let back: User = decode(&plain, &DecodeSettings::default()).unwrap();
//! assert_eq!(back, user);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;

pub mod encoding;
pub mod firestore;

// Re-exports for convenience
pub use error::{EncodingError, ErrorKind, FirebaseError, FirestoreError, PathSegment};

#[doc(hidden)]
pub mod __private {
    pub use once_cell::sync::Lazy;
}
