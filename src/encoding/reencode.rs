//! Reencode-transform
//!
//! Decode a stored value as `T`, apply a pure function, encode the result.
//! Partial in-place updates use this instead of separate decode and encode
//! call sites.

use std::any::Any;

use super::decoder::{decode, Decodable};
use super::encoder::{encode, Encodable};
use super::settings::{DecodeSettings, EncodeSettings};
use super::value::PlainValue;
use crate::error::EncodingError;

/// `encode(transform(decode::<T>(value)))`
///
/// Errors from either side propagate unchanged.
///
/// # Example
/// ```
/// use firebase_common::encoding::{reencode_transform, DecodeSettings, EncodeSettings, PlainValue};
///
/// let stored = PlainValue::List(vec![PlainValue::from("One"), PlainValue::from("Two")]);
/// let updated = reencode_transform(
///     &stored,
///     &DecodeSettings::default(),
///     &EncodeSettings::default(),
///     |items: Vec<String>| items.into_iter().map(|s| format!("new{s}")).collect(),
/// )
/// .unwrap();
///
/// assert_eq!(
///     updated,
///     PlainValue::List(vec![PlainValue::from("newOne"), PlainValue::from("newTwo")])
/// );
/// ```
pub fn reencode_transform<T, F>(
    value: &PlainValue,
    decode_settings: &DecodeSettings,
    encode_settings: &EncodeSettings,
    transform: F,
) -> Result<PlainValue, EncodingError>
where
    T: Decodable + Encodable + Any,
    F: FnOnce(T) -> T,
{
    let decoded: T = decode(value, decode_settings)?;
    encode(&transform(decoded), encode_settings)
}
