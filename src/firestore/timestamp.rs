//! Firestore Timestamp type
//!
//! Besides the validated [`Timestamp`] itself this module holds the two
//! typed views the encoder maps onto it: [`TimestampValue`], which can also
//! stand for a pending server timestamp, and `chrono::DateTime<Utc>`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::field_value::FieldValue;
use crate::encoding::{
    Decodable, Decoder, Encodable, Encoder, NativeValue, PlainValue, Schema, SchemaDescriptor, SpecialValueCodec,
};
use crate::error::{EncodingError, FirestoreError};

/// Firestore timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp {
    /// Seconds since Unix epoch
    pub seconds: i64,

    /// Nanoseconds component (0-999,999,999)
    pub nanoseconds: i32,
}

impl Timestamp {
    /// Create a new timestamp
    pub fn new(seconds: i64, nanoseconds: i32) -> Result<Self, FirestoreError> {
        if !(0..1_000_000_000).contains(&nanoseconds) {
            return Err(FirestoreError::InvalidArgument(format!(
                "nanoseconds must be in range [0, 999999999], got {}",
                nanoseconds
            )));
        }

        Ok(Self {
            seconds,
            nanoseconds,
        })
    }

    /// Get current timestamp
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    /// Convert from DateTime
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self {
            seconds: dt.timestamp(),
            // subsec nanos stay below 2e9 (leap seconds), well inside i32
            nanoseconds: dt.timestamp_subsec_nanos() as i32,
        }
    }

    /// Convert to DateTime
    ///
    /// # Errors
    /// `InvalidData` when the instant is outside chrono's range.
    pub fn to_datetime(&self) -> Result<DateTime<Utc>, FirestoreError> {
        let nanos = u32::try_from(self.nanoseconds)
            .map_err(|_| FirestoreError::InvalidData(format!("negative nanoseconds {}", self.nanoseconds)))?;
        DateTime::from_timestamp(self.seconds, nanos)
            .ok_or_else(|| FirestoreError::InvalidData(format!("timestamp {}s out of range", self.seconds)))
    }

    pub(crate) fn codec() -> SpecialValueCodec<Timestamp> {
        SpecialValueCodec::identity("Timestamp")
    }
}

/// Timestamp that may still be waiting for the server
///
/// Writing `ServerTimestamp` stores the server-timestamp sentinel; reading a
/// field that still holds the sentinel yields `ServerTimestamp` again rather
/// than a made-up instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampValue {
    /// Concrete instant
    Resolved(Timestamp),
    /// Server-assigned on commit
    ServerTimestamp,
}

impl TimestampValue {
    /// The instant, once resolved
    pub fn resolved(&self) -> Option<Timestamp> {
        match self {
            Self::Resolved(ts) => Some(*ts),
            Self::ServerTimestamp => None,
        }
    }

    pub(crate) fn codec() -> SpecialValueCodec<TimestampValue> {
        SpecialValueCodec {
            serial_name: "TimestampValue",
            to_native: |value| match value {
                Self::Resolved(ts) => NativeValue::new(*ts),
                Self::ServerTimestamp => NativeValue::new(FieldValue::ServerTimestamp),
            },
            from_native: |native| {
                if let Some(ts) = native.downcast_ref::<Timestamp>() {
                    return Some(Self::Resolved(*ts));
                }
                match native.downcast_ref::<FieldValue>() {
                    Some(FieldValue::ServerTimestamp) => Some(Self::ServerTimestamp),
                    _ => None,
                }
            },
        }
    }
}

impl From<Timestamp> for TimestampValue {
    fn from(ts: Timestamp) -> Self {
        Self::Resolved(ts)
    }
}

pub(crate) fn datetime_codec() -> SpecialValueCodec<DateTime<Utc>> {
    SpecialValueCodec {
        serial_name: "DateTime",
        to_native: |dt| NativeValue::new(Timestamp::from_datetime(*dt)),
        from_native: |native| native.downcast_ref::<Timestamp>()?.to_datetime().ok(),
    }
}

super::special_type!(Timestamp, "Timestamp");
super::special_type!(TimestampValue, "TimestampValue");

impl Schema for DateTime<Utc> {
    fn descriptor() -> SchemaDescriptor {
        SchemaDescriptor::special("DateTime")
    }
}

impl Encodable for DateTime<Utc> {
    fn encode(&self, _encoder: &Encoder<'_>) -> Result<PlainValue, EncodingError> {
        Err(super::unregistered("DateTime"))
    }
}

impl Decodable for DateTime<Utc> {
    fn decode(value: &PlainValue, _decoder: &Decoder<'_>) -> Result<Self, EncodingError> {
        Err(crate::encoding::decoder::mismatch("DateTime", value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::{decode, encode, DecodeSettings, EncodeSettings, ExtensionRegistry};
    use crate::error::ErrorKind;
    use std::sync::Arc;

    #[test]
    fn test_timestamp_creation() {
        let ts = Timestamp::new(1234567890, 123456789).unwrap();
        assert_eq!(ts.seconds, 1234567890);
        assert_eq!(ts.nanoseconds, 123456789);
    }

    #[test]
    fn test_timestamp_invalid_nanoseconds() {
        assert!(Timestamp::new(0, -1).is_err());
        assert!(Timestamp::new(0, 1_000_000_000).is_err());
        assert!(Timestamp::new(0, 999_999_999).is_ok());
    }

    #[test]
    fn test_timestamp_datetime_conversion() {
        let ts = Timestamp::new(1609459200, 500_000_000).unwrap();
        let dt = ts.to_datetime().unwrap();
        assert_eq!(dt.timestamp(), 1609459200);
        assert_eq!(Timestamp::from_datetime(dt), ts);
    }

    #[test]
    fn test_timestamp_negative_seconds() {
        let ts = Timestamp::new(-1000, 0).unwrap();
        assert_eq!(ts.to_datetime().unwrap().timestamp(), -1000);
    }

    #[test]
    fn test_timestamp_encodes_as_native() {
        let ts = Timestamp::new(10, 20).unwrap();
        let encoded = encode(&ts, &EncodeSettings::default()).unwrap();
        assert_eq!(encoded.as_native().and_then(|n| n.downcast_ref::<Timestamp>()), Some(&ts));
    }

    #[test]
    fn test_timestamp_without_codec_is_unsupported() {
        let settings = EncodeSettings::builder()
            .registry(Arc::new(ExtensionRegistry::empty()))
            .build();
        let err = encode(&Timestamp::new(1, 0).unwrap(), &settings).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::UnsupportedType(_)));
    }

    #[test]
    fn test_server_timestamp_placeholder_round_trip() {
        let encoded = encode(&TimestampValue::ServerTimestamp, &EncodeSettings::default()).unwrap();
        let native = encoded.as_native().unwrap();
        assert_eq!(native.downcast_ref::<FieldValue>(), Some(&FieldValue::ServerTimestamp));

        let decoded: TimestampValue = decode(&encoded, &DecodeSettings::default()).unwrap();
        assert_eq!(decoded, TimestampValue::ServerTimestamp);
        assert_eq!(decoded.resolved(), None);
    }

    #[test]
    fn test_plain_timestamp_refuses_sentinel() {
        let sentinel = PlainValue::Special(NativeValue::new(FieldValue::ServerTimestamp));
        let err = decode::<Timestamp>(&sentinel, &DecodeSettings::default()).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::UnrecognizedSpecialValue(_)));
    }

    #[test]
    fn test_datetime_round_trip() {
        let dt = DateTime::from_timestamp(1_700_000_000, 42).unwrap();
        let encoded = encode(&dt, &EncodeSettings::default()).unwrap();
        assert!(encoded.as_native().is_some_and(|n| n.is::<Timestamp>()));

        let decoded: DateTime<Utc> = decode(&encoded, &DecodeSettings::default()).unwrap();
        assert_eq!(decoded, dt);
    }
}
