//! Firestore GeoPoint type

use serde::{Deserialize, Serialize};

use crate::encoding::SpecialValueCodec;
use crate::error::FirestoreError;

/// Geographic point (latitude/longitude)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees (range: -90 to 90)
    pub latitude: f64,

    /// Longitude in degrees (range: -180 to 180)
    pub longitude: f64,
}

impl GeoPoint {
    /// Create a new geographic point
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, FirestoreError> {
        // Validate latitude (error cases first); NaN fails the range check too
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(FirestoreError::InvalidArgument(format!(
                "latitude must be in range [-90, 90], got {}",
                latitude
            )));
        }

        if !(-180.0..=180.0).contains(&longitude) {
            return Err(FirestoreError::InvalidArgument(format!(
                "longitude must be in range [-180, 180], got {}",
                longitude
            )));
        }

        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub(crate) fn codec() -> SpecialValueCodec<GeoPoint> {
        SpecialValueCodec::identity("GeoPoint")
    }
}

super::special_type!(GeoPoint, "GeoPoint");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::{decode, encode, DecodeSettings, EncodeSettings, NativeValue, PlainValue};

    #[test]
    fn test_geopoint_creation_valid() {
        let gp = GeoPoint::new(37.7749, -122.4194).unwrap();
        assert_eq!(gp.latitude, 37.7749);
        assert_eq!(gp.longitude, -122.4194);
    }

    #[test]
    fn test_geopoint_poles_and_dateline() {
        assert!(GeoPoint::new(90.0, 0.0).is_ok());
        assert!(GeoPoint::new(-90.0, 0.0).is_ok());
        assert!(GeoPoint::new(0.0, 180.0).is_ok());
        assert!(GeoPoint::new(0.0, -180.0).is_ok());
    }

    #[test]
    fn test_geopoint_invalid_latitude() {
        assert!(GeoPoint::new(91.0, 0.0).is_err());
        assert!(GeoPoint::new(-91.0, 0.0).is_err());
        assert!(GeoPoint::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_geopoint_invalid_longitude() {
        assert!(GeoPoint::new(0.0, 181.0).is_err());
        assert!(GeoPoint::new(0.0, -181.0).is_err());
    }

    #[test]
    fn test_geopoint_is_never_decomposed() {
        let gp = GeoPoint::new(1.5, 2.5).unwrap();
        let encoded = encode(&vec![gp], &EncodeSettings::default()).unwrap();

        let items = encoded.as_list().unwrap();
        assert_eq!(items[0].as_native().and_then(|n| n.downcast_ref::<GeoPoint>()), Some(&gp));
        assert!(items[0].as_map().is_none());
    }

    #[test]
    fn test_geopoint_decodes_from_native() {
        let gp = GeoPoint::new(-33.86, 151.21).unwrap();
        let value = PlainValue::Special(NativeValue::new(gp));
        let decoded: GeoPoint = decode(&value, &DecodeSettings::default()).unwrap();
        assert_eq!(decoded, gp);
    }
}
