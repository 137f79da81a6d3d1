//! Point geometry and great-circle distance.
//!
//! Records keep `latitude`/`longitude` as their only stored coordinates; the
//! GeoJSON-style point is always derived from them.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use crate::validate::ValidationError;

/// Mean Earth radius in metres.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Crops of the same name within this distance are checked for overlapping windows.
pub const OVERLAP_RADIUS_M: f64 = 2_000.0;

/// Search radius used by the nearby-crops lookup when none is given.
pub const DEFAULT_NEARBY_RADIUS_KM: f64 = 100.0;

/// Point geometry, serialized as `{"type": "Point", "coordinates": [lng, lat]}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(rename = "type")]
    kind: PointKind,
    coordinates: [f64; 2],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum PointKind {
    Point,
}

impl GeoPoint {
    /// Build a point from latitude and longitude, rejecting out-of-range values.
    pub fn from_lat_lng(latitude: f64, longitude: f64) -> Result<Self, ValidationError> {
        validate_coordinates(latitude, longitude)?;
        Ok(Self {
            kind: PointKind::Point,
            coordinates: [longitude, latitude],
        })
    }

    pub fn latitude(&self) -> f64 {
        self.coordinates[1]
    }

    pub fn longitude(&self) -> f64 {
        self.coordinates[0]
    }

    /// Great-circle distance to `other` in metres (haversine formula).
    pub fn distance_m(&self, other: &GeoPoint) -> f64 {
        const TO_RAD: f64 = std::f64::consts::PI / 180.0;

        let lat1 = self.latitude() * TO_RAD;
        let lat2 = other.latitude() * TO_RAD;
        let half_dlat = (other.latitude() - self.latitude()) * TO_RAD * 0.5;
        let half_dlon = (other.longitude() - self.longitude()) * TO_RAD * 0.5;

        let a = half_dlat.sin().powi(2) + lat1.cos() * lat2.cos() * half_dlon.sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_M * c
    }
}

/// Scalar coordinates of a record together with their mirrored point.
///
/// Serializes as three sibling fields (`latitude`, `longitude`, `location`) so
/// it can be flattened into a record. The point is derived on construction and
/// there is no way to change one side without the other.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position(GeoPoint);

impl Position {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, ValidationError> {
        GeoPoint::from_lat_lng(latitude, longitude).map(Self)
    }

    pub fn latitude(&self) -> f64 {
        self.0.latitude()
    }

    pub fn longitude(&self) -> f64 {
        self.0.longitude()
    }

    pub fn location(&self) -> &GeoPoint {
        &self.0
    }
}

impl Serialize for Position {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Position", 3)?;
        state.serialize_field("latitude", &self.latitude())?;
        state.serialize_field("longitude", &self.longitude())?;
        state.serialize_field("location", &self.0)?;
        state.end()
    }
}

/// Check that a coordinate pair is finite and within WGS84 bounds.
pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), ValidationError> {
    let valid = latitude.is_finite()
        && longitude.is_finite()
        && (-90.0..=90.0).contains(&latitude)
        && (-180.0..=180.0).contains(&longitude);
    if valid {
        Ok(())
    } else {
        Err(ValidationError::Coordinates {
            latitude,
            longitude,
        })
    }
}
