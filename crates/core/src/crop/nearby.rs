use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::geo::{GeoPoint, DEFAULT_NEARBY_RADIUS_KM};
use crate::input::{parse_number, parse_timestamp};
use crate::validate::QueryError;

/// Raw `GET /api/crops/nearby` query string.
#[derive(Debug, Default, Deserialize)]
pub struct NearbyCropsParams {
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    /// Kilometres.
    pub radius: Option<String>,
    pub date: Option<String>,
}

/// A validated proximity + bloom-date lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearbyQuery {
    pub point: GeoPoint,
    pub radius_m: f64,
    pub date: DateTime<Utc>,
}

impl NearbyCropsParams {
    /// Validate the parameters. `now` is used when no date is given.
    pub fn parse(&self, now: DateTime<Utc>) -> Result<NearbyQuery, QueryError> {
        let latitude = parse_number(self.latitude.as_deref());
        let longitude = parse_number(self.longitude.as_deref());
        let point = match (latitude, longitude) {
            (Some(Ok(lat)), Some(Ok(lng))) => {
                GeoPoint::from_lat_lng(lat, lng).map_err(|_| QueryError::Coordinates)?
            }
            _ => return Err(QueryError::Coordinates),
        };

        let radius_km = match parse_number(self.radius.as_deref()) {
            None => DEFAULT_NEARBY_RADIUS_KM,
            Some(Ok(km)) if km.is_finite() && km >= 0.0 => km,
            Some(_) => return Err(QueryError::Radius),
        };

        let date = match self.date.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            None => now,
            Some(raw) => parse_timestamp(raw).ok_or(QueryError::Date("date"))?,
        };

        Ok(NearbyQuery {
            point,
            radius_m: radius_km * 1000.0,
            date,
        })
    }
}
