use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::window::FloweringWindow;
use crate::geo::Position;
use crate::input::{lenient_f64, lenient_text, lenient_timestamp};
use crate::validate::{required, required_text, ValidationError};

pub const MIN_HIVE_DENSITY: f64 = 1.0;

/// A crop flowering record. Maps to the `crops` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Crop {
    pub id: Uuid,
    pub name: String,
    #[serde(flatten)]
    pub window: FloweringWindow,
    #[serde(flatten)]
    pub position: Position,
    pub recommended_hive_density: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Crop {
    pub fn from_new(new: NewCrop, id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: new.name,
            window: new.window,
            position: new.position,
            recommended_hive_density: new.recommended_hive_density,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Raw `POST /api/crops` payload.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCropRequest {
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub flowering_start: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub flowering_end: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub longitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub recommended_hive_density: Option<f64>,
}

/// A crop that passed validation. Whether it may be written still depends on
/// the overlap check performed by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCrop {
    pub name: String,
    pub window: FloweringWindow,
    pub position: Position,
    pub recommended_hive_density: f64,
}

impl TryFrom<CreateCropRequest> for NewCrop {
    type Error = ValidationError;

    fn try_from(req: CreateCropRequest) -> Result<Self, Self::Error> {
        let name = required_text(req.name, "name")?;
        let start = required(req.flowering_start, "floweringStart")?;
        let end = required(req.flowering_end, "floweringEnd")?;
        let latitude = required(req.latitude, "latitude")?;
        let longitude = required(req.longitude, "longitude")?;
        let density = required(req.recommended_hive_density, "recommendedHiveDensity")?;

        let window = FloweringWindow::new(start, end)?;
        let position = Position::new(latitude, longitude)?;
        if density.is_nan() || density < MIN_HIVE_DENSITY {
            return Err(ValidationError::BelowMinimum {
                field: "recommendedHiveDensity",
                min: MIN_HIVE_DENSITY,
                value: density,
            });
        }

        Ok(Self {
            name,
            window,
            position,
            recommended_hive_density: density,
        })
    }
}
