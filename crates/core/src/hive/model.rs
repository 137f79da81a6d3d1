use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::Position;
use crate::input::{lenient_f64, lenient_i32, lenient_text, lenient_timestamp};
use crate::validate::{required, required_text, ValidationError};

/// A hive placement. Maps to the `hives` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Hive {
    pub id: Uuid,
    pub hive_id: String,
    pub date_placed: DateTime<Utc>,
    #[serde(flatten)]
    pub position: Position,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_colonies: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Hive {
    /// Materialize a validated hive with store-assigned identity and timestamps.
    pub fn from_new(new: NewHive, id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id,
            hive_id: new.hive_id,
            date_placed: new.date_placed,
            position: new.position,
            num_colonies: new.num_colonies,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Raw `POST /api/hives` payload.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateHiveRequest {
    #[serde(default, deserialize_with = "lenient_text")]
    pub hive_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub date_placed: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub longitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_i32")]
    pub num_colonies: Option<i32>,
}

/// A hive that passed validation and is ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewHive {
    pub hive_id: String,
    pub date_placed: DateTime<Utc>,
    pub position: Position,
    pub num_colonies: Option<i32>,
}

impl TryFrom<CreateHiveRequest> for NewHive {
    type Error = ValidationError;

    fn try_from(req: CreateHiveRequest) -> Result<Self, Self::Error> {
        let hive_id = required_text(req.hive_id, "hiveId")?;
        let date_placed = required(req.date_placed, "datePlaced")?;
        let latitude = required(req.latitude, "latitude")?;
        let longitude = required(req.longitude, "longitude")?;
        let position = Position::new(latitude, longitude)?;
        if matches!(req.num_colonies, Some(n) if n < 0) {
            return Err(ValidationError::Negative("numColonies"));
        }

        Ok(Self {
            hive_id,
            date_placed,
            position,
            num_colonies: req.num_colonies,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn request() -> CreateHiveRequest {
        serde_json::from_value(json!({
            "hiveId": "H-001",
            "datePlaced": "2024-03-01",
            "latitude": 10.0,
            "longitude": "20.0",
            "numColonies": 4,
        }))
        .unwrap()
    }

    #[test]
    fn valid_request_builds_hive() {
        let hive = NewHive::try_from(request()).unwrap();
        assert_eq!(hive.hive_id, "H-001");
        assert_eq!(
            hive.date_placed,
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(hive.position.location().longitude(), 20.0);
        assert_eq!(hive.num_colonies, Some(4));
    }

    #[test]
    fn missing_fields_are_reported_in_order() {
        let mut req = request();
        req.hive_id = None;
        assert_eq!(
            NewHive::try_from(req).unwrap_err(),
            ValidationError::Missing("hiveId")
        );

        let mut req = request();
        req.date_placed = None;
        assert_eq!(
            NewHive::try_from(req).unwrap_err(),
            ValidationError::Missing("datePlaced")
        );

        let mut req = request();
        req.longitude = None;
        assert_eq!(
            NewHive::try_from(req).unwrap_err(),
            ValidationError::Missing("longitude")
        );
    }

    #[test]
    fn hive_id_is_stored_verbatim() {
        let mut req = request();
        req.hive_id = Some(" H-001 ".into());
        assert_eq!(NewHive::try_from(req).unwrap().hive_id, " H-001 ");

        let mut req = request();
        req.hive_id = Some("   ".into());
        assert_eq!(
            NewHive::try_from(req).unwrap_err(),
            ValidationError::Empty("hiveId")
        );
    }

    #[test]
    fn numeric_hive_id_becomes_text() {
        let req: CreateHiveRequest = serde_json::from_value(json!({
            "hiveId": 42,
            "datePlaced": "2024-03-01",
            "latitude": 10.0,
            "longitude": 20.0,
        }))
        .unwrap();
        assert_eq!(NewHive::try_from(req).unwrap().hive_id, "42");
    }

    #[test]
    fn colonies_are_optional_but_not_negative() {
        let mut req = request();
        req.num_colonies = None;
        assert_eq!(NewHive::try_from(req).unwrap().num_colonies, None);

        let mut req = request();
        req.num_colonies = Some(-1);
        assert_eq!(
            NewHive::try_from(req).unwrap_err(),
            ValidationError::Negative("numColonies")
        );
    }

    #[test]
    fn serialized_hive_mirrors_location() {
        let now = Utc.with_ymd_and_hms(2024, 3, 2, 8, 0, 0).unwrap();
        let hive = Hive::from_new(NewHive::try_from(request()).unwrap(), Uuid::nil(), now);
        let value = serde_json::to_value(&hive).unwrap();
        assert_eq!(value["hiveId"], "H-001");
        assert_eq!(value["latitude"], 10.0);
        assert_eq!(value["location"]["coordinates"], json!([20.0, 10.0]));
        assert_eq!(value["createdAt"], value["updatedAt"]);
    }
}
