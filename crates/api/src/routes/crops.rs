use apiary_core::crop::{CreateCropRequest, NearbyCropsParams, NewCrop};
use apiary_core::store::CropInsert;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};

use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiBody, ApiQuery};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/crops", post(create_crop))
        .route("/api/crops/nearby", get(nearby_crops))
}

async fn create_crop(
    State(state): State<AppState>,
    ApiBody(req): ApiBody<CreateCropRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let crop = NewCrop::try_from(req)?;

    match state.store().insert_crop(crop).await? {
        CropInsert::Created(crop) => {
            tracing::info!(name = %crop.name, id = %crop.id, "Crop registered");
            Ok((
                StatusCode::CREATED,
                Json(json!({ "message": "Crop entry added successfully", "crop": crop })),
            ))
        }
        CropInsert::Overlapping => Err(ApiError::Conflict(
            "Overlapping crop exists in the same area".to_string(),
        )),
    }
}

/// Crops in bloom on the requested date (default: now) within `radius` km.
async fn nearby_crops(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<NearbyCropsParams>,
) -> ApiResult<Json<Value>> {
    let query = params.parse(Utc::now())?;
    let crops = state.store().find_flowering_crops_near(&query).await?;

    if crops.is_empty() {
        return Ok(Json(json!({
            "message": "No flowering crops found nearby.",
            "crops": [],
        })));
    }

    Ok(Json(json!({ "crops": crops })))
}
