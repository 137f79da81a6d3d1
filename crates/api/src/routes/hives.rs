use apiary_core::hive::{CreateHiveRequest, ListHivesParams, NewHive};
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde_json::{json, Value};

use crate::error::ApiResult;
use crate::extract::{ApiBody, ApiQuery};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/hives", post(create_hive).get(list_hives))
}

async fn create_hive(
    State(state): State<AppState>,
    ApiBody(req): ApiBody<CreateHiveRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let hive = state.store().insert_hive(NewHive::try_from(req)?).await?;
    tracing::info!(hive_id = %hive.hive_id, id = %hive.id, "Hive registered");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Hive added successfully", "hive": hive })),
    ))
}

/// Hives placed within the optional date bounds, newest first, one page at a time.
async fn list_hives(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListHivesParams>,
) -> ApiResult<Json<Value>> {
    let (filter, pagination) = params.parse()?;
    let page = state.store().list_hives(&filter, pagination).await?;

    Ok(Json(json!({
        "total": page.total,
        "page": pagination.page,
        "limit": pagination.limit,
        "data": page.hives,
    })))
}
