use axum::{extract::State, response::Html, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::error::ApiResult;
use crate::state::AppState;

/// Root and health check routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(welcome))
        .route("/health", get(health_check))
}

async fn welcome() -> Html<&'static str> {
    Html("<h1>Welcome to server</h1>")
}

/// Verifies store connectivity.
async fn health_check(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    state.store().ping().await?;

    Ok(Json(json!({
        "status": "ok",
        "store": "connected",
    })))
}
