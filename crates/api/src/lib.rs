pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
pub mod state;

use axum::Router;

use crate::state::AppState;

/// The router with every middleware layer applied.
pub fn build_app(state: AppState) -> Router {
    routes::build_router(state)
        .layer(middleware::body_limit::body_limit_layer())
        .layer(middleware::request_tracing::trace_layer())
        .layer(middleware::cors::cors_layer())
}
