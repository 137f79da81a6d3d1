use tower_http::cors::{Any, CorsLayer};

/// Permissive CORS: the API has no authentication and serves any origin.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}
