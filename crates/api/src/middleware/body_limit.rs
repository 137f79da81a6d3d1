use tower_http::limit::RequestBodyLimitLayer;

/// Records are small; anything past this is rejected with 413.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

pub fn body_limit_layer() -> RequestBodyLimitLayer {
    RequestBodyLimitLayer::new(MAX_BODY_BYTES)
}
