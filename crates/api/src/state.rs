use std::sync::Arc;

use apiary_core::store::ApiaryStore;

/// Shared application state, passed to all handlers via Axum's `State` extractor.
/// Wrapped in `Arc` so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn ApiaryStore>,
}

impl AppState {
    /// The store is created once at startup and shared by every request.
    pub fn new(store: Arc<dyn ApiaryStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &dyn ApiaryStore {
        self.store.as_ref()
    }
}
