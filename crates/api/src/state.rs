use std::sync::Arc;

use pagewright_core::ContentEngine;

use crate::config::AppConfig;

/// Shared application state, passed to all handlers via Axum's `State`
/// extractor. Wrapped in `Arc` so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    engine: ContentEngine,
    config: AppConfig,
}

impl AppState {
    pub fn new(engine: ContentEngine, config: AppConfig) -> Self {
        Self {
            inner: Arc::new(InnerState { engine, config }),
        }
    }

    pub fn engine(&self) -> &ContentEngine {
        &self.inner.engine
    }

    #[allow(dead_code)]
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }
}
