//! Shared application state.
//!
//! Holds the single metrics registry for the process. Cloned into every
//! handler by axum; clones share the same `Arc`.

use std::sync::Arc;

use hola_core::error::Result;

use crate::obs::metrics::Registry;

#[derive(Clone)]
pub struct AppState {
    metrics: Arc<Registry>,
}

impl AppState {
    /// Build application state and register the request metrics.
    pub fn new() -> Result<Self> {
        let metrics = Registry::http_defaults()?;
        Ok(Self {
            metrics: Arc::new(metrics),
        })
    }

    pub fn metrics(&self) -> &Registry {
        &self.metrics
    }
}
