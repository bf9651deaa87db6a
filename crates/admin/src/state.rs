//! Application state shared across handlers.

use std::sync::Arc;

use crate::backend::{ApiError, BackendClient};
use crate::config::ConsoleConfig;
use crate::services::ConsoleCache;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ConsoleConfig,
    backend: BackendClient,
    cache: ConsoleCache,
}

impl AppState {
    /// Build the state from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the backend HTTP client cannot be built.
    pub fn new(config: ConsoleConfig) -> Result<Self, ApiError> {
        let backend = BackendClient::new(&config.api_url, config.api_timeout)?;
        Ok(Self::with_backend(config, backend))
    }

    /// Build the state around an existing backend client.
    #[must_use]
    pub fn with_backend(config: ConsoleConfig, backend: BackendClient) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                backend,
                cache: ConsoleCache::new(),
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ConsoleConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn backend(&self) -> &BackendClient {
        &self.inner.backend
    }

    #[must_use]
    pub fn cache(&self) -> &ConsoleCache {
        &self.inner.cache
    }
}
