//! API Handlers
//!
//! Application state and the service's own HTTP handlers.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{extract::State, Json};

use crate::cache::Cache;
use crate::config::Config;
use crate::models::HealthResponse;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Shared two-tier cache
    pub cache: Arc<Cache>,
    /// Root directory for static files
    pub static_root: PathBuf,
    /// CORS origin allowlist
    pub allowed_origins: Vec<String>,
}

impl AppState {
    /// Creates a new AppState around an existing cache.
    pub fn new(cache: Cache, static_root: impl Into<PathBuf>) -> Self {
        Self {
            cache: Arc::new(cache),
            static_root: static_root.into(),
            allowed_origins: Config::default().allowed_origins,
        }
    }

    /// Replaces the CORS allowlist.
    pub fn with_allowed_origins<I, O>(mut self, origins: I) -> Self
    where
        I: IntoIterator<Item = O>,
        O: Into<String>,
    {
        self.allowed_origins = origins.into_iter().map(Into::into).collect();
        self
    }

    /// Creates a new AppState from configuration.
    ///
    /// Connects the cache, which may take up to the PING timeout when a
    /// remote locator is configured.
    pub async fn from_config(config: &Config) -> Self {
        let cache = Cache::connect(&config.redis_url).await;
        Self::new(cache, config.static_root.clone())
            .with_allowed_origins(config.allowed_origins.iter().cloned())
    }
}

/// Handler for GET /health
///
/// Reports the selected cache backend and lookup counters.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let stats = state.cache.stats();
    Json(HealthResponse::healthy(state.cache.mode(), &stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[tokio::test]
    async fn test_health_handler_memory_mode() {
        let state = AppState::new(Cache::memory(), "./web/out");
        state
            .cache
            .set_feed("1", Bytes::from_static(b"{}"))
            .await
            .unwrap();
        state.cache.get_feed("1").await;
        state.cache.get_feed("2").await;

        let response = health_handler(State(state)).await;

        assert_eq!(response.status, "healthy");
        assert_eq!(response.cache, "memory");
        assert_eq!(response.hits, 1);
        assert_eq!(response.misses, 1);
        assert_eq!(response.entries, 1);
    }

    #[tokio::test]
    async fn test_from_config_defaults_to_memory() {
        let config = Config {
            allowed_origins: vec!["https://only.example".to_string()],
            ..Config::default()
        };

        let state = AppState::from_config(&config).await;

        assert!(!state.cache.is_remote_enabled());
        assert_eq!(state.allowed_origins, vec!["https://only.example"]);
    }
}
