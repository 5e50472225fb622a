//! Response DTOs
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::{BackendMode, CacheStats};

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Active cache backend, "redis" or "memory"
    pub cache: String,
    /// Number of cache hits since startup
    pub hits: u64,
    /// Number of cache misses since startup
    pub misses: u64,
    /// Resident memory-tier entries
    pub entries: usize,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy(mode: BackendMode, stats: &CacheStats) -> Self {
        Self {
            status: "healthy".to_string(),
            cache: mode.as_str().to_string(),
            hits: stats.hits,
            misses: stats.misses,
            entries: stats.total_entries,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
