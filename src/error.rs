//! Error types for the cache layer
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for cache operations.
///
/// Lookups never produce an error: a missing, expired or unreadable entry is
/// reported as a miss. Only writes, deletes and shutdown surface failures.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The remote store rejected or failed a SET/DEL
    #[error("Backend operation failed: {0}")]
    Backend(#[from] redis::RedisError),

    /// The remote store could not be reached during construction
    #[error("Backend unavailable ({locator}): {reason}")]
    Unavailable { locator: String, reason: String },

    /// The remote handle has already been released
    #[error("Remote store is closed")]
    Closed,

    /// Cache keys must be non-empty
    #[error("Cache key must not be empty")]
    EmptyKey,
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
