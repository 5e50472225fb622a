//! Cache Entry Module
//!
//! Defines the structure for memory-tier entries with a TTL deadline.

use std::time::Duration;

use bytes::Bytes;
use tokio::time::Instant;

/// Upper bound used when `now + ttl` would overflow the clock.
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

// == Cache Entry ==
/// A single memory-tier entry. Entries are replaced whole, never patched.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored payload
    pub payload: Bytes,
    /// Monotonic instant at which the entry stops being visible
    pub deadline: Instant,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new entry that expires `ttl` from now.
    pub fn new(payload: Bytes, ttl: Duration) -> Self {
        let now = Instant::now();
        let deadline = now
            .checked_add(ttl)
            .unwrap_or_else(|| now + FAR_FUTURE);

        Self { payload, deadline }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// Boundary condition: an entry is expired once `now >= deadline`, so a
    /// zero TTL produces an entry that is never visible.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Same as [`is_expired`](Self::is_expired) against a caller-supplied instant.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.deadline
    }

    // == Time To Live ==
    /// Returns the remaining lifetime, saturating at zero.
    pub fn ttl_remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}
