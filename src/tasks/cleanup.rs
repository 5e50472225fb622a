//! TTL Cleanup Task
//!
//! Background sweep of the memory tier. Expiry stays lazy from the caller's
//! point of view; the sweep only reclaims entries nobody reads again.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::Cache;

/// Spawns a background task that periodically purges expired cache entries.
///
/// Returns a JoinHandle so the task can be aborted during graceful shutdown.
/// In remote mode each sweep is a no-op.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(Cache::memory());
/// let cleanup_handle = spawn_cleanup_task(cache.clone(), Duration::from_secs(60));
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task(cache: Arc<Cache>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(?interval, "Starting TTL cleanup task");

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.purge_expired();

            if removed > 0 {
                info!("TTL cleanup: removed {} expired entries", removed);
            } else {
                debug!("TTL cleanup: no expired entries found");
            }
        }
    })
}
