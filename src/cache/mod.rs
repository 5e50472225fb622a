//! Cache Module
//!
//! Two-tier key/value cache: a shared remote store when one is reachable at
//! startup, otherwise a process-local memory tier with lazy TTL expiry.

mod entry;
mod facade;
mod memory;
mod remote;
mod stats;


// Re-export public types
pub use entry::CacheEntry;
pub use facade::{BackendMode, Cache, CachedImage, FEED_TTL, IMAGE_TTL, PING_TIMEOUT};
pub use memory::MemoryStore;
pub use remote::{RedisStore, RemoteStore};
pub use stats::CacheStats;

pub(crate) use stats::StatsCounter;
