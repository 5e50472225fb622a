//! Cache Facade Module
//!
//! Uniform get/set/delete surface over either the remote store or the memory
//! tier, plus the feed and image helpers used by HTTP handlers.
//!
//! The backend is chosen once, at construction. An empty locator or an
//! unreachable server yields memory mode; there is no later transition.

use std::time::Duration;

use bytes::Bytes;
use tracing::{info, warn};

use crate::cache::{CacheStats, MemoryStore, RedisStore, RemoteStore, StatsCounter};
use crate::error::{CacheError, Result};

// == Public Constants ==
/// Lifetime of a cached feed entry.
pub const FEED_TTL: Duration = Duration::from_secs(10 * 60);

/// Lifetime of both halves of a cached image pair.
pub const IMAGE_TTL: Duration = Duration::from_secs(60 * 60);

/// Upper bound on the construction-time connectivity check.
pub const PING_TIMEOUT: Duration = Duration::from_secs(5);

const FEED_PREFIX: &str = "dynamic:";
const IMAGE_PREFIX: &str = "img:";
const IMAGE_TYPE_PREFIX: &str = "img_ct:";

// == Backend Mode ==
/// Which backend a [`Cache`] was built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendMode {
    Remote,
    Memory,
}

impl BackendMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendMode::Remote => "redis",
            BackendMode::Memory => "memory",
        }
    }
}

/// A cached remote image: payload plus the content-type it was served with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedImage {
    pub data: Bytes,
    pub content_type: String,
}

enum Backend {
    Memory(MemoryStore),
    Remote(Box<dyn RemoteStore>),
}

// == Cache ==
/// Two-tier cache facade shared by every request task.
pub struct Cache {
    backend: Backend,
    stats: StatsCounter,
}

impl Cache {
    // == Constructors ==
    /// Creates a memory-only cache.
    pub fn memory() -> Self {
        Self {
            backend: Backend::Memory(MemoryStore::new()),
            stats: StatsCounter::default(),
        }
    }

    /// Creates a cache over an already-connected remote store.
    pub fn with_remote(store: impl RemoteStore + 'static) -> Self {
        Self {
            backend: Backend::Remote(Box::new(store)),
            stats: StatsCounter::default(),
        }
    }

    /// Selects a backend for `locator`.
    ///
    /// An empty locator gives memory mode. Otherwise the locator is parsed as a
    /// connection URL (or a bare `host:port`) and checked with PING within
    /// [`PING_TIMEOUT`]; on failure a warning is logged and memory mode is used.
    pub async fn connect(locator: &str) -> Self {
        Self::connect_with_timeout(locator, PING_TIMEOUT).await
    }

    /// [`connect`](Self::connect) with an explicit PING bound.
    pub async fn connect_with_timeout(locator: &str, timeout: Duration) -> Self {
        if locator.is_empty() {
            info!("No remote locator configured, using memory cache");
            return Self::memory();
        }

        match RedisStore::connect(locator, timeout).await {
            Ok(store) => {
                info!(addr = store.addr(), "Redis connected");
                Self::with_remote(store)
            }
            Err(e) => {
                warn!(locator, error = %e, "Redis connection failed, using memory cache");
                Self::memory()
            }
        }
    }

    // == Mode ==
    pub fn mode(&self) -> BackendMode {
        match self.backend {
            Backend::Memory(_) => BackendMode::Memory,
            Backend::Remote(_) => BackendMode::Remote,
        }
    }

    /// Returns whether the remote store is in use.
    pub fn is_remote_enabled(&self) -> bool {
        self.mode() == BackendMode::Remote
    }

    // == Get ==
    /// Looks up `key`. Backend errors and expired entries are misses.
    pub async fn get(&self, key: &str) -> Option<Bytes> {
        if key.is_empty() {
            return None;
        }

        let value = self.lookup(key).await;
        self.stats.record(value.is_some());
        value
    }

    async fn lookup(&self, key: &str) -> Option<Bytes> {
        match &self.backend {
            Backend::Memory(store) => store.load(key),
            Backend::Remote(store) => store.get(key).await,
        }
    }

    // == Set ==
    /// Stores `value` under `key` for `ttl`. Remote failures are surfaced.
    pub async fn set(&self, key: &str, value: impl Into<Bytes>, ttl: Duration) -> Result<()> {
        if key.is_empty() {
            return Err(CacheError::EmptyKey);
        }

        match &self.backend {
            Backend::Memory(store) => {
                store.store(key, value.into(), ttl);
                Ok(())
            }
            Backend::Remote(store) => store.set(key, value.into(), ttl).await,
        }
    }

    // == Delete ==
    /// Removes `key`. Remote failures are surfaced.
    pub async fn delete(&self, key: &str) -> Result<()> {
        match &self.backend {
            Backend::Memory(store) => {
                store.delete(key);
                Ok(())
            }
            Backend::Remote(store) => store.delete(key).await,
        }
    }

    // == Close ==
    /// Releases the remote handle. No-op in memory mode.
    pub async fn close(&self) -> Result<()> {
        match &self.backend {
            Backend::Memory(_) => Ok(()),
            Backend::Remote(store) => store.close().await,
        }
    }

    // == Maintenance ==
    /// Drops expired memory-tier entries. Remote entries expire server-side.
    pub fn purge_expired(&self) -> usize {
        match &self.backend {
            Backend::Memory(store) => store.purge_expired(),
            Backend::Remote(_) => 0,
        }
    }

    pub fn stats(&self) -> CacheStats {
        let resident = match &self.backend {
            Backend::Memory(store) => store.len(),
            Backend::Remote(_) => 0,
        };
        self.stats.snapshot(resident)
    }

    // == Feed Helpers ==
    /// Cached feed blob for an upstream user id.
    pub async fn get_feed(&self, uid: &str) -> Option<Bytes> {
        self.get(&feed_key(uid)).await
    }

    /// Caches a feed blob for [`FEED_TTL`].
    pub async fn set_feed(&self, uid: &str, data: impl Into<Bytes>) -> Result<()> {
        self.set(&feed_key(uid), data, FEED_TTL).await
    }

    // == Image Helpers ==
    /// Cached image for `url`. A pair with either half missing is a miss.
    ///
    /// Counts as a single lookup in [`stats`](Self::stats).
    pub async fn get_image(&self, url: &str) -> Option<CachedImage> {
        let image = match self.lookup(&image_key(url)).await {
            Some(data) => self
                .lookup(&image_type_key(url))
                .await
                .and_then(|content_type| String::from_utf8(content_type.to_vec()).ok())
                .map(|content_type| CachedImage { data, content_type }),
            None => None,
        };

        self.stats.record(image.is_some());
        image
    }

    /// Caches an image pair for [`IMAGE_TTL`].
    ///
    /// The payload is written first; if that fails the content-type is not
    /// written and the error is returned.
    pub async fn set_image(&self, url: &str, data: impl Into<Bytes>, content_type: &str) -> Result<()> {
        self.set(&image_key(url), data, IMAGE_TTL).await?;
        self.set(
            &image_type_key(url),
            Bytes::copy_from_slice(content_type.as_bytes()),
            IMAGE_TTL,
        )
        .await
    }
}

// == Key Namespaces ==
fn feed_key(uid: &str) -> String {
    format!("{}{}", FEED_PREFIX, uid)
}

fn image_key(url: &str) -> String {
    format!("{}{}", IMAGE_PREFIX, url)
}

fn image_type_key(url: &str) -> String {
    format!("{}{}", IMAGE_TYPE_PREFIX, url)
}
