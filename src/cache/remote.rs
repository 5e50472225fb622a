//! Remote Store Module
//!
//! Adapter over the networked key/value backend shared by every instance.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use redis::aio::ConnectionManager;
use redis::{Client, RedisError};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::{CacheError, Result};

// == Remote Store Trait ==
/// Capability set the cache facade needs from a networked backend.
///
/// Lookups cannot fail: any error, including "not found", is a miss.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetches the value stored under `key`.
    async fn get(&self, key: &str) -> Option<Bytes>;

    /// Stores `value` under `key`, expiring after `ttl`.
    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<()>;

    /// Removes `key`. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Releases the connection.
    async fn close(&self) -> Result<()>;
}

// == Redis Store ==
/// [`RemoteStore`] backed by a Redis connection manager.
pub struct RedisStore {
    conn: RwLock<Option<ConnectionManager>>,
    addr: String,
}

impl RedisStore {
    // == Connect ==
    /// Opens a connection for `locator` and verifies it with PING.
    ///
    /// The whole handshake (connect + PING) is bounded by `timeout`. Any failure
    /// is reported as [`CacheError::Unavailable`].
    pub async fn connect(locator: &str, timeout: Duration) -> Result<Self> {
        let unavailable = |reason: String| CacheError::Unavailable {
            locator: locator.to_string(),
            reason,
        };

        let client = open_client(locator).map_err(|e| unavailable(e.to_string()))?;
        let addr = client.get_connection_info().addr.to_string();

        let handshake = async move {
            let mut conn = ConnectionManager::new(client).await?;
            let _pong: String = redis::cmd("PING").query_async(&mut conn).await?;
            Ok::<_, RedisError>(conn)
        };

        let conn = tokio::time::timeout(timeout, handshake)
            .await
            .map_err(|_| unavailable(format!("PING timed out after {:?}", timeout)))?
            .map_err(|e| unavailable(e.to_string()))?;

        Ok(Self {
            conn: RwLock::new(Some(conn)),
            addr,
        })
    }

    /// Address of the connected server, without credentials.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    async fn handle(&self) -> Option<ConnectionManager> {
        self.conn.read().await.clone()
    }
}

#[async_trait]
impl RemoteStore for RedisStore {
    async fn get(&self, key: &str) -> Option<Bytes> {
        let mut conn = self.handle().await?;

        let result: redis::RedisResult<Option<Vec<u8>>> =
            redis::cmd("GET").arg(key).query_async(&mut conn).await;

        match result {
            Ok(value) => value.map(Bytes::from),
            Err(e) => {
                if is_transient(&e) {
                    debug!(key, error = %e, "remote GET failed, treating as miss");
                } else {
                    warn!(key, error = %e, "remote GET rejected, treating as miss");
                }
                None
            }
        }
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<()> {
        let mut conn = self.handle().await.ok_or(CacheError::Closed)?;

        // PSETEX rejects a zero expiry
        let millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);

        let _: () = redis::cmd("PSETEX")
            .arg(key)
            .arg(millis)
            .arg(value.as_ref())
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.handle().await.ok_or(CacheError::Closed)?;

        let _removed: i64 = redis::cmd("DEL").arg(key).query_async(&mut conn).await?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        match self.conn.write().await.take() {
            Some(_) => Ok(()),
            None => Err(CacheError::Closed),
        }
    }
}

// == Locator Parsing ==
/// Builds a client from a full connection URL, or from a bare `host:port`.
fn open_client(locator: &str) -> std::result::Result<Client, RedisError> {
    Client::open(locator).or_else(|url_err| {
        debug!(locator, error = %url_err, "not a connection URL, trying as host:port");
        Client::open(format!("redis://{}", locator))
    })
}

/// Network-level failures that may clear up on their own.
fn is_transient(err: &RedisError) -> bool {
    err.is_io_error() || err.is_timeout() || err.is_connection_dropped() || err.is_connection_refusal()
}
