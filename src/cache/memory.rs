//! Memory Store Module
//!
//! Process-local key/value tier with lazy TTL expiry.
//!
//! Entries live in a sharded concurrent map, so readers and writers of
//! different keys never contend on a global lock. An expired entry is removed
//! by the first read that observes it; [`MemoryStore::purge_expired`] exists
//! for the optional background sweeper.

use std::time::Duration;

use bytes::Bytes;
use dashmap::DashMap;
use tokio::time::Instant;

use crate::cache::CacheEntry;

// == Memory Store ==
/// Concurrent mapping from key to (payload, deadline).
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, CacheEntry>,
}

impl MemoryStore {
    // == Constructor ==
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // == Load ==
    /// Returns the payload for `key` if present and not yet expired.
    ///
    /// An expired entry is deleted as a side effect. The delete only fires if
    /// the entry is still expired when the shard lock is taken, so a racing
    /// `store` of a fresh value is never lost.
    pub fn load(&self, key: &str) -> Option<Bytes> {
        let now = Instant::now();

        match self.entries.get(key) {
            Some(entry) if !entry.is_expired_at(now) => return Some(entry.payload.clone()),
            Some(_) => {}
            None => return None,
        }

        self.entries
            .remove_if(key, |_, entry| entry.is_expired_at(now));
        None
    }

    // == Store ==
    /// Replaces any existing entry with `(payload, now + ttl)`.
    pub fn store(&self, key: impl Into<String>, payload: Bytes, ttl: Duration) {
        self.entries.insert(key.into(), CacheEntry::new(payload, ttl));
    }

    // == Delete ==
    /// Removes the entry unconditionally. Returns whether anything was removed.
    pub fn delete(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    // == Purge Expired ==
    /// Removes all expired entries and returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut removed = 0;

        self.entries.retain(|_, entry| {
            let keep = !entry.is_expired_at(now);
            if !keep {
                removed += 1;
            }
            keep
        });

        removed
    }

    // == Length ==
    /// Number of resident entries, including expired ones not yet reclaimed.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_store_new() {
        let store = MemoryStore::new();
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_and_load() {
        let store = MemoryStore::new();

        store.store("key1", Bytes::from_static(b"value1"), Duration::from_secs(60));

        assert_eq!(store.load("key1"), Some(Bytes::from_static(b"value1")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_load_nonexistent() {
        let store = MemoryStore::new();
        assert_eq!(store.load("nonexistent"), None);
    }

    #[test]
    fn test_delete() {
        let store = MemoryStore::new();

        store.store("key1", Bytes::from_static(b"value1"), Duration::from_secs(60));
        assert!(store.delete("key1"));

        assert!(store.is_empty());
        assert_eq!(store.load("key1"), None);
        assert!(!store.delete("key1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_load_removes_entry() {
        let store = MemoryStore::new();

        store.store("key1", Bytes::from_static(b"value1"), Duration::from_secs(1));
        assert!(store.load("key1").is_some());

        tokio::time::advance(Duration::from_secs(1)).await;

        // Expired entries stay resident until observed
        assert_eq!(store.len(), 1);
        assert_eq!(store.load("key1"), None);
        assert_eq!(store.len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overwrite_resets_deadline() {
        let store = MemoryStore::new();

        store.store("key1", Bytes::from_static(b"v1"), Duration::from_secs(5));
        tokio::time::advance(Duration::from_secs(3)).await;
        store.store("key1", Bytes::from_static(b"v2"), Duration::from_secs(5));

        tokio::time::advance(Duration::from_secs(4)).await;
        assert_eq!(store.load("key1"), Some(Bytes::from_static(b"v2")));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(store.load("key1"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let store = MemoryStore::new();

        store.store("short", Bytes::from_static(b"a"), Duration::from_secs(1));
        store.store("long", Bytes::from_static(b"b"), Duration::from_secs(10));

        tokio::time::advance(Duration::from_secs(2)).await;

        assert_eq!(store.purge_expired(), 1);
        assert_eq!(store.len(), 1);
        assert!(store.load("long").is_some());
    }

    #[test]
    fn test_zero_ttl_is_never_visible() {
        let store = MemoryStore::new();
        store.store("key", Bytes::from_static(b"v"), Duration::ZERO);
        assert_eq!(store.load("key"), None);
    }

    #[test]
    fn test_concurrent_writers_and_readers() {
        let store = Arc::new(MemoryStore::new());

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..500 {
                        let key = format!("key-{}", i % 50);
                        store.store(
                            key.clone(),
                            Bytes::from(format!("{}-{}", t, i)),
                            Duration::from_secs(60),
                        );
                        let _ = store.load(&key);
                        if i % 7 == 0 {
                            store.delete(&key);
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert!(store.len() <= 50);
    }
}
