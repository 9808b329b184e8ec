//! Rendered-page cache.
//!
//! Entries are whole response bodies stored under a caller-chosen key and
//! served unchanged until the TTL runs out or the cache is cleared. Nothing
//! invalidates an entry when the underlying data changes. The entry count
//! is capped; past the cap the least recently used entry goes first.

use std::num::NonZeroUsize;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use bytes::Bytes;
use lru::LruCache;

/// Prefix of the home page cache key. The query string is never part of
/// the key, so every `?page=` of the home listing shares one entry.
pub const INDEX_PAGE_KEY: &str = "index_page";

struct CachedPage {
    body: Bytes,
    stored_at: Instant,
}

pub struct PageCache {
    ttl: Duration,
    entries: RwLock<LruCache<String, CachedPage>>,
}

impl PageCache {
    pub fn new(ttl: Duration, capacity: NonZeroUsize) -> Self {
        Self {
            ttl,
            entries: RwLock::new(LruCache::new(capacity)),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, key: &str) -> Option<Bytes> {
        self.get_at(key, Instant::now())
    }

    pub fn get_at(&self, key: &str, now: Instant) -> Option<Bytes> {
        // A hit bumps recency, so even reads need the write half.
        let mut entries = self.write("get");
        let fresh = now.saturating_duration_since(entries.peek(key)?.stored_at) < self.ttl;
        if fresh {
            entries.get(key).map(|entry| entry.body.clone())
        } else {
            entries.pop(key);
            None
        }
    }

    pub fn insert(&self, key: impl Into<String>, body: Bytes) {
        self.insert_at(key, body, Instant::now());
    }

    pub fn insert_at(&self, key: impl Into<String>, body: Bytes, now: Instant) {
        let mut entries = self.write("insert");
        // Drop anything stale while we hold the lock anyway.
        let stale: Vec<String> = entries
            .iter()
            .filter(|(_, e)| now.saturating_duration_since(e.stored_at) >= self.ttl)
            .map(|(k, _)| k.clone())
            .collect();
        for key in &stale {
            entries.pop(key);
        }

        let key = key.into();
        let page = CachedPage {
            body,
            stored_at: now,
        };
        // `push` also hands back the old value when the key was present.
        if let Some((evicted, _)) = entries.push(key.clone(), page) {
            if evicted != key {
                tracing::debug!(key = %evicted, "Page cache full, evicted entry");
            }
        }
    }

    /// Forget every entry. Returns how many were dropped.
    pub fn clear(&self) -> usize {
        let mut entries = self.write("clear");
        let dropped = entries.len();
        entries.clear();
        dropped
    }

    pub fn len(&self) -> usize {
        self.read("len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self, op: &'static str) -> RwLockReadGuard<'_, LruCache<String, CachedPage>> {
        self.entries.read().unwrap_or_else(|poisoned| {
            tracing::warn!(op, "Recovered from poisoned page cache lock");
            poisoned.into_inner()
        })
    }

    fn write(&self, op: &'static str) -> RwLockWriteGuard<'_, LruCache<String, CachedPage>> {
        self.entries.write().unwrap_or_else(|poisoned| {
            tracing::warn!(op, "Recovered from poisoned page cache lock");
            poisoned.into_inner()
        })
    }
}

/// Home page key for a viewer. Rendered pages carry the viewer's
/// navigation bar, so each viewer gets an entry of their own.
pub fn index_key(viewer_id: Option<i64>) -> String {
    match viewer_id {
        Some(id) => format!("{INDEX_PAGE_KEY}:user:{id}"),
        None => format!("{INDEX_PAGE_KEY}:anon"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capacity(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn hit_within_ttl_returns_same_bytes() {
        let cache = PageCache::new(Duration::from_secs(20), capacity(16));
        let t0 = Instant::now();
        cache.insert_at("k", Bytes::from_static(b"<html>v1</html>"), t0);

        let hit = cache.get_at("k", t0 + Duration::from_secs(19)).unwrap();
        assert_eq!(&hit[..], b"<html>v1</html>");
    }

    #[test]
    fn entry_expires_after_ttl() {
        let cache = PageCache::new(Duration::from_secs(20), capacity(16));
        let t0 = Instant::now();
        cache.insert_at("k", Bytes::from_static(b"v1"), t0);
        assert!(cache.get_at("k", t0 + Duration::from_secs(20)).is_none());
    }

    #[test]
    fn clear_forces_a_miss() {
        let cache = PageCache::new(Duration::from_secs(20), capacity(16));
        cache.insert("a", Bytes::from_static(b"1"));
        cache.insert("b", Bytes::from_static(b"2"));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.clear(), 2);
        assert!(cache.get("a").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn stale_entries_are_pruned_on_insert() {
        let cache = PageCache::new(Duration::from_secs(5), capacity(16));
        let t0 = Instant::now();
        cache.insert_at("old", Bytes::from_static(b"1"), t0);
        cache.insert_at("new", Bytes::from_static(b"2"), t0 + Duration::from_secs(10));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn expired_entry_is_dropped_on_read() {
        let cache = PageCache::new(Duration::from_secs(5), capacity(16));
        let t0 = Instant::now();
        cache.insert_at("k", Bytes::from_static(b"1"), t0);
        assert!(cache.get_at("k", t0 + Duration::from_secs(6)).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn least_recently_used_entry_is_evicted_at_capacity() {
        let cache = PageCache::new(Duration::from_secs(20), capacity(2));
        let t0 = Instant::now();
        cache.insert_at("a", Bytes::from_static(b"1"), t0);
        cache.insert_at("b", Bytes::from_static(b"2"), t0);
        // Touch "a" so "b" becomes the oldest.
        assert!(cache.get_at("a", t0).is_some());
        cache.insert_at("c", Bytes::from_static(b"3"), t0);

        assert_eq!(cache.len(), 2);
        assert!(cache.get_at("a", t0).is_some());
        assert!(cache.get_at("b", t0).is_none());
        assert!(cache.get_at("c", t0).is_some());
    }

    #[test]
    fn index_key_ignores_everything_but_the_viewer() {
        assert_eq!(index_key(None), "index_page:anon");
        assert_eq!(index_key(Some(7)), "index_page:user:7");
    }
}
