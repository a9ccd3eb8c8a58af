//! Response caching.
//!
//! The client only depends on [`ResponseCache`]; [`MemoryCache`] is the
//! in-process implementation with a fixed time-to-live per entry. Expired
//! entries are evicted lazily when they are read. There is no capacity bound:
//! memory grows with the number of distinct URIs requested while the cache
//! is alive.

use async_trait::async_trait;
use dashmap::DashMap;
use std::{
    fmt::Debug,
    time::{Duration, Instant},
};

use crate::ResponseBody;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Key/value store the client consults before going to the network.
///
/// `get` returning `None` is the only miss signal; a stored body is a hit
/// even when it is empty.
#[async_trait]
pub trait ResponseCache: Send + Sync + Debug {
    async fn get(&self, key: &str) -> Option<ResponseBody>;

    async fn set(&self, key: &str, value: ResponseBody);
}

#[derive(Debug)]
struct CacheEntry {
    value: ResponseBody,
    stored_at: Instant,
}

/// In-memory TTL cache.
#[derive(Debug)]
pub struct MemoryCache {
    timeout: Duration,
    entries: DashMap<String, CacheEntry>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// A zero timeout expires every entry on its next read.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout, entries: DashMap::new() }
    }

    pub fn from_secs(secs: u64) -> Self {
        Self::with_timeout(Duration::from_secs(secs))
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Number of stored entries, expired ones included until they are read.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    fn lookup(&self, key: &str) -> Option<ResponseBody> {
        // remove_if holds the shard lock across the check and the eviction
        let expired = self
            .entries
            .remove_if(key, |_, entry| entry.stored_at.elapsed() >= self.timeout);
        if expired.is_some() {
            return None;
        }

        self.entries.get(key).map(|entry| entry.value.clone())
    }

    fn store(&self, key: &str, value: ResponseBody) {
        let entry = CacheEntry { value, stored_at: Instant::now() };
        self.entries.insert(key.to_string(), entry);
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResponseCache for MemoryCache {
    async fn get(&self, key: &str) -> Option<ResponseBody> {
        self.lookup(key)
    }

    async fn set(&self, key: &str, value: ResponseBody) {
        self.store(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(v: serde_json::Value) -> ResponseBody {
        ResponseBody::Json(v)
    }

    #[tokio::test]
    async fn set_then_get_returns_value() {
        let cache = MemoryCache::new();
        cache.set("key", body(json!("value"))).await;
        assert_eq!(cache.get("key").await, Some(body(json!("value"))));
    }

    #[tokio::test]
    async fn get_on_fresh_cache_is_absent() {
        let cache = MemoryCache::new();
        assert_eq!(cache.get("key").await, None);
    }

    #[tokio::test]
    async fn zero_timeout_expires_immediately() {
        let cache = MemoryCache::from_secs(0);
        cache.set("key", body(json!("value"))).await;
        assert_eq!(cache.get("key").await, None);
        assert!(cache.is_empty(), "expired entry should be evicted on read");
    }

    #[tokio::test]
    async fn entries_expire_after_timeout() {
        let cache = MemoryCache::with_timeout(Duration::from_millis(20));
        cache.set("key", body(json!(1))).await;
        assert!(cache.get("key").await.is_some());

        std::thread::sleep(Duration::from_millis(40));
        assert_eq!(cache.get("key").await, None);
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test]
    async fn set_overwrites_previous_entry() {
        let cache = MemoryCache::new();
        cache.set("key", body(json!(1))).await;
        cache.set("key", body(json!(2))).await;
        assert_eq!(cache.get("key").await, Some(body(json!(2))));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn empty_body_is_still_a_hit() {
        let cache = MemoryCache::new();
        cache.set("key", body(json!({}))).await;
        assert_eq!(cache.get("key").await, Some(body(json!({}))));
    }

    #[tokio::test]
    async fn unbounded_timeout_never_expires() {
        let cache = MemoryCache::from_secs(u64::MAX);
        cache.set("key", body(json!(1))).await;
        assert_eq!(cache.get("key").await, Some(body(json!(1))));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn default_timeout_is_one_minute() {
        assert_eq!(MemoryCache::default().timeout(), Duration::from_secs(60));
    }

    #[tokio::test]
    async fn clear_drops_everything() {
        let cache = MemoryCache::new();
        cache.set("a", body(json!(1))).await;
        cache.set("b", body(json!(2))).await;
        cache.clear();
        assert!(cache.is_empty());
    }
}
