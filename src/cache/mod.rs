//! External cache collaborator.
//!
//! # Responsibilities
//! - Best-effort `get`/`put` with optional time-to-live
//! - Key naming for slug and message→topic entries
//!
//! # Design Decisions
//! - A miss or failure is never fatal: callers recompute
//! - The in-process implementation is shared across requests via `Arc`

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::observability::metrics;
use crate::slug::SlugKind;

/// Best-effort key/value cache.
pub trait Cache: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value`; `None` means no expiry.
    fn put(&self, key: &str, value: &str, ttl: Option<Duration>);
}

/// Key for a persisted slug.
pub fn slug_key(kind: SlugKind, id: u64) -> String {
    format!("slug_type-{kind}_id-{id}")
}

/// Key for a message → topic lookup.
pub fn msg_topic_key(msg_id: u64) -> String {
    format!("msg_topic-{msg_id}")
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_live(&self) -> bool {
        self.expires_at.map(|at| at > Instant::now()).unwrap_or(true)
    }
}

/// Entry count at which a write first sweeps out expired entries.
const SWEEP_THRESHOLD: usize = 1024;

/// Thread-safe in-memory cache.
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    inner: Arc<DashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included until read or swept.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Removes every expired entry.
    pub fn purge_expired(&self) {
        let before = self.inner.len();
        self.inner.retain(|_, entry| entry.is_live());
        tracing::debug!(removed = before.saturating_sub(self.inner.len()), "Purged expired cache entries");
    }

    /// Drops an entry, e.g. after an entity rename.
    pub fn invalidate(&self, key: &str) {
        self.inner.remove(key);
    }
}

impl Cache for MemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        let value = match self.inner.get(key) {
            Some(entry) if entry.is_live() => Some(entry.value.clone()),
            Some(_) => None,
            None => return None,
        };
        if value.is_none() {
            self.inner.remove(key);
        }
        value
    }

    fn put(&self, key: &str, value: &str, ttl: Option<Duration>) {
        if self.inner.len() >= SWEEP_THRESHOLD {
            self.purge_expired();
        }
        self.inner.insert(
            key.to_string(),
            CacheEntry {
                value: value.to_string(),
                expires_at: ttl.map(|ttl| Instant::now() + ttl),
            },
        );
        metrics::record_cache_size(self.inner.len());
    }
}

/// A cache that stores nothing. Stands in for an unavailable backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl Cache for NoCache {
    fn get(&self, _key: &str) -> Option<String> {
        None
    }

    fn put(&self, _key: &str, _value: &str, _ttl: Option<Duration>) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_operations() {
        let cache = MemoryCache::new();
        assert!(cache.get("k").is_none());

        cache.put("k", "v", None);
        assert_eq!(cache.get("k").as_deref(), Some("v"));

        cache.invalidate("k");
        assert!(cache.get("k").is_none());
    }

    #[test]
    fn test_expiry() {
        let cache = MemoryCache::new();
        cache.put("short", "v", Some(Duration::ZERO));
        assert!(cache.get("short").is_none());
        assert!(cache.is_empty());

        cache.put("long", "v", Some(Duration::from_secs(120)));
        assert_eq!(cache.get("long").as_deref(), Some("v"));
    }

    #[test]
    fn test_writes_sweep_expired_entries() {
        let cache = MemoryCache::new();
        for i in 0..SWEEP_THRESHOLD - 1 {
            cache.put(&format!("stale-{i}"), "v", Some(Duration::ZERO));
        }
        cache.put("kept", "v", None);
        assert_eq!(cache.len(), SWEEP_THRESHOLD);

        cache.put("fresh", "v", Some(Duration::from_secs(120)));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("kept").as_deref(), Some("v"));
        assert_eq!(cache.get("fresh").as_deref(), Some("v"));
    }

    #[test]
    fn test_key_format() {
        assert_eq!(slug_key(SlugKind::Topic, 42), "slug_type-topic_id-42");
        assert_eq!(msg_topic_key(77), "msg_topic-77");
    }

    #[test]
    fn test_no_cache_forgets() {
        let cache = NoCache;
        cache.put("k", "v", None);
        assert!(cache.get("k").is_none());
    }
}
