//! Forum data collaborators: message ownership and entity titles, plus the
//! cached message → topic lookup.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::cache::{msg_topic_key, Cache};
use crate::slug::SlugKind;

/// Default lifetime of a cached message → topic entry.
pub const MSG_TOPIC_TTL: Duration = Duration::from_secs(120);

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("message store unavailable: {0}")]
    Unavailable(String),

    #[error("message store query failed: {0}")]
    Query(String),
}

/// Read access to message ownership (`SELECT id_topic FROM messages WHERE id_msg = ?`).
pub trait MessageStore: Send + Sync {
    fn topic_for_message(&self, msg_id: u64) -> Result<Option<u64>, StoreError>;
}

impl MessageStore for HashMap<u64, u64> {
    fn topic_for_message(&self, msg_id: u64) -> Result<Option<u64>, StoreError> {
        Ok(self.get(&msg_id).copied())
    }
}

/// Read access to entity titles, the source text for slugs.
pub trait TitleStore: Send + Sync {
    fn title(&self, kind: SlugKind, id: u64) -> Option<String>;
}

impl TitleStore for HashMap<(SlugKind, u64), String> {
    fn title(&self, kind: SlugKind, id: u64) -> Option<String> {
        self.get(&(kind, id)).cloned()
    }
}

/// Resolves a message id to its topic through the cache, then the store.
#[derive(Clone)]
pub struct TopicLocator {
    cache: Arc<dyn Cache>,
    store: Arc<dyn MessageStore>,
    ttl: Duration,
}

impl TopicLocator {
    pub fn new(cache: Arc<dyn Cache>, store: Arc<dyn MessageStore>, ttl: Duration) -> Self {
        Self { cache, store, ttl }
    }

    /// Owning topic of `msg_id`. Store failures are logged and read as a miss.
    pub fn locate(&self, msg_id: u64) -> Option<u64> {
        let key = msg_topic_key(msg_id);
        if let Some(topic) = self.cache.get(&key).and_then(|v| v.parse::<u64>().ok()) {
            return (topic > 0).then_some(topic);
        }

        match self.store.topic_for_message(msg_id) {
            Ok(Some(topic)) if topic > 0 => {
                self.cache.put(&key, &topic.to_string(), Some(self.ttl));
                Some(topic)
            }
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(msg_id, error = %e, "Message lookup failed");
                None
            }
        }
    }
}

impl std::fmt::Debug for TopicLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopicLocator").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{MemoryCache, NoCache};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingStore {
        calls: AtomicUsize,
    }

    impl MessageStore for CountingStore {
        fn topic_for_message(&self, msg_id: u64) -> Result<Option<u64>, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok((msg_id == 77).then_some(9))
        }
    }

    struct BrokenStore;

    impl MessageStore for BrokenStore {
        fn topic_for_message(&self, _msg_id: u64) -> Result<Option<u64>, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
    }

    #[test]
    fn test_lookup_is_cached() {
        let cache = Arc::new(MemoryCache::new());
        let store = Arc::new(CountingStore::default());
        let locator = TopicLocator::new(cache.clone(), store.clone(), MSG_TOPIC_TTL);

        assert_eq!(locator.locate(77), Some(9));
        assert_eq!(locator.locate(77), Some(9));
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.get("msg_topic-77").as_deref(), Some("9"));
    }

    #[test]
    fn test_unknown_message() {
        let locator = TopicLocator::new(Arc::new(NoCache), Arc::new(HashMap::from([(1u64, 2u64)])), MSG_TOPIC_TTL);
        assert_eq!(locator.locate(1), Some(2));
        assert_eq!(locator.locate(3), None);
    }

    #[test]
    fn test_title_store() {
        let titles = HashMap::from([((SlugKind::Topic, 4u64), "Hello".to_string())]);
        assert_eq!(titles.title(SlugKind::Topic, 4).as_deref(), Some("Hello"));
        assert_eq!(titles.title(SlugKind::Board, 4), None);
    }

    #[test]
    fn test_store_failure_is_a_miss() {
        let locator = TopicLocator::new(Arc::new(NoCache), Arc::new(BrokenStore), MSG_TOPIC_TTL);
        assert_eq!(locator.locate(77), None);
    }
}
