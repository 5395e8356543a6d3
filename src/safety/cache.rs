//! Memoization for remote label mentions.
//!
//! Keys are case-folded drug display names. Values are the vocabulary terms
//! found in that drug's label, including empty lists for failed or missing
//! lookups (negative caching). The store is bounded by entry count and can
//! expire entries after a TTL.

use std::time::Duration;

use moka::sync::Cache;

/// Key-value store for label mention lists.
pub trait MentionCache: Send + Sync {
    fn get(&self, key: &str) -> Option<Vec<String>>;
    fn put(&self, key: String, value: Vec<String>);
}

/// Bounded LRU-style cache with optional time-to-live.
pub struct LruMentionCache {
    inner: Cache<String, Vec<String>>,
}

impl LruMentionCache {
    pub fn new(capacity: u64, ttl: Option<Duration>) -> Self {
        let mut builder = Cache::<String, Vec<String>>::builder().max_capacity(capacity);
        if let Some(ttl) = ttl {
            builder = builder.time_to_live(ttl);
        }
        Self {
            inner: builder.build(),
        }
    }

    /// Approximate entry count (eviction is applied lazily).
    pub fn len(&self) -> u64 {
        self.inner.run_pending_tasks();
        self.inner.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.inner.invalidate_all();
    }
}

impl MentionCache for LruMentionCache {
    fn get(&self, key: &str) -> Option<Vec<String>> {
        self.inner.get(key)
    }

    fn put(&self, key: String, value: Vec<String>) {
        self.inner.insert(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get() {
        let cache = LruMentionCache::new(16, None);
        cache.put("warfarin".into(), vec!["aspirin".into()]);
        assert_eq!(cache.get("warfarin"), Some(vec!["aspirin".to_string()]));
        assert_eq!(cache.get("aspirin"), None);
    }

    #[test]
    fn negative_entries_are_kept() {
        let cache = LruMentionCache::new(16, Some(Duration::from_secs(3600)));
        cache.put("unknown".into(), Vec::new());
        assert_eq!(cache.get("unknown"), Some(Vec::new()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn overwrite_replaces_value() {
        let cache = LruMentionCache::new(16, None);
        cache.put("warfarin".into(), vec!["aspirin".into()]);
        cache.put("warfarin".into(), vec!["ibuprofen".into()]);
        assert_eq!(cache.get("warfarin"), Some(vec!["ibuprofen".to_string()]));
    }

    #[test]
    fn clear_empties_cache() {
        let cache = LruMentionCache::new(16, None);
        cache.put("warfarin".into(), vec![]);
        cache.clear();
        assert_eq!(cache.get("warfarin"), None);
    }
}
