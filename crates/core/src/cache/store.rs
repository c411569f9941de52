//! Keyed store with optional TTL and resource tags.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::Envelope;

/// Default lifetime of a cached API envelope.
pub const DEFAULT_RESPONSE_TTL: Duration = Duration::from_secs(60);

/// Cache of backend envelopes keyed by endpoint.
pub type ResponseCache = Cache<Envelope>;

/// Cache of page bodies keyed by normalized path.
pub type PageCache = Cache<String>;

/// A stored payload with its creation time.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    payload: V,
    stored_at: Instant,
    tags: Vec<String>,
}

impl<V> CacheEntry<V> {
    fn is_fresh(&self, ttl: Option<Duration>, now: Instant) -> bool {
        match ttl {
            Some(ttl) => now.saturating_duration_since(self.stored_at) < ttl,
            None => true,
        }
    }
}

/// In-memory key/value store.
///
/// With a TTL, an entry is valid while `now - stored_at < ttl`. Without one,
/// entries live until cleared. The lock is only held for the duration of a
/// single call, never across an await.
#[derive(Debug)]
pub struct Cache<V> {
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
    ttl: Option<Duration>,
}

impl<V: Clone> Cache<V> {
    /// Create a cache whose entries expire after `ttl`.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self { entries: Mutex::new(HashMap::new()), ttl: Some(ttl) }
    }

    /// Create a cache whose entries never expire.
    pub fn unbounded() -> Self {
        Self { entries: Mutex::new(HashMap::new()), ttl: None }
    }

    /// Configured TTL, `None` for an unbounded cache.
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry<V>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get a fresh payload for `key`.
    ///
    /// An expired entry is removed as a side effect of this read.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.lock();
        let fresh = entries.get(key)?.is_fresh(self.ttl, Instant::now());
        if fresh {
            return entries.get(key).map(|entry| entry.payload.clone());
        }

        entries.remove(key);
        tracing::debug!(key, "cache entry expired");
        None
    }

    /// Store `payload` under `key`, overwriting any existing entry.
    pub fn set(&self, key: impl Into<String>, payload: V) {
        self.set_tagged(key, payload, Vec::new());
    }

    /// Store `payload` under `key` with the resource tags it depends on.
    pub fn set_tagged(&self, key: impl Into<String>, payload: V, tags: Vec<String>) {
        let entry = CacheEntry { payload, stored_at: Instant::now(), tags };
        self.lock().insert(key.into(), entry);
    }

    /// Delete one entry, or every entry when `key` is `None`.
    pub fn clear(&self, key: Option<&str>) {
        let mut entries = self.lock();
        match key {
            Some(key) => {
                entries.remove(key);
            }
            None => entries.clear(),
        }
    }

    /// Delete every entry whose key contains `pattern`.
    ///
    /// Returns the number of deleted entries.
    pub fn clear_by_prefix(&self, pattern: &str) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|key, _| !key.contains(pattern));
        before - entries.len()
    }

    /// Delete every entry tagged with `tag`.
    ///
    /// Returns the number of deleted entries.
    pub fn invalidate_tag(&self, tag: &str) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| !entry.tags.iter().any(|t| t == tag));
        before - entries.len()
    }

    /// Whether a fresh entry exists for `key`. Does not evict.
    pub fn contains(&self, key: &str) -> bool {
        self.lock()
            .get(key)
            .is_some_and(|entry| entry.is_fresh(self.ttl, Instant::now()))
    }

    /// Number of stored entries, including expired ones not yet read.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Snapshot of stored keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Tags attached to `key`, if it is stored.
    pub fn tags(&self, key: &str) -> Option<Vec<String>> {
        self.lock().get(key).map(|entry| entry.tags.clone())
    }

    #[cfg(test)]
    pub(crate) fn backdate(&self, key: &str, by: Duration) {
        if let Some(entry) = self.lock().get_mut(key)
            && let Some(earlier) = entry.stored_at.checked_sub(by)
        {
            entry.stored_at = earlier;
        }
    }
}

impl Default for Cache<Envelope> {
    fn default() -> Self {
        Self::with_ttl(DEFAULT_RESPONSE_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_then_get() {
        let cache = ResponseCache::default();
        let env = Envelope::ok(json!({"total": 3}));
        cache.set("/api/reports/summary", env.clone());
        assert_eq!(cache.get("/api/reports/summary"), Some(env));
    }

    #[test]
    fn test_get_missing() {
        let cache = ResponseCache::default();
        assert!(cache.get("/api/employees").is_none());
    }

    #[test]
    fn test_expired_entry_removed_on_read() {
        let cache = ResponseCache::default();
        cache.set("/api/employees", Envelope::ok(json!([])));
        cache.backdate("/api/employees", DEFAULT_RESPONSE_TTL + Duration::from_secs(1));

        assert_eq!(cache.len(), 1);
        assert!(cache.get("/api/employees").is_none());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_entry_at_exact_ttl_is_stale() {
        let cache = ResponseCache::default();
        cache.set("/api/tasks", Envelope::ok(json!([])));
        cache.backdate("/api/tasks", DEFAULT_RESPONSE_TTL);
        assert!(cache.get("/api/tasks").is_none());
    }

    #[test]
    fn test_zero_ttl_never_serves() {
        let cache = ResponseCache::with_ttl(Duration::ZERO);
        cache.set("/api/tasks", Envelope::ok(json!([])));
        assert!(!cache.contains("/api/tasks"));
        assert!(cache.get("/api/tasks").is_none());
    }

    #[test]
    fn test_unbounded_never_expires() {
        let cache = PageCache::unbounded();
        cache.set("/warehouse", "<main>stock</main>".to_string());
        cache.backdate("/warehouse", Duration::from_secs(600));
        assert_eq!(cache.get("/warehouse").as_deref(), Some("<main>stock</main>"));
    }

    #[test]
    fn test_overwrite() {
        let cache = PageCache::unbounded();
        cache.set("/", "first".to_string());
        cache.set("/", "second".to_string());
        assert_eq!(cache.get("/").as_deref(), Some("second"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_clear_single_key() {
        let cache = ResponseCache::default();
        cache.set("/api/employees", Envelope::ok(json!([])));
        cache.set("/api/tasks", Envelope::ok(json!([])));

        cache.clear(Some("/api/employees"));

        assert_eq!(cache.keys(), vec!["/api/tasks".to_string()]);
    }

    #[test]
    fn test_clear_all() {
        let cache = ResponseCache::default();
        cache.set("/api/employees", Envelope::ok(json!([])));
        cache.set("/api/tasks", Envelope::ok(json!([])));

        cache.clear(None);

        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear_by_prefix_matches_substring() {
        let cache = ResponseCache::default();
        cache.set("/api/tasks", Envelope::ok(json!([])));
        cache.set("/api/tasks?status=pending", Envelope::ok(json!([])));
        cache.set("/api/employees/4/tasks", Envelope::ok(json!([])));
        cache.set("/api/employees", Envelope::ok(json!([])));

        let removed = cache.clear_by_prefix("/api/tasks");

        assert_eq!(removed, 2);
        assert_eq!(cache.keys(), vec!["/api/employees".to_string(), "/api/employees/4/tasks".to_string()]);
    }

    #[test]
    fn test_invalidate_tag() {
        let cache = ResponseCache::default();
        cache.set_tagged("/api/warehouse/products", Envelope::ok(json!([])), vec!["products".into()]);
        cache.set_tagged("/api/reports/summary", Envelope::ok(json!({})), vec!["reports".into()]);
        cache.set("/api/untagged", Envelope::ok(json!(null)));

        assert_eq!(cache.invalidate_tag("products"), 1);
        assert!(cache.get("/api/warehouse/products").is_none());
        assert!(cache.get("/api/reports/summary").is_some());
        assert!(cache.get("/api/untagged").is_some());
    }

    #[test]
    fn test_tags_lookup() {
        let cache = ResponseCache::default();
        cache.set_tagged("/api/tasks", Envelope::ok(json!([])), vec!["tasks".into()]);
        assert_eq!(cache.tags("/api/tasks"), Some(vec!["tasks".to_string()]));
        assert_eq!(cache.tags("/api/other"), None);
    }
}
