//! Memoized release-check outcomes shared by all queries.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, PoisonError};

use crate::model::VerifiedCandidate;
use crate::platform::PlatformFilter;
use crate::source::RepoId;

/// Default number of outcomes kept.
pub const DEFAULT_CAPACITY: usize = 500;

/// Cache key of a repository's release check for a platform filter.
pub fn cache_key(repo: &RepoId, filter: PlatformFilter) -> String {
    format!("{}:LATEST_PLATFORM_{}", repo, filter)
}

/// Least-recently-used map of release-check outcomes.
///
/// A stored `None` records a negative outcome and is distinct from a key that
/// was never checked.
pub struct ReleaseCheckCache {
    inner: Mutex<Lru>,
}

struct Lru {
    capacity: usize,
    tick: u64,
    entries: HashMap<String, (Option<VerifiedCandidate>, u64)>,
    recency: BTreeMap<u64, String>,
}

impl Lru {
    fn touch(&mut self, key: &str) -> Option<Option<VerifiedCandidate>> {
        self.tick += 1;
        let tick = self.tick;
        let (value, last) = self.entries.get_mut(key)?;
        let previous = std::mem::replace(last, tick);
        let value = value.clone();
        self.recency.remove(&previous);
        self.recency.insert(tick, key.to_string());
        Some(value)
    }

    fn insert(&mut self, key: String, value: Option<VerifiedCandidate>) {
        self.tick += 1;
        if let Some((_, previous)) = self.entries.insert(key.clone(), (value, self.tick)) {
            self.recency.remove(&previous);
        }
        self.recency.insert(self.tick, key);

        while self.entries.len() > self.capacity {
            let Some((_, oldest)) = self.recency.pop_first() else {
                break;
            };
            self.entries.remove(&oldest);
        }
    }
}

impl ReleaseCheckCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Lru {
                capacity: capacity.max(1),
                tick: 0,
                entries: HashMap::new(),
                recency: BTreeMap::new(),
            }),
        }
    }

    /// `None` when never checked, `Some(None)` for a cached negative outcome.
    pub fn get(&self, key: &str) -> Option<Option<VerifiedCandidate>> {
        self.lock().touch(key)
    }

    pub fn put(&self, key: impl Into<String>, value: Option<VerifiedCandidate>) {
        self.lock().insert(key.into(), value);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Lru> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ReleaseCheckCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RepositorySummary;
    use crate::platform::Platform;

    fn candidate(id: u64) -> VerifiedCandidate {
        VerifiedCandidate::new(RepositorySummary {
            id,
            ..Default::default()
        })
    }

    #[test]
    fn test_cache_key_format() {
        let repo: RepoId = "octo/tool".parse().unwrap();
        assert_eq!(
            cache_key(&repo, Platform::Android.into()),
            "octo/tool:LATEST_PLATFORM_android"
        );
        assert_eq!(
            cache_key(&repo, PlatformFilter::All),
            "octo/tool:LATEST_PLATFORM_all"
        );
    }

    #[test]
    fn test_put_then_get() {
        let cache = ReleaseCheckCache::new();
        cache.put("a", Some(candidate(1)));
        assert_eq!(cache.get("a"), Some(Some(candidate(1))));
    }

    #[test]
    fn test_negative_outcome_distinct_from_absent() {
        let cache = ReleaseCheckCache::new();
        assert!(!cache.contains("k"));
        assert_eq!(cache.get("k"), None);

        cache.put("k", None);
        assert!(cache.contains("k"));
        assert_eq!(cache.get("k"), Some(None));
    }

    #[test]
    fn test_put_overwrites() {
        let cache = ReleaseCheckCache::new();
        cache.put("k", None);
        cache.put("k", Some(candidate(2)));
        assert_eq!(cache.get("k"), Some(Some(candidate(2))));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let cache = ReleaseCheckCache::with_capacity(2);
        cache.put("a", None);
        cache.put("b", None);
        // refresh "a" so "b" becomes the oldest
        assert!(cache.get("a").is_some());
        cache.put("c", None);

        assert!(cache.contains("a"));
        assert!(!cache.contains("b"));
        assert!(cache.contains("c"));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_default_capacity_bound() {
        let cache = ReleaseCheckCache::new();
        for i in 0..(DEFAULT_CAPACITY + 20) {
            cache.put(format!("k{}", i), None);
        }
        assert_eq!(cache.len(), DEFAULT_CAPACITY);
        assert!(!cache.contains("k0"));
        assert!(cache.contains(&format!("k{}", DEFAULT_CAPACITY + 19)));
    }

    #[test]
    fn test_concurrent_writers_do_not_lose_updates() {
        let cache = std::sync::Arc::new(ReleaseCheckCache::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    for i in 0..50u64 {
                        let key = format!("t{}-{}", t, i);
                        cache.put(key.clone(), Some(candidate(i)));
                        assert_eq!(cache.get(&key), Some(Some(candidate(i))));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.len(), 400);
    }
}
