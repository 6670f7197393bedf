// Resolution cache - remembers which plugin class won for a URL
//
// Entries are never mutated in place, only inserted or cleared wholesale.
// One mutex covers the LRU order and the counters, so a clear never
// interleaves with an insert.

use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;

use crate::plugins::PluginClass;

/// Cache key: normalized URL and redirect mode
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub url: String,
    pub follow_redirects: bool,
}

/// Cached resolution outcome
#[derive(Debug, Clone)]
pub enum Decision {
    Resolved {
        class: Arc<PluginClass>,
        /// URL after redirects
        url: String,
        matcher: Option<usize>,
    },
    NoMatch {
        url: String,
    },
}

/// Cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheInfo {
    pub hits: u64,
    pub misses: u64,
    pub max_size: usize,
    pub current_size: usize,
}

struct Inner {
    /// `None` when the capacity is zero
    entries: Option<LruCache<CacheKey, Decision>>,
    hits: u64,
    misses: u64,
}

/// Bounded LRU cache of resolution decisions
pub struct ResolutionCache {
    inner: Mutex<Inner>,
    capacity: usize,
}

impl ResolutionCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: NonZeroUsize::new(capacity).map(LruCache::new),
                hits: 0,
                misses: 0,
            }),
            capacity,
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<Decision> {
        let mut inner = self.inner.lock();
        let found = inner.entries.as_mut().and_then(|entries| entries.get(key).cloned());
        match found {
            Some(_) => inner.hits += 1,
            None => inner.misses += 1,
        }
        found
    }

    /// Store a decision, evicting the least recently used entry when full
    pub fn insert(&self, key: CacheKey, decision: Decision) {
        if let Some(entries) = self.inner.lock().entries.as_mut() {
            entries.put(key, decision);
        }
    }

    /// Drop every entry and reset the counters
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        if let Some(entries) = inner.entries.as_mut() {
            entries.clear();
        }
        inner.hits = 0;
        inner.misses = 0;
    }

    pub fn info(&self) -> CacheInfo {
        let inner = self.inner.lock();
        CacheInfo {
            hits: inner.hits,
            misses: inner.misses,
            max_size: self.capacity,
            current_size: inner.entries.as_ref().map_or(0, |entries| entries.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_key(url: &str) -> CacheKey {
        CacheKey {
            url: url.to_string(),
            follow_redirects: false,
        }
    }

    fn no_match(url: &str) -> Decision {
        Decision::NoMatch {
            url: url.to_string(),
        }
    }

    #[test]
    fn test_hit_and_miss_counters() {
        let cache = ResolutionCache::new(4);

        assert!(cache.get(&make_key("https://a")).is_none());
        cache.insert(make_key("https://a"), no_match("https://a"));
        assert!(cache.get(&make_key("https://a")).is_some());

        let info = cache.info();
        assert_eq!(info.hits, 1);
        assert_eq!(info.misses, 1);
        assert_eq!(info.current_size, 1);
        assert_eq!(info.max_size, 4);
    }

    #[test]
    fn test_redirect_mode_is_part_of_key() {
        let cache = ResolutionCache::new(4);
        cache.insert(make_key("https://a"), no_match("https://a"));

        let redirecting = CacheKey {
            url: "https://a".to_string(),
            follow_redirects: true,
        };
        assert!(cache.get(&redirecting).is_none());
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let cache = ResolutionCache::new(2);
        cache.insert(make_key("https://a"), no_match("https://a"));
        cache.insert(make_key("https://b"), no_match("https://b"));

        // touch "a" so "b" becomes the oldest
        assert!(cache.get(&make_key("https://a")).is_some());
        cache.insert(make_key("https://c"), no_match("https://c"));

        assert!(cache.get(&make_key("https://a")).is_some());
        assert!(cache.get(&make_key("https://b")).is_none());
        assert!(cache.get(&make_key("https://c")).is_some());
        assert_eq!(cache.info().current_size, 2);
    }

    #[test]
    fn test_clear() {
        let cache = ResolutionCache::new(2);
        cache.insert(make_key("https://a"), no_match("https://a"));
        cache.clear();

        assert_eq!(cache.info(), CacheInfo { max_size: 2, ..CacheInfo::default() });
    }

    #[test]
    fn test_zero_capacity_never_stores() {
        let cache = ResolutionCache::new(0);
        cache.insert(make_key("https://a"), no_match("https://a"));
        assert!(cache.get(&make_key("https://a")).is_none());
    }

    #[test]
    fn test_concurrent_inserts_and_lookups() {
        let cache = ResolutionCache::new(256);

        std::thread::scope(|scope| {
            for worker in 0..8 {
                let cache = &cache;
                scope.spawn(move || {
                    for n in 0..16 {
                        let url = format!("https://host{worker}/{n}");
                        cache.insert(make_key(&url), no_match(&url));
                        match cache.get(&make_key(&url)) {
                            Some(Decision::NoMatch { url: cached }) => assert_eq!(cached, url),
                            other => panic!("unexpected entry for {url}: {other:?}"),
                        }
                    }
                });
            }
        });

        let info = cache.info();
        assert_eq!(info.current_size, 128);
        assert_eq!(info.hits, 128);
        assert_eq!(info.misses, 0);
    }
}
