use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;

use super::query::DomainQuery;

/// Default LRU cache size
pub const DEFAULT_CACHE_SIZE: usize = 1024;

/// Cache key: raw query string and case rule
type CacheKey = (String, bool);

/// LRU cache of compiled domain queries.
///
/// Applications that issue the same handful of query strings against many
/// domains can share one cache across threads instead of re-parsing each time.
pub struct QueryCache {
    cache: Mutex<LruCache<CacheKey, Arc<DomainQuery>>>,
}

impl QueryCache {
    /// Create a cache holding at most `capacity` compiled queries (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Get the compiled form of `query`, parsing it on a cache miss.
    pub fn compile(&self, query: &str, case_sensitive: bool) -> Arc<DomainQuery> {
        let key = (query.to_string(), case_sensitive);
        let mut cache = self.cache.lock();

        if let Some(compiled) = cache.get(&key) {
            return compiled.clone();
        }

        let compiled = Arc::new(DomainQuery::new(query, case_sensitive));
        cache.put(key, compiled.clone());
        compiled
    }

    /// Same result as [`super::matches`], using the cached compiled query.
    pub fn matches(&self, domain: &str, query: &str, case_sensitive: bool) -> bool {
        if query.is_empty() {
            return false;
        }
        self.compile(query, case_sensitive).matches(domain)
    }

    /// Number of cached queries
    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.lock().is_empty()
    }

    /// Clear the cache
    pub fn clear(&self) {
        let mut cache = self.cache.lock();
        cache.clear();
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_SIZE)
    }
}
