use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use super::types::CacheEntry;

/// In-memory cache for query results with a freshness window
#[derive(Debug)]
pub struct QueryCache<K, V> {
    inner: Mutex<MemoryCache<K, V>>,
    stale_after: Duration,
}

#[derive(Debug)]
struct MemoryCache<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    hits: usize,
    misses: usize,
}

impl<K, V> QueryCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Create a cache whose entries are fresh for `stale_after`
    pub fn new(stale_after: Duration) -> Self {
        Self {
            inner: Mutex::new(MemoryCache {
                entries: HashMap::new(),
                hits: 0,
                misses: 0,
            }),
            stale_after,
        }
    }

    /// Return the cached value if it is still fresh
    pub fn get_fresh(&self, key: &K) -> Option<V> {
        let mut cache = self.inner.lock();
        let fresh = cache
            .entries
            .get(key)
            .filter(|entry| entry.stored_at.elapsed() < self.stale_after)
            .map(|entry| entry.data.clone());

        if fresh.is_some() {
            cache.hits += 1;
        } else {
            cache.misses += 1;
        }
        fresh
    }

    pub fn insert(&self, key: K, data: V) {
        let mut cache = self.inner.lock();
        cache.entries.insert(
            key,
            CacheEntry {
                data,
                stored_at: Instant::now(),
            },
        );
    }

    pub fn invalidate(&self, key: &K) {
        self.inner.lock().entries.remove(key);
    }

    pub fn clear(&self) {
        self.inner.lock().entries.clear();
    }

    /// Drop entries that are no longer fresh
    pub fn evict_stale(&self) -> usize {
        let mut cache = self.inner.lock();
        let before = cache.entries.len();
        let stale_after = self.stale_after;
        cache
            .entries
            .retain(|_, entry| entry.stored_at.elapsed() < stale_after);
        before - cache.entries.len()
    }

    pub fn stats(&self) -> CacheStats {
        let cache = self.inner.lock();
        let total_requests = cache.hits + cache.misses;
        let hit_rate = if total_requests > 0 {
            (cache.hits as f32 / total_requests as f32) * 100.0
        } else {
            0.0
        };
        CacheStats {
            entries: cache.entries.len(),
            cache_hits: cache.hits,
            cache_misses: cache.misses,
            hit_rate,
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq)]
pub struct CacheStats {
    pub entries: usize,
    pub cache_hits: usize,
    pub cache_misses: usize,
    pub hit_rate: f32,
}

impl CacheStats {
    /// Format cache stats for display
    pub fn format(&self) -> String {
        format!(
            "{} entries, hit rate {:.1}% ({} hits, {} misses)",
            self.entries, self.hit_rate, self.cache_hits, self.cache_misses
        )
    }
}
