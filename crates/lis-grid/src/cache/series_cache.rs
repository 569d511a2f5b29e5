//! LRU cache for extracted cell series.

use lis_common::TimeSeries;
use lru::LruCache;
use std::num::NonZeroUsize;

use crate::types::CacheStats;

/// Cache key for series: (variable, ix, iy).
pub type SeriesKey = (String, i64, i64);

/// LRU cache of full-extent cell series, bounded by entry count.
///
/// One cache belongs to one session; keys do not identify the dataset.
pub struct SeriesCache {
    cache: LruCache<SeriesKey, TimeSeries>,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl SeriesCache {
    /// Create a cache holding at most `capacity` series (minimum one).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: LruCache::new(capacity),
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    /// Try to get a series from the cache.
    ///
    /// Returns `Some(series)` on a hit, `None` on a miss.
    pub fn get(&mut self, key: &SeriesKey) -> Option<&TimeSeries> {
        if let Some(series) = self.cache.get(key) {
            self.hits += 1;
            Some(series)
        } else {
            self.misses += 1;
            None
        }
    }

    /// Check if a key exists without updating LRU order.
    pub fn contains(&self, key: &SeriesKey) -> bool {
        self.cache.contains(key)
    }

    /// Insert a series, evicting the least recently used entry when full.
    pub fn insert(&mut self, key: SeriesKey, series: TimeSeries) {
        if let Some((evicted_key, _)) = self.cache.push(key.clone(), series) {
            if evicted_key != key {
                self.evictions += 1;
            }
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.cache.len(),
            evictions: self.evictions,
        }
    }

    /// Clear all entries. Counters are kept.
    pub fn clear(&mut self) {
        self.cache.clear();
    }

    pub fn capacity(&self) -> usize {
        self.cache.cap().get()
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
