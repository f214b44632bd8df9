//! Cache Counters
//!
//! Lock-free hit/miss/eviction accounting for the order cache.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::domain::CacheMetrics;

/// Counters updated on the cache hot path
#[derive(Debug, Default)]
pub struct CacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    expired: AtomicU64,
}

impl CacheCounters {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    /// Count entries dropped because their TTL ran out
    #[inline]
    pub fn record_expired(&self, n: u64) {
        self.expired.fetch_add(n, Ordering::Relaxed);
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Get hit ratio
    pub fn hit_ratio(&self) -> f64 {
        let hits = self.hits() as f64;
        let total = hits + self.misses() as f64;
        if total == 0.0 {
            0.0
        } else {
            hits / total
        }
    }

    /// Snapshot for the cache port
    pub fn snapshot(&self, max_size: usize) -> CacheMetrics {
        CacheMetrics {
            max_size,
            hits: self.hits(),
            misses: self.misses(),
            evictions: self.evictions.load(Ordering::Relaxed),
            expired: self.expired.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_ratio() {
        let counters = CacheCounters::new();
        assert_eq!(counters.hit_ratio(), 0.0);

        counters.record_hit();
        counters.record_hit();
        counters.record_hit();
        counters.record_miss();
        assert_eq!(counters.hit_ratio(), 0.75);
    }

    #[test]
    fn test_snapshot() {
        let counters = CacheCounters::new();
        counters.record_eviction();
        counters.record_expired(4);

        let snap = counters.snapshot(100);
        assert_eq!(snap.max_size, 100);
        assert_eq!(snap.evictions, 1);
        assert_eq!(snap.expired, 4);
        assert_eq!(snap.hits, 0);
    }
}
