//! Memory Cache - bounded TTL/LRU order cache
//!
//! # Design
//!
//! - One `HashMap` behind a single `parking_lot::RwLock`
//! - Fixed TTL per entry, checked lazily on read and by a background sweeper
//! - Capacity bound enforced on insert by evicting the least recently
//!   accessed entry (linear scan)
//! - Reads share the lock: the recency stamp is atomic, so concurrent hits
//!   never lose an LRU update. Dropping a stale entry upgrades to the
//!   exclusive lock and re-checks.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::entry::CacheEntry;
use super::metrics::CacheCounters;
use super::sweeper::Sweeper;
use super::{DEFAULT_CLEANUP_INTERVAL, DEFAULT_MAX_SIZE, DEFAULT_TTL};
use crate::domain::{CacheMetrics, Order, OrderCache};
use crate::error::{Error, Result};

// =============================================================================
// Configuration
// =============================================================================

/// Memory cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries
    pub max_size: usize,
    /// Lifetime of an entry from insertion
    pub ttl: Duration,
    /// How often the sweeper drops expired entries
    pub cleanup_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            ttl: DEFAULT_TTL,
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
        }
    }
}

/// Upper bound for `ttl` and `cleanup_interval`. Keeps `Instant` arithmetic
/// from overflowing for the lifetime of the process.
pub const MAX_DURATION: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

impl CacheConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_size == 0 {
            return Err(Error::Config("cache max_size must be at least 1".into()));
        }
        if self.ttl.is_zero() {
            return Err(Error::Config("cache ttl must be non-zero".into()));
        }
        if self.ttl > MAX_DURATION {
            return Err(Error::Config(format!(
                "cache ttl must be at most {}s, got {}s",
                MAX_DURATION.as_secs(),
                self.ttl.as_secs()
            )));
        }
        if self.cleanup_interval.is_zero() {
            return Err(Error::Config(
                "cache cleanup_interval must be non-zero".into(),
            ));
        }
        if self.cleanup_interval > MAX_DURATION {
            return Err(Error::Config(format!(
                "cache cleanup_interval must be at most {}s, got {}s",
                MAX_DURATION.as_secs(),
                self.cleanup_interval.as_secs()
            )));
        }
        Ok(())
    }
}

// =============================================================================
// Shared State
// =============================================================================

/// State shared between the cache handle and its sweeper thread
pub(crate) struct CacheState {
    entries: RwLock<HashMap<String, CacheEntry>>,
    config: CacheConfig,
    /// Logical clock for recency stamps
    clock: AtomicU64,
    counters: CacheCounters,
}

impl CacheState {
    fn new(config: CacheConfig) -> Self {
        Self {
            entries: RwLock::new(HashMap::with_capacity(config.max_size.min(4096))),
            config,
            clock: AtomicU64::new(0),
            counters: CacheCounters::new(),
        }
    }

    #[inline]
    fn next_stamp(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn make_entry(&self, order: Arc<Order>, now: Instant) -> CacheEntry {
        CacheEntry::new(order, now + self.config.ttl, self.next_stamp())
    }

    /// Drop the entry with the smallest recency stamp. Caller holds the
    /// write lock.
    fn evict_oldest(&self, entries: &mut HashMap<String, CacheEntry>) {
        let victim = entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_access())
            .map(|(key, _)| key.clone());

        if let Some(key) = victim {
            entries.remove(&key);
            self.counters.record_eviction();
            debug!(order_uid = %key, "Evicted least recently used order");
        }
    }

    /// Drop every expired entry. Returns how many were removed.
    pub(crate) fn remove_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired_at(now));
        let removed = before - entries.len();
        self.counters.record_expired(removed as u64);
        removed
    }
}

// =============================================================================
// Memory Cache
// =============================================================================

/// Bounded, TTL-aware, LRU-evicting order cache.
///
/// A sweeper thread starts with the cache and is stopped by [`close`] or,
/// failing that, when the cache is dropped.
///
/// [`close`]: MemoryCache::close
pub struct MemoryCache {
    state: Arc<CacheState>,
    sweeper: Mutex<Option<Sweeper>>,
}

impl std::fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache")
            .field("config", &self.state.config)
            .finish_non_exhaustive()
    }
}

impl MemoryCache {
    /// Create a cache with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(CacheConfig::default())
    }

    /// Create a cache with custom configuration and start its sweeper
    pub fn with_config(config: CacheConfig) -> Result<Self> {
        config.validate()?;

        let interval = config.cleanup_interval;
        let state = Arc::new(CacheState::new(config));
        let sweeper = Sweeper::spawn(Arc::downgrade(&state), interval)?;

        info!(
            max_size = state.config.max_size,
            ttl_secs = state.config.ttl.as_secs(),
            cleanup_interval_secs = interval.as_secs(),
            "Memory cache started"
        );

        Ok(Self {
            state,
            sweeper: Mutex::new(Some(sweeper)),
        })
    }

    /// Stop the background sweeper. Must be called at most once.
    pub fn close(&self) {
        let sweeper = self.sweeper.lock().take();
        debug_assert!(sweeper.is_some(), "cache sweeper stopped twice");

        if let Some(sweeper) = sweeper {
            sweeper.stop();
            info!("Memory cache sweeper stopped");
        }
    }

    /// Whether the sweeper is still running
    pub fn is_sweeping(&self) -> bool {
        self.sweeper.lock().is_some()
    }

    /// Run one sweep now. Returns how many entries were removed.
    pub fn sweep_expired(&self) -> usize {
        self.state.remove_expired()
    }

    /// Raw number of stored entries, including expired ones not yet swept
    pub fn len(&self) -> usize {
        self.state.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.entries.read().is_empty()
    }

    pub fn config(&self) -> &CacheConfig {
        &self.state.config
    }

    /// Get hit ratio
    pub fn hit_ratio(&self) -> f64 {
        self.state.counters.hit_ratio()
    }

    fn miss(&self, order_uid: &str) -> Error {
        self.state.counters.record_miss();
        Error::CacheMiss {
            order_uid: order_uid.to_string(),
        }
    }
}

impl Drop for MemoryCache {
    fn drop(&mut self) {
        if let Some(sweeper) = self.sweeper.get_mut().take() {
            sweeper.stop();
        }
    }
}

impl OrderCache for MemoryCache {
    fn set(&self, order_uid: &str, order: Arc<Order>) -> Result<()> {
        if order_uid.is_empty() {
            return Err(Error::InvalidArgument(
                "cache key cannot be empty".to_string(),
            ));
        }

        let now = Instant::now();
        let mut entries = self.state.entries.write();

        if entries.len() >= self.state.config.max_size && !entries.contains_key(order_uid) {
            self.state.evict_oldest(&mut entries);
        }

        let entry = self.state.make_entry(order, now);
        entries.insert(order_uid.to_string(), entry);
        Ok(())
    }

    fn get(&self, order_uid: &str) -> Result<Arc<Order>> {
        {
            let entries = self.state.entries.read();
            match entries.get(order_uid) {
                None => return Err(self.miss(order_uid)),
                Some(entry) if !entry.is_expired_at(Instant::now()) => {
                    entry.touch(self.state.next_stamp());
                    self.state.counters.record_hit();
                    return Ok(Arc::clone(entry.order()));
                }
                Some(_) => {}
            }
        }

        // Expired: re-check under the write lock, a concurrent set may have
        // replaced it with a fresh entry in between
        let mut entries = self.state.entries.write();
        if entries
            .get(order_uid)
            .is_some_and(|entry| entry.is_expired_at(Instant::now()))
        {
            entries.remove(order_uid);
            self.state.counters.record_expired(1);
            debug!(order_uid, "Dropped expired cache entry on read");
        }
        Err(self.miss(order_uid))
    }

    fn delete(&self, order_uid: &str) -> Result<()> {
        match self.state.entries.write().remove(order_uid) {
            Some(_) => Ok(()),
            None => Err(Error::CacheMiss {
                order_uid: order_uid.to_string(),
            }),
        }
    }

    fn load_all(&self, orders: Vec<Arc<Order>>) -> Result<usize> {
        let total = orders.len();
        let max_size = self.state.config.max_size;
        let now = Instant::now();
        let mut entries = self.state.entries.write();
        let mut accepted = 0;

        for order in orders {
            if order.order_uid.is_empty() {
                warn!("Skipping order with empty order_uid during cache load");
                continue;
            }
            // Bulk load never evicts: first records up to capacity win
            if entries.len() >= max_size && !entries.contains_key(&order.order_uid) {
                break;
            }
            let key = order.order_uid.clone();
            let entry = self.state.make_entry(order, now);
            entries.insert(key, entry);
            accepted += 1;
        }

        if accepted < total {
            debug!(
                accepted,
                dropped = total - accepted,
                max_size,
                "Cache load stopped at capacity"
            );
        }
        Ok(accepted)
    }

    fn get_all(&self) -> Result<Vec<Arc<Order>>> {
        let now = Instant::now();
        let entries = self.state.entries.read();
        Ok(entries
            .values()
            .filter(|entry| !entry.is_expired_at(now))
            .map(|entry| Arc::clone(entry.order()))
            .collect())
    }

    fn count(&self) -> usize {
        let now = Instant::now();
        self.state
            .entries
            .read()
            .values()
            .filter(|entry| !entry.is_expired_at(now))
            .count()
    }

    fn clear(&self) -> Result<()> {
        self.state.entries.write().clear();
        Ok(())
    }

    fn metrics(&self) -> CacheMetrics {
        self.state.counters.snapshot(self.state.config.max_size)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::thread;

    fn make_order(uid: &str) -> Arc<Order> {
        Arc::new(Order::new(uid, format!("TRACK-{}", uid), "WBIL").unwrap())
    }

    fn cache_with(max_size: usize, ttl: Duration) -> MemoryCache {
        MemoryCache::with_config(CacheConfig {
            max_size,
            ttl,
            cleanup_interval: Duration::from_secs(3600),
        })
        .unwrap()
    }

    #[test]
    fn test_set_then_get_returns_same_record() {
        let cache = cache_with(10, Duration::from_secs(3600));
        let order = make_order("a");

        cache.set("a", Arc::clone(&order)).unwrap();
        let fetched = cache.get("a").unwrap();

        assert_eq!(*fetched, *order);
        assert!(Arc::ptr_eq(&fetched, &order));
    }

    #[test]
    fn test_set_rejects_empty_key() {
        let cache = cache_with(10, Duration::from_secs(3600));
        assert_matches!(cache.set("", make_order("a")), Err(Error::InvalidArgument(_)));
        assert_eq!(cache.count(), 0);
    }

    #[test]
    fn test_get_missing_is_cache_miss() {
        let cache = cache_with(10, Duration::from_secs(3600));
        assert_matches!(
            cache.get("nope"),
            Err(Error::CacheMiss { order_uid }) if order_uid == "nope"
        );
        assert_eq!(cache.metrics().misses, 1);
    }

    #[test]
    fn test_lru_scenario_capacity_two() {
        let cache = cache_with(2, Duration::from_secs(3600));

        cache.set("a", make_order("a")).unwrap();
        cache.set("b", make_order("b")).unwrap();
        cache.get("a").unwrap();
        cache.set("c", make_order("c")).unwrap();

        assert_eq!(cache.count(), 2);
        assert!(cache.get("a").is_ok());
        assert!(cache.get("c").is_ok());
        assert_matches!(cache.get("b"), Err(Error::CacheMiss { .. }));
        assert_eq!(cache.metrics().evictions, 1);
    }

    #[test]
    fn test_eviction_removes_exactly_least_recent() {
        let cache = cache_with(3, Duration::from_secs(3600));
        for uid in ["a", "b", "c"] {
            cache.set(uid, make_order(uid)).unwrap();
        }
        cache.get("a").unwrap();
        cache.get("b").unwrap();

        cache.set("d", make_order("d")).unwrap();

        assert_eq!(cache.len(), 3);
        assert!(cache.get("c").is_err());
        for uid in ["a", "b", "d"] {
            assert!(cache.get(uid).is_ok(), "{} should survive", uid);
        }
    }

    #[test]
    fn test_overwrite_at_capacity_does_not_evict() {
        let cache = cache_with(2, Duration::from_secs(3600));
        cache.set("a", make_order("a")).unwrap();
        cache.set("b", make_order("b")).unwrap();

        let replacement = Arc::new(Order::new("a", "TRACK-NEW", "WBIL").unwrap());
        cache.set("a", replacement).unwrap();

        assert_eq!(cache.count(), 2);
        assert_eq!(cache.get("a").unwrap().track_number, "TRACK-NEW");
        assert!(cache.get("b").is_ok());
        assert_eq!(cache.metrics().evictions, 0);
    }

    #[test]
    fn test_expired_entry_excluded_everywhere() {
        let cache = cache_with(10, Duration::from_millis(50));
        cache.set("old", make_order("old")).unwrap();
        thread::sleep(Duration::from_millis(80));
        cache.set("new", make_order("new")).unwrap();

        assert_eq!(cache.count(), 1);
        let all = cache.get_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].order_uid, "new");

        // get_all and count are pure views: the stale entry is still stored
        assert_eq!(cache.len(), 2);

        assert_matches!(cache.get("old"), Err(Error::CacheMiss { .. }));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.metrics().expired, 1);
    }

    #[test]
    fn test_get_all_does_not_touch_recency() {
        let cache = cache_with(2, Duration::from_secs(3600));
        cache.set("a", make_order("a")).unwrap();
        cache.set("b", make_order("b")).unwrap();

        assert_eq!(cache.get_all().unwrap().len(), 2);
        cache.set("c", make_order("c")).unwrap();

        // "a" is still the least recently accessed
        assert!(cache.get("a").is_err());
        assert!(cache.get("b").is_ok());
    }

    #[test]
    fn test_delete() {
        let cache = cache_with(10, Duration::from_secs(3600));
        cache.set("a", make_order("a")).unwrap();

        cache.delete("a").unwrap();
        assert_eq!(cache.count(), 0);
        assert_matches!(cache.delete("a"), Err(Error::CacheMiss { .. }));
    }

    #[test]
    fn test_load_all_stops_at_capacity() {
        let cache = cache_with(3, Duration::from_secs(3600));
        let orders: Vec<_> = ["a", "b", "c", "d", "e"]
            .iter()
            .map(|uid| make_order(uid))
            .collect();

        let accepted = cache.load_all(orders).unwrap();

        assert_eq!(accepted, 3);
        assert_eq!(cache.count(), 3);
        for uid in ["a", "b", "c"] {
            assert!(cache.get(uid).is_ok());
        }
        assert!(cache.get("d").is_err());
        assert!(cache.get("e").is_err());
        assert_eq!(cache.metrics().evictions, 0);
    }

    #[test]
    fn test_load_all_does_not_evict_existing() {
        let cache = cache_with(2, Duration::from_secs(3600));
        cache.set("x", make_order("x")).unwrap();

        let accepted = cache
            .load_all(vec![make_order("a"), make_order("b")])
            .unwrap();

        assert_eq!(accepted, 1);
        assert!(cache.get("x").is_ok());
        assert!(cache.get("a").is_ok());
        assert!(cache.get("b").is_err());
    }

    #[test]
    fn test_load_all_skips_empty_uid() {
        let cache = cache_with(5, Duration::from_secs(3600));
        let mut blank = Order::new("tmp", "TRACK", "WBIL").unwrap();
        blank.order_uid.clear();

        let accepted = cache
            .load_all(vec![Arc::new(blank), make_order("a")])
            .unwrap();
        assert_eq!(accepted, 1);
        assert_eq!(cache.count(), 1);
    }

    #[test]
    fn test_clear() {
        let cache = cache_with(100, Duration::from_secs(3600));
        for i in 0..50 {
            let uid = format!("order-{}", i);
            cache.set(&uid, make_order(&uid)).unwrap();
        }
        assert_eq!(cache.count(), 50);

        cache.clear().unwrap();
        assert!(cache.is_empty());
        assert_eq!(cache.count(), 0);
    }

    #[test]
    fn test_manual_sweep() {
        let cache = cache_with(10, Duration::from_millis(30));
        cache.set("a", make_order("a")).unwrap();
        cache.set("b", make_order("b")).unwrap();
        thread::sleep(Duration::from_millis(60));

        assert_eq!(cache.sweep_expired(), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_background_sweeper_removes_expired() {
        let cache = MemoryCache::with_config(CacheConfig {
            max_size: 10,
            ttl: Duration::from_millis(30),
            cleanup_interval: Duration::from_millis(20),
        })
        .unwrap();
        cache.set("a", make_order("a")).unwrap();

        let deadline = Instant::now() + Duration::from_secs(2);
        while !cache.is_empty() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }

        assert!(cache.is_empty(), "sweeper should have removed the entry");
        cache.close();
    }

    #[test]
    fn test_close_stops_sweeper() {
        let cache = cache_with(10, Duration::from_secs(3600));
        assert!(cache.is_sweeping());
        cache.close();
        assert!(!cache.is_sweeping());

        // Cache stays usable without the sweeper
        cache.set("a", make_order("a")).unwrap();
        assert!(cache.get("a").is_ok());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "stopped twice")]
    fn test_double_close_is_a_programming_error() {
        let cache = cache_with(10, Duration::from_secs(3600));
        cache.close();
        cache.close();
    }

    #[test]
    fn test_invalid_config() {
        let zero = CacheConfig {
            max_size: 0,
            ..Default::default()
        };
        assert_matches!(MemoryCache::with_config(zero), Err(Error::Config(_)));

        let no_ttl = CacheConfig {
            ttl: Duration::ZERO,
            ..Default::default()
        };
        assert_matches!(no_ttl.validate(), Err(Error::Config(_)));
    }

    #[test]
    fn test_oversized_durations_rejected() {
        let huge_ttl = CacheConfig {
            ttl: Duration::from_secs(u64::MAX),
            ..Default::default()
        };
        assert_matches!(huge_ttl.validate(), Err(Error::Config(_)));
        assert_matches!(MemoryCache::with_config(huge_ttl), Err(Error::Config(_)));

        let huge_interval = CacheConfig {
            cleanup_interval: Duration::from_secs(u64::MAX),
            ..Default::default()
        };
        assert_matches!(huge_interval.validate(), Err(Error::Config(_)));
    }

    #[test]
    fn test_longest_ttl_still_usable() {
        let cache = MemoryCache::with_config(CacheConfig {
            ttl: MAX_DURATION,
            cleanup_interval: MAX_DURATION,
            ..Default::default()
        })
        .unwrap();

        cache.set("a", make_order("a")).unwrap();
        assert_eq!(cache.load_all(vec![make_order("b")]).unwrap(), 1);
        assert!(cache.get("a").is_ok());
        assert_eq!(cache.count(), 2);
        cache.close();
    }

    #[test]
    fn test_concurrent_access_respects_capacity() {
        let cache = Arc::new(cache_with(64, Duration::from_secs(3600)));

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for i in 0..500 {
                        let uid = format!("order-{}-{}", t, i);
                        cache.set(&uid, make_order(&uid)).unwrap();
                        let _ = cache.get(&uid);
                        let _ = cache.get(&format!("order-{}-{}", (t + 1) % 8, i));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.len(), 64);
        assert_eq!(cache.count(), 64);
    }

    #[test]
    fn test_hit_ratio_tracking() {
        let cache = cache_with(10, Duration::from_secs(3600));
        cache.set("a", make_order("a")).unwrap();
        cache.get("a").unwrap();
        let _ = cache.get("b");

        assert_eq!(cache.hit_ratio(), 0.5);
        let metrics = cache.metrics();
        assert_eq!(metrics.hits, 1);
        assert_eq!(metrics.misses, 1);
        assert_eq!(metrics.max_size, 10);
    }
}
