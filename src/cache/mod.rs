//! In-Memory Order Cache
//!
//! Bounded, TTL-aware, LRU-evicting key→order store used as the fast path
//! in front of the durable repository. It knows nothing about persistence or
//! transport.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        MemoryCache                            │
//! ├──────────────────────────────────────────────────────────────┤
//! │  RwLock<HashMap<order_uid, CacheEntry>>                       │
//! │    CacheEntry = Arc<Order> + expires_at + last_access stamp   │
//! │                                                               │
//! │  set ──▶ evict least recently used when full                  │
//! │  get ──▶ lazy expiry, atomic recency touch                    │
//! │                                                               │
//! │  Sweeper thread ──▶ periodic removal of expired entries       │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Policies
//!
//! - `set` at capacity evicts exactly one entry (oldest `last_access`)
//! - `load_all` never evicts; it stops accepting once full
//! - `get_all` and `count` are pure views over live entries

mod entry;
mod memory;
mod metrics;
mod sweeper;

use std::time::Duration;

pub use entry::CacheEntry;
pub use memory::{CacheConfig, MemoryCache, MAX_DURATION};
pub use metrics::CacheCounters;

/// Default maximum number of cached orders
pub const DEFAULT_MAX_SIZE: usize = 1000;

/// Default entry lifetime (24h)
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Default sweep interval (5 minutes)
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(5 * 60);

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_constants() {
        let config = CacheConfig::default();
        assert_eq!(config.max_size, DEFAULT_MAX_SIZE);
        assert_eq!(config.ttl, DEFAULT_TTL);
        assert_eq!(config.cleanup_interval, DEFAULT_CLEANUP_INTERVAL);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_sweep_runs_more_often_than_entries_expire() {
        assert!(DEFAULT_CLEANUP_INTERVAL < DEFAULT_TTL);
    }
}
