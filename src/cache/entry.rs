//! Cache Entry Types

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::domain::Order;

/// A cached order with its expiry deadline and recency stamp.
///
/// `last_access` is a value of the owning cache's logical clock rather than a
/// wall-clock time: stamps are strictly increasing, so two accesses never tie
/// and LRU order matches the order in which accesses happened.
#[derive(Debug)]
pub struct CacheEntry {
    order: Arc<Order>,
    expires_at: Instant,
    last_access: AtomicU64,
}

impl CacheEntry {
    /// Create an entry that expires at `expires_at`.
    pub fn new(order: Arc<Order>, expires_at: Instant, stamp: u64) -> Self {
        Self {
            order,
            expires_at,
            last_access: AtomicU64::new(stamp),
        }
    }

    /// Shared handle to the cached record
    #[inline]
    pub fn order(&self) -> &Arc<Order> {
        &self.order
    }

    #[inline]
    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    /// An entry is live strictly before its deadline.
    #[inline]
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    /// Record an access. Safe under a shared lock.
    #[inline]
    pub fn touch(&self, stamp: u64) {
        self.last_access.fetch_max(stamp, Ordering::Relaxed);
    }

    #[inline]
    pub fn last_access(&self) -> u64 {
        self.last_access.load(Ordering::Relaxed)
    }
}
