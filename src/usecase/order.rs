//! Order Service - cache-aside orchestration
//!
//! Sits between the transports and the store:
//!
//! ```text
//! create:      validate ──▶ repo.save ──▶ cache.set (best-effort)
//! get_by_uid:  cache.get ──hit──▶ return
//!                  └─miss──▶ repo.get_by_id ──▶ cache.set (best-effort) ──▶ return
//! ```
//!
//! The store is authoritative. Cache writes never fail an operation: a
//! failed populate is logged at warn and dropped.

use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::domain::{CacheMetrics, Order, OrderCache, OrderRepository};
use crate::dto::{CreateOrderInput, OrderOutput};
use crate::error::{Error, Result};
use crate::telemetry::{CACHE_LOOKUPS, ORDERS_CREATED};

/// Cache statistics for health reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Live (non-expired) cached orders
    pub cached_orders: usize,
    #[serde(flatten)]
    pub metrics: CacheMetrics,
}

/// Cache-aside orchestration over a repository and a cache
#[derive(Clone)]
pub struct OrderService {
    repo: Arc<dyn OrderRepository>,
    cache: Arc<dyn OrderCache>,
}

impl OrderService {
    pub fn new(repo: Arc<dyn OrderRepository>, cache: Arc<dyn OrderCache>) -> Self {
        Self { repo, cache }
    }

    /// Validate, persist, then cache a new order.
    ///
    /// Validation and store failures are returned. A cache failure after a
    /// successful save is logged and ignored.
    #[instrument(skip(self, cancel, input), fields(order_uid = %input.order_uid))]
    pub async fn create(&self, cancel: &CancellationToken, input: CreateOrderInput) -> Result<()> {
        let order = input.into_domain()?;

        self.repo.save(cancel, &order).await?;
        ORDERS_CREATED.inc();

        self.populate(Arc::new(order));
        Ok(())
    }

    /// Read an order, serving from cache when possible.
    #[instrument(skip(self, cancel))]
    pub async fn get_by_uid(&self, cancel: &CancellationToken, order_uid: &str) -> Result<OrderOutput> {
        if order_uid.is_empty() {
            return Err(Error::InvalidIdentifier);
        }

        match self.cache.get(order_uid) {
            Ok(order) => {
                CACHE_LOOKUPS.with_label_values(&["hit"]).inc();
                return Ok(OrderOutput::from(order.as_ref()));
            }
            Err(e) if e.is_not_found() => debug!("Cache miss, reading through to store"),
            Err(e) => warn!(error = %e, "Cache read failed, reading through to store"),
        }

        let order = match self.repo.get_by_id(cancel, order_uid).await {
            Ok(order) => order,
            Err(e) => {
                if e.is_not_found() {
                    CACHE_LOOKUPS.with_label_values(&["not_found"]).inc();
                }
                return Err(e);
            }
        };
        CACHE_LOOKUPS.with_label_values(&["miss"]).inc();

        let output = OrderOutput::from(&order);
        self.populate(Arc::new(order));
        Ok(output)
    }

    /// List orders.
    ///
    /// A non-empty cache is served as-is; the store is consulted only when
    /// the cache holds nothing. After evictions or expiry the cached view can
    /// be a subset of the store, so this listing is eventually consistent.
    #[instrument(skip(self, cancel))]
    pub async fn get_all(&self, cancel: &CancellationToken) -> Result<Vec<OrderOutput>> {
        match self.cache.get_all() {
            Ok(orders) if !orders.is_empty() => {
                return Ok(orders.iter().map(|o| OrderOutput::from(o.as_ref())).collect());
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Cache listing failed, reading from store"),
        }

        let orders = self.repo.get_all(cancel).await?;
        Ok(orders.iter().map(OrderOutput::from).collect())
    }

    /// Bulk-load the store into the cache. Returns how many orders were
    /// cached.
    ///
    /// Meant to run once at startup; callers should treat failure as a
    /// degraded start rather than a fatal one.
    #[instrument(skip(self, cancel))]
    pub async fn restore_cache(&self, cancel: &CancellationToken) -> Result<usize> {
        let orders = self.repo.get_all(cancel).await?;
        let total = orders.len();

        let loaded = self
            .cache
            .load_all(orders.into_iter().map(Arc::new).collect())?;

        if loaded < total {
            warn!(loaded, total, "Cache capacity reached during restore");
        }
        info!(loaded, total, "Cache restored from store");
        Ok(loaded)
    }

    /// Current cache statistics.
    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            cached_orders: self.cache.count(),
            metrics: self.cache.metrics(),
        }
    }

    /// Best-effort cache write. The store already holds the record, so a
    /// failure here only costs a future cache miss.
    fn populate(&self, order: Arc<Order>) {
        if let Err(e) = self.cache.set(&order.order_uid, Arc::clone(&order)) {
            warn!(
                order_uid = %order.order_uid,
                error = %e,
                "Failed to cache order, store remains authoritative"
            );
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
