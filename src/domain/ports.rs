//! Domain Ports (DDD Port/Adapter Pattern)
//!
//! This module defines the abstractions the order service depends on.
//! Infrastructure adapters implement these traits to provide concrete
//! storage, and the cache engine implements the cache port.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Domain Layer                            │
//! │  ┌─────────────────────────────────────────────────────┐    │
//! │  │                    Ports (Traits)                    │    │
//! │  │        OrderRepository    │    OrderCache            │    │
//! │  └─────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Infrastructure Layer                       │
//! │  ┌─────────────────────────────────────────────────────┐    │
//! │  │                  Adapters (Impls)                    │    │
//! │  │  InMemoryOrderRepository │ FileOrderRepository      │    │
//! │  │  MemoryCache                                         │    │
//! │  └─────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use super::order::Order;
use crate::error::Result;

// =============================================================================
// Persistent Store Port
// =============================================================================

/// Port for durable order storage.
///
/// Every operation takes a cancellation token; implementations abort with
/// [`Error::Cancelled`](crate::error::Error::Cancelled) once it fires.
///
/// # Example
///
/// ```ignore
/// struct PostgresOrderRepository { /* ... */ }
///
/// #[async_trait]
/// impl OrderRepository for PostgresOrderRepository {
///     async fn get_by_id(&self, cancel: &CancellationToken, order_uid: &str) -> Result<Order> {
///         // SELECT ... WHERE order_uid = $1
///     }
/// }
/// ```
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Insert or replace an order.
    async fn save(&self, cancel: &CancellationToken, order: &Order) -> Result<()>;

    /// Fetch an order. Absent orders yield `Error::OrderNotFound`.
    async fn get_by_id(&self, cancel: &CancellationToken, order_uid: &str) -> Result<Order>;

    /// List every stored order.
    async fn get_all(&self, cancel: &CancellationToken) -> Result<Vec<Order>>;

    /// Delete an order. Absent orders yield `Error::OrderNotFound`.
    async fn delete(&self, cancel: &CancellationToken, order_uid: &str) -> Result<()>;

    /// Number of stored orders.
    async fn count(&self, cancel: &CancellationToken) -> Result<usize>;
}

// =============================================================================
// Cache Port
// =============================================================================

/// Point-in-time cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheMetrics {
    pub max_size: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expired: u64,
}

/// Port for the in-memory order cache.
///
/// Cache operations are synchronous: they only touch memory and must never
/// wait on I/O. Records are shared as `Arc<Order>` and are read-only once
/// cached.
pub trait OrderCache: Send + Sync {
    /// Insert or replace an entry, evicting if the cache is full.
    fn set(&self, order_uid: &str, order: Arc<Order>) -> Result<()>;

    /// Fetch a live entry. Absent or expired entries yield `Error::CacheMiss`.
    fn get(&self, order_uid: &str) -> Result<Arc<Order>>;

    /// Remove an entry. Absent entries yield `Error::CacheMiss`.
    fn delete(&self, order_uid: &str) -> Result<()>;

    /// Bulk insert at startup. Returns how many records were accepted.
    fn load_all(&self, orders: Vec<Arc<Order>>) -> Result<usize>;

    /// Every live record, without counting as an access.
    fn get_all(&self) -> Result<Vec<Arc<Order>>>;

    /// Number of live entries.
    fn count(&self) -> usize;

    /// Drop every entry.
    fn clear(&self) -> Result<()>;

    /// Counters for health reporting.
    fn metrics(&self) -> CacheMetrics {
        CacheMetrics::default()
    }
}

// =============================================================================
// Tests
// =============================================================================
