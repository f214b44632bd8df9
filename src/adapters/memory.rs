//! In-Memory Order Repository
//!
//! Implements the `OrderRepository` port on a `DashMap`. Used when no data
//! directory is configured and as the store double in tests; per-operation
//! counters make store traffic observable.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use tokio_util::sync::CancellationToken;

use crate::domain::{Order, OrderRepository};
use crate::error::{Error, Result};

/// Repository operation counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepositoryStats {
    pub saves: u64,
    pub reads: u64,
    pub lists: u64,
    pub deletes: u64,
}

/// DashMap-backed order repository
#[derive(Debug, Default)]
pub struct InMemoryOrderRepository {
    orders: DashMap<String, Order>,
    saves: AtomicU64,
    reads: AtomicU64,
    lists: AtomicU64,
    deletes: AtomicU64,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get operation counters
    pub fn stats(&self) -> RepositoryStats {
        RepositoryStats {
            saves: self.saves.load(Ordering::Relaxed),
            reads: self.reads.load(Ordering::Relaxed),
            lists: self.lists.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
        }
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

fn ensure_live(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }
    Ok(())
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn save(&self, cancel: &CancellationToken, order: &Order) -> Result<()> {
        ensure_live(cancel)?;
        self.saves.fetch_add(1, Ordering::Relaxed);
        self.orders.insert(order.order_uid.clone(), order.clone());
        Ok(())
    }

    async fn get_by_id(&self, cancel: &CancellationToken, order_uid: &str) -> Result<Order> {
        ensure_live(cancel)?;
        self.reads.fetch_add(1, Ordering::Relaxed);
        self.orders
            .get(order_uid)
            .map(|order| order.value().clone())
            .ok_or_else(|| Error::OrderNotFound {
                order_uid: order_uid.to_string(),
            })
    }

    async fn get_all(&self, cancel: &CancellationToken) -> Result<Vec<Order>> {
        ensure_live(cancel)?;
        self.lists.fetch_add(1, Ordering::Relaxed);
        Ok(self
            .orders
            .iter()
            .map(|order| order.value().clone())
            .collect())
    }

    async fn delete(&self, cancel: &CancellationToken, order_uid: &str) -> Result<()> {
        ensure_live(cancel)?;
        self.deletes.fetch_add(1, Ordering::Relaxed);
        self.orders
            .remove(order_uid)
            .map(|_| ())
            .ok_or_else(|| Error::OrderNotFound {
                order_uid: order_uid.to_string(),
            })
    }

    async fn count(&self, cancel: &CancellationToken) -> Result<usize> {
        ensure_live(cancel)?;
        Ok(self.orders.len())
    }
}
