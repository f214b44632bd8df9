//! Domain Layer
//!
//! This module contains the order record model and the ports the service
//! depends on, following Domain-Driven Design principles.
//!
//! # Architecture
//!
//! - **Order** (`order.rs`) - Self-validating record and value objects
//! - **Ports** (`ports.rs`) - Trait abstractions for the store and the cache
//!
//! # Usage
//!
//! ```ignore
//! use ordercache::domain::{Order, OrderCache, OrderRepository};
//!
//! async fn warm<R, C>(repo: &R, cache: &C, cancel: &CancellationToken) -> Result<usize>
//! where
//!     R: OrderRepository,
//!     C: OrderCache,
//! {
//!     let orders = repo.get_all(cancel).await?;
//!     cache.load_all(orders.into_iter().map(Arc::new).collect())
//! }
//! ```

pub mod order;
pub mod ports;

pub use order::{Delivery, Item, Order, Payment, ValidationError};
pub use ports::{CacheMetrics, OrderCache, OrderRepository};
