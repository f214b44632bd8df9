//! Order Cache - cache-aside read service for order records
//!
//! Keeps a bounded, expiring in-memory copy of order records in front of a
//! persistent store so repeat reads skip the store.
//!
//! # Architecture
//!
//! The service follows a ports-and-adapters layout:
//!
//! ```text
//!   ingest (messages) ──┐                       ┌──▶ OrderRepository (store)
//!                       ├──▶ OrderService ──────┤
//!   http (reads) ───────┘   (cache-aside)       └──▶ OrderCache (MemoryCache)
//! ```
//!
//! Writes go to the store first and are then cached best-effort. Reads try
//! the cache and fall through to the store, populating the cache on the way
//! back.
//!
//! # Modules
//!
//! - [`adapters`] - Store implementations (in-memory, file-backed)
//! - [`cache`] - Bounded TTL + LRU memory cache with background sweeper
//! - [`domain`] - Order model, validation and ports
//! - [`dto`] - Wire shapes for inbound messages and read responses
//! - [`error`] - Error types
//! - [`http`] - HTTP read API
//! - [`ingest`] - Inbound message consumer
//! - [`telemetry`] - Prometheus counters
//! - [`usecase`] - Cache-aside orchestration

pub mod adapters;
pub mod cache;
pub mod domain;
pub mod dto;
pub mod error;
pub mod http;
pub mod ingest;
pub mod telemetry;
pub mod usecase;

// Re-export commonly used types
pub use cache::{CacheConfig, MemoryCache};
pub use domain::{Order, OrderCache, OrderRepository};
pub use error::{Error, Result};
pub use usecase::{CacheStats, OrderService};
