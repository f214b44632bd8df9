//! Use Cases
//!
//! Application services that coordinate the domain ports. Transports call
//! into these; they never reach the store or the cache directly.

mod order;

pub use order::{CacheStats, OrderService};
