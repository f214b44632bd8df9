//! Order Ingestion
//!
//! Inbound order messages flow from a source through the handler into the
//! service:
//!
//! ```text
//! MessageSource ──▶ Consumer ──▶ OrderMessageHandler ──▶ OrderService::create
//!  (JSON lines,        │              (decode, reject
//!   channel)           │               empty uid)
//!                      └── failures logged + counted, loop continues
//! ```

mod consumer;
mod handler;
mod source;

pub use consumer::{Consumer, ConsumerStats};
pub use handler::OrderMessageHandler;
pub use source::{JsonLinesSource, MessageSource};
