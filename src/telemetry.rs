//! Prometheus Metrics
//!
//! Process-wide counters registered in the default prometheus registry and
//! exposed by the HTTP server at `/metrics`.

use once_cell::sync::Lazy;
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};
use prometheus::{Encoder, TextEncoder};

use crate::error::{Error, Result};

/// Orders persisted through the service
pub static ORDERS_CREATED: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "ordercache_orders_created_total",
        "Total number of orders persisted"
    )
    .expect("metric can be registered")
});

/// Read lookups by outcome: `hit`, `miss`, `not_found`
pub static CACHE_LOOKUPS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "ordercache_cache_lookups_total",
        "Order reads by cache outcome",
        &["result"]
    )
    .expect("metric can be registered")
});

/// Inbound messages by outcome: `ok`, `decode_error`, `rejected`, `failed`
pub static INGEST_MESSAGES: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "ordercache_ingest_messages_total",
        "Inbound order messages by outcome",
        &["status"]
    )
    .expect("metric can be registered")
});

/// Encode the default registry in the text exposition format.
pub fn gather_text() -> Result<(String, Vec<u8>)> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&prometheus::gather(), &mut buffer)
        .map_err(|e| Error::Internal(format!("Failed to encode metrics: {}", e)))?;
    Ok((encoder.format_type().to_string(), buffer))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_appear_in_exposition() {
        ORDERS_CREATED.inc();
        CACHE_LOOKUPS.with_label_values(&["hit"]).inc();

        let (content_type, body) = gather_text().unwrap();
        let text = String::from_utf8(body).unwrap();

        assert!(content_type.starts_with("text/plain"));
        assert!(text.contains("ordercache_orders_created_total"));
        assert!(text.contains("ordercache_cache_lookups_total{result=\"hit\"}"));
    }
}
