//! Per-message handling: decode, pre-check, hand off to the service.

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument};

use crate::domain::ValidationError;
use crate::dto::CreateOrderInput;
use crate::error::{Error, Result};
use crate::telemetry::INGEST_MESSAGES;
use crate::usecase::OrderService;

/// Turns raw order messages into `OrderService::create` calls
#[derive(Clone)]
pub struct OrderMessageHandler {
    service: OrderService,
}

impl OrderMessageHandler {
    pub fn new(service: OrderService) -> Self {
        Self { service }
    }

    /// Handle one message payload. Returns the created order's uid.
    #[instrument(skip_all, fields(bytes = payload.len()))]
    pub async fn handle(&self, cancel: &CancellationToken, payload: &[u8]) -> Result<String> {
        debug!("Received order message");

        let input: CreateOrderInput = match serde_json::from_slice(payload) {
            Ok(input) => input,
            Err(e) => {
                INGEST_MESSAGES.with_label_values(&["decode_error"]).inc();
                error!(error = %e, "Failed to decode order message");
                return Err(Error::Decode(e.to_string()));
            }
        };

        if input.order_uid.is_empty() {
            INGEST_MESSAGES.with_label_values(&["rejected"]).inc();
            error!("Received order with empty order_uid");
            return Err(ValidationError::EmptyOrderUid.into());
        }

        let order_uid = input.order_uid.clone();
        info!(%order_uid, "Processing order");

        if let Err(e) = self.service.create(cancel, input).await {
            let status = if e.is_client_error() { "rejected" } else { "failed" };
            INGEST_MESSAGES.with_label_values(&[status]).inc();
            error!(%order_uid, error = %e, "Failed to create order");
            return Err(e);
        }

        INGEST_MESSAGES.with_label_values(&["ok"]).inc();
        info!(%order_uid, "Order stored and cached");
        Ok(order_uid)
    }
}
