//! Consumer loop: pull, handle, repeat.

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::handler::OrderMessageHandler;
use super::source::MessageSource;
use crate::error::{Error, Result};

/// Outcome counts for one consumer run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumerStats {
    pub processed: u64,
    pub failed: u64,
}

/// Drives a `MessageSource` through an `OrderMessageHandler`
pub struct Consumer<S> {
    source: S,
    handler: OrderMessageHandler,
}

impl<S: MessageSource> Consumer<S> {
    pub fn new(source: S, handler: OrderMessageHandler) -> Self {
        Self { source, handler }
    }

    /// Consume until the source is exhausted or `cancel` fires.
    ///
    /// A message that fails to decode or persist is logged and counted; it
    /// never stops the loop. Only a source read error ends the run early.
    pub async fn run(mut self, cancel: CancellationToken) -> Result<ConsumerStats> {
        info!("Starting order consumer");
        let mut stats = ConsumerStats::default();

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Consumer shutdown requested");
                    break;
                }
                next = self.source.next_message() => next,
            };

            let payload = match next {
                Ok(Some(payload)) => payload,
                Ok(None) => {
                    info!("Message source exhausted");
                    break;
                }
                Err(e) => {
                    error!(error = %e, "Message source failed");
                    return Err(e);
                }
            };

            match self.handler.handle(&cancel, &payload).await {
                Ok(_) => stats.processed += 1,
                Err(Error::Cancelled) => {
                    warn!("Message interrupted by shutdown");
                    break;
                }
                // Already logged by the handler
                Err(_) => stats.failed += 1,
            }
        }

        info!(
            processed = stats.processed,
            failed = stats.failed,
            "Order consumer stopped"
        );
        Ok(stats)
    }
}
