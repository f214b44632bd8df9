//! Error types for the order cache service

use thiserror::Error;

use crate::domain::ValidationError;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the order cache service
#[derive(Error, Debug)]
pub enum Error {
    /// Record failed domain validation
    #[error("Invalid order data: {0}")]
    Validation(#[from] ValidationError),

    /// Empty order identifier on a read path
    #[error("order_uid cannot be empty")]
    InvalidIdentifier,

    /// Cache called with an unusable argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Entry absent or expired in the cache
    #[error("Order not found in cache: {order_uid}")]
    CacheMiss { order_uid: String },

    /// Order absent from both cache and store
    #[error("Order not found: {order_uid}")]
    OrderNotFound { order_uid: String },

    /// Persistent store failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Inbound message could not be decoded
    #[error("Failed to decode message: {0}")]
    Decode(String),

    /// Operation aborted by its cancellation token
    #[error("Operation cancelled")]
    Cancelled,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for cache or store misses.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::CacheMiss { .. } | Error::OrderNotFound { .. })
    }

    /// True when the caller sent something unusable.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::Validation(_)
                | Error::InvalidIdentifier
                | Error::InvalidArgument(_)
                | Error::Decode(_)
        )
    }
}
