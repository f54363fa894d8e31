//! Error types for appsflyer-relay-core

use thiserror::Error;

use crate::validate::InvalidReason;

/// Main error type for the appsflyer-relay-core library
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Inbound message could not be turned into an event
    #[error("message error: {0}")]
    Message(String),

    /// Event or settings are not deliverable; the caller has to fix something
    #[error("invalid: {0}")]
    Invalid(#[from] InvalidReason),

    /// Delivery failed after the transport gave up
    #[error(
        "delivery failed{}: {}",
        .status.map(|s| format!(" ({})", s)).unwrap_or_default(),
        .message
    )]
    Delivery {
        /// HTTP status, when the destination answered at all
        status: Option<u16>,
        message: String,
    },
}

impl Error {
    /// True for validation failures ("fix your config")
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Invalid(_))
    }

    /// True for transport/HTTP failures ("retry later")
    pub fn is_delivery(&self) -> bool {
        matches!(self, Error::Delivery { .. })
    }
}

/// Result type alias for appsflyer-relay-core
pub type Result<T> = std::result::Result<T, Error>;
