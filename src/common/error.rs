//! Error types for the application.

use std::time::Duration;

use thiserror::Error;

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {message}")]
    ParseError { message: String },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

/// Errors returned when handing a message to the delivery queue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    #[error("Yell queue is full ({capacity} messages pending), retry later")]
    Full { capacity: usize },
}

/// Failure reported by the external send API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    /// The platform throttled us and asked to wait before the next attempt.
    #[error("Rate limited, retry after {}ms", retry_after.as_millis())]
    Throttled { retry_after: Duration },

    /// Any other failure. These are not retried.
    #[error("Send failed: {0}")]
    Transient(String),
}
