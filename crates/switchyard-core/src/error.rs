//! Error types for switchyard-core

use std::time::Duration;
use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration value
    #[error("invalid configuration: {field}: {message}")]
    InvalidConfig {
        /// Config field name
        field: String,
        /// Detailed message
        message: String,
    },

    /// Rate tokens did not become available before the caller's deadline
    #[error("timed out after {}ms waiting for rate tokens from {provider}", waited.as_millis())]
    AcquireTimeout {
        /// Provider whose bucket was exhausted
        provider: String,
        /// How long the caller waited
        waited: Duration,
    },

    /// The request needs more tokens than the bucket can ever hold
    #[error("{provider} bucket holds at most {capacity} tokens, {requested} requested")]
    ExceedsCapacity {
        /// Provider name
        provider: String,
        /// Tokens requested
        requested: f64,
        /// Bucket capacity
        capacity: f64,
    },

    /// The caller cancelled the wait
    #[error("cancelled")]
    Cancelled,
}

impl Error {
    /// Shorthand for an [`Error::InvalidConfig`]
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
