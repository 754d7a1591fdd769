//! Raw provider failures
//!
//! Adapters report what went wrong in transport terms; turning that into a
//! retry decision is the classifier's job.

use serde::{Deserialize, Serialize};

/// Where in the call the failure happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// The provider answered with an error status
    Http,
    /// The call exceeded its deadline
    Timeout,
    /// The connection failed or was reset
    Connection,
    /// The provider answered but the body could not be decoded
    Decode,
    /// Anything else
    Other,
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Http => "http",
            Self::Timeout => "timeout",
            Self::Connection => "connection",
            Self::Decode => "decode",
            Self::Other => "other",
        };
        f.write_str(s)
    }
}

/// A failed provider call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderError {
    /// Transport-level failure kind
    pub kind: TransportKind,
    /// HTTP status, when the provider answered
    pub status: Option<u16>,
    /// Provider message
    pub message: String,
    /// Raw `Retry-After` header value
    pub retry_after: Option<String>,
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} error (HTTP {}): {}", self.kind, status, self.message),
            None => write!(f, "{} error: {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for ProviderError {}

impl ProviderError {
    fn new(kind: TransportKind, status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            kind,
            status,
            message: message.into(),
            retry_after: None,
        }
    }

    /// Error status returned by the provider
    #[must_use]
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::new(TransportKind::Http, Some(status), message)
    }

    /// Deadline exceeded
    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(TransportKind::Timeout, None, message)
    }

    /// Connection refused, reset or dropped
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(TransportKind::Connection, None, message)
    }

    /// Response body could not be decoded
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(TransportKind::Decode, None, message)
    }

    /// Unrecognised failure
    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Self::new(TransportKind::Other, None, message)
    }

    /// Attach the provider's `Retry-After` header value
    #[must_use]
    pub fn with_retry_after(mut self, value: impl Into<String>) -> Self {
        self.retry_after = Some(value.into());
        self
    }
}
