//! Error types for switchyard-llm

use crate::classify::ErrorCategory;
use crate::executor::ExhaustionError;
use thiserror::Error;

/// Router error type
#[derive(Debug, Error)]
pub enum Error {
    /// No model in the table satisfies the request
    #[error("no candidate satisfies required capabilities {required:?} and constraints ({considered} models considered)")]
    NoCandidate {
        /// Required capability tags of the request
        required: Vec<String>,
        /// Size of the table that was searched
        considered: usize,
    },

    /// Every candidate was tried and failed
    #[error(transparent)]
    Exhausted(#[from] ExhaustionError),

    /// The caller cancelled the request
    #[error("request cancelled")]
    Cancelled,

    /// A side-effecting request may or may not have taken effect
    #[error("outcome of request with idempotency key '{key}' is unknown; refusing to dispatch again")]
    AmbiguousOutcome {
        /// The idempotency key
        key: String,
        /// Provider whose dispatch outcome is unknown, if this request made it
        provider: Option<String>,
    },

    /// Invalid configuration value
    #[error("invalid configuration: {field}: {message}")]
    InvalidConfig {
        /// Config field name
        field: String,
        /// Detailed message
        message: String,
    },

    /// Error from the resilience primitives
    #[error(transparent)]
    Core(#[from] switchyard_core::Error),
}

impl Error {
    /// Shorthand for an [`Error::InvalidConfig`]
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Whether submitting the same request again cannot succeed
    ///
    /// True when nothing can serve the request as shaped, when every
    /// candidate rejected it as a client error, or when resubmitting would
    /// risk a duplicate side effect.
    #[must_use]
    pub fn is_terminal_for_request(&self) -> bool {
        match self {
            Self::NoCandidate { .. } | Self::AmbiguousOutcome { .. } | Self::InvalidConfig { .. } => {
                true
            }
            Self::Exhausted(exhaustion) => exhaustion.all_client_errors(),
            Self::Cancelled => false,
            Self::Core(err) => matches!(
                err,
                switchyard_core::Error::InvalidConfig { .. }
                    | switchyard_core::Error::ExceedsCapacity { .. }
            ),
        }
    }

    /// Category of the last classified provider failure, if any
    #[must_use]
    pub fn category(&self) -> Option<ErrorCategory> {
        match self {
            Self::Exhausted(exhaustion) => exhaustion.last_category(),
            _ => None,
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
