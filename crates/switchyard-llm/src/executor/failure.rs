//! Per-candidate failure records
//!
//! Every candidate the executor gives up on leaves a [`CandidateFailure`];
//! when none succeeds they are returned together as an [`ExhaustionError`].

use crate::classify::{ClassifiedError, ErrorCategory};
use crate::router::ScoredCandidate;
use std::time::Duration;
use uuid::Uuid;

/// Why a candidate was abandoned
#[derive(Debug, Clone, PartialEq)]
pub enum FailureReason {
    /// The provider failed and the failure was classified
    Classified(ClassifiedError),
    /// The provider's circuit was open; nothing was dispatched
    CircuitOpen {
        /// Time left until the breaker allows a trial
        retry_in: Duration,
    },
    /// Rate tokens did not arrive before the acquire deadline
    RateGateTimeout {
        /// How long the executor waited
        waited: Duration,
    },
    /// The request needs more rate tokens than the provider's bucket holds
    ExceedsRateCapacity {
        /// Tokens requested
        requested: f64,
        /// Bucket capacity
        capacity: f64,
    },
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Classified(err) => write!(f, "{err}"),
            Self::CircuitOpen { retry_in } => {
                write!(f, "circuit open (retry in {}ms)", retry_in.as_millis())
            }
            Self::RateGateTimeout { waited } => {
                write!(f, "rate gate timed out after {}ms", waited.as_millis())
            }
            Self::ExceedsRateCapacity {
                requested,
                capacity,
            } => write!(f, "needs {requested} rate tokens, bucket holds {capacity}"),
        }
    }
}

/// Terminal outcome of one candidate
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateFailure {
    /// Provider name
    pub provider: String,
    /// Model name
    pub model: String,
    /// Why the candidate was abandoned
    pub reason: FailureReason,
    /// Dispatches made to this candidate
    pub attempts: u32,
}

impl CandidateFailure {
    pub(crate) fn new(candidate: &ScoredCandidate, reason: FailureReason, attempts: u32) -> Self {
        Self {
            provider: candidate.provider().to_string(),
            model: candidate.model().to_string(),
            reason,
            attempts,
        }
    }

    /// Dispatches beyond the first
    #[must_use]
    pub fn retries(&self) -> u32 {
        self.attempts.saturating_sub(1)
    }

    /// Category of the final failure, when the provider was reached
    #[must_use]
    pub fn category(&self) -> Option<ErrorCategory> {
        match &self.reason {
            FailureReason::Classified(err) => Some(err.category),
            _ => None,
        }
    }
}

impl std::fmt::Display for CandidateFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}: {} after {} attempt(s)",
            self.provider, self.model, self.reason, self.attempts
        )
    }
}

/// Every candidate failed
#[derive(Debug, Clone, PartialEq)]
pub struct ExhaustionError {
    /// Request the failures belong to
    pub request_id: Uuid,
    /// One entry per candidate, in the order they were tried
    pub failures: Vec<CandidateFailure>,
}

impl ExhaustionError {
    /// Whether every candidate reached the provider and was told the
    /// request itself is bad
    #[must_use]
    pub fn all_client_errors(&self) -> bool {
        !self.failures.is_empty()
            && self
                .failures
                .iter()
                .all(|f| f.category() == Some(ErrorCategory::Client))
    }

    /// Category of the last classified failure
    #[must_use]
    pub fn last_category(&self) -> Option<ErrorCategory> {
        self.failures.iter().rev().find_map(CandidateFailure::category)
    }
}

impl std::fmt::Display for ExhaustionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "all {} candidate(s) failed", self.failures.len())?;
        for (i, failure) in self.failures.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{sep}{failure}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ExhaustionError {}
