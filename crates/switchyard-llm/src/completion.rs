//! Completion request and response types
//!
//! The request payload is opaque to the router; only the capability tags,
//! constraints and idempotency key influence routing and execution.

use crate::error::{Error, Result};
use crate::executor::CandidateFailure;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;
use uuid::Uuid;

/// Hard limits a candidate must satisfy to be considered at all
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    /// Highest acceptable cost per 1000 tokens
    #[serde(default)]
    pub max_cost_per_1k: Option<f64>,
    /// Highest acceptable average latency
    #[serde(default)]
    pub max_latency_ms: Option<u64>,
    /// Smallest acceptable context window
    #[serde(default)]
    pub min_context: Option<u64>,
}

/// A unit of work submitted to the executor
///
/// Built by the caller and never mutated once submitted.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Request ID (for log correlation)
    pub id: Uuid,
    /// Provider-facing payload, passed through untouched
    pub payload: serde_json::Value,
    /// Capabilities every candidate must score well on
    pub required: BTreeSet<String>,
    /// Capabilities that improve a candidate's rank
    pub preferred: BTreeSet<String>,
    /// Hard constraints
    pub constraints: Constraints,
    /// At-most-once key for side-effecting requests
    pub idempotency_key: Option<String>,
    /// Rate tokens this request consumes (executor default when unset)
    pub rate_tokens: Option<f64>,
    /// Per-dispatch deadline (executor default when unset)
    pub attempt_timeout: Option<Duration>,
}

impl CompletionRequest {
    /// Create a request around an opaque payload
    #[must_use]
    pub fn new(payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            payload,
            required: BTreeSet::new(),
            preferred: BTreeSet::new(),
            constraints: Constraints::default(),
            idempotency_key: None,
            rate_tokens: None,
            attempt_timeout: None,
        }
    }

    /// Add a required capability
    #[must_use]
    pub fn require(mut self, capability: impl Into<String>) -> Self {
        self.required.insert(capability.into());
        self
    }

    /// Add a preferred capability
    #[must_use]
    pub fn prefer(mut self, capability: impl Into<String>) -> Self {
        self.preferred.insert(capability.into());
        self
    }

    /// Set the cost ceiling (per 1000 tokens)
    #[must_use]
    pub fn with_max_cost(mut self, max_cost_per_1k: f64) -> Self {
        self.constraints.max_cost_per_1k = Some(max_cost_per_1k);
        self
    }

    /// Set the latency ceiling
    #[must_use]
    pub fn with_max_latency_ms(mut self, max_latency_ms: u64) -> Self {
        self.constraints.max_latency_ms = Some(max_latency_ms);
        self
    }

    /// Set the minimum context window
    #[must_use]
    pub fn with_min_context(mut self, min_context: u64) -> Self {
        self.constraints.min_context = Some(min_context);
        self
    }

    /// Replace all constraints
    #[must_use]
    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }

    /// Mark the request as side-effecting under `key`
    #[must_use]
    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }

    /// Override the rate tokens consumed per dispatch
    #[must_use]
    pub fn with_rate_tokens(mut self, tokens: f64) -> Self {
        self.rate_tokens = Some(tokens);
        self
    }

    /// Override the per-dispatch deadline
    #[must_use]
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = Some(timeout);
        self
    }

    /// Check the per-request overrides
    pub fn validate(&self) -> Result<()> {
        if let Some(tokens) = self.rate_tokens {
            if !tokens.is_finite() || tokens <= 0.0 {
                return Err(Error::invalid_config(
                    "request.rate_tokens",
                    format!("must be a positive number, got {tokens}"),
                ));
            }
        }
        if self.attempt_timeout == Some(Duration::ZERO) {
            return Err(Error::invalid_config(
                "request.attempt_timeout",
                "must be positive when set",
            ));
        }
        Ok(())
    }
}

/// Token usage information
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Prompt tokens
    pub input_tokens: u32,
    /// Completion tokens
    pub output_tokens: u32,
}

impl TokenUsage {
    /// Create a usage record
    #[must_use]
    pub fn new(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    /// Input plus output tokens
    #[must_use]
    pub fn total(&self) -> u64 {
        u64::from(self.input_tokens) + u64::from(self.output_tokens)
    }
}

/// Response returned by a provider adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// Generated content
    pub content: String,
    /// Token usage
    pub usage: Option<TokenUsage>,
    /// Finish reason
    pub finish_reason: Option<String>,
    /// Model that produced the response
    pub model: String,
}

impl CompletionResponse {
    /// Create a response with content only
    #[must_use]
    pub fn new(model: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            usage: None,
            finish_reason: Some("stop".to_string()),
            model: model.into(),
        }
    }

    /// Attach token usage
    #[must_use]
    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = Some(usage);
        self
    }
}

/// A successful `submit`, with the routing history that led to it
#[derive(Debug, Clone)]
pub struct Completion {
    /// The provider's response
    pub response: CompletionResponse,
    /// Provider that answered
    pub provider: String,
    /// Model that answered
    pub model: String,
    /// Dispatches made against the answering candidate
    pub attempts: u32,
    /// Latency of the successful dispatch
    pub latency: Duration,
    /// Cost charged for the successful dispatch
    pub cost: f64,
    /// Candidates tried and abandoned before this one
    pub prior_failures: Vec<CandidateFailure>,
    /// Served from the idempotency ledger without dispatching
    pub replayed: bool,
}

impl Completion {
    /// Whether a lower-ranked candidate had to answer
    #[must_use]
    pub fn failed_over(&self) -> bool {
        !self.prior_failures.is_empty()
    }
}
