//! Switchyard LLM - Capability routing and resilient execution
//!
//! This crate turns the primitives in `switchyard-core` into a request
//! router for large-language-model providers:
//! - Capability router: filters and ranks provider/model pairs per request
//! - Error classifier: maps raw provider failures to retry decisions
//! - Resilient executor: rate gate, dispatch, retry, failover, idempotency
//! - Health tracker: rolling success rate, latency, cost and circuit state
//!
//! Vendor integrations plug in through the [`ProviderAdapter`] trait.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod classify;
pub mod completion;
pub mod config;
pub mod error;
pub mod executor;
pub mod health;
pub mod idempotency;
pub mod provider;
pub mod router;

pub use classify::{parse_retry_after, ClassifiedError, ErrorCategory, ErrorClassifier};
pub use completion::{Completion, CompletionRequest, CompletionResponse, Constraints, TokenUsage};
pub use config::{
    ExecutorSettings, HealthSettings, IdempotencySettings, ProviderSettings, SwitchyardConfig,
};
pub use error::{Error, Result};
pub use executor::{
    CandidateFailure, ExecutorBuilder, ExecutorConfig, ExhaustionError, FailureReason,
    ResilientExecutor,
};
pub use health::{format_report, HealthConfig, HealthTracker, ProviderTelemetry, TelemetrySnapshot};
pub use idempotency::{Claim, IdempotencyConfig, IdempotencyLedger, KeyState};
pub use provider::{
    DispatchCall, DispatchFuture, FnProvider, ProviderAdapter, ProviderError, ScriptedProvider,
    TransportKind,
};
pub use router::{CapabilityRouter, ProviderModelSpec, RoutingRules, ScoredCandidate};
