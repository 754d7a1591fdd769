//! Resilient executor implementation
//!
//! This module contains the ResilientExecutor struct and the per-candidate
//! classify, backoff and failover loop.

use super::builder::{ExecutorBuilder, ExecutorConfig};
use super::failure::{CandidateFailure, ExhaustionError, FailureReason};
use crate::classify::ErrorClassifier;
use crate::completion::{Completion, CompletionRequest, CompletionResponse};
use crate::error::{Error, Result};
use crate::health::{HealthTracker, TelemetrySnapshot};
use crate::idempotency::{Claim, IdempotencyLedger};
use crate::provider::{ProviderAdapter, ProviderError};
use crate::router::{CapabilityRouter, ScoredCandidate};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use switchyard_core::{Admission, RateLimiter};
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// How a single dispatch ended
enum DispatchOutcome {
    Response(CompletionResponse),
    Failure(ProviderError),
    Cancelled,
}

/// How a candidate ended
enum CandidateOutcome {
    Success {
        response: CompletionResponse,
        attempts: u32,
        latency: Duration,
        cost: f64,
    },
    /// Give up on this candidate and move to the next
    Failed(CandidateFailure),
    /// Stop the whole request
    Abort(Error),
}

/// Mutable state of one `execute` call
struct RequestRun<'a> {
    request: &'a CompletionRequest,
    cancel: &'a CancellationToken,
    claim: Option<KeyClaim<'a>>,
}

/// An idempotency key claimed for one `execute` call
///
/// Settled explicitly with the request's result. If the call is dropped
/// first, the key is released when nothing was dispatched under it and
/// marked ambiguous otherwise.
struct KeyClaim<'a> {
    ledger: &'a IdempotencyLedger,
    key: &'a str,
    dispatched: bool,
    settled: bool,
}

impl<'a> KeyClaim<'a> {
    fn new(ledger: &'a IdempotencyLedger, key: &'a str) -> Self {
        Self {
            ledger,
            key,
            dispatched: false,
            settled: false,
        }
    }

    fn settle(mut self, result: &Result<Completion>) {
        match result {
            Ok(completion) => self.ledger.complete(self.key, completion),
            Err(_) => self.abandon(),
        }
        self.settled = true;
    }

    fn abandon(&self) {
        if self.dispatched {
            self.ledger.mark_ambiguous(self.key);
        } else {
            self.ledger.release(self.key);
        }
    }
}

impl Drop for KeyClaim<'_> {
    fn drop(&mut self) {
        if !self.settled {
            warn!(
                idempotency_key = %self.key,
                dispatched = self.dispatched,
                "Request dropped while holding its idempotency key"
            );
            self.abandon();
        }
    }
}

/// A half-open trial admission
///
/// Hands the slot back on drop unless a verdict was recorded, so a candidate
/// that ends early (or a dropped request) never leaves the breaker waiting on
/// a trial that will not report.
struct TrialSlot<'a> {
    tracker: &'a HealthTracker,
    provider: &'a str,
    held: bool,
}

impl TrialSlot<'_> {
    /// The breaker received a success or a counted failure
    fn settle(&mut self) {
        self.held = false;
    }
}

impl Drop for TrialSlot<'_> {
    fn drop(&mut self) {
        if self.held {
            debug!(provider = %self.provider, "Releasing half-open trial without a verdict");
            self.tracker.release_trial(self.provider);
        }
    }
}

/// Executes requests against ranked candidates with retries and failover
///
/// Cheap to share behind an `Arc`; all mutable state lives in the tracker,
/// limiter and ledger, each keyed and locked independently.
pub struct ResilientExecutor {
    pub(super) router: CapabilityRouter,
    pub(super) adapters: HashMap<String, Arc<dyn ProviderAdapter>>,
    pub(super) tracker: Arc<HealthTracker>,
    pub(super) limiter: Arc<RateLimiter>,
    pub(super) classifier: ErrorClassifier,
    pub(super) ledger: Arc<IdempotencyLedger>,
    pub(super) config: ExecutorConfig,
}

impl std::fmt::Debug for ResilientExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut providers: Vec<&String> = self.adapters.keys().collect();
        providers.sort();
        f.debug_struct("ResilientExecutor")
            .field("providers", &providers)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ResilientExecutor {
    /// Start assembling an executor over `router`
    #[must_use]
    pub fn builder(router: CapabilityRouter) -> ExecutorBuilder {
        ExecutorBuilder::new(router)
    }

    /// Get the router
    #[must_use]
    pub fn router(&self) -> &CapabilityRouter {
        &self.router
    }

    /// Get the health tracker
    #[must_use]
    pub fn tracker(&self) -> &Arc<HealthTracker> {
        &self.tracker
    }

    /// Get the rate limiter
    #[must_use]
    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Get the idempotency ledger
    #[must_use]
    pub fn ledger(&self) -> &Arc<IdempotencyLedger> {
        &self.ledger
    }

    /// Get the executor settings
    #[must_use]
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Current per-provider telemetry
    #[must_use]
    pub fn telemetry(&self) -> TelemetrySnapshot {
        self.tracker.snapshot()
    }

    /// Execute a request with no external cancellation
    pub async fn submit(&self, request: CompletionRequest) -> Result<Completion> {
        self.execute(request, CancellationToken::new()).await
    }

    /// Execute a request, abandoning it when `cancel` fires
    ///
    /// Returns the first successful response, [`Error::NoCandidate`] when
    /// nothing in the table fits, or [`Error::Exhausted`] listing every
    /// candidate's terminal failure.
    #[instrument(skip(self, request, cancel), fields(request_id = %request.id))]
    pub async fn execute(
        &self,
        request: CompletionRequest,
        cancel: CancellationToken,
    ) -> Result<Completion> {
        request.validate()?;
        let candidates = self.router.select_candidates(&request)?;

        let claim = match &request.idempotency_key {
            Some(key) => match self.ledger.claim(key) {
                Claim::Acquired => Some(KeyClaim::new(&self.ledger, key)),
                Claim::Completed(cached) => {
                    info!(idempotency_key = %key, "Replaying completed request from ledger");
                    let mut completion = *cached;
                    completion.replayed = true;
                    return Ok(completion);
                }
                Claim::InFlight | Claim::Ambiguous => {
                    return Err(Error::AmbiguousOutcome {
                        key: key.clone(),
                        provider: None,
                    });
                }
            },
            None => None,
        };

        let mut run = RequestRun {
            request: &request,
            cancel: &cancel,
            claim,
        };
        let result = self.run_candidates(&mut run, &candidates).await;

        if let Some(claim) = run.claim.take() {
            claim.settle(&result);
        }

        result
    }

    async fn run_candidates(
        &self,
        run: &mut RequestRun<'_>,
        candidates: &[ScoredCandidate],
    ) -> Result<Completion> {
        let mut failures = Vec::new();

        for candidate in candidates {
            if run.cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            match self.try_candidate(run, candidate).await {
                CandidateOutcome::Success {
                    response,
                    attempts,
                    latency,
                    cost,
                } => {
                    if !failures.is_empty() {
                        warn!(
                            provider = %candidate.provider(),
                            model = %candidate.model(),
                            skipped = failures.len(),
                            "Request served by fallback candidate"
                        );
                    }
                    return Ok(Completion {
                        response,
                        provider: candidate.provider().to_string(),
                        model: candidate.model().to_string(),
                        attempts,
                        latency,
                        cost,
                        prior_failures: failures,
                        replayed: false,
                    });
                }
                CandidateOutcome::Failed(failure) => {
                    info!(
                        provider = %failure.provider,
                        model = %failure.model,
                        reason = %failure.reason,
                        attempts = failure.attempts,
                        "Candidate failed, advancing"
                    );
                    failures.push(failure);
                }
                CandidateOutcome::Abort(err) => return Err(err),
            }
        }

        error!(
            request_id = %run.request.id,
            candidates = failures.len(),
            "All candidates exhausted"
        );
        Err(ExhaustionError {
            request_id: run.request.id,
            failures,
        }
        .into())
    }

    async fn try_candidate(
        &self,
        run: &mut RequestRun<'_>,
        candidate: &ScoredCandidate,
    ) -> CandidateOutcome {
        let provider = candidate.provider();
        let model = candidate.model();

        let Some(adapter) = self.adapters.get(provider) else {
            return CandidateOutcome::Abort(Error::invalid_config(
                format!("providers.{provider}"),
                "no adapter registered",
            ));
        };

        let trial = match self.tracker.admit(provider) {
            Admission::Allowed => false,
            Admission::Trial => {
                info!(provider = %provider, "Dispatching half-open trial");
                true
            }
            Admission::Rejected { retry_in } => {
                debug!(
                    provider = %provider,
                    retry_in_ms = retry_in.as_millis() as u64,
                    "Circuit open, skipping candidate"
                );
                return CandidateOutcome::Failed(CandidateFailure::new(
                    candidate,
                    FailureReason::CircuitOpen { retry_in },
                    0,
                ));
            }
        };
        let mut slot = TrialSlot {
            tracker: &self.tracker,
            provider,
            held: trial,
        };

        let tokens = run
            .request
            .rate_tokens
            .unwrap_or(self.config.rate_tokens_per_request);
        let attempt_timeout = run.request.attempt_timeout.or(self.config.attempt_timeout);
        let backoff = &self.config.backoff;

        let mut attempts: u32 = 0;
        let mut retries: u32 = 0;
        let mut refreshed = false;

        loop {
            if let Err(err) = self
                .limiter
                .acquire(provider, tokens, self.config.acquire_timeout, run.cancel)
                .await
            {
                let reason = match err {
                    switchyard_core::Error::Cancelled => {
                        return CandidateOutcome::Abort(Error::Cancelled)
                    }
                    switchyard_core::Error::AcquireTimeout { waited, .. } => {
                        FailureReason::RateGateTimeout { waited }
                    }
                    switchyard_core::Error::ExceedsCapacity {
                        requested,
                        capacity,
                        ..
                    } => FailureReason::ExceedsRateCapacity {
                        requested,
                        capacity,
                    },
                    other => return CandidateOutcome::Abort(other.into()),
                };
                return CandidateOutcome::Failed(CandidateFailure::new(
                    candidate, reason, attempts,
                ));
            }

            attempts += 1;
            if let Some(claim) = run.claim.as_mut() {
                claim.dispatched = true;
            }

            let started = Instant::now();
            let outcome = self
                .dispatch(adapter.as_ref(), model, run.request, run.cancel, attempt_timeout)
                .await;
            let latency = started.elapsed();

            let provider_error = match outcome {
                DispatchOutcome::Response(response) => {
                    let cost = adapter.cost(&candidate.spec, response.usage.as_ref());
                    self.tracker
                        .record_success(provider, latency.as_secs_f64() * 1000.0, cost);
                    slot.settle();
                    debug!(
                        provider = %provider,
                        model = %model,
                        attempts,
                        latency_ms = latency.as_millis() as u64,
                        "Dispatch succeeded"
                    );
                    return CandidateOutcome::Success {
                        response,
                        attempts,
                        latency,
                        cost,
                    };
                }
                DispatchOutcome::Cancelled => return CandidateOutcome::Abort(Error::Cancelled),
                DispatchOutcome::Failure(err) => err,
            };

            let classified = self.classifier.classify(provider, &provider_error);
            warn!(
                provider = %provider,
                model = %model,
                attempt = attempts,
                category = %classified.category,
                error = %provider_error,
                "Dispatch failed"
            );

            if let Some(key) = &run.request.idempotency_key {
                // The call may have taken effect; never dispatch it again
                if let Some(Ok(response)) = adapter.replay(model, key).await {
                    info!(provider = %provider, idempotency_key = %key, "Recovered committed result via replay");
                    let cost = adapter.cost(&candidate.spec, response.usage.as_ref());
                    self.tracker
                        .record_success(provider, latency.as_secs_f64() * 1000.0, cost);
                    slot.settle();
                    return CandidateOutcome::Success {
                        response,
                        attempts,
                        latency,
                        cost,
                    };
                }

                self.tracker.record_failure(provider);
                if classified.category.trips_circuit() {
                    self.tracker.record_circuit_failure(provider);
                    slot.settle();
                }
                return CandidateOutcome::Abort(Error::AmbiguousOutcome {
                    key: key.clone(),
                    provider: Some(provider.to_string()),
                });
            }

            self.tracker.record_failure(provider);
            let can_retry = !trial && backoff.can_retry(retries);

            if classified.needs_credential_refresh && can_retry && !refreshed {
                refreshed = true;
                match adapter.refresh_credentials().await {
                    Ok(()) => {
                        warn!(provider = %provider, "Credentials refreshed, retrying");
                        retries += 1;
                        continue;
                    }
                    Err(refresh_err) => {
                        warn!(provider = %provider, error = %refresh_err, "Credential refresh failed");
                    }
                }
            }

            if classified.needs_credential_refresh || !classified.should_retry || !can_retry {
                if classified.category.trips_circuit() {
                    self.tracker.record_circuit_failure(provider);
                    slot.settle();
                }
                return CandidateOutcome::Failed(CandidateFailure::new(
                    candidate,
                    FailureReason::Classified(classified),
                    attempts,
                ));
            }

            let delay =
                backoff.delay_for(retries, classified.retry_after, classified.min_delay);
            retries += 1;
            warn!(
                provider = %provider,
                retry = retries,
                max_retries = backoff.max_retries,
                delay_ms = delay.as_millis() as u64,
                "Retrying candidate after backoff"
            );

            tokio::select! {
                _ = run.cancel.cancelled() => return CandidateOutcome::Abort(Error::Cancelled),
                _ = sleep(delay) => {}
            }
        }
    }

    /// One dispatch, bounded by the attempt deadline and the caller's token
    async fn dispatch(
        &self,
        adapter: &dyn ProviderAdapter,
        model: &str,
        request: &CompletionRequest,
        cancel: &CancellationToken,
        attempt_timeout: Option<Duration>,
    ) -> DispatchOutcome {
        // Cancelled on drop, so an abandoned call is told to stop
        let call_token = cancel.child_token();
        let _guard = call_token.clone().drop_guard();

        let call = adapter.dispatch(model, request, call_token);
        let bounded = async {
            match attempt_timeout {
                Some(limit) => match tokio::time::timeout(limit, call).await {
                    Ok(result) => result,
                    Err(_) => Err(ProviderError::timeout(format!(
                        "no response within {}ms",
                        limit.as_millis()
                    ))),
                },
                None => call.await,
            }
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => DispatchOutcome::Cancelled,
            result = bounded => match result {
                Ok(response) => DispatchOutcome::Response(response),
                Err(err) => DispatchOutcome::Failure(err),
            },
        }
    }
}
