//! Scripted provider for testing
//!
//! Plays back a queue of outcomes, then falls back to a default outcome.
//! Every dispatch is timestamped so tests can check retry spacing.

use super::adapter::ProviderAdapter;
use super::error::ProviderError;
use crate::completion::{CompletionRequest, CompletionResponse, TokenUsage};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
enum Step {
    Respond(String),
    Fail(ProviderError),
    /// The provider did the work but the answer was lost on the way back
    CommitThenFail(String, ProviderError),
}

/// A provider that plays back queued outcomes
#[derive(Debug)]
pub struct ScriptedProvider {
    name: String,
    script: Mutex<VecDeque<Step>>,
    default_failure: Option<ProviderError>,
    latency: Duration,
    refresh_succeeds: bool,
    supports_replay: bool,
    context_limits: HashMap<String, u64>,
    committed: Mutex<HashMap<String, CompletionResponse>>,
    dispatches: Mutex<Vec<Instant>>,
    refreshes: AtomicU32,
}

impl ScriptedProvider {
    /// A provider that answers every dispatch successfully
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            script: Mutex::new(VecDeque::new()),
            default_failure: None,
            latency: Duration::ZERO,
            refresh_succeeds: false,
            supports_replay: false,
            context_limits: HashMap::new(),
            committed: Mutex::new(HashMap::new()),
            dispatches: Mutex::new(Vec::new()),
            refreshes: AtomicU32::new(0),
        }
    }

    /// Queue a successful response
    #[must_use]
    pub fn then_respond(self, content: impl Into<String>) -> Self {
        self.push(Step::Respond(content.into()));
        self
    }

    /// Queue a failure
    #[must_use]
    pub fn then_fail(self, error: ProviderError) -> Self {
        self.push(Step::Fail(error));
        self
    }

    /// Queue a call that takes effect on the provider but reports `error`
    #[must_use]
    pub fn then_commit_and_fail(self, content: impl Into<String>, error: ProviderError) -> Self {
        self.push(Step::CommitThenFail(content.into(), error));
        self
    }

    /// Fail every unscripted dispatch with `error`
    #[must_use]
    pub fn failing_with(mut self, error: ProviderError) -> Self {
        self.default_failure = Some(error);
        self
    }

    /// Take `latency` to answer each dispatch
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Make credential refresh succeed
    #[must_use]
    pub fn with_credential_refresh(mut self) -> Self {
        self.refresh_succeeds = true;
        self
    }

    /// Remember committed calls by idempotency key and answer `replay`
    #[must_use]
    pub fn with_replay(mut self) -> Self {
        self.supports_replay = true;
        self
    }

    /// Report a context window for `model` tighter than the table's
    #[must_use]
    pub fn with_context_limit(mut self, model: impl Into<String>, tokens: u64) -> Self {
        self.context_limits.insert(model.into(), tokens);
        self
    }

    fn push(&self, step: Step) {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(step);
    }

    /// Number of dispatches received
    #[must_use]
    pub fn dispatch_count(&self) -> usize {
        self.dispatches
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// When each dispatch arrived
    #[must_use]
    pub fn dispatch_times(&self) -> Vec<Instant> {
        self.dispatches
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Number of credential refreshes requested
    #[must_use]
    pub fn refresh_count(&self) -> u32 {
        self.refreshes.load(Ordering::SeqCst)
    }

    fn response(&self, model: &str, content: String) -> CompletionResponse {
        CompletionResponse::new(model, content).with_usage(TokenUsage::new(100, 50))
    }

    fn commit(&self, request: &CompletionRequest, response: &CompletionResponse) {
        if let Some(key) = &request.idempotency_key {
            self.committed
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .insert(key.clone(), response.clone());
        }
    }
}

#[async_trait::async_trait]
impl ProviderAdapter for ScriptedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn dispatch(
        &self,
        model: &str,
        request: &CompletionRequest,
        cancel: CancellationToken,
    ) -> Result<CompletionResponse, ProviderError> {
        self.dispatches
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Instant::now());

        if !self.latency.is_zero() {
            tokio::select! {
                _ = cancel.cancelled() => {
                    return Err(ProviderError::connection("request aborted by caller"));
                }
                _ = sleep(self.latency) => {}
            }
        }

        let step = self
            .script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();

        match step {
            Some(Step::Respond(content)) => {
                let response = self.response(model, content);
                self.commit(request, &response);
                Ok(response)
            }
            Some(Step::Fail(error)) => Err(error),
            Some(Step::CommitThenFail(content, error)) => {
                let response = self.response(model, content);
                self.commit(request, &response);
                Err(error)
            }
            None => match &self.default_failure {
                Some(error) => Err(error.clone()),
                None => {
                    let response = self.response(model, format!("response from {}", self.name));
                    self.commit(request, &response);
                    Ok(response)
                }
            },
        }
    }

    fn context_limit(&self, model: &str) -> Option<u64> {
        self.context_limits.get(model).copied()
    }

    async fn refresh_credentials(&self) -> Result<(), ProviderError> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        if self.refresh_succeeds {
            Ok(())
        } else {
            Err(ProviderError::http(401, "credential refresh rejected"))
        }
    }

    async fn replay(
        &self,
        _model: &str,
        idempotency_key: &str,
    ) -> Option<Result<CompletionResponse, ProviderError>> {
        if !self.supports_replay {
            return None;
        }
        let committed = self.committed.lock().unwrap_or_else(|e| e.into_inner());
        Some(
            committed
                .get(idempotency_key)
                .cloned()
                .ok_or_else(|| ProviderError::http(404, "no committed result for key")),
        )
    }
}
