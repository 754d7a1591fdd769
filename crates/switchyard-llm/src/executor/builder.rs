//! Executor configuration and assembly

use super::executor_impl::ResilientExecutor;
use crate::classify::ErrorClassifier;
use crate::error::{Error, Result};
use crate::health::HealthTracker;
use crate::idempotency::IdempotencyLedger;
use crate::provider::ProviderAdapter;
use crate::router::CapabilityRouter;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use switchyard_core::{BackoffPolicy, RateLimiter};
use tracing::debug;

/// Executor settings
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutorConfig {
    /// Per-candidate retry cap and delay schedule
    pub backoff: BackoffPolicy,
    /// Longest wait for rate tokens before giving up on a candidate
    pub acquire_timeout: Option<Duration>,
    /// Rate tokens consumed per dispatch unless the request overrides it
    pub rate_tokens_per_request: f64,
    /// Deadline for a single dispatch unless the request overrides it
    pub attempt_timeout: Option<Duration>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            backoff: BackoffPolicy::default(),
            acquire_timeout: Some(Duration::from_secs(30)),
            rate_tokens_per_request: 1.0,
            attempt_timeout: None,
        }
    }
}

impl ExecutorConfig {
    /// Set the backoff policy
    #[must_use]
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Set the rate gate deadline (`None` waits indefinitely)
    #[must_use]
    pub fn with_acquire_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// Set the default per-dispatch deadline
    #[must_use]
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = Some(timeout);
        self
    }
}

/// Assembles a [`ResilientExecutor`]
pub struct ExecutorBuilder {
    router: CapabilityRouter,
    adapters: HashMap<String, Arc<dyn ProviderAdapter>>,
    tracker: Option<Arc<HealthTracker>>,
    limiter: Option<Arc<RateLimiter>>,
    classifier: ErrorClassifier,
    ledger: Option<Arc<IdempotencyLedger>>,
    config: ExecutorConfig,
}

impl ExecutorBuilder {
    pub(crate) fn new(router: CapabilityRouter) -> Self {
        Self {
            router,
            adapters: HashMap::new(),
            tracker: None,
            limiter: None,
            classifier: ErrorClassifier::default(),
            ledger: None,
            config: ExecutorConfig::default(),
        }
    }

    /// Register the adapter for its provider
    #[must_use]
    pub fn adapter(mut self, adapter: Arc<dyn ProviderAdapter>) -> Self {
        let name = adapter.name().to_string();
        debug!(provider = %name, "Registering provider adapter");
        self.adapters.insert(name, adapter);
        self
    }

    /// Share a health tracker
    #[must_use]
    pub fn tracker(mut self, tracker: Arc<HealthTracker>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    /// Share a rate limiter
    #[must_use]
    pub fn limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    /// Use a configured classifier
    #[must_use]
    pub fn classifier(mut self, classifier: ErrorClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Share an idempotency ledger
    #[must_use]
    pub fn ledger(mut self, ledger: Arc<IdempotencyLedger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    /// Set executor settings
    #[must_use]
    pub fn config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    /// Validate and build
    ///
    /// Every provider in the routing table needs an adapter. Adapter context
    /// limits narrow the table before it is used.
    pub fn build(self) -> Result<ResilientExecutor> {
        let Self {
            mut router,
            adapters,
            tracker,
            limiter,
            classifier,
            ledger,
            config,
        } = self;

        if let Some(provider) = router
            .providers()
            .into_iter()
            .find(|p| !adapters.contains_key(*p))
        {
            return Err(Error::invalid_config(
                format!("providers.{provider}"),
                "no adapter registered",
            ));
        }
        if !config.rate_tokens_per_request.is_finite() || config.rate_tokens_per_request <= 0.0 {
            return Err(Error::invalid_config(
                "executor.rate_tokens_per_request",
                "must be positive",
            ));
        }

        router.tighten_context_limits(|spec| {
            adapters
                .get(&spec.provider)
                .and_then(|a| a.context_limit(&spec.model))
        });

        let tracker = tracker.unwrap_or_default();
        let router = router.with_health(Arc::clone(&tracker));

        Ok(ResilientExecutor {
            router,
            adapters,
            tracker,
            limiter: limiter.unwrap_or_default(),
            classifier,
            ledger: ledger.unwrap_or_default(),
            config,
        })
    }
}
