//! Configuration schema
//!
//! Serde model of the router's configuration: executor tuning, routing
//! weights, health window, idempotency retention, per-provider rate and
//! circuit settings, and the static model table. Loading and layering the
//! sources is left to the caller.

use crate::classify::ErrorClassifier;
use crate::error::{Error, Result};
use crate::executor::{ExecutorBuilder, ExecutorConfig, ResilientExecutor};
use crate::health::{HealthConfig, HealthTracker};
use crate::idempotency::{IdempotencyConfig, IdempotencyLedger};
use crate::router::{CapabilityRouter, ProviderModelSpec, RoutingRules};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;
use switchyard_core::{BackoffPolicy, CircuitBreakerConfig, RateLimiter, TokenBucketConfig};

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SwitchyardConfig {
    /// Retry, backoff and rate gate settings
    #[serde(default)]
    pub executor: ExecutorSettings,
    /// Candidate scoring
    #[serde(default)]
    pub routing: RoutingRules,
    /// Health tracking
    #[serde(default)]
    pub health: HealthSettings,
    /// Idempotency ledger
    #[serde(default)]
    pub idempotency: IdempotencySettings,
    /// Per-provider limits, keyed by provider name
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderSettings>,
    /// The static capability and cost table
    #[serde(default)]
    pub models: Vec<ProviderModelSpec>,
}

/// `[executor]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutorSettings {
    /// Retries per candidate (dispatches = retries + 1)
    #[serde(default = "default_max_retries")]
    pub max_retries_per_candidate: u32,
    /// First backoff delay
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Cap on the exponential part of the backoff
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Upper bound of the uniform jitter
    #[serde(default = "default_max_jitter_ms")]
    pub max_jitter_ms: u64,
    /// Longest wait for rate tokens; unset waits indefinitely
    #[serde(default = "default_acquire_timeout_ms")]
    pub acquire_timeout_ms: Option<u64>,
    /// Deadline for each dispatch
    #[serde(default)]
    pub attempt_timeout_ms: Option<u64>,
    /// Rate tokens consumed per dispatch
    #[serde(default = "default_rate_tokens")]
    pub rate_tokens_per_request: f64,
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    30_000
}

fn default_max_jitter_ms() -> u64 {
    1_000
}

fn default_acquire_timeout_ms() -> Option<u64> {
    Some(30_000)
}

fn default_rate_tokens() -> f64 {
    1.0
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            max_retries_per_candidate: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            max_jitter_ms: default_max_jitter_ms(),
            acquire_timeout_ms: default_acquire_timeout_ms(),
            attempt_timeout_ms: None,
            rate_tokens_per_request: default_rate_tokens(),
        }
    }
}

/// `[health]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthSettings {
    /// Outcomes kept per provider
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    /// Latency that scores zero on the latency term
    #[serde(default = "default_latency_ceiling_ms")]
    pub latency_ceiling_ms: u64,
}

fn default_window_size() -> usize {
    100
}

fn default_latency_ceiling_ms() -> u64 {
    10_000
}

impl Default for HealthSettings {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            latency_ceiling_ms: default_latency_ceiling_ms(),
        }
    }
}

/// `[idempotency]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdempotencySettings {
    /// How long keys are remembered
    #[serde(default = "default_retention_seconds")]
    pub retention_seconds: u64,
    /// Soft cap on remembered keys
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

fn default_retention_seconds() -> u64 {
    3_600
}

fn default_max_entries() -> usize {
    10_000
}

impl Default for IdempotencySettings {
    fn default() -> Self {
        Self {
            retention_seconds: default_retention_seconds(),
            max_entries: default_max_entries(),
        }
    }
}

/// `[providers.<name>]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Token bucket refill rate
    #[serde(default = "default_tokens_per_second")]
    pub tokens_per_second: f64,
    /// Token bucket capacity
    #[serde(default = "default_max_tokens")]
    pub max_tokens: f64,
    /// Consecutive provider-fault failures that open the circuit
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    /// Time an open circuit waits before allowing a trial
    #[serde(default = "default_cool_down_seconds")]
    pub cool_down_seconds: u64,
    /// Wait after a rate limit that carries no retry-after hint
    #[serde(default = "default_rate_limit_seconds")]
    pub rate_limit_default_seconds: u64,
}

fn default_tokens_per_second() -> f64 {
    1.0
}

fn default_max_tokens() -> f64 {
    10.0
}

fn default_failure_threshold() -> u32 {
    5
}

fn default_cool_down_seconds() -> u64 {
    60
}

fn default_rate_limit_seconds() -> u64 {
    60
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            tokens_per_second: default_tokens_per_second(),
            max_tokens: default_max_tokens(),
            failure_threshold: default_failure_threshold(),
            cool_down_seconds: default_cool_down_seconds(),
            rate_limit_default_seconds: default_rate_limit_seconds(),
        }
    }
}

impl ProviderSettings {
    /// Token bucket for this provider
    #[must_use]
    pub fn bucket(&self) -> TokenBucketConfig {
        TokenBucketConfig::new(self.tokens_per_second, self.max_tokens)
    }

    /// Circuit breaker for this provider
    #[must_use]
    pub fn breaker(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig::new()
            .with_failure_threshold(self.failure_threshold)
            .with_cool_down(Duration::from_secs(self.cool_down_seconds))
    }
}

impl SwitchyardConfig {
    /// Check every section
    pub fn validate(&self) -> Result<()> {
        let executor = &self.executor;
        if executor.base_delay_ms > executor.max_delay_ms {
            return Err(Error::invalid_config(
                "executor.base_delay_ms",
                "must not exceed executor.max_delay_ms",
            ));
        }
        if !executor.rate_tokens_per_request.is_finite() || executor.rate_tokens_per_request <= 0.0
        {
            return Err(Error::invalid_config(
                "executor.rate_tokens_per_request",
                "must be positive",
            ));
        }
        if executor.acquire_timeout_ms == Some(0) {
            return Err(Error::invalid_config(
                "executor.acquire_timeout_ms",
                "must be positive when set",
            ));
        }
        if executor.attempt_timeout_ms == Some(0) {
            return Err(Error::invalid_config(
                "executor.attempt_timeout_ms",
                "must be positive when set",
            ));
        }

        self.routing.validate()?;

        if self.health.window_size == 0 {
            return Err(Error::invalid_config("health.window_size", "must be positive"));
        }
        if self.health.latency_ceiling_ms == 0 {
            return Err(Error::invalid_config(
                "health.latency_ceiling_ms",
                "must be positive",
            ));
        }
        if self.idempotency.max_entries == 0 {
            return Err(Error::invalid_config(
                "idempotency.max_entries",
                "must be positive",
            ));
        }

        for name in self.provider_names() {
            let settings = self.provider(name);
            settings.bucket().validate(name)?;
            if settings.failure_threshold == 0 {
                return Err(Error::invalid_config(
                    format!("providers.{name}.failure_threshold"),
                    "must be at least 1",
                ));
            }
            if executor.rate_tokens_per_request > settings.max_tokens {
                return Err(Error::invalid_config(
                    format!("providers.{name}.max_tokens"),
                    format!(
                        "bucket holds {} tokens but each request needs {}",
                        settings.max_tokens, executor.rate_tokens_per_request
                    ),
                ));
            }
        }

        if self.models.is_empty() {
            return Err(Error::invalid_config("models", "at least one model is required"));
        }
        let mut seen = BTreeSet::new();
        for spec in &self.models {
            spec.validate()?;
            if !seen.insert((spec.provider.as_str(), spec.model.as_str())) {
                return Err(Error::invalid_config(
                    "models",
                    format!("duplicate entry for {}", spec.label()),
                ));
            }
        }

        Ok(())
    }

    /// Providers named in either the provider table or the model table
    #[must_use]
    pub fn provider_names(&self) -> BTreeSet<&str> {
        self.providers
            .keys()
            .map(String::as_str)
            .chain(self.models.iter().map(|m| m.provider.as_str()))
            .collect()
    }

    /// Settings for a provider (defaults when it has no section)
    #[must_use]
    pub fn provider(&self, name: &str) -> ProviderSettings {
        self.providers.get(name).cloned().unwrap_or_default()
    }

    /// Executor settings
    #[must_use]
    pub fn executor_config(&self) -> ExecutorConfig {
        let e = &self.executor;
        ExecutorConfig {
            backoff: BackoffPolicy::new()
                .with_max_retries(e.max_retries_per_candidate)
                .with_base_delay(Duration::from_millis(e.base_delay_ms))
                .with_max_delay(Duration::from_millis(e.max_delay_ms))
                .with_max_jitter(Duration::from_millis(e.max_jitter_ms)),
            acquire_timeout: e.acquire_timeout_ms.map(Duration::from_millis),
            rate_tokens_per_request: e.rate_tokens_per_request,
            attempt_timeout: e.attempt_timeout_ms.map(Duration::from_millis),
        }
    }

    /// Health tracker with each provider's breaker settings
    #[must_use]
    pub fn health_tracker(&self) -> HealthTracker {
        let config = HealthConfig {
            window_size: self.health.window_size,
            latency_ceiling: Duration::from_millis(self.health.latency_ceiling_ms),
        };
        self.providers.iter().fold(
            HealthTracker::new(config).with_default_breaker(ProviderSettings::default().breaker()),
            |tracker, (name, settings)| tracker.with_provider_breaker(name, settings.breaker()),
        )
    }

    /// Rate limiter with each provider's bucket
    #[must_use]
    pub fn rate_limiter(&self) -> RateLimiter {
        self.providers.iter().fold(
            RateLimiter::new(ProviderSettings::default().bucket()),
            |limiter, (name, settings)| limiter.with_provider(name, settings.bucket()),
        )
    }

    /// Classifier with each provider's rate limit default
    #[must_use]
    pub fn classifier(&self) -> ErrorClassifier {
        self.providers.iter().fold(
            ErrorClassifier::new().with_rate_limit_default(Duration::from_secs(
                default_rate_limit_seconds(),
            )),
            |classifier, (name, settings)| {
                classifier.with_provider_rate_limit_default(
                    name,
                    Duration::from_secs(settings.rate_limit_default_seconds),
                )
            },
        )
    }

    /// Idempotency ledger
    #[must_use]
    pub fn ledger(&self) -> IdempotencyLedger {
        IdempotencyLedger::new(IdempotencyConfig {
            retention: Duration::from_secs(self.idempotency.retention_seconds),
            max_entries: self.idempotency.max_entries,
        })
    }

    /// Router over the model table
    pub fn router(&self) -> Result<CapabilityRouter> {
        CapabilityRouter::new(self.models.clone(), self.routing.clone())
    }

    /// Validate and wire every component into an executor builder
    ///
    /// Only the provider adapters remain to be registered.
    pub fn executor_builder(&self) -> Result<ExecutorBuilder> {
        self.validate()?;
        Ok(ResilientExecutor::builder(self.router()?)
            .tracker(Arc::new(self.health_tracker()))
            .limiter(Arc::new(self.rate_limiter()))
            .classifier(self.classifier())
            .ledger(Arc::new(self.ledger()))
            .config(self.executor_config()))
    }
}

#[cfg(test)]
mod tests;
