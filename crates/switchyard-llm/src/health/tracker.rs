//! Health Tracker - per-provider outcome monitoring
//!
//! This module contains the HealthTracker, which owns each provider's
//! rolling statistics and circuit breaker.

use super::record::RollingStats;
use super::report::{ProviderTelemetry, TelemetrySnapshot};
use chrono::Utc;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use switchyard_core::{Admission, CircuitBreaker, CircuitBreakerConfig, CircuitState};
use tracing::debug;

/// Weight of the rolling success rate in the health score
const SUCCESS_WEIGHT: f64 = 0.7;
/// Weight of the latency term in the health score
const LATENCY_WEIGHT: f64 = 0.3;

/// Health tracking configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HealthConfig {
    /// Outcomes kept in each provider's rolling window
    pub window_size: usize,
    /// Average latency at or above which the latency term scores zero
    pub latency_ceiling: Duration,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            window_size: 100,
            latency_ceiling: Duration::from_secs(10),
        }
    }
}

#[derive(Debug)]
struct ProviderEntry {
    breaker: CircuitBreaker,
    stats: Mutex<RollingStats>,
}

impl ProviderEntry {
    fn stats(&self) -> MutexGuard<'_, RollingStats> {
        self.stats.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Per-provider health, cost and circuit state
///
/// Entries are created lazily on first write and live for the life of the
/// tracker. Each entry is locked independently.
#[derive(Debug, Default)]
pub struct HealthTracker {
    config: HealthConfig,
    default_breaker: CircuitBreakerConfig,
    breaker_overrides: HashMap<String, CircuitBreakerConfig>,
    entries: DashMap<String, Arc<ProviderEntry>>,
}

impl HealthTracker {
    /// Create a tracker
    #[must_use]
    pub fn new(config: HealthConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Breaker settings for providers without an override
    #[must_use]
    pub fn with_default_breaker(mut self, config: CircuitBreakerConfig) -> Self {
        self.default_breaker = config;
        self
    }

    /// Breaker settings for one provider
    #[must_use]
    pub fn with_provider_breaker(
        mut self,
        provider: impl Into<String>,
        config: CircuitBreakerConfig,
    ) -> Self {
        self.breaker_overrides.insert(provider.into(), config);
        self
    }

    /// Get the tracker configuration
    #[must_use]
    pub fn config(&self) -> HealthConfig {
        self.config
    }

    /// Breaker settings in effect for a provider
    #[must_use]
    pub fn breaker_config_for(&self, provider: &str) -> CircuitBreakerConfig {
        self.breaker_overrides
            .get(provider)
            .copied()
            .unwrap_or(self.default_breaker)
    }

    fn entry(&self, provider: &str) -> Arc<ProviderEntry> {
        if let Some(entry) = self.entries.get(provider) {
            return Arc::clone(entry.value());
        }
        let entry = self
            .entries
            .entry(provider.to_string())
            .or_insert_with(|| {
                debug!(provider = %provider, "Tracking new provider");
                Arc::new(ProviderEntry {
                    breaker: CircuitBreaker::new(provider, self.breaker_config_for(provider)),
                    stats: Mutex::new(RollingStats::new(self.config.window_size)),
                })
            });
        Arc::clone(entry.value())
    }

    fn existing(&self, provider: &str) -> Option<Arc<ProviderEntry>> {
        self.entries.get(provider).map(|e| Arc::clone(e.value()))
    }

    fn with_stats<T>(&self, provider: &str, f: impl FnOnce(&RollingStats) -> T) -> Option<T> {
        let entry = self.existing(provider)?;
        let stats = entry.stats();
        Some(f(&stats))
    }

    /// Ask the provider's breaker whether a call may proceed
    pub fn admit(&self, provider: &str) -> Admission {
        self.entry(provider).breaker.admit()
    }

    /// Hand back a half-open trial slot without a verdict
    pub fn release_trial(&self, provider: &str) {
        if let Some(entry) = self.existing(provider) {
            entry.breaker.release_trial();
        }
    }

    /// Record a successful dispatch
    pub fn record_success(&self, provider: &str, latency_ms: f64, cost: f64) {
        let entry = self.entry(provider);
        entry.stats().record_success(latency_ms, cost);
        entry.breaker.record_success();
    }

    /// Record a failed dispatch in the rolling statistics
    ///
    /// Does not touch the circuit breaker; see [`Self::record_circuit_failure`].
    pub fn record_failure(&self, provider: &str) {
        self.entry(provider).stats().record_failure();
    }

    /// Count a failure toward the provider's breaker threshold
    pub fn record_circuit_failure(&self, provider: &str) {
        self.entry(provider).breaker.record_failure();
    }

    /// Current circuit state (Closed for unseen providers)
    #[must_use]
    pub fn circuit_state(&self, provider: &str) -> CircuitState {
        self.existing(provider)
            .map(|e| e.breaker.state())
            .unwrap_or(CircuitState::Closed)
    }

    /// Rolling success rate, `None` before any outcome
    #[must_use]
    pub fn success_rate(&self, provider: &str) -> Option<f64> {
        self.with_stats(provider, RollingStats::success_rate).flatten()
    }

    /// Rolling average latency of successful dispatches
    #[must_use]
    pub fn average_latency_ms(&self, provider: &str) -> Option<f64> {
        self.with_stats(provider, RollingStats::average_latency_ms)
            .flatten()
    }

    /// Cumulative cost charged to a provider
    #[must_use]
    pub fn cumulative_cost(&self, provider: &str) -> f64 {
        self.with_stats(provider, |s| s.cumulative_cost)
            .unwrap_or(0.0)
    }

    /// Health score in `[0, 1]`
    ///
    /// `0.7 * success_rate + 0.3 * (1 - avg_latency / latency_ceiling)`,
    /// with both terms at 1 before any observation. An open circuit scores 0.
    #[must_use]
    pub fn get_health_score(&self, provider: &str) -> f64 {
        let Some(entry) = self.existing(provider) else {
            return 1.0;
        };
        if entry.breaker.state() == CircuitState::Open {
            return 0.0;
        }
        let stats = entry.stats();
        self.score(stats.success_rate(), stats.average_latency_ms())
    }

    fn score(&self, success_rate: Option<f64>, average_latency_ms: Option<f64>) -> f64 {
        let success = success_rate.unwrap_or(1.0);
        let ceiling_ms = self.config.latency_ceiling.as_secs_f64() * 1000.0;
        let latency = match average_latency_ms {
            Some(avg) if ceiling_ms > 0.0 => 1.0 - (avg / ceiling_ms).min(1.0),
            Some(_) => 0.0,
            None => 1.0,
        };
        (SUCCESS_WEIGHT * success + LATENCY_WEIGHT * latency).clamp(0.0, 1.0)
    }

    /// Force a provider's breaker closed
    pub fn reset_circuit(&self, provider: &str) {
        if let Some(entry) = self.existing(provider) {
            entry.breaker.reset();
        }
    }

    /// Names of every tracked provider, sorted
    #[must_use]
    pub fn providers(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Point-in-time telemetry for every tracked provider
    #[must_use]
    pub fn snapshot(&self) -> TelemetrySnapshot {
        let providers = self
            .providers()
            .into_iter()
            .filter_map(|name| {
                let entry = self.existing(&name)?;
                let circuit_state = entry.breaker.state();
                let stats = entry.stats();
                let success_rate = stats.success_rate();
                let average_latency_ms = stats.average_latency_ms();
                let health_score = if circuit_state == CircuitState::Open {
                    0.0
                } else {
                    self.score(success_rate, average_latency_ms)
                };
                Some(ProviderTelemetry {
                    provider: name,
                    circuit_state,
                    consecutive_failures: entry.breaker.consecutive_failures(),
                    health_score,
                    success_rate,
                    average_latency_ms,
                    window_samples: stats.len(),
                    total_successes: stats.total_successes,
                    total_failures: stats.total_failures,
                    cumulative_latency_ms: stats.cumulative_latency_ms,
                    cumulative_cost: stats.cumulative_cost,
                    last_success_at: stats.last_success_at,
                    last_failure_at: stats.last_failure_at,
                })
            })
            .collect();

        TelemetrySnapshot {
            generated_at: Utc::now(),
            providers,
        }
    }
}
