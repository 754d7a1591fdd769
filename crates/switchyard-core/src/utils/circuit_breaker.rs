//! Circuit Breaker pattern implementation
//!
//! Isolates a failing provider so callers stop paying for doomed requests.
//! The breaker has three states:
//! - Closed: calls pass through, consecutive failures are counted
//! - Open: calls are rejected without a dispatch until the cool-down elapses
//! - HalfOpen: exactly one trial call is let through to test recovery

use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Circuit breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Normal operation - requests pass through
    Closed,
    /// Failure threshold reached - requests are rejected
    Open,
    /// Cool-down elapsed - a single trial request may pass
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "Closed"),
            Self::Open => write!(f, "Open"),
            Self::HalfOpen => write!(f, "HalfOpen"),
        }
    }
}

/// Configuration for circuit breaker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit
    pub failure_threshold: u32,
    /// Time spent open before a trial call is allowed
    pub cool_down: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            cool_down: Duration::from_secs(60),
        }
    }
}

impl CircuitBreakerConfig {
    /// Create a new configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set failure threshold
    #[must_use]
    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    /// Set cool-down window
    #[must_use]
    pub fn with_cool_down(mut self, cool_down: Duration) -> Self {
        self.cool_down = cool_down;
        self
    }
}

/// Answer to "may I call this provider now?"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Circuit is closed
    Allowed,
    /// Circuit is half-open and the caller holds the single trial slot.
    /// The caller must finish with `record_success`, `record_failure` or
    /// `release_trial`.
    Trial,
    /// Circuit is open, or a trial is already in flight
    Rejected {
        /// Time left before the cool-down elapses (zero while another trial runs)
        retry_in: Duration,
    },
}

impl Admission {
    /// Whether the call may proceed
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        !matches!(self, Self::Rejected { .. })
    }
}

#[derive(Debug)]
struct Inner {
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    trial_in_flight: bool,
}

/// Circuit breaker for a single provider
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    /// Create a new circuit breaker
    #[must_use]
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                opened_at: None,
                trial_in_flight: false,
            }),
        }
    }

    /// Create with default configuration
    #[must_use]
    pub fn with_defaults(name: impl Into<String>) -> Self {
        Self::new(name, CircuitBreakerConfig::default())
    }

    /// Get the circuit breaker name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the configuration
    #[must_use]
    pub fn config(&self) -> CircuitBreakerConfig {
        self.config
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Current state. Reading never moves Open to HalfOpen; only `admit` does.
    #[must_use]
    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    /// Consecutive failures counted while closed
    #[must_use]
    pub fn consecutive_failures(&self) -> u32 {
        self.lock().consecutive_failures
    }

    /// When the circuit last opened
    #[must_use]
    pub fn opened_at(&self) -> Option<Instant> {
        self.lock().opened_at
    }

    /// Decide whether a call may proceed
    ///
    /// An open circuit whose cool-down has elapsed moves to HalfOpen here and
    /// hands the caller the trial slot. While that trial is in flight every
    /// other caller is rejected.
    pub fn admit(&self) -> Admission {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed => Admission::Allowed,
            CircuitState::Open => {
                let elapsed = inner
                    .opened_at
                    .map(|at| at.elapsed())
                    .unwrap_or(self.config.cool_down);
                if elapsed >= self.config.cool_down {
                    info!(name = %self.name, "Circuit breaker entering half-open state");
                    inner.state = CircuitState::HalfOpen;
                    inner.trial_in_flight = true;
                    Admission::Trial
                } else {
                    Admission::Rejected {
                        retry_in: self.config.cool_down - elapsed,
                    }
                }
            }
            CircuitState::HalfOpen => {
                if inner.trial_in_flight {
                    Admission::Rejected {
                        retry_in: Duration::ZERO,
                    }
                } else {
                    inner.trial_in_flight = true;
                    Admission::Trial
                }
            }
        }
    }

    /// Record a successful call
    pub fn record_success(&self) {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed => {
                inner.consecutive_failures = 0;
            }
            CircuitState::HalfOpen => {
                info!(name = %self.name, "Circuit breaker closed after successful trial");
                inner.state = CircuitState::Closed;
                inner.consecutive_failures = 0;
                inner.opened_at = None;
                inner.trial_in_flight = false;
            }
            CircuitState::Open => {
                // A call admitted before the circuit opened; the cool-down still applies
                debug!(name = %self.name, "Ignoring late success while open");
            }
        }
    }

    /// Record a failure that counts toward the threshold
    pub fn record_failure(&self) {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed => {
                inner.consecutive_failures += 1;
                debug!(
                    name = %self.name,
                    failures = inner.consecutive_failures,
                    threshold = self.config.failure_threshold,
                    "Circuit breaker failure recorded"
                );
                if inner.consecutive_failures >= self.config.failure_threshold {
                    info!(
                        name = %self.name,
                        failures = inner.consecutive_failures,
                        "Circuit breaker opened"
                    );
                    Self::open(&mut inner);
                }
            }
            CircuitState::HalfOpen => {
                warn!(
                    name = %self.name,
                    "Circuit breaker trial failed, reopening"
                );
                Self::open(&mut inner);
            }
            CircuitState::Open => {}
        }
    }

    /// Give back the trial slot without a verdict (e.g. the caller cancelled)
    pub fn release_trial(&self) {
        let mut inner = self.lock();
        if inner.state == CircuitState::HalfOpen {
            inner.trial_in_flight = false;
        }
    }

    /// Force the breaker back to closed
    pub fn reset(&self) {
        let mut inner = self.lock();
        inner.state = CircuitState::Closed;
        inner.consecutive_failures = 0;
        inner.opened_at = None;
        inner.trial_in_flight = false;
    }

    fn open(inner: &mut Inner) {
        inner.state = CircuitState::Open;
        inner.opened_at = Some(Instant::now());
        inner.trial_in_flight = false;
    }
}

#[cfg(test)]
mod tests;
