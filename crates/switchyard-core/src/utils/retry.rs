//! Retry backoff policy
//!
//! Computes the delay before re-dispatching to the same provider:
//! `min(max_delay, base_delay * 2^attempt) + uniform(0, max_jitter)`, unless
//! the provider supplied an explicit retry-after, which wins. Callers may
//! raise the exponential part to a per-category minimum.

use rand::Rng;
use std::time::Duration;

/// Backoff configuration for retries against a single candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Retries allowed per candidate (dispatches = retries + 1)
    pub max_retries: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Upper bound on the exponential part of the delay
    pub max_delay: Duration,
    /// Upper bound of the uniform jitter added to computed delays
    pub max_jitter: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            max_jitter: Duration::from_secs(1),
        }
    }
}

impl BackoffPolicy {
    /// Create a new policy with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set retries per candidate
    #[must_use]
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set base delay
    #[must_use]
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Set maximum delay
    #[must_use]
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Set jitter bound (zero disables jitter)
    #[must_use]
    pub fn with_max_jitter(mut self, jitter: Duration) -> Self {
        self.max_jitter = jitter;
        self
    }

    /// Whether another retry is allowed after `retries_so_far` retries
    #[must_use]
    pub fn can_retry(&self, retries_so_far: u32) -> bool {
        retries_so_far < self.max_retries
    }

    /// Exponential delay for zero-based retry index `attempt`, without jitter
    #[must_use]
    pub fn computed_delay(&self, attempt: u32) -> Duration {
        let factor = 2f64.powi(attempt.min(63) as i32);
        let secs = (self.base_delay.as_secs_f64() * factor).min(self.max_delay.as_secs_f64());
        Duration::try_from_secs_f64(secs).unwrap_or(self.max_delay)
    }

    /// Delay before retry `attempt`
    ///
    /// An explicit `retry_after` from the provider takes precedence and is
    /// used as-is. Otherwise the exponential delay is raised to at least
    /// `floor`, then jittered.
    #[must_use]
    pub fn delay_for(
        &self,
        attempt: u32,
        retry_after: Option<Duration>,
        floor: Duration,
    ) -> Duration {
        match retry_after {
            Some(explicit) => explicit,
            None => self.computed_delay(attempt).max(floor) + self.jitter(),
        }
    }

    fn jitter(&self) -> Duration {
        let max_ms = self.max_jitter.as_millis() as u64;
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..=max_ms))
    }
}

#[cfg(test)]
mod tests;
