//! Rate limiting for provider dispatch
//!
//! Provides a token bucket per provider. Tokens refill continuously at
//! `tokens_per_second` up to `max_tokens`; the refill is computed lazily on
//! every access, so there is no background timer.

use crate::error::{Error, Result};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Token bucket configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenBucketConfig {
    /// Continuous refill rate
    pub tokens_per_second: f64,
    /// Bucket capacity
    pub max_tokens: f64,
}

impl Default for TokenBucketConfig {
    fn default() -> Self {
        Self {
            tokens_per_second: 1.0,
            max_tokens: 10.0,
        }
    }
}

impl TokenBucketConfig {
    /// Create a new bucket config
    #[must_use]
    pub fn new(tokens_per_second: f64, max_tokens: f64) -> Self {
        Self {
            tokens_per_second,
            max_tokens,
        }
    }

    /// Config allowing `requests` per minute with a burst of the same size
    #[must_use]
    pub fn per_minute(requests: u32) -> Self {
        Self::new(f64::from(requests) / 60.0, f64::from(requests))
    }

    /// Reject rates and capacities that would stall or overflow the bucket
    pub fn validate(&self, provider: &str) -> Result<()> {
        if !self.tokens_per_second.is_finite() || self.tokens_per_second <= 0.0 {
            return Err(Error::invalid_config(
                format!("providers.{provider}.tokens_per_second"),
                format!("must be positive, got {}", self.tokens_per_second),
            ));
        }
        if !self.max_tokens.is_finite() || self.max_tokens <= 0.0 {
            return Err(Error::invalid_config(
                format!("providers.{provider}.max_tokens"),
                format!("must be positive, got {}", self.max_tokens),
            ));
        }
        Ok(())
    }
}

/// Result of a single non-blocking acquisition attempt
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Acquisition {
    /// Whether the tokens were deducted
    pub granted: bool,
    /// How long until enough tokens will have accumulated (zero when granted)
    pub wait: Duration,
}

impl Acquisition {
    fn granted() -> Self {
        Self {
            granted: true,
            wait: Duration::ZERO,
        }
    }

    fn denied(wait: Duration) -> Self {
        Self {
            granted: false,
            wait,
        }
    }
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

/// A single provider's token bucket
///
/// Invariant: `0 <= tokens <= max_tokens` after every operation.
#[derive(Debug)]
pub struct TokenBucket {
    config: TokenBucketConfig,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    /// Create a bucket that starts full
    #[must_use]
    pub fn new(config: TokenBucketConfig) -> Self {
        Self {
            config,
            state: Mutex::new(BucketState {
                tokens: config.max_tokens,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Bucket configuration
    #[must_use]
    pub fn config(&self) -> TokenBucketConfig {
        self.config
    }

    fn refill(&self, state: &mut BucketState, now: Instant) {
        let elapsed = now.saturating_duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.config.tokens_per_second)
            .min(self.config.max_tokens);
        state.last_refill = now;
    }

    /// Deduct `needed` tokens if available, otherwise report how long to wait
    pub fn try_acquire(&self, needed: f64) -> Acquisition {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        self.refill(&mut state, Instant::now());

        if state.tokens >= needed {
            state.tokens -= needed;
            return Acquisition::granted();
        }

        let seconds = (needed - state.tokens) / self.config.tokens_per_second;
        Acquisition::denied(Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX))
    }

    /// Tokens currently in the bucket (after refill)
    #[must_use]
    pub fn available(&self) -> f64 {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        self.refill(&mut state, Instant::now());
        state.tokens
    }
}

/// Provider-keyed collection of token buckets
///
/// Buckets are created lazily on first reference. Each bucket has its own
/// lock, so acquisitions for different providers never contend.
#[derive(Debug, Default)]
pub struct RateLimiter {
    default_config: TokenBucketConfig,
    overrides: HashMap<String, TokenBucketConfig>,
    buckets: DashMap<String, Arc<TokenBucket>>,
}

impl RateLimiter {
    /// Create a limiter whose providers all use `default_config`
    #[must_use]
    pub fn new(default_config: TokenBucketConfig) -> Self {
        Self {
            default_config,
            overrides: HashMap::new(),
            buckets: DashMap::new(),
        }
    }

    /// Set the bucket config for one provider
    #[must_use]
    pub fn with_provider(mut self, provider: impl Into<String>, config: TokenBucketConfig) -> Self {
        self.overrides.insert(provider.into(), config);
        self
    }

    /// Bucket config in effect for a provider
    #[must_use]
    pub fn config_for(&self, provider: &str) -> TokenBucketConfig {
        self.overrides
            .get(provider)
            .copied()
            .unwrap_or(self.default_config)
    }

    fn bucket(&self, provider: &str) -> Arc<TokenBucket> {
        if let Some(bucket) = self.buckets.get(provider) {
            return Arc::clone(bucket.value());
        }
        let bucket = self
            .buckets
            .entry(provider.to_string())
            .or_insert_with(|| Arc::new(TokenBucket::new(self.config_for(provider))));
        Arc::clone(bucket.value())
    }

    /// Non-blocking acquisition for a provider
    pub fn try_acquire(&self, provider: &str, tokens: f64) -> Acquisition {
        self.bucket(provider).try_acquire(tokens)
    }

    /// Tokens currently available to a provider
    #[must_use]
    pub fn available(&self, provider: &str) -> f64 {
        self.bucket(provider).available()
    }

    /// Wait until `tokens` can be deducted from the provider's bucket
    ///
    /// Loops on [`TokenBucket::try_acquire`], sleeping for the reported wait
    /// between attempts. Waiters are not queued, so under heavy contention a
    /// caller may be overtaken repeatedly. Returns the total time spent
    /// waiting. Non-positive or non-finite token counts are rejected.
    pub async fn acquire(
        &self,
        provider: &str,
        tokens: f64,
        timeout: Option<Duration>,
        cancel: &CancellationToken,
    ) -> Result<Duration> {
        if !tokens.is_finite() || tokens <= 0.0 {
            return Err(Error::invalid_config(
                "tokens",
                format!("must be a positive number, got {tokens}"),
            ));
        }

        let bucket = self.bucket(provider);
        let capacity = bucket.config().max_tokens;
        if tokens > capacity {
            return Err(Error::ExceedsCapacity {
                provider: provider.to_string(),
                requested: tokens,
                capacity,
            });
        }

        let started = Instant::now();
        let deadline = timeout.and_then(|t| started.checked_add(t));

        loop {
            let attempt = bucket.try_acquire(tokens);
            if attempt.granted {
                return Ok(started.elapsed());
            }

            let mut wait = attempt.wait;
            if let Some(deadline) = deadline {
                let now = Instant::now();
                if now >= deadline {
                    return Err(Error::AcquireTimeout {
                        provider: provider.to_string(),
                        waited: now.duration_since(started),
                    });
                }
                wait = wait.min(deadline.duration_since(now));
            }

            debug!(
                provider = %provider,
                wait_ms = wait.as_millis() as u64,
                "Waiting for rate tokens"
            );

            tokio::select! {
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                _ = sleep(wait) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests;
