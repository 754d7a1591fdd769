//! Switchyard Core - Resilience primitives
//!
//! This crate provides the provider-agnostic building blocks the request
//! router is assembled from:
//! - Rate limiter: per-provider token buckets with lazy refill
//! - Circuit breaker: three-state failure isolation per provider
//! - Retry: exponential backoff with jitter

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod utils;

pub use error::{Error, Result};
pub use utils::{
    Acquisition, Admission, BackoffPolicy, CircuitBreaker, CircuitBreakerConfig, CircuitState,
    RateLimiter, TokenBucket, TokenBucketConfig,
};
