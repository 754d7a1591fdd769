//! Resilience utilities
//!
//! - rate_limiter: token bucket per provider
//! - circuit_breaker: Closed / Open / HalfOpen state machine
//! - retry: backoff delay policy

mod circuit_breaker;
mod rate_limiter;
mod retry;

pub use circuit_breaker::{Admission, CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use rate_limiter::{Acquisition, RateLimiter, TokenBucket, TokenBucketConfig};
pub use retry::BackoffPolicy;
