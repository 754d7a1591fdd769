//! Error classification
//!
//! Maps a raw [`ProviderError`] into exactly one [`ErrorCategory`] plus the
//! retry decision that goes with it. Matching runs in a fixed priority order
//! (rate limit, auth, server, transient, parse, client) and anything that
//! matches none of them is `Fatal`, so the mapping is total.

use crate::provider::{ProviderError, TransportKind};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;
use std::time::Duration;

static STATUS_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:http|status(?:\s+code)?|error\s+code)\s*[:=]?\s*([1-5]\d{2})\b")
        .expect("STATUS_REGEX is a compile-time constant")
});

static RETRY_HINT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)retry\s+(?:after|in)\s+(\d+(?:\.\d+)?)\s*(?:s\b|sec|seconds?\b)?")
        .expect("RETRY_HINT_REGEX is a compile-time constant")
});

static RATE_LIMIT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)rate[\s_-]?limit|too many requests|quota exceeded|resource[\s_]exhausted")
        .expect("RATE_LIMIT_REGEX is a compile-time constant")
});

static AUTH_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)unauthori[sz]ed|forbidden|invalid api key|authentication failed|(?:token|credentials?) (?:has |have )?expired")
        .expect("AUTH_REGEX is a compile-time constant")
});

static SERVER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)internal server error|bad gateway|service unavailable|overloaded")
        .expect("SERVER_REGEX is a compile-time constant")
});

static TRANSIENT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)timed?\s?out|connection (?:reset|refused|closed|aborted)|broken pipe")
        .expect("TRANSIENT_REGEX is a compile-time constant")
});

static PARSE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)failed to parse|invalid json|malformed response|unexpected end of (?:input|stream)")
        .expect("PARSE_REGEX is a compile-time constant")
});

static CLIENT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)bad request|invalid request|malformed request|context length exceeded")
        .expect("CLIENT_REGEX is a compile-time constant")
});

/// Actionable failure category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Provider throttled the call (HTTP 429)
    RateLimit,
    /// Credentials rejected (HTTP 401/403)
    Auth,
    /// Provider-side failure (HTTP 5xx)
    Server,
    /// Timeout or dropped connection
    Transient,
    /// Response body could not be understood
    Parse,
    /// The request itself is bad (HTTP 400 and friends)
    Client,
    /// Anything unrecognised
    Fatal,
}

impl ErrorCategory {
    /// All categories, in matching priority order
    pub const ALL: [ErrorCategory; 7] = [
        Self::RateLimit,
        Self::Auth,
        Self::Server,
        Self::Transient,
        Self::Parse,
        Self::Client,
        Self::Fatal,
    ];

    /// Stable lowercase name (used in metric labels)
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RateLimit => "rate_limit",
            Self::Auth => "auth",
            Self::Server => "server",
            Self::Transient => "transient",
            Self::Parse => "parse",
            Self::Client => "client",
            Self::Fatal => "fatal",
        }
    }

    /// Whether a candidate that ends on this category counts against its
    /// provider's circuit breaker
    ///
    /// Rate limiting has its own gate, and client or auth failures are not
    /// the provider being unhealthy.
    #[must_use]
    pub fn trips_circuit(&self) -> bool {
        matches!(
            self,
            Self::Server | Self::Transient | Self::Parse | Self::Fatal
        )
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::RateLimit => "RateLimit",
            Self::Auth => "Auth",
            Self::Server => "Server",
            Self::Transient => "Transient",
            Self::Parse => "Parse",
            Self::Client => "Client",
            Self::Fatal => "Fatal",
        };
        f.write_str(s)
    }
}

/// A failure with its retry decision attached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedError {
    /// Category
    pub category: ErrorCategory,
    /// Whether retrying the same candidate can help
    pub should_retry: bool,
    /// Explicit wait before the next attempt; overrides computed backoff
    ///
    /// Set from the provider's own hint, or zero for parse failures, which
    /// are retried at once.
    pub retry_after: Option<Duration>,
    /// Category minimum for the computed backoff when there is no explicit wait
    pub min_delay: Duration,
    /// The retry is only useful after the adapter refreshes its credentials
    pub needs_credential_refresh: bool,
    /// HTTP status, from the error or recovered from its message
    pub status: Option<u16>,
    /// Original provider message
    pub message: String,
}

impl std::fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} (HTTP {}): {}", self.category, status, self.message),
            None => write!(f, "{}: {}", self.category, self.message),
        }
    }
}

/// Maps raw provider failures to categories
#[derive(Debug, Clone)]
pub struct ErrorClassifier {
    rate_limit_default: Duration,
    provider_rate_limit_defaults: HashMap<String, Duration>,
    server_retry_after: Duration,
    transient_retry_after: Duration,
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self {
            rate_limit_default: Duration::from_secs(60),
            provider_rate_limit_defaults: HashMap::new(),
            server_retry_after: Duration::from_secs(5),
            transient_retry_after: Duration::from_secs(1),
        }
    }
}

impl ErrorClassifier {
    /// Create a classifier with default waits
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Minimum wait after rate limits that carry no retry-after hint
    #[must_use]
    pub fn with_rate_limit_default(mut self, wait: Duration) -> Self {
        self.rate_limit_default = wait;
        self
    }

    /// Rate limit wait for one provider
    #[must_use]
    pub fn with_provider_rate_limit_default(
        mut self,
        provider: impl Into<String>,
        wait: Duration,
    ) -> Self {
        self.provider_rate_limit_defaults
            .insert(provider.into(), wait);
        self
    }

    /// Minimum backoff after server errors
    #[must_use]
    pub fn with_server_retry_after(mut self, wait: Duration) -> Self {
        self.server_retry_after = wait;
        self
    }

    /// Minimum backoff after transient errors
    #[must_use]
    pub fn with_transient_retry_after(mut self, wait: Duration) -> Self {
        self.transient_retry_after = wait;
        self
    }

    /// Rate limit wait used for `provider` when it sends no hint
    #[must_use]
    pub fn rate_limit_default_for(&self, provider: &str) -> Duration {
        self.provider_rate_limit_defaults
            .get(provider)
            .copied()
            .unwrap_or(self.rate_limit_default)
    }

    /// Classify a failure reported by `provider`
    #[must_use]
    pub fn classify(&self, provider: &str, error: &ProviderError) -> ClassifiedError {
        let status = error.status.or_else(|| status_from_message(&error.message));
        let message = error.message.as_str();
        let classified = |category: ErrorCategory,
                          should_retry: bool,
                          retry_after: Option<Duration>,
                          min_delay: Duration| ClassifiedError {
            category,
            should_retry,
            retry_after,
            min_delay,
            needs_credential_refresh: category == ErrorCategory::Auth,
            status,
            message: error.message.clone(),
        };

        if status == Some(429) || RATE_LIMIT_REGEX.is_match(message) {
            let hint = error
                .retry_after
                .as_deref()
                .and_then(parse_retry_after)
                .or_else(|| retry_hint_from_message(message));
            return classified(
                ErrorCategory::RateLimit,
                true,
                hint,
                self.rate_limit_default_for(provider),
            );
        }

        if matches!(status, Some(401 | 403)) || AUTH_REGEX.is_match(message) {
            return classified(ErrorCategory::Auth, true, None, Duration::ZERO);
        }

        if matches!(status, Some(500..=599)) || SERVER_REGEX.is_match(message) {
            return classified(ErrorCategory::Server, true, None, self.server_retry_after);
        }

        if matches!(error.kind, TransportKind::Timeout | TransportKind::Connection)
            || status == Some(408)
            || TRANSIENT_REGEX.is_match(message)
        {
            return classified(
                ErrorCategory::Transient,
                true,
                None,
                self.transient_retry_after,
            );
        }

        if error.kind == TransportKind::Decode || PARSE_REGEX.is_match(message) {
            return classified(
                ErrorCategory::Parse,
                true,
                Some(Duration::ZERO),
                Duration::ZERO,
            );
        }

        if matches!(status, Some(400..=499)) || CLIENT_REGEX.is_match(message) {
            return classified(ErrorCategory::Client, false, None, Duration::ZERO);
        }

        classified(ErrorCategory::Fatal, false, None, Duration::ZERO)
    }
}

/// Parse a `Retry-After` value: delta-seconds or an HTTP-date
///
/// Dates in the past yield a zero wait. Unparseable values yield `None`.
#[must_use]
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<f64>() {
        return Duration::try_from_secs_f64(secs).ok();
    }

    let when = chrono::DateTime::parse_from_rfc2822(value).ok()?;
    let delta = when.with_timezone(&chrono::Utc) - chrono::Utc::now();
    Some(delta.to_std().unwrap_or(Duration::ZERO))
}

fn status_from_message(message: &str) -> Option<u16> {
    STATUS_REGEX
        .captures(message)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn retry_hint_from_message(message: &str) -> Option<Duration> {
    RETRY_HINT_REGEX
        .captures(message)
        .and_then(|caps| caps.get(1))
        .and_then(|m| parse_retry_after(m.as_str()))
}

#[cfg(test)]
mod tests;
