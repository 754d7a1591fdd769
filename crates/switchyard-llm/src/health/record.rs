//! Rolling outcome records
//!
//! This module contains the per-provider statistics kept by the tracker.

use chrono::{DateTime, Utc};
use std::collections::VecDeque;

/// One finished dispatch
#[derive(Debug, Clone, Copy)]
pub(crate) struct Outcome {
    pub success: bool,
    /// Only successes carry a latency sample
    pub latency_ms: Option<f64>,
}

/// Sliding window over the last `capacity` outcomes, plus lifetime totals
#[derive(Debug)]
pub(crate) struct RollingStats {
    window: VecDeque<Outcome>,
    capacity: usize,
    pub total_successes: u64,
    pub total_failures: u64,
    pub cumulative_latency_ms: f64,
    pub cumulative_cost: f64,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_failure_at: Option<DateTime<Utc>>,
}

impl RollingStats {
    pub fn new(capacity: usize) -> Self {
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            total_successes: 0,
            total_failures: 0,
            cumulative_latency_ms: 0.0,
            cumulative_cost: 0.0,
            last_success_at: None,
            last_failure_at: None,
        }
    }

    fn push(&mut self, outcome: Outcome) {
        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(outcome);
    }

    pub fn record_success(&mut self, latency_ms: f64, cost: f64) {
        self.push(Outcome {
            success: true,
            latency_ms: Some(latency_ms),
        });
        self.total_successes += 1;
        self.cumulative_latency_ms += latency_ms;
        self.cumulative_cost += cost;
        self.last_success_at = Some(Utc::now());
    }

    pub fn record_failure(&mut self) {
        self.push(Outcome {
            success: false,
            latency_ms: None,
        });
        self.total_failures += 1;
        self.last_failure_at = Some(Utc::now());
    }

    /// Outcomes currently in the window
    pub fn len(&self) -> usize {
        self.window.len()
    }

    /// Share of successes in the window, `None` before any outcome
    pub fn success_rate(&self) -> Option<f64> {
        if self.window.is_empty() {
            return None;
        }
        let successes = self.window.iter().filter(|o| o.success).count();
        Some(successes as f64 / self.window.len() as f64)
    }

    /// Mean latency of the successes in the window
    pub fn average_latency_ms(&self) -> Option<f64> {
        let (sum, count) = self
            .window
            .iter()
            .filter_map(|o| o.latency_ms)
            .fold((0.0, 0usize), |(sum, n), l| (sum + l, n + 1));
        (count > 0).then(|| sum / count as f64)
    }
}
