//! Telemetry Reporting
//!
//! This module contains the per-provider telemetry snapshot and its
//! Prometheus and plain-text renderings.

use chrono::{DateTime, Utc};
use serde::Serialize;
use switchyard_core::CircuitState;

/// Telemetry for one provider
#[derive(Debug, Clone, Serialize)]
pub struct ProviderTelemetry {
    /// Provider name
    pub provider: String,
    /// Current circuit state
    pub circuit_state: CircuitState,
    /// Consecutive failures counted by the breaker
    pub consecutive_failures: u32,
    /// Advisory health score in `[0, 1]`
    pub health_score: f64,
    /// Success rate over the rolling window
    pub success_rate: Option<f64>,
    /// Average latency of successes in the rolling window
    pub average_latency_ms: Option<f64>,
    /// Outcomes currently in the rolling window
    pub window_samples: usize,
    /// Lifetime successes
    pub total_successes: u64,
    /// Lifetime failures
    pub total_failures: u64,
    /// Lifetime latency of successful dispatches
    pub cumulative_latency_ms: f64,
    /// Lifetime cost
    pub cumulative_cost: f64,
    /// Last success
    pub last_success_at: Option<DateTime<Utc>>,
    /// Last failure
    pub last_failure_at: Option<DateTime<Utc>>,
}

/// Telemetry for every tracked provider
#[derive(Debug, Clone, Serialize)]
pub struct TelemetrySnapshot {
    /// When the snapshot was taken
    pub generated_at: DateTime<Utc>,
    /// Providers, sorted by name
    pub providers: Vec<ProviderTelemetry>,
}

impl TelemetrySnapshot {
    /// Look up one provider
    #[must_use]
    pub fn provider(&self, name: &str) -> Option<&ProviderTelemetry> {
        self.providers.iter().find(|p| p.provider == name)
    }

    /// Cost across all providers
    #[must_use]
    pub fn total_cost(&self) -> f64 {
        self.providers.iter().map(|p| p.cumulative_cost).sum()
    }

    /// Render in the Prometheus text exposition format
    #[must_use]
    pub fn to_prometheus(&self) -> String {
        let mut output = String::new();

        gauge(
            &mut output,
            "switchyard_circuit_state",
            "Circuit state (0 closed, 1 half-open, 2 open)",
            self.providers.iter().map(|p| {
                let value = match p.circuit_state {
                    CircuitState::Closed => 0.0,
                    CircuitState::HalfOpen => 1.0,
                    CircuitState::Open => 2.0,
                };
                (p, value)
            }),
        );
        gauge(
            &mut output,
            "switchyard_health_score",
            "Advisory provider health score",
            self.providers.iter().map(|p| (p, p.health_score)),
        );
        gauge(
            &mut output,
            "switchyard_success_rate",
            "Success rate over the rolling window",
            self.providers
                .iter()
                .filter_map(|p| p.success_rate.map(|v| (p, v))),
        );
        gauge(
            &mut output,
            "switchyard_latency_avg_ms",
            "Average latency over the rolling window",
            self.providers
                .iter()
                .filter_map(|p| p.average_latency_ms.map(|v| (p, v))),
        );

        output.push_str("# HELP switchyard_cost_total Cumulative cost charged\n");
        output.push_str("# TYPE switchyard_cost_total counter\n");
        for p in &self.providers {
            output.push_str(&format!(
                "switchyard_cost_total{} {}\n",
                format_labels(&[("provider", p.provider.as_str())]),
                p.cumulative_cost
            ));
        }

        output.push_str("# HELP switchyard_dispatches_total Dispatches by outcome\n");
        output.push_str("# TYPE switchyard_dispatches_total counter\n");
        for p in &self.providers {
            for (outcome, count) in [("success", p.total_successes), ("failure", p.total_failures)]
            {
                output.push_str(&format!(
                    "switchyard_dispatches_total{} {}\n",
                    format_labels(&[("provider", p.provider.as_str()), ("outcome", outcome)]),
                    count
                ));
            }
        }

        output
    }
}

fn gauge<'a>(
    output: &mut String,
    name: &str,
    help: &str,
    values: impl Iterator<Item = (&'a ProviderTelemetry, f64)>,
) {
    output.push_str(&format!("# HELP {} {}\n", name, help));
    output.push_str(&format!("# TYPE {} gauge\n", name));
    for (p, value) in values {
        output.push_str(&format!(
            "{}{} {}\n",
            name,
            format_labels(&[("provider", p.provider.as_str())]),
            value
        ));
    }
}

/// Format label pairs as a Prometheus label string: `{key1="val1",key2="val2"}`
fn format_labels(labels: &[(&str, &str)]) -> String {
    if labels.is_empty() {
        return String::new();
    }
    let parts: Vec<String> = labels
        .iter()
        .map(|(k, v)| {
            let escaped = v
                .replace('\\', "\\\\")
                .replace('"', "\\\"")
                .replace('\n', "\\n");
            format!("{}=\"{}\"", k, escaped)
        })
        .collect();
    format!("{{{}}}", parts.join(","))
}

/// Format a snapshot as a plain-text report
#[must_use]
pub fn format_report(snapshot: &TelemetrySnapshot) -> String {
    let mut output = String::new();

    output.push_str("Provider Health Report\n");
    output.push_str(&format!(
        "Generated: {}\n",
        snapshot.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    output.push_str(&format!("Total Cost: ${:.4}\n", snapshot.total_cost()));

    if snapshot.providers.is_empty() {
        output.push_str("\nNo provider activity recorded.\n");
        return output;
    }

    for p in &snapshot.providers {
        output.push_str(&format!("\n{} [{}]\n", p.provider, p.circuit_state));
        output.push_str(&format!("  Health: {:.2}\n", p.health_score));
        match p.success_rate {
            Some(rate) => output.push_str(&format!(
                "  Success Rate: {:.1}% (last {} dispatches)\n",
                rate * 100.0,
                p.window_samples
            )),
            None => output.push_str("  Success Rate: n/a\n"),
        }
        match p.average_latency_ms {
            Some(latency) => output.push_str(&format!("  Avg Latency: {:.0}ms\n", latency)),
            None => output.push_str("  Avg Latency: n/a\n"),
        }
        output.push_str(&format!(
            "  Dispatches: {} ok, {} failed\n",
            p.total_successes, p.total_failures
        ));
        output.push_str(&format!("  Cost: ${:.4}\n", p.cumulative_cost));
        if p.consecutive_failures > 0 {
            output.push_str(&format!(
                "  Consecutive Failures: {}\n",
                p.consecutive_failures
            ));
        }
        if let Some(at) = p.last_failure_at {
            output.push_str(&format!(
                "  Last Failure: {}\n",
                at.format("%Y-%m-%d %H:%M:%S UTC")
            ));
        }
    }

    output
}
