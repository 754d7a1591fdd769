//! Health and cost tracking
//!
//! Passive per-provider bookkeeping fed by the executor: a rolling window of
//! outcomes, cumulative cost, and the provider's circuit breaker. The health
//! score is advisory; gating is left to the breaker alone.
//!
//! # Module Structure
//!
//! - `record`: rolling outcome window and cumulative counters
//! - `tracker`: HealthTracker implementation
//! - `report`: telemetry snapshot and its text/Prometheus renderings

mod record;
mod report;
mod tracker;


pub use report::{format_report, ProviderTelemetry, TelemetrySnapshot};
pub use tracker::{HealthConfig, HealthTracker};
