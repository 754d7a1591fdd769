//! Capability router
//!
//! Ranks the static provider/model table against a request's capability
//! needs and hard constraints. The table is read-only after construction;
//! the only live input is observed latency from the health tracker.
//!
//! # Module Structure
//!
//! - `types`: `ProviderModelSpec` and `ScoredCandidate`
//! - `rules`: scoring weights and thresholds
//! - `router_impl`: `CapabilityRouter` implementation

mod router_impl;
mod rules;
mod types;

#[cfg(test)]
mod tests;

pub use router_impl::CapabilityRouter;
pub use rules::RoutingRules;
pub use types::{ProviderModelSpec, ScoredCandidate};
