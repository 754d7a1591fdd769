//! Capability router implementation
//!
//! This module contains the CapabilityRouter struct that filters and ranks
//! the provider/model table for each request.

use super::rules::RoutingRules;
use super::types::{ProviderModelSpec, ScoredCandidate};
use crate::completion::CompletionRequest;
use crate::error::{Error, Result};
use crate::health::HealthTracker;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tracing::debug;

/// Ranks provider/model pairs for a request
#[derive(Debug, Clone)]
pub struct CapabilityRouter {
    specs: Vec<ProviderModelSpec>,
    rules: RoutingRules,
    reference_cost: f64,
    health: Option<Arc<HealthTracker>>,
}

impl CapabilityRouter {
    /// Create a router over a static table
    ///
    /// Fails on malformed entries, duplicate (provider, model) pairs and
    /// unusable rules.
    pub fn new(specs: Vec<ProviderModelSpec>, rules: RoutingRules) -> Result<Self> {
        rules.validate()?;

        let mut seen = HashSet::new();
        for spec in &specs {
            spec.validate()?;
            if !seen.insert((spec.provider.as_str(), spec.model.as_str())) {
                return Err(Error::invalid_config(
                    "models",
                    format!("duplicate entry for {}", spec.label()),
                ));
            }
        }

        let reference_cost = rules.reference_cost.unwrap_or_else(|| {
            specs
                .iter()
                .map(|s| s.cost_per_1k_tokens)
                .fold(0.0, f64::max)
        });

        Ok(Self {
            specs,
            rules,
            reference_cost,
            health: None,
        })
    }

    /// Use observed latency from `tracker` for filtering and tie-breaks
    #[must_use]
    pub fn with_health(mut self, tracker: Arc<HealthTracker>) -> Self {
        self.health = Some(tracker);
        self
    }

    /// The full table
    #[must_use]
    pub fn specs(&self) -> &[ProviderModelSpec] {
        &self.specs
    }

    /// Look up one entry
    #[must_use]
    pub fn spec(&self, provider: &str, model: &str) -> Option<&ProviderModelSpec> {
        self.specs
            .iter()
            .find(|s| s.provider == provider && s.model == model)
    }

    /// Distinct provider names, sorted
    #[must_use]
    pub fn providers(&self) -> Vec<&str> {
        self.specs
            .iter()
            .map(|s| s.provider.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Get the routing rules
    #[must_use]
    pub fn rules(&self) -> &RoutingRules {
        &self.rules
    }

    /// Cost the cost bonus is measured against
    #[must_use]
    pub fn reference_cost(&self) -> f64 {
        self.reference_cost
    }

    /// Shrink context windows to what the adapters actually support
    pub(crate) fn tighten_context_limits(
        &mut self,
        limit_for: impl Fn(&ProviderModelSpec) -> Option<u64>,
    ) {
        for spec in &mut self.specs {
            if let Some(limit) = limit_for(spec) {
                if limit < spec.max_context {
                    debug!(
                        candidate = %spec.label(),
                        table = spec.max_context,
                        adapter = limit,
                        "Adapter narrows context window"
                    );
                    spec.max_context = limit;
                }
            }
        }
    }

    /// Latency used for `spec`: the provider's rolling average when any
    /// calls have been observed, else the table value
    #[must_use]
    pub fn latency_ms(&self, spec: &ProviderModelSpec) -> f64 {
        self.health
            .as_ref()
            .and_then(|h| h.average_latency_ms(&spec.provider))
            .unwrap_or(spec.avg_latency_ms as f64)
    }

    /// Rank score of `spec` for `request`
    #[must_use]
    pub fn score(&self, spec: &ProviderModelSpec, request: &CompletionRequest) -> f64 {
        let required: u32 = request
            .required
            .iter()
            .map(|tag| u32::from(spec.capability_score(tag)))
            .sum();
        let preferred: u32 = request
            .preferred
            .iter()
            .map(|tag| u32::from(spec.capability_score(tag)))
            .sum();
        let cost_bonus = (self.reference_cost - spec.cost_per_1k_tokens) * self.rules.cost_weight;

        self.rules.required_weight * f64::from(required)
            + self.rules.preferred_weight * f64::from(preferred)
            + cost_bonus
    }

    /// Why `spec` is ineligible for `request`, if it is
    fn rejection(
        &self,
        spec: &ProviderModelSpec,
        request: &CompletionRequest,
        latency_ms: f64,
    ) -> Option<String> {
        let constraints = &request.constraints;

        if let Some(max_cost) = constraints.max_cost_per_1k {
            if spec.cost_per_1k_tokens > max_cost {
                return Some(format!(
                    "cost {} exceeds {}",
                    spec.cost_per_1k_tokens, max_cost
                ));
            }
        }
        if let Some(max_latency) = constraints.max_latency_ms {
            if latency_ms > max_latency as f64 {
                return Some(format!("latency {latency_ms:.0}ms exceeds {max_latency}ms"));
            }
        }
        if let Some(min_context) = constraints.min_context {
            if spec.max_context < min_context {
                return Some(format!(
                    "context {} below {}",
                    spec.max_context, min_context
                ));
            }
        }

        request
            .required
            .iter()
            .find(|tag| spec.capability_score(tag) < self.rules.min_capability_score)
            .map(|tag| {
                format!(
                    "'{}' scores {} (minimum {})",
                    tag,
                    spec.capability_score(tag),
                    self.rules.min_capability_score
                )
            })
    }

    /// Ordered candidates for `request`, best first
    ///
    /// Ties on score go to the lower latency, then to provider and model name.
    /// An empty result is reported as [`Error::NoCandidate`].
    pub fn select_candidates(&self, request: &CompletionRequest) -> Result<Vec<ScoredCandidate>> {
        let mut candidates: Vec<ScoredCandidate> = self
            .specs
            .iter()
            .filter_map(|spec| {
                let latency_ms = self.latency_ms(spec);
                if let Some(reason) = self.rejection(spec, request, latency_ms) {
                    debug!(request_id = %request.id, candidate = %spec.label(), %reason, "Candidate filtered");
                    return None;
                }
                Some(ScoredCandidate {
                    score: self.score(spec, request),
                    latency_ms,
                    spec: spec.clone(),
                })
            })
            .collect();

        if candidates.is_empty() {
            return Err(Error::NoCandidate {
                required: request.required.iter().cloned().collect(),
                considered: self.specs.len(),
            });
        }

        candidates.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.latency_ms.total_cmp(&b.latency_ms))
                .then_with(|| a.spec.provider.cmp(&b.spec.provider))
                .then_with(|| a.spec.model.cmp(&b.spec.model))
        });

        debug!(
            request_id = %request.id,
            candidates = ?candidates.iter().map(|c| c.spec.label()).collect::<Vec<_>>(),
            "Ranked candidates"
        );

        Ok(candidates)
    }
}
