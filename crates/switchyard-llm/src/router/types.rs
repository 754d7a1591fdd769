//! Router types
//!
//! This module defines the static capability table entry and the ranked
//! candidate produced for each request.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One (provider, model) pair and what it is good at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderModelSpec {
    /// Provider name
    pub provider: String,
    /// Model name
    pub model: String,
    /// Capability tag -> score (1..=10)
    #[serde(default)]
    pub capabilities: BTreeMap<String, u8>,
    /// Cost per 1000 tokens
    #[serde(default)]
    pub cost_per_1k_tokens: f64,
    /// Maximum context size in tokens
    #[serde(default)]
    pub max_context: u64,
    /// Typical latency, used until real observations exist
    #[serde(default)]
    pub avg_latency_ms: u64,
}

impl ProviderModelSpec {
    /// Create an empty spec
    #[must_use]
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            capabilities: BTreeMap::new(),
            cost_per_1k_tokens: 0.0,
            max_context: 0,
            avg_latency_ms: 0,
        }
    }

    /// Add a capability score
    #[must_use]
    pub fn with_capability(mut self, tag: impl Into<String>, score: u8) -> Self {
        self.capabilities.insert(tag.into(), score);
        self
    }

    /// Set the price per 1000 tokens
    #[must_use]
    pub fn with_cost_per_1k(mut self, cost: f64) -> Self {
        self.cost_per_1k_tokens = cost;
        self
    }

    /// Set the context window
    #[must_use]
    pub fn with_max_context(mut self, tokens: u64) -> Self {
        self.max_context = tokens;
        self
    }

    /// Set the typical latency
    #[must_use]
    pub fn with_avg_latency_ms(mut self, latency_ms: u64) -> Self {
        self.avg_latency_ms = latency_ms;
        self
    }

    /// Score for `tag` (0 when the model does not list it)
    #[must_use]
    pub fn capability_score(&self, tag: &str) -> u8 {
        self.capabilities.get(tag).copied().unwrap_or(0)
    }

    /// `provider/model`, as used in logs
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}/{}", self.provider, self.model)
    }

    /// Check the entry is well formed
    pub fn validate(&self) -> Result<()> {
        let field = |name: &str| format!("models[{}].{}", self.label(), name);

        if self.provider.trim().is_empty() || self.model.trim().is_empty() {
            return Err(Error::invalid_config(
                field("provider"),
                "provider and model must be non-empty",
            ));
        }
        for (tag, score) in &self.capabilities {
            if !(1..=10).contains(score) {
                return Err(Error::invalid_config(
                    field("capabilities"),
                    format!("score for '{tag}' must be between 1 and 10, got {score}"),
                ));
            }
        }
        if !self.cost_per_1k_tokens.is_finite() || self.cost_per_1k_tokens < 0.0 {
            return Err(Error::invalid_config(
                field("cost_per_1k_tokens"),
                "must be a non-negative number",
            ));
        }
        Ok(())
    }
}

/// A spec that survived filtering, with its rank inputs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCandidate {
    /// The table entry
    pub spec: ProviderModelSpec,
    /// Weighted capability score plus cost bonus
    pub score: f64,
    /// Latency used for filtering and tie-breaks (observed when available)
    pub latency_ms: f64,
}

impl ScoredCandidate {
    /// Provider name
    #[must_use]
    pub fn provider(&self) -> &str {
        &self.spec.provider
    }

    /// Model name
    #[must_use]
    pub fn model(&self) -> &str {
        &self.spec.model
    }
}
