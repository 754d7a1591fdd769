//! Routing rules for candidate scoring
//!
//! This module contains the RoutingRules struct for tuning how candidates are
//! filtered and ranked.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Candidate scoring configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingRules {
    /// Lowest acceptable score on each required capability (1..=10)
    pub min_capability_score: u8,
    /// Multiplier for required capability scores
    pub required_weight: f64,
    /// Multiplier for preferred capability scores
    pub preferred_weight: f64,
    /// Multiplier for the cost bonus
    pub cost_weight: f64,
    /// Cost the bonus is measured against; defaults to the priciest model
    pub reference_cost: Option<f64>,
}

impl Default for RoutingRules {
    fn default() -> Self {
        Self {
            min_capability_score: 5,
            required_weight: 3.0,
            preferred_weight: 1.0,
            cost_weight: 1.0,
            reference_cost: None,
        }
    }
}

impl RoutingRules {
    /// Set the minimum required capability score
    #[must_use]
    pub fn with_min_capability_score(mut self, score: u8) -> Self {
        self.min_capability_score = score;
        self
    }

    /// Set the cost bonus weight
    #[must_use]
    pub fn with_cost_weight(mut self, weight: f64) -> Self {
        self.cost_weight = weight;
        self
    }

    /// Pin the reference cost
    #[must_use]
    pub fn with_reference_cost(mut self, cost: f64) -> Self {
        self.reference_cost = Some(cost);
        self
    }

    /// Check the rules are usable
    pub fn validate(&self) -> Result<()> {
        if !(1..=10).contains(&self.min_capability_score) {
            return Err(Error::invalid_config(
                "routing.min_capability_score",
                "must be between 1 and 10",
            ));
        }
        for (field, value) in [
            ("routing.required_weight", self.required_weight),
            ("routing.preferred_weight", self.preferred_weight),
            ("routing.cost_weight", self.cost_weight),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::invalid_config(field, "must be a non-negative number"));
            }
        }
        if let Some(cost) = self.reference_cost {
            if !cost.is_finite() || cost < 0.0 {
                return Err(Error::invalid_config(
                    "routing.reference_cost",
                    "must be a non-negative number",
                ));
            }
        }
        Ok(())
    }
}
