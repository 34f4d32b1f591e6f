//! Retrieval configuration

use serde::{Deserialize, Serialize};

/// Configuration for corrective retrieval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Upper bound on retrieve-check-refine rounds
    pub max_iterations: usize,

    /// Completeness (0-100) at which context counts as sufficient
    pub sufficiency_threshold: f64,

    /// Fraction of query terms (0.0-1.0) the chunks must cover to be relevant
    pub relevance_threshold: f64,

    /// Chunks requested per round
    pub top_k: usize,

    /// Distinct sources needed when the strategy requires diversity
    pub min_distinct_sources: usize,

    /// Store results requested per chunk kept, to leave room for filtering
    pub overfetch: usize,

    /// Whether multi-perspective strategies raise the distinct-source
    /// requirement to their `min_sources`
    pub enforce_strategy_sources: bool,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_iterations: 3,
            sufficiency_threshold: 70.0,
            relevance_threshold: 0.2,
            top_k: 8,
            min_distinct_sources: 2,
            overfetch: 3,
            enforce_strategy_sources: true,
        }
    }
}

impl RetrievalConfig {
    /// Higher bar, one extra round
    pub fn strict() -> Self {
        Self {
            max_iterations: 4,
            sufficiency_threshold: 85.0,
            relevance_threshold: 0.3,
            ..Self::default()
        }
    }

    /// Lower bar, single-source answers allowed
    pub fn lenient() -> Self {
        Self {
            max_iterations: 2,
            sufficiency_threshold: 50.0,
            relevance_threshold: 0.1,
            min_distinct_sources: 1,
            enforce_strategy_sources: false,
            ..Self::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_iterations == 0 {
            return Err("max_iterations must be greater than 0".to_string());
        }
        if !(0.0..=100.0).contains(&self.sufficiency_threshold) {
            return Err("sufficiency_threshold must be between 0 and 100".to_string());
        }
        if !(0.0..=1.0).contains(&self.relevance_threshold) {
            return Err("relevance_threshold must be between 0.0 and 1.0".to_string());
        }
        if self.top_k == 0 {
            return Err("top_k must be greater than 0".to_string());
        }
        if self.overfetch == 0 {
            return Err("overfetch must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
