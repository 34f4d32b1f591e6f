//! Gatekeeper configuration

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Configuration for claim extraction and cross-referencing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    /// Sentences this short or shorter are not claims
    pub min_sentence_chars: usize,

    /// Shortest word counted as a keyword
    pub keyword_min_len: usize,

    /// Fraction of claim keywords a chunk must share to be consulted (0.0-1.0)
    pub overlap_threshold: f64,

    /// Relative difference within which two numbers agree
    pub numeric_tolerance: f64,

    /// Sentence similarity above which a chunk supports the claim
    pub support_similarity: f64,

    /// Sentence similarity above which support counts as a direct quote
    pub direct_quote_similarity: f64,

    /// Shared keywords that put a negating sentence on topic
    pub negation_shared_keywords: usize,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            min_sentence_chars: 20,
            keyword_min_len: 4,
            overlap_threshold: 0.5,
            numeric_tolerance: 0.10,
            support_similarity: 0.5,
            direct_quote_similarity: 0.8,
            negation_shared_keywords: 2,
        }
    }
}

impl VerifierConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("overlap_threshold", self.overlap_threshold),
            ("numeric_tolerance", self.numeric_tolerance),
            ("support_similarity", self.support_similarity),
            ("direct_quote_similarity", self.direct_quote_similarity),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{} must be between 0.0 and 1.0", name));
            }
        }
        if self.direct_quote_similarity < self.support_similarity {
            return Err("direct_quote_similarity must not be below support_similarity".to_string());
        }
        if self.keyword_min_len == 0 {
            return Err("keyword_min_len must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Configuration for hallucination detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Claims below this confidence (0-100) are treated as hallucinations
    pub min_confidence: f64,

    /// Most unexplained-entity flags reported per text
    pub max_entity_flags: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_confidence: 50.0,
            max_entity_flags: 5,
        }
    }
}

/// Configuration for ensemble validation (confidences on a 0-1 scale)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnsembleConfig {
    /// Time each reviewer gets per target, in milliseconds
    pub reviewer_timeout_ms: u64,

    /// Aggregate above which confidence is boosted
    pub baseline: f64,

    /// Largest boost, reached at a unanimous `supported`
    pub max_boost: f64,

    /// Boosting never goes above this
    pub confidence_cap: f64,

    /// Reducing never goes below this
    pub confidence_floor: f64,

    /// Confidence ceiling when reviewers disagree
    pub conflicted_cap: f64,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            reviewer_timeout_ms: 10_000,
            baseline: 0.5,
            max_boost: 0.15,
            confidence_cap: 0.95,
            confidence_floor: 0.15,
            conflicted_cap: 0.4,
        }
    }
}

impl EnsembleConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.reviewer_timeout_ms == 0 {
            return Err("reviewer_timeout_ms must be greater than 0".to_string());
        }
        if !(0.0..1.0).contains(&self.baseline) {
            return Err("baseline must be in [0.0, 1.0)".to_string());
        }
        for (name, value) in [
            ("max_boost", self.max_boost),
            ("confidence_cap", self.confidence_cap),
            ("confidence_floor", self.confidence_floor),
            ("conflicted_cap", self.conflicted_cap),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{} must be between 0.0 and 1.0", name));
            }
        }
        if self.confidence_floor > self.confidence_cap {
            return Err("confidence_floor must not exceed confidence_cap".to_string());
        }
        Ok(())
    }
}

/// Dimension weights for the overall quality score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityWeights {
    /// Weight of mean source credibility
    pub source_credibility: f64,
    /// Weight of citation coverage
    pub citation_coverage: f64,
    /// Weight of the verified-claim share
    pub fact_verification: f64,
    /// Weight of length and concept coverage
    pub concept_clarity: f64,
    /// Weight of bias and source diversity
    pub perspective_diversity: f64,
    /// Weight of source recency
    pub currency: f64,
    /// Weight of explanatory structure
    pub educational_value: f64,
}

impl Default for QualityWeights {
    fn default() -> Self {
        Self {
            source_credibility: 0.2,
            citation_coverage: 0.2,
            fact_verification: 0.2,
            concept_clarity: 0.1,
            perspective_diversity: 0.1,
            currency: 0.1,
            educational_value: 0.1,
        }
    }
}

impl QualityWeights {
    /// Sum of all weights
    pub fn total(&self) -> f64 {
        self.source_credibility
            + self.citation_coverage
            + self.fact_verification
            + self.concept_clarity
            + self.perspective_diversity
            + self.currency
            + self.educational_value
    }
}

/// Configuration for the quality gate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// Overall score needed to publish
    pub publish_threshold: f64,

    /// Texts shorter than this lose concept clarity
    pub min_words: usize,

    /// Dimension weights, summing to 1
    pub weights: QualityWeights,

    /// Date source ages are measured from; today when unset
    pub reference_date: Option<NaiveDate>,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            publish_threshold: 80.0,
            min_words: 500,
            weights: QualityWeights::default(),
            reference_date: None,
        }
    }
}

impl QualityConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=100.0).contains(&self.publish_threshold) {
            return Err("publish_threshold must be between 0 and 100".to_string());
        }
        if (self.weights.total() - 1.0).abs() > 1e-6 {
            return Err(format!("quality weights must sum to 1.0, got {:.3}", self.weights.total()));
        }
        Ok(())
    }
}

/// Configuration for every gatekeeper component
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatekeeperConfig {
    /// Claim verification
    pub verifier: VerifierConfig,

    /// Hallucination detection
    pub detector: DetectorConfig,

    /// Ensemble validation
    pub ensemble: EnsembleConfig,

    /// Quality gate
    pub quality: QualityConfig,
}

impl GatekeeperConfig {
    /// Tighter matching and a higher publication bar
    pub fn strict() -> Self {
        Self {
            verifier: VerifierConfig {
                overlap_threshold: 0.6,
                numeric_tolerance: 0.05,
                ..VerifierConfig::default()
            },
            detector: DetectorConfig {
                min_confidence: 60.0,
                ..DetectorConfig::default()
            },
            ensemble: EnsembleConfig {
                conflicted_cap: 0.3,
                ..EnsembleConfig::default()
            },
            quality: QualityConfig {
                publish_threshold: 85.0,
                ..QualityConfig::default()
            },
        }
    }

    /// Looser matching and a lower publication bar
    pub fn lenient() -> Self {
        Self {
            verifier: VerifierConfig {
                overlap_threshold: 0.4,
                numeric_tolerance: 0.15,
                support_similarity: 0.4,
                ..VerifierConfig::default()
            },
            detector: DetectorConfig {
                min_confidence: 40.0,
                max_entity_flags: 3,
            },
            ensemble: EnsembleConfig::default(),
            quality: QualityConfig {
                publish_threshold: 70.0,
                min_words: 300,
                ..QualityConfig::default()
            },
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        self.verifier.validate()?;
        self.ensemble.validate()?;
        self.quality.validate()?;
        if !(0.0..=100.0).contains(&self.detector.min_confidence) {
            return Err("detector.min_confidence must be between 0 and 100".to_string());
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GatekeeperConfig::default();
        assert_eq!(config.verifier.min_sentence_chars, 20);
        assert_eq!(config.detector.max_entity_flags, 5);
        assert_eq!(config.ensemble.conflicted_cap, 0.4);
        assert_eq!(config.quality.publish_threshold, 80.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets_are_valid() {
        assert!(GatekeeperConfig::strict().validate().is_ok());
        assert!(GatekeeperConfig::lenient().validate().is_ok());
        assert!(GatekeeperConfig::strict().quality.publish_threshold > GatekeeperConfig::lenient().quality.publish_threshold);
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        let mut config = GatekeeperConfig::default();
        config.quality.weights.currency = 0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_similarity_ordering() {
        let mut config = VerifierConfig::default();
        config.direct_quote_similarity = 0.3;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml() {
        let config = GatekeeperConfig::from_toml("[ensemble]\nreviewer_timeout_ms = 250\n").unwrap();
        assert_eq!(config.ensemble.reviewer_timeout_ms, 250);
        assert_eq!(config.ensemble.baseline, 0.5);
        assert_eq!(config.verifier, VerifierConfig::default());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = GatekeeperConfig::strict();
        let parsed = GatekeeperConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }
}
