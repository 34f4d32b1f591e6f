//! Pipeline configuration

use crate::error::SynthesizerError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use veritas_gatekeeper::GatekeeperConfig;
use veritas_ingest::IngestConfig;
use veritas_llm::RetryPolicy;
use veritas_retrieval::RetrievalConfig;

/// Configuration for draft generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DraftConfig {
    /// Chunks placed in the generation prompt
    pub max_context_chunks: usize,

    /// Characters of each chunk placed in the prompt
    pub max_chunk_chars: usize,

    /// Sentences kept by the extractive fallback
    pub extractive_sentences: usize,

    /// Timeout and backoff for generation calls
    pub retry: RetryPolicy,
}

impl Default for DraftConfig {
    fn default() -> Self {
        Self {
            max_context_chunks: 8,
            max_chunk_chars: 1200,
            extractive_sentences: 6,
            retry: RetryPolicy::default(),
        }
    }
}

impl DraftConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_context_chunks == 0 {
            return Err("max_context_chunks must be greater than 0".to_string());
        }
        if self.max_chunk_chars == 0 {
            return Err("max_chunk_chars must be greater than 0".to_string());
        }
        if self.extractive_sentences == 0 {
            return Err("extractive_sentences must be greater than 0".to_string());
        }
        self.retry.validate()
    }
}

/// Configuration for a full research run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Scoring, chunking and embedding
    pub ingest: IngestConfig,

    /// Corrective retrieval
    pub retrieval: RetrievalConfig,

    /// Verification, review and quality gate
    pub gatekeeper: GatekeeperConfig,

    /// Draft generation
    pub draft: DraftConfig,
}

impl PipelineConfig {
    /// Stricter retrieval and publication bars
    pub fn strict() -> Self {
        Self {
            retrieval: RetrievalConfig::strict(),
            gatekeeper: GatekeeperConfig::strict(),
            ..Self::default()
        }
    }

    /// Looser retrieval and publication bars
    pub fn lenient() -> Self {
        Self {
            retrieval: RetrievalConfig::lenient(),
            gatekeeper: GatekeeperConfig::lenient(),
            ..Self::default()
        }
    }

    /// Validate every section
    pub fn validate(&self) -> Result<(), String> {
        self.ingest.validate()?;
        self.retrieval.validate()?;
        self.gatekeeper.validate()?;
        self.draft.validate()
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }

    /// Load and validate configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SynthesizerError> {
        let contents = fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml(&contents).map_err(SynthesizerError::Config)?;
        config.validate().map_err(SynthesizerError::Config)?;
        Ok(config)
    }

    /// Write configuration to a TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SynthesizerError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = self.to_toml().map_err(SynthesizerError::Config)?;
        fs::write(path, contents)?;
        Ok(())
    }
}
