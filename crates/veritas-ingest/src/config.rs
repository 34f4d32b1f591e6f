//! Configuration for ingestion

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A recognized publication and its authority bonus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicationTier {
    /// Publication name, matched case-insensitively as the whole name or a
    /// leading word sequence ("IEEE" matches "IEEE Transactions on ...")
    pub name: String,
    /// Authority bonus (0-5)
    pub bonus: u32,
}

impl PublicationTier {
    fn new(name: &str, bonus: u32) -> Self {
        Self {
            name: name.to_string(),
            bonus,
        }
    }
}

/// Configuration for the credibility scorer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredibilityConfig {
    /// Topics whose sources age quickly, matched as whole words
    pub fast_moving_keywords: Vec<String>,

    /// Known-unreliable domains (a subdomain of a listed domain matches too)
    pub blocklist: Vec<String>,

    /// Recognized high-tier publications
    pub publication_tiers: Vec<PublicationTier>,

    /// Date ages are measured from; today when unset
    pub reference_date: Option<NaiveDate>,
}

impl Default for CredibilityConfig {
    fn default() -> Self {
        let keywords = [
            "ai",
            "artificial intelligence",
            "llm",
            "llms",
            "large language model",
            "generative",
            "gpt",
            "machine learning",
            "cryptocurrency",
            "crypto",
            "bitcoin",
            "blockchain",
            "web3",
        ];
        Self {
            fast_moving_keywords: keywords.iter().map(|k| k.to_string()).collect(),
            blocklist: vec![
                "beforeitsnews.com".to_string(),
                "naturalnews.com".to_string(),
                "infowars.com".to_string(),
            ],
            publication_tiers: vec![
                PublicationTier::new("Nature", 5),
                PublicationTier::new("Science", 5),
                PublicationTier::new("Cell", 5),
                PublicationTier::new("The Lancet", 5),
                PublicationTier::new("NEJM", 5),
                PublicationTier::new("New England Journal of Medicine", 5),
                PublicationTier::new("JAMA", 5),
                PublicationTier::new("PNAS", 4),
                PublicationTier::new("IEEE", 4),
                PublicationTier::new("ACM", 4),
                PublicationTier::new("arXiv", 2),
            ],
            reference_date: None,
        }
    }
}

impl CredibilityConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if let Some(tier) = self.publication_tiers.iter().find(|t| t.bonus > 5) {
            return Err(format!(
                "publication bonus for '{}' is {} (max 5)",
                tier.name, tier.bonus
            ));
        }
        if self.fast_moving_keywords.iter().any(|k| k.trim().is_empty()) {
            return Err("fast_moving_keywords must not contain blank entries".to_string());
        }
        Ok(())
    }
}

/// Token budgets for the semantic chunker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkerConfig {
    /// Upper bound on estimated tokens per chunk
    pub max_chunk_size: usize,
    /// A chunk is only closed once it holds this many tokens
    pub min_chunk_size: usize,
    /// Tokens carried from the end of one chunk into the next
    pub overlap_size: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: 512,
            min_chunk_size: 100,
            overlap_size: 50,
        }
    }
}

impl ChunkerConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_chunk_size == 0 {
            return Err("max_chunk_size must be greater than 0".to_string());
        }
        if self.min_chunk_size > self.max_chunk_size {
            return Err("min_chunk_size cannot exceed max_chunk_size".to_string());
        }
        if self.overlap_size >= self.max_chunk_size {
            return Err("overlap_size must be smaller than max_chunk_size".to_string());
        }
        Ok(())
    }
}

/// Configuration for the ingestor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Credibility scoring tables
    pub credibility: CredibilityConfig,

    /// Chunk token budgets
    pub chunker: ChunkerConfig,

    /// Concurrent embedding or fetch requests in flight
    pub concurrency: usize,

    /// Texts per embedding request
    pub embed_batch_size: usize,
}

impl Default for IngestConfig {
    /// Default configuration with balanced settings
    fn default() -> Self {
        Self {
            credibility: CredibilityConfig::default(),
            chunker: ChunkerConfig::default(),
            concurrency: 3,
            embed_batch_size: 20,
        }
    }
}

impl IngestConfig {
    /// Fine-grained preset: small chunks, single request in flight
    pub fn fine_grained() -> Self {
        Self {
            chunker: ChunkerConfig {
                max_chunk_size: 256,
                min_chunk_size: 50,
                overlap_size: 25,
            },
            concurrency: 1,
            embed_batch_size: 10,
            ..Self::default()
        }
    }

    /// Coarse preset: large chunks, more requests in flight
    pub fn coarse() -> Self {
        Self {
            chunker: ChunkerConfig {
                max_chunk_size: 1024,
                min_chunk_size: 200,
                overlap_size: 100,
            },
            concurrency: 4,
            embed_batch_size: 32,
            ..Self::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        self.credibility.validate()?;
        self.chunker.validate()?;
        if self.concurrency == 0 {
            return Err("concurrency must be greater than 0".to_string());
        }
        if self.embed_batch_size == 0 {
            return Err("embed_batch_size must be greater than 0".to_string());
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
