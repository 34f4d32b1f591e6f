//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and infrastructure.
//! Infrastructure implementations live in other crates.

use crate::{Chunk, Source};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Trait for persisting and retrieving chunks
///
/// Implemented by the infrastructure layer (veritas-store). Writes are
/// append-only; no operation rewrites or removes an existing chunk.
pub trait VectorStore: Send + Sync {
    /// Error type for store operations
    type Error: std::error::Error + Send + Sync + 'static;

    /// Persist chunks, returning how many were written
    fn add_documents(&self, chunks: Vec<Chunk>) -> Result<usize, Self::Error>;

    /// Top-`k` chunks for a query
    ///
    /// Ranks by cosine similarity when `options.embedding` is set and any
    /// stored chunk carries an embedding, lexically otherwise.
    fn search(&self, query: &str, k: usize, options: &SearchOptions) -> Result<Vec<Chunk>, Self::Error>;

    /// Top-`k` chunks by cosine similarity to an embedding
    fn similarity_search(&self, embedding: &[f32], k: usize) -> Result<Vec<Chunk>, Self::Error>;

    /// Number of stored chunks
    fn count(&self) -> Result<usize, Self::Error>;

    /// Whether any stored chunk carries an embedding
    fn has_embeddings(&self) -> Result<bool, Self::Error>;
}

/// Options for [`VectorStore::search`]
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// Query embedding, if one was computed
    pub embedding: Option<Vec<f32>>,

    /// Chunk ids to leave out of the results
    pub exclude_ids: HashSet<String>,
}

impl SearchOptions {
    /// Options carrying a query embedding
    pub fn with_embedding(embedding: Vec<f32>) -> Self {
        Self {
            embedding: Some(embedding),
            exclude_ids: HashSet::new(),
        }
    }
}

/// Options for a generative call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InvokeOptions {
    /// Ask the model for a JSON object
    pub expect_json: bool,
}

/// Trait for the generative text capability
///
/// Implemented by the infrastructure layer (veritas-llm). Output is
/// untrusted: callers parse and verify it.
#[async_trait]
pub trait GenerativeProvider: Send + Sync {
    /// Error type for generation
    type Error: std::error::Error + Send + Sync + 'static;

    /// Generate a completion for a prompt
    async fn invoke(&self, prompt: &str, options: InvokeOptions) -> Result<String, Self::Error>;
}

/// Trait for text embedding
///
/// Implemented by the infrastructure layer (veritas-llm)
#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    /// Error type for embedding
    type Error: std::error::Error + Send + Sync + 'static;

    /// Embed a batch of texts, one vector per text in input order
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, Self::Error>;

    /// Vector dimension, when fixed
    fn dimension(&self) -> Option<usize>;
}

/// Trait for acquiring raw sources
#[async_trait]
pub trait SourceProvider: Send + Sync {
    /// Error type for fetching
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetch candidate sources for a query
    async fn fetch(&self, query: &str) -> Result<Vec<Source>, Self::Error>;
}

/// A reviewer verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    /// The evidence supports the claim
    Supported,
    /// The claim looks wrong or unsupported
    Flagged,
    /// The reviewer could not decide
    Unclear,
}

impl ReviewStatus {
    /// Parse a status string, tolerating case and whitespace
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "supported" => Some(ReviewStatus::Supported),
            "flagged" => Some(ReviewStatus::Flagged),
            "unclear" => Some(ReviewStatus::Unclear),
            _ => None,
        }
    }
}

/// Input sent to every reviewer for one target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRequest {
    /// Claim or section text
    pub claim: String,
    /// Evidence snippet
    pub evidence: String,
    /// Surrounding context (query, section title)
    pub context: String,
}

/// A single reviewer response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewVerdict {
    /// Verdict
    pub status: ReviewStatus,
    /// Reviewer explanation
    #[serde(default)]
    pub explanation: String,
}

/// Trait for an independent claim reviewer
///
/// A reviewer that fails or has nothing to say returns `None`.
#[async_trait]
pub trait Reviewer: Send + Sync {
    /// Reviewer name used in reports
    fn name(&self) -> &str;

    /// Review one target
    async fn review(&self, request: &ReviewRequest) -> Option<ReviewVerdict>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_status_parse() {
        assert_eq!(ReviewStatus::parse(" Supported "), Some(ReviewStatus::Supported));
        assert_eq!(ReviewStatus::parse("FLAGGED"), Some(ReviewStatus::Flagged));
        assert_eq!(ReviewStatus::parse("maybe"), None);
    }

    #[test]
    fn test_verdict_deserialize_without_explanation() {
        let verdict: ReviewVerdict = serde_json::from_str(r#"{"status":"unclear"}"#).unwrap();
        assert_eq!(verdict.status, ReviewStatus::Unclear);
        assert!(verdict.explanation.is_empty());
    }
}
