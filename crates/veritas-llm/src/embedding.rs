//! Embedding providers
//!
//! [`HashEmbeddingModel`] is the deterministic offline fallback: feature
//! hashing of tokens and token bigrams with SHA-256, L2-normalized.
//! Texts that share words land close together, so retrieval code paths are
//! exercised realistically without a live model.
//!
//! [`ResilientEmbedder`] batches requests to an optional primary model and
//! substitutes hash embeddings for any batch the primary fails on.
//!
//! # Examples
//!
//! ```rust
//! use veritas_llm::HashEmbeddingModel;
//!
//! let model = HashEmbeddingModel::new(64);
//! let a = model.embed_one("The sky is blue");
//! let b = model.embed_one("The sky is blue");
//! assert_eq!(a, b);
//! assert_eq!(a.len(), 64);
//! ```

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::convert::Infallible;
use tracing::{debug, warn};
use veritas_domain::text::tokenize;
use veritas_domain::traits::EmbeddingModel;

/// Default pseudo-embedding dimension
pub const DEFAULT_DIMENSION: usize = 256;

/// Default number of texts per embedding request
pub const DEFAULT_BATCH_SIZE: usize = 20;

/// Weight of a token bigram relative to a single token
const BIGRAM_WEIGHT: f32 = 0.5;

/// Content-seeded hash embeddings
///
/// The embeddings are:
///
/// - **Deterministic**: Same text always produces the same vector
/// - **Normalized**: Non-empty texts have unit length
/// - **Lexically aware**: Shared words raise cosine similarity
///
/// Text without any token maps to the zero vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashEmbeddingModel {
    dimension: usize,
}

impl HashEmbeddingModel {
    /// Create a model producing `dimension`-length vectors
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    /// Embed a single text
    pub fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        let tokens = tokenize(text);

        for token in &tokens {
            self.add_feature(&mut vector, token.as_bytes(), 1.0);
        }
        for pair in tokens.windows(2) {
            let bigram = format!("{} {}", pair[0], pair[1]);
            self.add_feature(&mut vector, bigram.as_bytes(), BIGRAM_WEIGHT);
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        }
        vector
    }

    fn add_feature(&self, vector: &mut [f32], feature: &[u8], weight: f32) {
        let digest = Sha256::digest(feature);
        let mut index_bytes = [0u8; 8];
        index_bytes.copy_from_slice(&digest[..8]);
        let index = (u64::from_le_bytes(index_bytes) % self.dimension as u64) as usize;
        let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
        vector[index] += sign * weight;
    }
}

impl Default for HashEmbeddingModel {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

#[async_trait]
impl EmbeddingModel for HashEmbeddingModel {
    type Error = Infallible;

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, Self::Error> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }

    fn dimension(&self) -> Option<usize> {
        Some(self.dimension)
    }
}

/// Batched embedding that never fails
///
/// With no primary model every text gets a hash embedding. With a primary,
/// each batch goes to the primary first; a failed or short batch is logged
/// and replaced by hash embeddings.
pub struct ResilientEmbedder<E> {
    primary: Option<E>,
    fallback: HashEmbeddingModel,
    batch_size: usize,
}

impl ResilientEmbedder<HashEmbeddingModel> {
    /// Embedder that only uses the hash fallback
    pub fn offline(dimension: usize) -> Self {
        Self {
            primary: None,
            fallback: HashEmbeddingModel::new(dimension),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl<E: EmbeddingModel> ResilientEmbedder<E> {
    /// Embedder backed by a primary model
    pub fn new(primary: E) -> Self {
        let dimension = primary.dimension().unwrap_or(DEFAULT_DIMENSION);
        Self {
            primary: Some(primary),
            fallback: HashEmbeddingModel::new(dimension),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Set the batch size (minimum 1)
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Set the fallback model
    pub fn with_fallback(mut self, fallback: HashEmbeddingModel) -> Self {
        self.fallback = fallback;
        self
    }

    /// Configured batch size
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    async fn embed_batch(&self, batch: &[String]) -> Vec<Vec<f32>> {
        if let Some(primary) = &self.primary {
            match primary.embed(batch).await {
                Ok(vectors) if vectors.len() == batch.len() => return vectors,
                Ok(vectors) => warn!(
                    "Embedding provider returned {} vectors for {} texts, using pseudo-embeddings",
                    vectors.len(),
                    batch.len()
                ),
                Err(e) => warn!("Embedding provider failed ({}), using pseudo-embeddings", e),
            }
        }
        batch.iter().map(|t| self.fallback.embed_one(t)).collect()
    }
}

#[async_trait]
impl<E: EmbeddingModel> EmbeddingModel for ResilientEmbedder<E> {
    type Error = Infallible;

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, Self::Error> {
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            vectors.extend(self.embed_batch(batch).await);
        }
        debug!("Embedded {} texts in batches of {}", texts.len(), self.batch_size);
        Ok(vectors)
    }

    fn dimension(&self) -> Option<usize> {
        self.primary
            .as_ref()
            .and_then(|p| p.dimension())
            .or(Some(self.fallback.dimension))
    }
}
