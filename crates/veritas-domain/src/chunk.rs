//! Chunk module - concept-bounded excerpts of sources

use crate::source::Source;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Rhetorical role of the concept a chunk is built around
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConceptType {
    /// States what something is
    Definition,
    /// Explains why or how something works
    Explanation,
    /// Illustrates with an example or code
    Example,
    /// Describes steps to follow
    Procedure,
    /// Contrasts alternatives
    Comparison,
    /// Anything else
    #[default]
    General,
}

impl ConceptType {
    /// Get the concept type name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ConceptType::Definition => "definition",
            ConceptType::Explanation => "explanation",
            ConceptType::Example => "example",
            ConceptType::Procedure => "procedure",
            ConceptType::Comparison => "comparison",
            ConceptType::General => "general",
        }
    }
}

/// Positional and semantic tags attached at chunking time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkMetadata {
    /// Dominant concept type of the chunk
    pub concept_type: ConceptType,
    /// Zero-based position within the source
    pub position: usize,
    /// Number of chunks produced from the source
    pub total_chunks: usize,
    /// Estimated token count
    pub tokens: usize,
    /// Byte offset of the chunk start in the source text
    pub start_char: usize,
    /// Byte offset one past the chunk end in the source text
    pub end_char: usize,
    /// False when the chunk opens with an unresolved back-reference
    pub is_self_contained: bool,
    /// Capitalized multi-word phrases and acronyms
    #[serde(default)]
    pub entities: Vec<String>,
    /// Frequency-ranked content words
    #[serde(default)]
    pub topics: Vec<String>,
    /// Stop-word filtered frequency ranking
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// A concept-bounded excerpt of exactly one source
///
/// Chunks are created by the chunker and never modified afterwards, with
/// the single exception of attaching an embedding via [`Chunk::with_embedding`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique identifier (`{source_id}_chunk_{position}`)
    pub id: String,

    /// Excerpt text
    pub content: String,

    /// Owning source, shared with every sibling chunk
    pub source: Arc<Source>,

    /// Embedding vector, once computed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,

    /// Positional and semantic tags
    pub metadata: ChunkMetadata,
}

impl Chunk {
    /// Create a chunk without an embedding
    pub fn new(
        id: impl Into<String>,
        content: impl Into<String>,
        source: Arc<Source>,
        metadata: ChunkMetadata,
    ) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            source,
            embedding: None,
            metadata,
        }
    }

    /// Build the canonical chunk identifier for a source position
    pub fn make_id(source_id: &str, position: usize) -> String {
        format!("{}_chunk_{}", source_id, position)
    }

    /// Attach an embedding, consuming the chunk
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// Identifier of the owning source
    pub fn source_id(&self) -> &str {
        &self.source.id
    }

    /// Whether an embedding has been attached
    pub fn has_embedding(&self) -> bool {
        self.embedding.as_ref().map_or(false, |e| !e.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SourceType;

    fn source() -> Arc<Source> {
        Arc::new(Source::new("https://a.example", "A", SourceType::Blog))
    }

    #[test]
    fn test_make_id() {
        assert_eq!(Chunk::make_id("src", 3), "src_chunk_3");
    }

    #[test]
    fn test_with_embedding() {
        let chunk = Chunk::new("c1", "text", source(), ChunkMetadata::default());
        assert!(!chunk.has_embedding());

        let chunk = chunk.with_embedding(vec![0.1, 0.2]);
        assert!(chunk.has_embedding());
    }

    #[test]
    fn test_siblings_share_source() {
        let source = source();
        let a = Chunk::new("a", "one", Arc::clone(&source), ChunkMetadata::default());
        let b = Chunk::new("b", "two", Arc::clone(&source), ChunkMetadata::default());
        assert!(Arc::ptr_eq(&a.source, &b.source));
        assert_eq!(a.source_id(), b.source_id());
    }

    #[test]
    fn test_record_shape() {
        let chunk = Chunk::new("c1", "text", source(), ChunkMetadata::default());
        let json = serde_json::to_value(&chunk).unwrap();
        assert_eq!(json["id"], "c1");
        assert!(json.get("embedding").is_none());
        assert_eq!(json["metadata"]["conceptType"], "general");
        assert_eq!(json["source"]["type"], "blog");
    }
}
