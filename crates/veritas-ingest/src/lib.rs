//! Veritas Ingest
//!
//! Turns raw sources into scored, chunked and embedded records in a
//! [`VectorStore`](veritas_domain::traits::VectorStore).
//!
//! # Architecture
//!
//! ```text
//! SourceProvider → Source → CredibilityScorer → SemanticChunker → embed (bounded) → VectorStore
//! ```
//!
//! # Key Features
//!
//! - **Credibility scoring**: five capped signals summing to at most 100
//! - **Semantic chunking**: concept-bounded chunks with word-aligned overlap
//! - **Tagging**: self-containment, entities, topics and keywords per chunk
//! - **Bounded fan-out**: fetches and embedding batches never exceed the
//!   configured concurrency
//!
//! # Example Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use veritas_domain::{Source, SourceType};
//! use veritas_ingest::{IngestConfig, Ingestor};
//! use veritas_llm::ResilientEmbedder;
//! use veritas_store::MemoryStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(MemoryStore::new());
//! let embedder = Arc::new(ResilientEmbedder::offline(256));
//! let ingestor = Ingestor::new(store, embedder, IngestConfig::default())?;
//!
//! let source = Source::new("https://docs.example/tokio", "Tokio", SourceType::OfficialDocs)
//!     .with_content("Tokio is an asynchronous runtime for Rust.");
//! let report = ingestor.ingest(vec![source]).await?;
//!
//! println!("Stored {} chunks", report.chunks_stored);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod chunker;
mod config;
mod credibility;
mod error;
mod ingestor;
mod tagging;

#[cfg(test)]
mod tests;

pub use chunker::{
    parse_units, ChunkSpan, Concept, ConceptRule, ConceptRules, SemanticChunker, Unit, UnitKind,
};
pub use config::{ChunkerConfig, CredibilityConfig, IngestConfig, PublicationTier};
pub use credibility::{
    citations, methodology, CredibilityScorer, RecencyCurve, ACADEMIC_CURVE, FAST_MOVING_CURVE,
    STANDARD_CURVE, UNKNOWN_DATE_RECENCY,
};
pub use error::IngestError;
pub use ingestor::{DropReason, DroppedSource, IngestReport, Ingestor};
pub use tagging::{is_self_contained, ChunkTagger, ChunkTags};
