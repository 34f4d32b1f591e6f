//! Veritas Synthesizer
//!
//! Turns a query into a cited, verified and graded answer.
//!
//! # Architecture
//!
//! ```text
//! sources → Ingestor → VectorStore
//! query → QueryIntentPlanner → ContextSufficiencyEngine → DraftGenerator
//!       → ClaimVerifier → HallucinationDetector → EnsembleValidator
//!       → CitationManager → QualityScorer → ResearchReport
//! ```
//!
//! Every external dependency has a local fallback: drafts fall back to an
//! extractive summary, embeddings to feature hashing, and reviewers that
//! fail are left out of the vote. Only storage errors end a run.
//!
//! # Example Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use veritas_domain::{Source, SourceType};
//! use veritas_llm::ResilientEmbedder;
//! use veritas_store::MemoryStore;
//! use veritas_synthesizer::{DraftGenerator, PipelineConfig, ResearchPipeline};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PipelineConfig::default();
//! let drafts = DraftGenerator::extractive(config.draft.clone());
//! let pipeline = ResearchPipeline::new(
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(ResilientEmbedder::offline(256)),
//!     drafts,
//!     config,
//! )?;
//!
//! pipeline
//!     .ingest(vec![Source::new("https://doc.rust-lang.org/book", "The Book", SourceType::OfficialDocs)
//!         .with_content("Ownership is a set of rules that govern how a Rust program manages memory.")])
//!     .await?;
//!
//! let report = pipeline.run("What is ownership in Rust?").await?;
//! println!("{}\n\n{}", report.draft.content, report.bibliography);
//! println!("quality {:.1}, ready: {}", report.quality.overall, report.ready_to_publish());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod citations;
mod config;
mod draft;
mod error;
mod pipeline;

pub use citations::{CitationManager, CitationStyle};
pub use config::{DraftConfig, PipelineConfig};
pub use draft::{strip_markers, Draft, DraftGenerator, DraftOrigin, NoModel};
pub use error::SynthesizerError;
pub use pipeline::{ResearchPipeline, ResearchReport};
