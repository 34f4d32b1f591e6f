//! Veritas Domain Layer
//!
//! This crate contains the core data model for Veritas and the trait
//! interfaces that every other layer depends upon. It carries no
//! infrastructure: storage, model providers and heuristics live in the
//! outer crates.
//!
//! ## Key Concepts
//!
//! - **Source**: An external document with a computed credibility score
//! - **Chunk**: A concept-bounded excerpt of a source, the unit of retrieval
//! - **Claim**: An atomic assertion extracted from synthesized text
//! - **Citation**: A stable reference handle to a source
//! - **ContextSufficiency**: Whether retrieved chunks can answer a query
//! - **QualityScore**: The final publishability verdict
//!
//! ## Architecture
//!
//! - Sources are scored once and then shared (`Arc<Source>`) by every chunk
//! - Chunks never change after creation except to attach an embedding
//! - Claim confidence is recomputable from `(supporting, conflicting, type)`
//! - Trait definitions for all external interactions

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chunk;
pub mod citation;
pub mod claim;
pub mod confidence;
pub mod quality;
pub mod severity;
pub mod source;
pub mod sufficiency;
pub mod text;
pub mod traits;

// Re-exports for convenience
pub use chunk::{Chunk, ChunkMetadata, ConceptType};
pub use citation::Citation;
pub use claim::{Claim, ClaimId, ClaimIssue, ClaimType, IssueKind, Verification, VerificationMethod};
pub use quality::{QualityBreakdown, QualityDimension, QualityIssue, QualityScore};
pub use severity::Severity;
pub use source::{CredibilityBreakdown, Source, SourceType};
pub use sufficiency::{ContextSufficiency, RecommendedAction};
