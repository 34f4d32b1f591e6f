//! Veritas Gatekeeper
//!
//! Decides whether synthesized text is fit to publish.
//!
//! The Gatekeeper provides:
//! - Claim extraction, typing and cross-referencing against source chunks
//! - Hallucination detection per claim plus pattern checks on the text
//! - Ensemble validation by independent reviewers
//! - A weighted quality score with bias detection and a publication verdict
//!
//! # Examples
//!
//! ```no_run
//! use veritas_gatekeeper::{ClaimVerifier, HallucinationDetector, QualityInput, QualityScorer};
//!
//! let text = "Tokio is an asynchronous runtime for Rust.";
//! let chunks = Vec::new();
//!
//! let claims = ClaimVerifier::default().verify_text(text, &chunks);
//! let report = HallucinationDetector::default().analyze(text, &claims, &chunks);
//! let quality = QualityScorer::default().score(&QualityInput {
//!     text,
//!     claims: &claims,
//!     sources: &[],
//! });
//! assert!(!quality.ready_to_publish);
//! # let _ = report;
//! ```

#![warn(missing_docs)]

mod config;
mod ensemble;
mod error;
mod hallucination;
mod quality;
mod reviewer;
mod verifier;

pub use config::{
    DetectorConfig, EnsembleConfig, GatekeeperConfig, QualityConfig, QualityWeights, VerifierConfig,
};
pub use ensemble::{status_score, EnsembleOutcome, EnsembleTarget, EnsembleValidator, ReviewerVote};
pub use error::GatekeeperError;
pub use hallucination::{
    ClaimAssessment, HallucinationDetector, HallucinationReport, PatternFlag, PatternKind,
    Recommendation, RiskLevel,
};
pub use quality::{concepts_explained, BiasDetector, BiasFinding, BiasKind, QualityInput, QualityScorer};
pub use reviewer::{ModelReviewer, OverlapReviewer};
pub use verifier::{ClaimTypeRule, ClaimTypeRules, ClaimVerifier, ExtractedClaim};
