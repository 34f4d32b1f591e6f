//! Error types for synthesis

use thiserror::Error;
use veritas_gatekeeper::GatekeeperError;
use veritas_ingest::IngestError;
use veritas_retrieval::RetrievalError;

/// Errors that can occur while running the research pipeline
///
/// Model outages never surface here; they fall back to heuristics.
/// Configuration and storage failures do.
#[derive(Error, Debug)]
pub enum SynthesizerError {
    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Export serialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Ingestion failed
    #[error("Ingest error: {0}")]
    Ingest(#[from] IngestError),

    /// Retrieval failed
    #[error("Retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    /// A gatekeeper component could not be built
    #[error("Gatekeeper error: {0}")]
    Gatekeeper(#[from] GatekeeperError),
}
