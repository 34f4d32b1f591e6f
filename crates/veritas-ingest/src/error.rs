//! Error types for ingestion

use thiserror::Error;

/// Errors that can occur during ingestion
///
/// Fetch failures and unusable sources are not errors; they are recorded
/// in the ingest report. Only configuration and storage failures abort.
#[derive(Error, Debug)]
pub enum IngestError {
    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Chunk store rejected a write
    #[error("Store error: {0}")]
    Store(String),
}
