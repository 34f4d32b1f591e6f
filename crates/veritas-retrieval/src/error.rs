//! Retrieval error types

use thiserror::Error;

/// Errors that can occur during retrieval
#[derive(Error, Debug)]
pub enum RetrievalError {
    /// The chunk store failed
    #[error("Store error: {0}")]
    Store(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}
