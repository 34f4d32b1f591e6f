//! Veritas Storage Layer
//!
//! Implements the `VectorStore` trait from `veritas-domain` with two
//! backends behind one interface.
//!
//! # Architecture
//!
//! - `MemoryStore`: hash map keyed by chunk id, for tests and single runs
//! - `JsonlStore`: append-only record-per-line file, safe for concurrent writers
//! - Ranking by cosine similarity when embeddings exist on both sides,
//!   lexical term counting otherwise, through a bounded top-k heap
//!
//! # Examples
//!
//! ```
//! use veritas_store::MemoryStore;
//! use veritas_domain::traits::{SearchOptions, VectorStore};
//!
//! let store = MemoryStore::new();
//! assert_eq!(store.count().unwrap(), 0);
//! assert!(store.search("anything", 5, &SearchOptions::default()).unwrap().is_empty());
//! ```

#![warn(missing_docs)]

pub mod jsonl;
pub mod memory;
pub mod scoring;
pub mod topk;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use veritas_domain::traits::{SearchOptions, VectorStore};
use veritas_domain::Chunk;

pub use jsonl::{JsonlStore, ScanStats};
pub use memory::MemoryStore;
pub use scoring::{cosine_similarity, QueryMatcher};

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Record could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A writer panicked while holding the store lock
    #[error("Store lock poisoned")]
    Poisoned,

    /// Invalid configuration
    #[error("Invalid store configuration: {0}")]
    InvalidConfig(String),
}

/// Which backend to open
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StoreConfig {
    /// Volatile in-memory store
    Memory,
    /// Durable JSON-lines file
    Jsonl {
        /// Path of the record file
        path: PathBuf,
    },
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::Memory
    }
}

impl StoreConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        match self {
            StoreConfig::Memory => Ok(()),
            StoreConfig::Jsonl { path } if path.as_os_str().is_empty() => {
                Err("jsonl store path must not be empty".to_string())
            }
            StoreConfig::Jsonl { .. } => Ok(()),
        }
    }

    /// Open the configured backend
    pub fn open(&self) -> Result<AnyStore, StoreError> {
        self.validate().map_err(StoreError::InvalidConfig)?;
        match self {
            StoreConfig::Memory => Ok(AnyStore::Memory(MemoryStore::new())),
            StoreConfig::Jsonl { path } => Ok(AnyStore::Jsonl(JsonlStore::open(path)?)),
        }
    }
}

/// A store whose backend is chosen at runtime
#[derive(Debug)]
pub enum AnyStore {
    /// In-memory backend
    Memory(MemoryStore),
    /// JSON-lines backend
    Jsonl(JsonlStore),
}

impl VectorStore for AnyStore {
    type Error = StoreError;

    fn add_documents(&self, chunks: Vec<Chunk>) -> Result<usize, Self::Error> {
        match self {
            AnyStore::Memory(s) => s.add_documents(chunks),
            AnyStore::Jsonl(s) => s.add_documents(chunks),
        }
    }

    fn search(&self, query: &str, k: usize, options: &SearchOptions) -> Result<Vec<Chunk>, Self::Error> {
        match self {
            AnyStore::Memory(s) => s.search(query, k, options),
            AnyStore::Jsonl(s) => s.search(query, k, options),
        }
    }

    fn similarity_search(&self, embedding: &[f32], k: usize) -> Result<Vec<Chunk>, Self::Error> {
        match self {
            AnyStore::Memory(s) => s.similarity_search(embedding, k),
            AnyStore::Jsonl(s) => s.similarity_search(embedding, k),
        }
    }

    fn count(&self) -> Result<usize, Self::Error> {
        match self {
            AnyStore::Memory(s) => s.count(),
            AnyStore::Jsonl(s) => s.count(),
        }
    }

    fn has_embeddings(&self) -> Result<bool, Self::Error> {
        match self {
            AnyStore::Memory(s) => s.has_embeddings(),
            AnyStore::Jsonl(s) => s.has_embeddings(),
        }
    }
}
