//! Veritas Retrieval
//!
//! Selects the working set of chunks for a query.
//!
//! # Architecture
//!
//! ```text
//! query → QueryIntentPlanner → RetrievalStrategy → ChunkFilter
//!       → ContextSufficiencyEngine ⇄ ChunkRetriever (StoreRetriever → VectorStore)
//! ```
//!
//! The planner classifies the query and derives minimum sources, a
//! credibility floor, a recency ceiling and diversity requirements. The
//! sufficiency engine then runs corrective retrieval: retrieve, check which
//! required information components are covered, refine the query with
//! terms for what is missing, and retrieve again, for at most
//! `max_iterations` strictly sequential rounds.
//!
//! # Example Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use veritas_retrieval::{
//!     ChunkFilter, ContextSufficiencyEngine, QueryIntentPlanner, RetrievalConfig, StoreRetriever,
//! };
//! use veritas_store::MemoryStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RetrievalConfig::default();
//! let analysis = QueryIntentPlanner::new().analyze("How to configure the Tokio runtime");
//!
//! let retriever = StoreRetriever::lexical(Arc::new(MemoryStore::new()))
//!     .with_filter(ChunkFilter::from_strategy(&analysis.strategy), config.overfetch);
//! let engine = ContextSufficiencyEngine::new(config)?;
//!
//! let result = engine
//!     .retrieve_for(&retriever, &analysis.query, &analysis.strategy)
//!     .await?;
//! println!("{} chunks after {} rounds", result.chunks.len(), result.iterations);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod intent;
mod retriever;
mod sufficiency;

pub use config::RetrievalConfig;
pub use error::RetrievalError;
pub use intent::{
    Complexity, IntentRule, IntentRules, QueryAnalysis, QueryIntent, QueryIntentPlanner,
    RetrievalStrategy, ACADEMIC_CREDIBILITY_FLOOR,
};
pub use retriever::{ChunkFilter, ChunkRetriever, StoreRetriever};
pub use sufficiency::{
    ComponentTable, ContextSufficiencyEngine, CorrectiveResult, InformationComponent,
    IterationRecord, SOURCE_DIVERSITY,
};
