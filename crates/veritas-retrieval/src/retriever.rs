//! Chunk retrieval behind a trait, with strategy-driven filtering

use crate::error::RetrievalError;
use crate::intent::RetrievalStrategy;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};
use veritas_domain::traits::{EmbeddingModel, SearchOptions, VectorStore};
use veritas_domain::{Chunk, SourceType};
use veritas_llm::HashEmbeddingModel;

/// Source of candidate chunks for corrective retrieval
#[async_trait]
pub trait ChunkRetriever: Send + Sync {
    /// Up to `k` chunks for `query`, none of them in `exclude`
    async fn retrieve(
        &self,
        query: &str,
        k: usize,
        exclude: &HashSet<String>,
    ) -> Result<Vec<Chunk>, RetrievalError>;
}

/// Keeps chunks whose source meets a strategy's floor and age ceiling
///
/// Sources without a date pass the age check. Preferred source types are
/// moved to the front without reordering within each group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChunkFilter {
    /// Lowest acceptable credibility score
    pub min_credibility: u32,
    /// Oldest acceptable source, in days
    pub max_age_days: Option<u32>,
    /// Source types ranked first
    pub preferred_types: Vec<SourceType>,
    /// Date ages are measured from; today when unset
    pub reference_date: Option<NaiveDate>,
}

impl ChunkFilter {
    /// Filter that keeps everything
    pub fn none() -> Self {
        Self::default()
    }

    /// Filter derived from a retrieval strategy
    pub fn from_strategy(strategy: &RetrievalStrategy) -> Self {
        Self {
            min_credibility: strategy.min_credibility_score,
            max_age_days: strategy.max_age_days,
            preferred_types: strategy.preferred_source_types.clone(),
            reference_date: None,
        }
    }

    /// Measure ages from a fixed date
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    /// Whether a chunk's source passes the filter
    pub fn accepts(&self, chunk: &Chunk) -> bool {
        let source = &chunk.source;
        if source.credibility_score < self.min_credibility {
            return false;
        }
        match (self.max_age_days, source.date) {
            (Some(max_age), Some(_)) => {
                let today = self
                    .reference_date
                    .unwrap_or_else(|| chrono::Utc::now().date_naive());
                source.age_days(today).map_or(true, |age| age <= i64::from(max_age))
            }
            _ => true,
        }
    }

    /// Filter and reorder chunks
    pub fn apply(&self, chunks: Vec<Chunk>) -> Vec<Chunk> {
        self.prefer(chunks.into_iter().filter(|c| self.accepts(c)).collect())
    }

    /// Move preferred source types to the front
    pub fn prefer(&self, chunks: Vec<Chunk>) -> Vec<Chunk> {
        let (preferred, rest): (Vec<Chunk>, Vec<Chunk>) = chunks
            .into_iter()
            .partition(|c| self.preferred_types.contains(&c.source.source_type));
        preferred.into_iter().chain(rest).collect()
    }
}

/// Retrieves from a [`VectorStore`], embedding the query when it can
pub struct StoreRetriever<S, E = HashEmbeddingModel> {
    store: Arc<S>,
    embedder: Option<Arc<E>>,
    filter: ChunkFilter,
    overfetch: usize,
}

impl<S: VectorStore> StoreRetriever<S, HashEmbeddingModel> {
    /// Lexical-only retriever
    pub fn lexical(store: Arc<S>) -> Self {
        Self {
            store,
            embedder: None,
            filter: ChunkFilter::none(),
            overfetch: 1,
        }
    }
}

impl<S: VectorStore, E: EmbeddingModel> StoreRetriever<S, E> {
    /// Retriever that embeds each query before searching
    pub fn new(store: Arc<S>, embedder: Arc<E>) -> Self {
        Self {
            store,
            embedder: Some(embedder),
            filter: ChunkFilter::none(),
            overfetch: 1,
        }
    }

    /// Apply a filter to every result set
    ///
    /// The store is paged `k * overfetch` chunks at a time, excluding chunks
    /// already scanned, until `k` pass the filter or the store runs out.
    pub fn with_filter(mut self, filter: ChunkFilter, overfetch: usize) -> Self {
        self.filter = filter;
        self.overfetch = overfetch.max(1);
        self
    }

    /// Active filter
    pub fn filter(&self) -> &ChunkFilter {
        &self.filter
    }

    async fn query_embedding(&self, query: &str) -> Option<Vec<f32>> {
        let embedder = self.embedder.as_ref()?;
        match embedder.embed(&[query.to_string()]).await {
            Ok(mut vectors) if vectors.len() == 1 => vectors.pop(),
            Ok(_) => {
                warn!("Query embedding returned no vector, searching lexically");
                None
            }
            Err(e) => {
                warn!("Query embedding failed ({}), searching lexically", e);
                None
            }
        }
    }
}

#[async_trait]
impl<S: VectorStore, E: EmbeddingModel> ChunkRetriever for StoreRetriever<S, E> {
    async fn retrieve(
        &self,
        query: &str,
        k: usize,
        exclude: &HashSet<String>,
    ) -> Result<Vec<Chunk>, RetrievalError> {
        let mut options = SearchOptions {
            embedding: self.query_embedding(query).await,
            exclude_ids: exclude.clone(),
        };
        let page = k.saturating_mul(self.overfetch);
        let mut accepted = Vec::new();
        let mut scanned = 0;
        let mut pages = 0;

        while accepted.len() < k {
            let found = self
                .store
                .search(query, page, &options)
                .map_err(|e| RetrievalError::Store(e.to_string()))?;
            pages += 1;
            scanned += found.len();
            let mut exhausted = found.len() < page;
            let mut fresh = 0;
            for chunk in found {
                // Rejected chunks stay excluded so the next page moves past them
                if !options.exclude_ids.insert(chunk.id.clone()) {
                    continue;
                }
                fresh += 1;
                if self.filter.accepts(&chunk) {
                    accepted.push(chunk);
                }
            }
            exhausted |= fresh == 0;
            if exhausted {
                break;
            }
        }

        let mut kept = self.filter.prefer(accepted);
        kept.truncate(k);
        debug!(
            "Retrieved {} chunks for '{}' ({} scanned over {} page(s))",
            kept.len(),
            query,
            scanned,
            pages
        );
        Ok(kept)
    }
}
