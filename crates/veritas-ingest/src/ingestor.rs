//! Ingestion orchestration: score → chunk → embed → store

use crate::chunker::SemanticChunker;
use crate::config::IngestConfig;
use crate::credibility::CredibilityScorer;
use crate::error::IngestError;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};
use veritas_domain::traits::{EmbeddingModel, SourceProvider, VectorStore};
use veritas_domain::{Chunk, Source};
use veritas_llm::embedding::DEFAULT_DIMENSION;
use veritas_llm::HashEmbeddingModel;

/// Why a source never reached the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// The provider failed for the query
    FetchFailed(String),
    /// The source has no `metadata.content`
    NoContent,
    /// Another source with the same id was already accepted
    Duplicate,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::FetchFailed(e) => write!(f, "fetch failed: {}", e),
            DropReason::NoContent => f.write_str("no content"),
            DropReason::Duplicate => f.write_str("duplicate"),
        }
    }
}

/// A source or query that was dropped during ingestion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedSource {
    /// Source URL, or the query for fetch failures
    pub reference: String,
    /// Why it was dropped
    pub reason: DropReason,
}

/// Outcome of an ingest call
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    /// Sources handed to the ingestor (after fetching)
    pub sources_received: usize,
    /// Scored sources whose chunks were stored
    pub sources: Vec<Arc<Source>>,
    /// Everything that was left out, with reasons
    pub dropped: Vec<DroppedSource>,
    /// Chunks written to the store
    pub chunks_stored: usize,
    /// Stored chunks that carry an embedding
    pub chunks_embedded: usize,
}

impl IngestReport {
    /// Number of sources that made it into the store
    pub fn sources_ingested(&self) -> usize {
        self.sources.len()
    }
}

/// Scores, chunks, embeds and stores sources
///
/// Embedding requests run under a bounded stream of at most
/// `config.concurrency` batches in flight. A failed or short batch gets
/// content-seeded pseudo-embeddings of the embedder's dimension instead; a
/// store failure aborts the call.
pub struct Ingestor<S, E> {
    store: Arc<S>,
    embedder: Arc<E>,
    fallback: HashEmbeddingModel,
    scorer: CredibilityScorer,
    chunker: SemanticChunker,
    config: IngestConfig,
}

impl<S: VectorStore, E: EmbeddingModel> Ingestor<S, E> {
    /// Create an ingestor, validating the configuration
    pub fn new(store: Arc<S>, embedder: Arc<E>, config: IngestConfig) -> Result<Self, IngestError> {
        config.validate().map_err(IngestError::Config)?;
        let fallback = HashEmbeddingModel::new(embedder.dimension().unwrap_or(DEFAULT_DIMENSION));
        Ok(Self {
            store,
            embedder,
            fallback,
            scorer: CredibilityScorer::new(config.credibility.clone()),
            chunker: SemanticChunker::new(config.chunker),
            config,
        })
    }

    /// Replace the chunker (custom concept rules, tagger)
    pub fn with_chunker(mut self, chunker: SemanticChunker) -> Self {
        self.chunker = chunker;
        self
    }

    /// Replace the pseudo-embedding model used when the embedder fails
    pub fn with_fallback(mut self, fallback: HashEmbeddingModel) -> Self {
        self.fallback = fallback;
        self
    }

    /// Credibility scorer in use
    pub fn scorer(&self) -> &CredibilityScorer {
        &self.scorer
    }

    /// Chunker in use
    pub fn chunker(&self) -> &SemanticChunker {
        &self.chunker
    }

    /// Target store
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Fetch sources for each query and ingest them
    ///
    /// Queries are fetched concurrently up to `config.concurrency`. A failed
    /// query is recorded in the report and does not stop the others.
    pub async fn ingest_from<P: SourceProvider>(
        &self,
        provider: &P,
        queries: &[String],
    ) -> Result<IngestReport, IngestError> {
        let results: Vec<(&String, Result<Vec<Source>, P::Error>)> = stream::iter(queries)
            .map(|query| async move { (query, provider.fetch(query).await) })
            .buffered(self.config.concurrency)
            .collect()
            .await;

        let mut sources = Vec::new();
        let mut dropped = Vec::new();
        for (query, result) in results {
            match result {
                Ok(fetched) => {
                    debug!("Fetched {} sources for '{}'", fetched.len(), query);
                    sources.extend(fetched);
                }
                Err(e) => {
                    warn!("Source fetch failed for '{}': {}", query, e);
                    dropped.push(DroppedSource {
                        reference: query.clone(),
                        reason: DropReason::FetchFailed(e.to_string()),
                    });
                }
            }
        }

        let mut report = self.ingest(sources).await?;
        dropped.append(&mut report.dropped);
        report.dropped = dropped;
        Ok(report)
    }

    /// Ingest sources directly
    pub async fn ingest(&self, sources: Vec<Source>) -> Result<IngestReport, IngestError> {
        let mut report = IngestReport {
            sources_received: sources.len(),
            ..IngestReport::default()
        };

        let (accepted, chunks) = self.prepare(sources, &mut report.dropped);
        let chunks = self.embed(chunks).await;

        report.chunks_embedded = chunks.iter().filter(|c| c.has_embedding()).count();
        report.chunks_stored = if chunks.is_empty() {
            0
        } else {
            self.store
                .add_documents(chunks)
                .map_err(|e| IngestError::Store(e.to_string()))?
        };
        report.sources = accepted;

        info!(
            "Ingested {}/{} sources: {} chunks stored, {} embedded, {} dropped",
            report.sources_ingested(),
            report.sources_received,
            report.chunks_stored,
            report.chunks_embedded,
            report.dropped.len()
        );
        Ok(report)
    }

    /// Score and chunk sources without touching the store or the embedder
    pub fn prepare(
        &self,
        sources: Vec<Source>,
        dropped: &mut Vec<DroppedSource>,
    ) -> (Vec<Arc<Source>>, Vec<Chunk>) {
        let mut seen = HashSet::new();
        let mut accepted = Vec::new();
        let mut chunks = Vec::new();

        for source in sources {
            if source.content().is_none() {
                debug!("Dropping source without content: {}", source.url);
                dropped.push(DroppedSource {
                    reference: source.url,
                    reason: DropReason::NoContent,
                });
                continue;
            }
            if !seen.insert(source.id.clone()) {
                dropped.push(DroppedSource {
                    reference: source.url,
                    reason: DropReason::Duplicate,
                });
                continue;
            }

            let source = Arc::new(self.scorer.score(source));
            let produced = self.chunker.chunk_source(&source);
            debug!(
                "Chunked {} (credibility {}) into {} chunks",
                source.url,
                source.credibility_score,
                produced.len()
            );
            chunks.extend(produced);
            accepted.push(source);
        }
        (accepted, chunks)
    }

    async fn embed(&self, chunks: Vec<Chunk>) -> Vec<Chunk> {
        let batch_size = self.config.embed_batch_size;
        let mut batches: Vec<Vec<Chunk>> = Vec::new();
        let mut remaining = chunks.into_iter().peekable();
        while remaining.peek().is_some() {
            batches.push(remaining.by_ref().take(batch_size).collect());
        }

        let embedder = &self.embedder;
        let fallback = &self.fallback;
        let results: Vec<Vec<Chunk>> = stream::iter(batches)
            .map(|batch| async move {
                let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
                match embedder.embed(&texts).await {
                    Ok(vectors) if vectors.len() == batch.len() => batch
                        .into_iter()
                        .zip(vectors)
                        .map(|(chunk, vector)| chunk.with_embedding(vector))
                        .collect(),
                    Ok(vectors) => {
                        warn!(
                            "Embedder returned {} vectors for {} chunks, using pseudo-embeddings",
                            vectors.len(),
                            batch.len()
                        );
                        pseudo_embed(fallback, batch)
                    }
                    Err(e) => {
                        warn!("Embedding failed for {} chunks, using pseudo-embeddings: {}", batch.len(), e);
                        pseudo_embed(fallback, batch)
                    }
                }
            })
            .buffered(self.config.concurrency)
            .collect()
            .await;

        results.into_iter().flatten().collect()
    }
}

fn pseudo_embed(model: &HashEmbeddingModel, batch: Vec<Chunk>) -> Vec<Chunk> {
    batch
        .into_iter()
        .map(|chunk| {
            let vector = model.embed_one(&chunk.content);
            chunk.with_embedding(vector)
        })
        .collect()
}
