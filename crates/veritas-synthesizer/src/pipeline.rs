//! End-to-end research run

use crate::citations::{CitationManager, CitationStyle};
use crate::config::PipelineConfig;
use crate::draft::{strip_markers, Draft, DraftGenerator};
use crate::error::SynthesizerError;
use chrono::NaiveDate;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info};
use veritas_domain::traits::{EmbeddingModel, GenerativeProvider, Reviewer, VectorStore};
use veritas_domain::{Citation, Claim, QualityScore, Source};
use veritas_gatekeeper::{
    ClaimVerifier, EnsembleOutcome, EnsembleValidator, HallucinationDetector, HallucinationReport,
    QualityInput, QualityScorer,
};
use veritas_ingest::{IngestReport, Ingestor};
use veritas_llm::LlmError;
use veritas_retrieval::{
    ChunkFilter, ContextSufficiencyEngine, CorrectiveResult, QueryAnalysis, QueryIntentPlanner,
    StoreRetriever,
};

/// Everything one research run produced
///
/// The run never fails because a model or reviewer is down; callers read
/// `quality.ready_to_publish` and the per-stage signals to decide whether
/// to use the answer.
#[derive(Debug, Clone)]
pub struct ResearchReport {
    /// Query as asked
    pub query: String,
    /// Intent, complexity and strategy
    pub analysis: QueryAnalysis,
    /// Corrective retrieval trace and working set
    pub retrieval: CorrectiveResult,
    /// Draft with inline markers
    pub draft: Draft,
    /// Draft text without markers, as verified
    pub text: String,
    /// Verified claims, confidence adjusted by the ensemble
    pub claims: Vec<Claim>,
    /// Hallucination assessment of the draft
    pub hallucination: HallucinationReport,
    /// Ensemble outcomes for reviewed claims
    pub ensemble: Vec<EnsembleOutcome>,
    /// Citations in numbering order
    pub citations: Vec<Citation>,
    /// Rendered bibliography
    pub bibliography: String,
    /// Publication gate
    pub quality: QualityScore,
}

impl ResearchReport {
    /// Whether the answer passed the quality gate
    pub fn ready_to_publish(&self) -> bool {
        self.quality.ready_to_publish
    }

    /// Claims that were cross-verified
    pub fn verified_claims(&self) -> impl Iterator<Item = &Claim> {
        self.claims.iter().filter(|c| c.verified)
    }
}

/// Ingestion plus the full query-to-verdict flow over one store
pub struct ResearchPipeline<S, E, P> {
    store: Arc<S>,
    embedder: Arc<E>,
    ingestor: Ingestor<S, E>,
    planner: QueryIntentPlanner,
    engine: ContextSufficiencyEngine,
    verifier: ClaimVerifier,
    detector: HallucinationDetector,
    ensemble: EnsembleValidator,
    quality: QualityScorer,
    drafts: DraftGenerator<P>,
    config: PipelineConfig,
    access_date: NaiveDate,
    style: CitationStyle,
}

impl<S, E, P> ResearchPipeline<S, E, P>
where
    S: VectorStore,
    E: EmbeddingModel,
    P: GenerativeProvider<Error = LlmError>,
{
    /// Build every stage from `config`
    pub fn new(
        store: Arc<S>,
        embedder: Arc<E>,
        drafts: DraftGenerator<P>,
        config: PipelineConfig,
    ) -> Result<Self, SynthesizerError> {
        config.validate().map_err(SynthesizerError::Config)?;

        let ingestor = Ingestor::new(Arc::clone(&store), Arc::clone(&embedder), config.ingest.clone())?;
        let engine = ContextSufficiencyEngine::new(config.retrieval.clone())?;
        let verifier = ClaimVerifier::new(config.gatekeeper.verifier.clone())?;
        let detector = HallucinationDetector::new(config.gatekeeper.detector.clone());
        let ensemble = EnsembleValidator::new(config.gatekeeper.ensemble.clone())?;
        let quality = QualityScorer::new(config.gatekeeper.quality.clone())?;

        Ok(Self {
            store,
            embedder,
            ingestor,
            planner: QueryIntentPlanner::new(),
            engine,
            verifier,
            detector,
            ensemble,
            quality,
            drafts,
            config,
            access_date: chrono::Utc::now().date_naive(),
            style: CitationStyle::Apa,
        })
    }

    /// Add a reviewer to the ensemble
    pub fn with_reviewer<R: Reviewer + 'static>(mut self, reviewer: R) -> Self {
        self.ensemble = self.ensemble.with_reviewer(reviewer);
        self
    }

    /// Bibliography style for reports
    pub fn with_citation_style(mut self, style: CitationStyle) -> Self {
        self.style = style;
        self
    }

    /// Date used for citation access, age filtering and currency scoring
    ///
    /// An explicit `quality.reference_date` in the configuration wins for
    /// currency scoring.
    pub fn with_access_date(mut self, date: NaiveDate) -> Result<Self, SynthesizerError> {
        self.access_date = date;
        if self.config.gatekeeper.quality.reference_date.is_none() {
            let mut quality = self.config.gatekeeper.quality.clone();
            quality.reference_date = Some(date);
            self.quality = QualityScorer::new(quality)?;
        }
        Ok(self)
    }

    /// Get the configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Score, chunk, embed and store sources
    pub async fn ingest(&self, sources: Vec<Source>) -> Result<IngestReport, SynthesizerError> {
        Ok(self.ingestor.ingest(sources).await?)
    }

    /// Answer `query` from the store and grade the answer
    ///
    /// An empty working set is not an error. Store failures are.
    pub async fn run(&self, query: &str) -> Result<ResearchReport, SynthesizerError> {
        let analysis = self.planner.analyze(query);
        info!(
            "Research run for '{}' (intent {}, min credibility {})",
            query, analysis.intent, analysis.strategy.min_credibility_score
        );

        let filter = ChunkFilter::from_strategy(&analysis.strategy).with_reference_date(self.access_date);
        let retriever = StoreRetriever::new(Arc::clone(&self.store), Arc::clone(&self.embedder))
            .with_filter(filter, self.config.retrieval.overfetch);
        let retrieval = self
            .engine
            .retrieve_for(&retriever, query, &analysis.strategy)
            .await
            .map_err(|e| {
                error!("Retrieval failed for '{}': {}", query, e);
                e
            })?;
        let chunks = &retrieval.chunks;

        let mut citations = CitationManager::new(self.access_date);
        let draft = self.drafts.generate(query, chunks, &mut citations).await;
        let text = strip_markers(&draft.content);

        let mut claims = if chunks.is_empty() {
            Vec::new()
        } else {
            self.verifier.verify_text(&text, chunks)
        };
        let hallucination = self.detector.analyze(&text, &claims, chunks);
        let ensemble = self.ensemble.apply_to_claims(&mut claims, chunks, query).await;

        let sources = distinct_sources(chunks);
        let quality = self.quality.score(&QualityInput {
            text: &text,
            claims: &claims,
            sources: &sources,
        });

        info!(
            "Research run for '{}' finished: {} chunks, {} claims ({} verified), quality {:.1}, ready {}",
            query,
            chunks.len(),
            claims.len(),
            claims.iter().filter(|c| c.verified).count(),
            quality.overall,
            quality.ready_to_publish
        );

        Ok(ResearchReport {
            query: query.to_string(),
            analysis,
            bibliography: citations.bibliography(self.style),
            citations: citations.citations().to_vec(),
            retrieval,
            draft,
            text,
            claims,
            hallucination,
            ensemble,
            quality,
        })
    }
}

fn distinct_sources(chunks: &[veritas_domain::Chunk]) -> Vec<Arc<Source>> {
    let mut seen = HashSet::new();
    chunks
        .iter()
        .filter(|c| seen.insert(c.source.id.clone()))
        .map(|c| Arc::clone(&c.source))
        .collect()
}
