//! Context sufficiency checks and corrective retrieval
//!
//! A query is decomposed into required information components (definition,
//! process, examples, ...). Each round retrieves chunks, checks which
//! components the combined text covers, and if coverage is short, appends
//! refinement terms for the missing components and retrieves again,
//! excluding chunks already seen.

use crate::config::RetrievalConfig;
use crate::error::RetrievalError;
use crate::intent::RetrievalStrategy;
use crate::retriever::ChunkRetriever;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info};
use veritas_domain::text::{content_words, tokenize};
use veritas_domain::{Chunk, ContextSufficiency, RecommendedAction};

/// Missing-info label used when too few distinct sources were found
pub const SOURCE_DIVERSITY: &str = "source diversity";

const DIVERSITY_REFINEMENT: &str = "independent sources";

/// One kind of information a query can require
#[derive(Debug, Clone)]
pub struct InformationComponent {
    /// Component name, reported in `missing_info`
    pub name: String,
    /// Query cue that makes the component required
    pub cue: Regex,
    /// Evidence that the chunk text covers the component
    pub evidence: Regex,
    /// Terms appended to the query when the component is missing
    pub refinement: String,
}

/// Swappable component table
///
/// The first component is the fallback requirement when no cue matches.
#[derive(Debug, Clone)]
pub struct ComponentTable {
    components: Vec<InformationComponent>,
}

impl ComponentTable {
    /// Build a table; the first entry is the fallback requirement
    pub fn new(components: Vec<InformationComponent>) -> Self {
        Self { components }
    }

    /// Build a table from `(name, cue, evidence, refinement)` tuples
    pub fn from_patterns(patterns: &[(&str, &str, &str, &str)]) -> Result<Self, regex::Error> {
        let components = patterns
            .iter()
            .map(|(name, cue, evidence, refinement)| {
                Ok(InformationComponent {
                    name: name.to_string(),
                    cue: Regex::new(cue)?,
                    evidence: Regex::new(evidence)?,
                    refinement: refinement.to_string(),
                })
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self::new(components))
    }

    /// Components a query requires
    pub fn required(&self, query: &str) -> Vec<&InformationComponent> {
        let matched: Vec<&InformationComponent> =
            self.components.iter().filter(|c| c.cue.is_match(query)).collect();
        if matched.is_empty() {
            self.components.first().into_iter().collect()
        } else {
            matched
        }
    }

    /// Look up a component by name
    pub fn get(&self, name: &str) -> Option<&InformationComponent> {
        self.components.iter().find(|c| c.name == name)
    }
}

static DEFAULT_COMPONENTS: Lazy<ComponentTable> = Lazy::new(|| {
    ComponentTable::from_patterns(&[
        (
            "definition",
            r"(?i)(^(what|who) (is|are)\b|\bdefin\w*|\bmeaning\b|\bwhat does\b)",
            r"(?i)\b(is an?|are an?|refers to|is defined as|means|known as|stands for)\b",
            "definition meaning overview",
        ),
        (
            "process",
            r"(?i)(\bhow (to|do|does|can|should)\b|\bsteps?\b|\bprocess\b|\bprocedure\b|\bset ?up\b|\binstall\w*)",
            r"(?im)(\b(step|steps|first|then|next|finally|install|configure|follow)\b|^\s*\d+[.)]\s)",
            "how to step by step",
        ),
        (
            "examples",
            r"(?i)\b(examples?|for instance|use cases?|samples?)\b",
            r"(?i)(\bfor example\b|\bfor instance\b|\be\.g\.|\bsuch as\b|\bexamples?\b)",
            "examples use cases",
        ),
        (
            "timeline",
            r"(?i)\b(when|history|timeline|evolution|origins?)\b",
            r"(?i)(\b(1[89]\d{2}|20\d{2})\b|\b(decade|century|originally|since)\b)",
            "history timeline",
        ),
        (
            "comparison",
            r"(?i)(\bvs\.?|\bversus\b|\bcompar\w*|\bdifferences?\b|\bbetter than\b)",
            r"(?i)\b(whereas|unlike|compared (to|with)|in contrast|versus|vs|on the other hand|better|worse)\b",
            "comparison differences",
        ),
        (
            "causes",
            r"(?i)\b(why|causes?|reasons?)\b",
            r"(?i)\b(because|due to|caused by|leads to|as a result|reasons?)\b",
            "causes reasons why",
        ),
        (
            "statistics",
            r"(?i)(\bhow (many|much)\b|\bstatistics?\b|\bpercent\w*|\brates?\b|\bnumbers\b)",
            r"(?i)(\d+(\.\d+)?\s?%|\b\d{2,}\b|\b(percent|million|billion)\b)",
            "statistics data",
        ),
        (
            "solution",
            r"(?i)\b(fix|solve|solution|error|troubleshoot\w*|not working|resolve)\b",
            r"(?i)\b(solution|fix(ed)?|resolve[sd]?|workaround|to solve)\b",
            "solution fix",
        ),
    ])
    .expect("valid component table")
});

impl Default for ComponentTable {
    fn default() -> Self {
        DEFAULT_COMPONENTS.clone()
    }
}

/// One round of corrective retrieval
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IterationRecord {
    /// Round number, starting at 1
    pub iteration: usize,
    /// Query sent in this round
    pub query: String,
    /// New chunks this round added
    pub retrieved: usize,
    /// Working set size after the round
    pub total_chunks: usize,
    /// Completeness after the round
    pub completeness: f64,
    /// Action the check recommended
    pub action: RecommendedAction,
}

/// Outcome of corrective retrieval
#[derive(Debug, Clone)]
pub struct CorrectiveResult {
    /// Original query
    pub query: String,
    /// Query used in the last round
    pub final_query: String,
    /// Working set, deduplicated by chunk id, in retrieval order
    pub chunks: Vec<Chunk>,
    /// Last sufficiency check
    pub sufficiency: ContextSufficiency,
    /// Rounds run
    pub iterations: usize,
    /// Per-round trace
    pub history: Vec<IterationRecord>,
    /// True when rounds ran out before the context became sufficient
    pub needs_refinement: bool,
}

/// Checks retrieved context and drives refine-and-retrieve rounds
#[derive(Debug, Clone, Default)]
pub struct ContextSufficiencyEngine {
    config: RetrievalConfig,
    components: ComponentTable,
}

impl ContextSufficiencyEngine {
    /// Create an engine, validating the configuration
    pub fn new(config: RetrievalConfig) -> Result<Self, RetrievalError> {
        config.validate().map_err(RetrievalError::Config)?;
        Ok(Self {
            config,
            components: ComponentTable::default(),
        })
    }

    /// Replace the component table
    pub fn with_components(mut self, components: ComponentTable) -> Self {
        self.components = components;
        self
    }

    /// Engine configuration
    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Fraction of query terms present anywhere in the chunks
    pub fn relevance(&self, query: &str, chunks: &[Chunk]) -> f64 {
        let mut terms = content_words(query, 3);
        if terms.is_empty() {
            terms = tokenize(query);
        }
        let terms: HashSet<String> = terms.into_iter().collect();
        if terms.is_empty() || chunks.is_empty() {
            return 0.0;
        }
        let present: HashSet<String> = chunks.iter().flat_map(|c| tokenize(&c.content)).collect();
        let covered = terms.iter().filter(|t| present.contains(*t)).count();
        covered as f64 / terms.len() as f64
    }

    /// Distinct sources a strategy needs before its context counts as sufficient
    ///
    /// One when diversity is not required. Otherwise `min_distinct_sources`,
    /// raised to the strategy's `min_sources` for multi-perspective queries
    /// when `enforce_strategy_sources` is set.
    pub fn required_sources(&self, strategy: &RetrievalStrategy) -> usize {
        if !strategy.diversity_required {
            return 1;
        }
        let floor = self.config.min_distinct_sources;
        if self.config.enforce_strategy_sources && strategy.requires_multiple_perspectives {
            floor.max(strategy.min_sources)
        } else {
            floor
        }
    }

    /// Chunks requested per round for a strategy
    pub fn top_k_for(&self, strategy: &RetrievalStrategy) -> usize {
        self.config.top_k.max(strategy.min_sources)
    }

    /// Check whether chunks answer a query
    ///
    /// With `diversity_required`, `min_distinct_sources` distinct sources
    /// must be present.
    ///
    /// # Examples
    ///
    /// ```
    /// use veritas_retrieval::ContextSufficiencyEngine;
    /// use veritas_domain::RecommendedAction;
    ///
    /// let engine = ContextSufficiencyEngine::default();
    /// let check = engine.check("What is a mutex", &[], false);
    /// assert!(!check.is_sufficient);
    /// assert_eq!(check.recommended_action, RecommendedAction::RefineQuery);
    /// ```
    pub fn check(&self, query: &str, chunks: &[Chunk], diversity_required: bool) -> ContextSufficiency {
        let sources = if diversity_required {
            self.config.min_distinct_sources
        } else {
            1
        };
        self.check_sources(query, chunks, sources)
    }

    /// Check whether chunks answer a query drawing on `required_sources`
    /// distinct sources
    pub fn check_sources(&self, query: &str, chunks: &[Chunk], required_sources: usize) -> ContextSufficiency {
        let required = self.components.required(query);
        if chunks.is_empty() {
            return ContextSufficiency::empty(required.iter().map(|c| c.name.clone()).collect());
        }

        let is_relevant = self.relevance(query, chunks) >= self.config.relevance_threshold;
        let combined = chunks
            .iter()
            .map(|c| c.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let (covered, missing): (Vec<&InformationComponent>, Vec<&InformationComponent>) =
            required.iter().copied().partition(|c| c.evidence.is_match(&combined));
        let completeness = if required.is_empty() {
            100.0
        } else {
            covered.len() as f64 / required.len() as f64 * 100.0
        };

        let distinct_sources: HashSet<&str> = chunks.iter().map(|c| c.source_id()).collect();
        let diverse_enough = distinct_sources.len() >= required_sources;

        let mut missing_info: Vec<String> = missing.iter().map(|c| c.name.clone()).collect();
        if !diverse_enough {
            missing_info.push(SOURCE_DIVERSITY.to_string());
        }

        // Relevance only steers the action
        let is_sufficient = completeness >= self.config.sufficiency_threshold && diverse_enough;

        // Combining is needed when no single chunk covers every found component
        let spread = chunks.len() > 1
            && covered.len() > 1
            && !chunks
                .iter()
                .any(|chunk| covered.iter().all(|c| c.evidence.is_match(&chunk.content)));

        let recommended_action = if !is_sufficient && !is_relevant {
            RecommendedAction::RefineQuery
        } else if !is_sufficient {
            RecommendedAction::SearchMore
        } else if spread {
            RecommendedAction::CombineChunks
        } else {
            RecommendedAction::Use
        };

        ContextSufficiency {
            is_relevant,
            is_sufficient,
            completeness,
            missing_info,
            recommended_action,
        }
    }

    /// Original query extended with refinement terms for missing components
    pub fn refine_query(&self, query: &str, missing_info: &[String]) -> String {
        let mut refined = query.trim().to_string();
        let mut added = HashSet::new();
        for name in missing_info {
            let terms = match self.components.get(name) {
                Some(component) => component.refinement.as_str(),
                None if name == SOURCE_DIVERSITY => DIVERSITY_REFINEMENT,
                None => continue,
            };
            if added.insert(terms) {
                refined.push(' ');
                refined.push_str(terms);
            }
        }
        refined
    }

    /// Run corrective retrieval for a query
    ///
    /// Rounds run strictly one after another, at most `max_iterations`.
    /// Each round excludes chunk ids already in the working set.
    pub async fn retrieve<R: ChunkRetriever + ?Sized>(
        &self,
        retriever: &R,
        query: &str,
        diversity_required: bool,
    ) -> Result<CorrectiveResult, RetrievalError> {
        let sources = if diversity_required {
            self.config.min_distinct_sources
        } else {
            1
        };
        self.run_rounds(retriever, query, self.config.top_k, sources).await
    }

    /// Run corrective retrieval with a strategy's source requirements
    ///
    /// See [`required_sources`](Self::required_sources) and
    /// [`top_k_for`](Self::top_k_for).
    pub async fn retrieve_for<R: ChunkRetriever + ?Sized>(
        &self,
        retriever: &R,
        query: &str,
        strategy: &RetrievalStrategy,
    ) -> Result<CorrectiveResult, RetrievalError> {
        let top_k = self.top_k_for(strategy);
        let sources = self.required_sources(strategy);
        debug!("Retrieving for '{}': top_k {}, {} distinct source(s) required", query, top_k, sources);
        self.run_rounds(retriever, query, top_k, sources).await
    }

    async fn run_rounds<R: ChunkRetriever + ?Sized>(
        &self,
        retriever: &R,
        query: &str,
        top_k: usize,
        required_sources: usize,
    ) -> Result<CorrectiveResult, RetrievalError> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut chunks: Vec<Chunk> = Vec::new();
        let mut history = Vec::new();
        let mut current_query = query.to_string();
        let mut sufficiency = ContextSufficiency::empty(Vec::new());

        for iteration in 1..=self.config.max_iterations {
            let found = retriever.retrieve(&current_query, top_k, &seen).await?;
            let mut retrieved = 0;
            for chunk in found {
                if seen.insert(chunk.id.clone()) {
                    chunks.push(chunk);
                    retrieved += 1;
                }
            }

            sufficiency = self.check_sources(query, &chunks, required_sources);
            debug!(
                "Round {} for '{}': +{} chunks, completeness {:.0}, action {:?}",
                iteration, current_query, retrieved, sufficiency.completeness, sufficiency.recommended_action
            );
            history.push(IterationRecord {
                iteration,
                query: current_query.clone(),
                retrieved,
                total_chunks: chunks.len(),
                completeness: sufficiency.completeness,
                action: sufficiency.recommended_action,
            });

            if sufficiency.is_sufficient {
                info!(
                    "Context sufficient for '{}' after {} round(s) with {} chunks",
                    query,
                    iteration,
                    chunks.len()
                );
                return Ok(CorrectiveResult {
                    query: query.to_string(),
                    final_query: current_query,
                    chunks,
                    sufficiency,
                    iterations: iteration,
                    history,
                    needs_refinement: false,
                });
            }
            current_query = self.refine_query(query, &sufficiency.missing_info);
        }

        let iterations = history.len();
        let final_query = history.last().map_or_else(|| query.to_string(), |h| h.query.clone());
        info!(
            "Context still insufficient for '{}' after {} rounds (completeness {:.0}, missing {:?})",
            query, iterations, sufficiency.completeness, sufficiency.missing_info
        );
        Ok(CorrectiveResult {
            query: query.to_string(),
            final_query,
            chunks,
            sufficiency,
            iterations,
            history,
            needs_refinement: true,
        })
    }
}
