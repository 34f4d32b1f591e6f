//! Context sufficiency verdicts produced by corrective retrieval

use serde::{Deserialize, Serialize};

/// What the retrieval loop should do next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendedAction {
    /// The working set answers the query
    Use,
    /// The chunks are off-topic; rephrase the query
    RefineQuery,
    /// On-topic but incomplete; retrieve more
    SearchMore,
    /// Complete only when several chunks are read together
    CombineChunks,
}

/// Whether a set of chunks can answer a query
///
/// Recomputed on every retrieval iteration and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextSufficiency {
    /// Query-term coverage met the relevance threshold
    pub is_relevant: bool,
    /// Completeness and diversity requirements are met
    pub is_sufficient: bool,
    /// Share of required information components present (0-100)
    pub completeness: f64,
    /// Names of required components that were not found
    pub missing_info: Vec<String>,
    /// Next step for the retrieval loop
    pub recommended_action: RecommendedAction,
}

impl ContextSufficiency {
    /// Verdict for an empty working set
    pub fn empty(missing_info: Vec<String>) -> Self {
        Self {
            is_relevant: false,
            is_sufficient: false,
            completeness: 0.0,
            missing_info,
            recommended_action: RecommendedAction::RefineQuery,
        }
    }
}
