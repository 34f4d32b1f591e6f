//! Multi-reviewer validation of claims
//!
//! Every reviewer sees the same `{claim, evidence, context}` request for a
//! target. Reviewers for one target run concurrently, each under its own
//! timeout; targets are processed one at a time. Confidences here are on a
//! 0-1 scale.

use crate::config::EnsembleConfig;
use crate::error::GatekeeperError;
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use veritas_domain::text::{keyword_set, jaccard};
use veritas_domain::traits::{ReviewRequest, ReviewStatus, Reviewer};
use veritas_domain::{Chunk, Claim};

/// Score contributed by one verdict
pub fn status_score(status: ReviewStatus) -> f64 {
    match status {
        ReviewStatus::Supported => 1.0,
        ReviewStatus::Unclear => 0.25,
        ReviewStatus::Flagged => 0.0,
    }
}

/// One claim or section to review
#[derive(Debug, Clone, PartialEq)]
pub struct EnsembleTarget {
    /// Caller-chosen identifier
    pub id: String,
    /// What reviewers are asked about
    pub request: ReviewRequest,
    /// Confidence before review (0-1)
    pub confidence: f64,
}

/// A reviewer's answer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewerVote {
    /// Reviewer name
    pub reviewer: String,
    /// Verdict
    pub status: ReviewStatus,
    /// Reviewer explanation
    pub explanation: String,
}

/// Ensemble result for one target
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnsembleOutcome {
    /// Target identifier
    pub target_id: String,
    /// Votes from reviewers that answered in time
    pub votes: Vec<ReviewerVote>,
    /// Mean vote score, `None` when nobody answered
    pub aggregate: Option<f64>,
    /// Both `supported` and `flagged` were returned
    pub conflicted: bool,
    /// Confidence before review (0-1)
    pub prior_confidence: f64,
    /// Confidence after review (0-1)
    pub confidence: f64,
}

impl EnsembleOutcome {
    /// Number of reviewers that answered
    pub fn responders(&self) -> usize {
        self.votes.len()
    }
}

/// Runs a set of reviewers over targets and merges their verdicts
pub struct EnsembleValidator {
    config: EnsembleConfig,
    reviewers: Vec<Arc<dyn Reviewer>>,
}

impl EnsembleValidator {
    /// Create a validator with no reviewers, validating the configuration
    pub fn new(config: EnsembleConfig) -> Result<Self, GatekeeperError> {
        config.validate().map_err(GatekeeperError::Config)?;
        Ok(Self {
            config,
            reviewers: Vec::new(),
        })
    }

    /// Add a reviewer
    pub fn with_reviewer<R: Reviewer + 'static>(mut self, reviewer: R) -> Self {
        self.reviewers.push(Arc::new(reviewer));
        self
    }

    /// Add a shared reviewer
    pub fn with_shared_reviewer(mut self, reviewer: Arc<dyn Reviewer>) -> Self {
        self.reviewers.push(reviewer);
        self
    }

    /// Number of configured reviewers
    pub fn reviewer_count(&self) -> usize {
        self.reviewers.len()
    }

    /// Validator configuration
    pub fn config(&self) -> &EnsembleConfig {
        &self.config
    }

    /// Merge a prior confidence with the ensemble verdict
    ///
    /// # Examples
    ///
    /// ```
    /// use veritas_gatekeeper::{EnsembleConfig, EnsembleValidator};
    ///
    /// let validator = EnsembleValidator::new(EnsembleConfig::default()).unwrap();
    /// assert_eq!(validator.merge_confidence(0.9, Some(0.5), true), 0.4);
    /// assert_eq!(validator.merge_confidence(0.6, None, false), 0.6);
    /// ```
    pub fn merge_confidence(&self, prior: f64, aggregate: Option<f64>, conflicted: bool) -> f64 {
        let Some(aggregate) = aggregate else {
            return prior;
        };
        let config = &self.config;
        if conflicted {
            return prior.min(config.conflicted_cap);
        }
        if aggregate > config.baseline {
            if prior >= config.confidence_cap {
                return prior;
            }
            let boost = config.max_boost * (aggregate - config.baseline) / (1.0 - config.baseline);
            (prior + boost).min(config.confidence_cap)
        } else if prior > aggregate {
            let floor = config.confidence_floor.min(prior);
            (prior - (prior - aggregate) / 2.0).max(floor)
        } else {
            prior
        }
    }

    /// Review one target with every reviewer
    pub async fn validate(&self, target: &EnsembleTarget) -> EnsembleOutcome {
        let timeout = Duration::from_millis(self.config.reviewer_timeout_ms);
        let request = &target.request;
        let pending = self.reviewers.iter().map(|reviewer| async move {
            match tokio::time::timeout(timeout, reviewer.review(request)).await {
                Ok(Some(verdict)) => Some(ReviewerVote {
                    reviewer: reviewer.name().to_string(),
                    status: verdict.status,
                    explanation: verdict.explanation,
                }),
                Ok(None) => {
                    debug!("Reviewer {} returned no verdict for {}", reviewer.name(), target.id);
                    None
                }
                Err(_) => {
                    warn!(
                        "Reviewer {} timed out after {:?} on {}",
                        reviewer.name(),
                        timeout,
                        target.id
                    );
                    None
                }
            }
        });
        let votes: Vec<ReviewerVote> = join_all(pending).await.into_iter().flatten().collect();

        let aggregate = if votes.is_empty() {
            None
        } else {
            Some(votes.iter().map(|v| status_score(v.status)).sum::<f64>() / votes.len() as f64)
        };
        let conflicted = votes.iter().any(|v| v.status == ReviewStatus::Supported)
            && votes.iter().any(|v| v.status == ReviewStatus::Flagged);
        let confidence = self.merge_confidence(target.confidence, aggregate, conflicted);

        debug!(
            "Target {}: {} votes, aggregate {:?}, conflicted {}, confidence {:.2} -> {:.2}",
            target.id,
            votes.len(),
            aggregate,
            conflicted,
            target.confidence,
            confidence
        );
        EnsembleOutcome {
            target_id: target.id.clone(),
            votes,
            aggregate,
            conflicted,
            prior_confidence: target.confidence,
            confidence,
        }
    }

    /// Review targets one after another
    pub async fn validate_all(&self, targets: &[EnsembleTarget]) -> Vec<EnsembleOutcome> {
        let mut outcomes = Vec::with_capacity(targets.len());
        for target in targets {
            outcomes.push(self.validate(target).await);
        }
        outcomes
    }

    /// Review claims and write the merged confidence back
    ///
    /// Each claim's evidence is the chunk that best overlaps the statement.
    /// Claims without any overlapping chunk are not reviewed. Only
    /// `Claim.confidence` changes, converted from and back to 0-100.
    pub async fn apply_to_claims(
        &self,
        claims: &mut [Claim],
        chunks: &[Chunk],
        context: &str,
    ) -> Vec<EnsembleOutcome> {
        let mut outcomes = Vec::new();
        if self.reviewers.is_empty() {
            return outcomes;
        }
        for claim in claims.iter_mut() {
            let Some(evidence) = best_evidence(&claim.statement, chunks) else {
                continue;
            };
            let target = EnsembleTarget {
                id: claim.id.to_string(),
                request: ReviewRequest {
                    claim: claim.statement.clone(),
                    evidence: evidence.to_string(),
                    context: context.to_string(),
                },
                confidence: claim.confidence / 100.0,
            };
            let outcome = self.validate(&target).await;
            claim.confidence = (outcome.confidence * 100.0).clamp(0.0, 100.0);
            outcomes.push(outcome);
        }
        info!(
            "Ensemble reviewed {} of {} claims with {} reviewers",
            outcomes.len(),
            claims.len(),
            self.reviewers.len()
        );
        outcomes
    }
}

fn best_evidence<'a>(statement: &str, chunks: &'a [Chunk]) -> Option<&'a str> {
    let keywords = keyword_set(statement, 4);
    chunks
        .iter()
        .map(|c| (jaccard(&keywords, &keyword_set(&c.content, 4)), c))
        .filter(|(score, _)| *score > 0.0)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, c)| c.content.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use veritas_domain::traits::ReviewVerdict;

    struct Fixed {
        name: &'static str,
        status: Option<ReviewStatus>,
        delay: Duration,
        calls: Arc<AtomicUsize>,
    }

    impl Fixed {
        fn new(name: &'static str, status: Option<ReviewStatus>) -> Self {
            Self {
                name,
                status,
                delay: Duration::ZERO,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn slow(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    #[async_trait]
    impl Reviewer for Fixed {
        fn name(&self) -> &str {
            self.name
        }

        async fn review(&self, _request: &ReviewRequest) -> Option<ReviewVerdict> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.status.map(|status| ReviewVerdict {
                status,
                explanation: format!("{} says {:?}", self.name, status),
            })
        }
    }

    fn target(confidence: f64) -> EnsembleTarget {
        EnsembleTarget {
            id: "t1".to_string(),
            request: ReviewRequest {
                claim: "Rust has no garbage collector.".to_string(),
                evidence: "Rust manages memory without a garbage collector.".to_string(),
                context: "rust memory".to_string(),
            },
            confidence,
        }
    }

    fn validator() -> EnsembleValidator {
        EnsembleValidator::new(EnsembleConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_disagreement_caps_confidence() {
        let validator = validator()
            .with_reviewer(Fixed::new("a", Some(ReviewStatus::Supported)))
            .with_reviewer(Fixed::new("b", Some(ReviewStatus::Flagged)));
        let outcome = validator.validate(&target(0.9)).await;
        assert!(outcome.conflicted);
        assert_eq!(outcome.aggregate, Some(0.5));
        assert!(outcome.confidence <= 0.4);
    }

    #[tokio::test]
    async fn test_unanimous_support_boosts() {
        let validator = validator()
            .with_reviewer(Fixed::new("a", Some(ReviewStatus::Supported)))
            .with_reviewer(Fixed::new("b", Some(ReviewStatus::Supported)));
        let outcome = validator.validate(&target(0.6)).await;
        assert!(!outcome.conflicted);
        assert!((outcome.confidence - 0.75).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_unclear_reduces_toward_aggregate() {
        let validator = validator().with_reviewer(Fixed::new("a", Some(ReviewStatus::Unclear)));
        let outcome = validator.validate(&target(0.85)).await;
        assert_eq!(outcome.aggregate, Some(0.25));
        assert!((outcome.confidence - 0.55).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_flagged_reduction_is_floored() {
        let validator = validator().with_reviewer(Fixed::new("a", Some(ReviewStatus::Flagged)));
        assert!((validator.validate(&target(0.2)).await.confidence - 0.15).abs() < 1e-9);
        assert!((validator.validate(&target(0.1)).await.confidence - 0.1).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_no_responders_leaves_confidence() {
        let validator = validator().with_reviewer(Fixed::new("silent", None));
        let outcome = validator.validate(&target(0.7)).await;
        assert_eq!(outcome.responders(), 0);
        assert_eq!(outcome.aggregate, None);
        assert_eq!(outcome.confidence, 0.7);
    }

    #[tokio::test]
    async fn test_timeout_does_not_block_other_reviewers() {
        let config = EnsembleConfig {
            reviewer_timeout_ms: 50,
            ..EnsembleConfig::default()
        };
        let validator = EnsembleValidator::new(config)
            .unwrap()
            .with_reviewer(Fixed::new("slow", Some(ReviewStatus::Flagged)).slow(Duration::from_secs(5)))
            .with_reviewer(Fixed::new("fast", Some(ReviewStatus::Supported)));

        let started = std::time::Instant::now();
        let outcome = validator.validate(&target(0.6)).await;
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(outcome.responders(), 1);
        assert_eq!(outcome.votes[0].reviewer, "fast");
        assert!(!outcome.conflicted);
    }

    #[test]
    fn test_boost_never_lowers_high_confidence() {
        let validator = validator();
        assert_eq!(validator.merge_confidence(0.99, Some(1.0), false), 0.99);
        assert_eq!(validator.merge_confidence(0.9, Some(1.0), false), 0.95);
    }

    #[tokio::test]
    async fn test_apply_to_claims_updates_confidence_only() {
        use veritas_domain::{ChunkMetadata, ClaimId, ClaimType, Source, SourceType, Verification};

        let reviewer = Fixed::new("a", Some(ReviewStatus::Supported));
        let calls = Arc::clone(&reviewer.calls);
        let validator = validator().with_reviewer(reviewer);

        let source = Arc::new(Source::new("https://a.example", "A", SourceType::OfficialDocs));
        let chunks = vec![Chunk::new(
            "a_chunk_0",
            "Rust manages memory through ownership rules.",
            source,
            ChunkMetadata::default(),
        )];
        let make = |statement: &str| Claim {
            id: ClaimId::new(),
            statement: statement.to_string(),
            claim_type: ClaimType::Fact,
            sources: Vec::new(),
            verified: false,
            confidence: 50.0,
            verification: Verification::default(),
            issues: Vec::new(),
        };
        let mut claims = vec![
            make("Rust manages memory through ownership."),
            make("Bread dough needs patience."),
        ];
        let before = claims.clone();

        let outcomes = validator.apply_to_claims(&mut claims, &chunks, "rust").await;
        assert_eq!(outcomes.len(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!((claims[0].confidence - 65.0).abs() < 1e-9);
        assert_eq!(claims[1], before[1]);
        assert_eq!(claims[0].statement, before[0].statement);
        assert_eq!(claims[0].verified, before[0].verified);
    }
}
