//! Reviewer implementations

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};
use veritas_domain::text::{jaccard, keyword_set};
use veritas_domain::traits::{GenerativeProvider, InvokeOptions, ReviewRequest, ReviewStatus, ReviewVerdict, Reviewer};
use veritas_llm::parse_as;

#[derive(Debug, Deserialize)]
struct ReviewResponse {
    status: String,
    #[serde(default)]
    explanation: String,
}

/// Reviewer backed by a generative model
///
/// The model is asked for `{"status": ..., "explanation": ...}`. Provider
/// failures and unparseable answers yield no verdict.
pub struct ModelReviewer<P> {
    name: String,
    provider: P,
}

impl<P: GenerativeProvider> ModelReviewer<P> {
    /// Create a reviewer
    pub fn new(name: impl Into<String>, provider: P) -> Self {
        Self {
            name: name.into(),
            provider,
        }
    }

    /// Prompt sent for one request
    pub fn build_prompt(request: &ReviewRequest) -> String {
        format!(
            r#"You are a fact-checking reviewer. Decide whether the evidence supports the claim.

Context: {}

Claim: {}

Evidence: {}

Answer "supported" if the evidence backs the claim, "flagged" if it contradicts the claim or the claim goes beyond it, and "unclear" if you cannot tell.

Respond with JSON only:
{{"status": "supported" | "flagged" | "unclear", "explanation": "one sentence"}}"#,
            request.context, request.claim, request.evidence
        )
    }
}

#[async_trait]
impl<P: GenerativeProvider> Reviewer for ModelReviewer<P> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn review(&self, request: &ReviewRequest) -> Option<ReviewVerdict> {
        let prompt = Self::build_prompt(request);
        let raw = match self.provider.invoke(&prompt, InvokeOptions { expect_json: true }).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Reviewer {} failed: {}", self.name, e);
                return None;
            }
        };
        let response: ReviewResponse = match parse_as(&raw) {
            Ok(response) => response,
            Err(e) => {
                debug!("Reviewer {} returned unparseable output: {}", self.name, e);
                return None;
            }
        };
        let Some(status) = ReviewStatus::parse(&response.status) else {
            debug!("Reviewer {} returned unknown status '{}'", self.name, response.status);
            return None;
        };
        Some(ReviewVerdict {
            status,
            explanation: response.explanation,
        })
    }
}

/// Offline reviewer comparing the claim's keywords with the evidence
///
/// Supported above `support_overlap`, flagged below `flag_overlap`,
/// unclear in between.
#[derive(Debug, Clone)]
pub struct OverlapReviewer {
    name: String,
    support_overlap: f64,
    flag_overlap: f64,
}

impl OverlapReviewer {
    /// Create a reviewer with explicit thresholds
    pub fn new(name: impl Into<String>, support_overlap: f64, flag_overlap: f64) -> Self {
        Self {
            name: name.into(),
            support_overlap,
            flag_overlap,
        }
    }
}

impl Default for OverlapReviewer {
    fn default() -> Self {
        Self::new("keyword-overlap", 0.5, 0.1)
    }
}

#[async_trait]
impl Reviewer for OverlapReviewer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn review(&self, request: &ReviewRequest) -> Option<ReviewVerdict> {
        let claim = keyword_set(&request.claim, 4);
        if claim.is_empty() {
            return None;
        }
        let evidence = keyword_set(&request.evidence, 4);
        let covered = claim.intersection(&evidence).count() as f64 / claim.len() as f64;
        let status = if covered >= self.support_overlap {
            ReviewStatus::Supported
        } else if covered < self.flag_overlap {
            ReviewStatus::Flagged
        } else {
            ReviewStatus::Unclear
        };
        Some(ReviewVerdict {
            status,
            explanation: format!(
                "{:.0}% of claim keywords appear in the evidence (similarity {:.2})",
                covered * 100.0,
                jaccard(&claim, &evidence)
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veritas_llm::{LlmError, MockProvider};

    fn request() -> ReviewRequest {
        ReviewRequest {
            claim: "Rust manages memory through ownership.".to_string(),
            evidence: "Ownership rules let Rust manage memory safely.".to_string(),
            context: "rust".to_string(),
        }
    }

    #[tokio::test]
    async fn test_model_reviewer_parses_fenced_json() {
        let provider = MockProvider::new(
            "Here you go:\n```json\n{\"status\": \"Supported\", \"explanation\": \"matches\"}\n```",
        );
        let reviewer = ModelReviewer::new("model", provider.clone());
        let verdict = reviewer.review(&request()).await.unwrap();
        assert_eq!(verdict.status, ReviewStatus::Supported);
        assert_eq!(verdict.explanation, "matches");
        assert!(provider.prompts()[0].contains("Claim: Rust manages memory through ownership."));
    }

    #[tokio::test]
    async fn test_model_reviewer_failure_is_none() {
        let provider = MockProvider::new("{\"status\": \"supported\"}");
        provider.queue_failure(LlmError::Communication("down".into()));
        let reviewer = ModelReviewer::new("model", provider);
        assert!(reviewer.review(&request()).await.is_none());
    }

    #[tokio::test]
    async fn test_model_reviewer_unknown_status_is_none() {
        let reviewer = ModelReviewer::new("model", MockProvider::new("{\"status\": \"maybe\"}"));
        assert!(reviewer.review(&request()).await.is_none());
    }

    #[tokio::test]
    async fn test_model_reviewer_plain_text_is_none() {
        let reviewer = ModelReviewer::new("model", MockProvider::new("I think it is fine."));
        assert!(reviewer.review(&request()).await.is_none());
    }

    #[tokio::test]
    async fn test_overlap_reviewer() {
        let reviewer = OverlapReviewer::default();
        let verdict = reviewer.review(&request()).await.unwrap();
        assert_eq!(verdict.status, ReviewStatus::Supported);

        let unrelated = ReviewRequest {
            evidence: "Bread needs flour and water.".to_string(),
            ..request()
        };
        assert_eq!(reviewer.review(&unrelated).await.unwrap().status, ReviewStatus::Flagged);
    }
}
