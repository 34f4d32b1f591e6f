//! Claim extraction and cross-referencing against retrieved chunks
//!
//! Synthesized text is split into sentences, each sentence is typed by an
//! ordered rule table, and every typed sentence is checked against the
//! chunks that share enough keywords with it. A chunk either supports the
//! claim, conflicts with it (a number disagrees or an on-topic sentence
//! negates it), or is neutral.

use crate::config::VerifierConfig;
use crate::error::GatekeeperError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use tracing::{debug, info};
use veritas_domain::confidence::{agreement, compute_confidence, is_verified};
use veritas_domain::text::{jaccard, keyword_set, split_sentences};
use veritas_domain::{
    Chunk, Claim, ClaimId, ClaimIssue, ClaimType, IssueKind, Severity, Verification, VerificationMethod,
};

static NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+(?:,\d{3})*(?:\.\d+)?").expect("valid regex"));

static NEGATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(not|no|never|none|neither|nor|false|untrue|incorrect|myth|misconception|debunked|disputed|contrary|contradicts?|refuted?|cannot)\b|n't\b",
    )
    .expect("valid regex")
});

/// One claim-typing rule
#[derive(Debug, Clone)]
pub struct ClaimTypeRule {
    /// Type assigned when the pattern matches
    pub claim_type: ClaimType,
    /// Pattern tested against the sentence
    pub pattern: Regex,
}

/// Ordered claim-typing table; the first matching rule wins
#[derive(Debug, Clone)]
pub struct ClaimTypeRules {
    rules: Vec<ClaimTypeRule>,
}

impl ClaimTypeRules {
    /// Build a table from rules in priority order
    pub fn new(rules: Vec<ClaimTypeRule>) -> Self {
        Self { rules }
    }

    /// Build a table from `(type, pattern)` pairs in priority order
    pub fn from_patterns(patterns: &[(ClaimType, &str)]) -> Result<Self, regex::Error> {
        let rules = patterns
            .iter()
            .map(|(claim_type, pattern)| {
                Ok(ClaimTypeRule {
                    claim_type: *claim_type,
                    pattern: Regex::new(pattern)?,
                })
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self::new(rules))
    }

    /// Type of a sentence, or `None` when it makes no claim
    pub fn classify(&self, sentence: &str) -> Option<ClaimType> {
        self.rules
            .iter()
            .find(|rule| rule.pattern.is_match(sentence))
            .map(|rule| rule.claim_type)
    }
}

static DEFAULT_RULES: Lazy<ClaimTypeRules> = Lazy::new(|| {
    ClaimTypeRules::from_patterns(&[
        (
            ClaimType::Statistic,
            r"(?i)(\d+(\.\d+)?\s?%|\b\d+(\.\d+)?\s?(percent|million|billion|thousand|times|x|ms|seconds|minutes|hours|days|weeks|months|years|gb|mb|kb|users|people)\b)",
        ),
        (ClaimType::Quote, r#"(?i)(["“”]|\baccording to\b)"#),
        (
            ClaimType::Opinion,
            r"(?i)\b(might|may|could|should|would|probably|perhaps|possibly|arguably|likely)\b",
        ),
        (
            ClaimType::Interpretation,
            r"(?i)\b(suggests?|suggested|indicates?|indicated|appears?|appeared|seems?|implies|implied)\b",
        ),
        (ClaimType::Fact, r"(?i)\b(is|are|was|were|has been|have been)\b"),
    ])
    .expect("valid claim type table")
});

impl Default for ClaimTypeRules {
    fn default() -> Self {
        DEFAULT_RULES.clone()
    }
}

/// A sentence extracted as a claim, before verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedClaim {
    /// The sentence, trimmed
    pub statement: String,
    /// Assigned type
    pub claim_type: ClaimType,
}

enum Judgement {
    Support { similarity: f64 },
    Conflict,
    Neutral,
}

/// Turns synthesized text into verified claims
#[derive(Debug, Clone, Default)]
pub struct ClaimVerifier {
    config: VerifierConfig,
    rules: ClaimTypeRules,
}

impl ClaimVerifier {
    /// Create a verifier, validating the configuration
    pub fn new(config: VerifierConfig) -> Result<Self, GatekeeperError> {
        config.validate().map_err(GatekeeperError::Config)?;
        Ok(Self {
            config,
            rules: ClaimTypeRules::default(),
        })
    }

    /// Replace the claim-typing table
    pub fn with_rules(mut self, rules: ClaimTypeRules) -> Self {
        self.rules = rules;
        self
    }

    /// Verifier configuration
    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Sentences long enough to be claims, with their types
    pub fn extract_claims(&self, text: &str) -> Vec<ExtractedClaim> {
        split_sentences(text)
            .into_iter()
            .map(str::trim)
            .filter(|s| s.chars().count() > self.config.min_sentence_chars)
            .filter_map(|s| {
                self.rules.classify(s).map(|claim_type| ExtractedClaim {
                    statement: s.to_string(),
                    claim_type,
                })
            })
            .collect()
    }

    /// Extract and verify every claim in a text
    pub fn verify_text(&self, text: &str, chunks: &[Chunk]) -> Vec<Claim> {
        let claims: Vec<Claim> = self
            .extract_claims(text)
            .into_iter()
            .map(|extracted| self.verify(&extracted.statement, extracted.claim_type, chunks))
            .collect();
        info!(
            "Verified {} claims against {} chunks ({} verified)",
            claims.len(),
            chunks.len(),
            claims.iter().filter(|c| c.verified).count()
        );
        claims
    }

    /// Verify one statement
    ///
    /// # Examples
    ///
    /// ```
    /// use veritas_domain::ClaimType;
    /// use veritas_gatekeeper::ClaimVerifier;
    ///
    /// let verifier = ClaimVerifier::default();
    /// let claim = verifier.verify("Rust guarantees memory safety without garbage collection.", ClaimType::Fact, &[]);
    /// assert!(!claim.verified);
    /// assert_eq!(claim.confidence, 0.0);
    /// ```
    pub fn verify(&self, statement: &str, claim_type: ClaimType, chunks: &[Chunk]) -> Claim {
        let keywords = keyword_set(statement, self.config.keyword_min_len);
        let claim_numbers = numbers(statement);
        let claim_negations = negation_terms(statement);

        let mut supporting: Vec<String> = Vec::new();
        let mut conflicting: Vec<String> = Vec::new();
        let mut best_similarity: f64 = 0.0;
        let mut matched_chunks = 0;

        for chunk in chunks {
            if !self.matches(&keywords, &chunk.content) {
                continue;
            }
            matched_chunks += 1;
            let source_id = chunk.source_id().to_string();
            match self.judge(&keywords, &claim_numbers, &claim_negations, &chunk.content) {
                Judgement::Conflict => {
                    debug!("Chunk {} conflicts with '{}'", chunk.id, statement);
                    if !conflicting.contains(&source_id) {
                        conflicting.push(source_id);
                    }
                }
                Judgement::Support { similarity } => {
                    best_similarity = best_similarity.max(similarity);
                    if !supporting.contains(&source_id) {
                        supporting.push(source_id);
                    }
                }
                Judgement::Neutral => {}
            }
        }
        // A source that contradicts itself counts only as conflicting
        supporting.retain(|id| !conflicting.contains(id));

        let support_count = supporting.len();
        let conflict_count = conflicting.len();
        let verified = is_verified(support_count, conflict_count);

        let verification_method = if support_count == 0 {
            VerificationMethod::Inference
        } else if best_similarity > self.config.direct_quote_similarity {
            VerificationMethod::DirectQuote
        } else if support_count >= 2 {
            VerificationMethod::Synthesis
        } else {
            VerificationMethod::Paraphrase
        };

        let issues = issues_for(claim_type, matched_chunks, support_count, conflict_count);

        Claim {
            id: ClaimId::new(),
            statement: statement.to_string(),
            claim_type,
            sources: supporting.clone(),
            verified,
            confidence: compute_confidence(support_count, conflict_count, claim_type),
            verification: Verification {
                supporting_sources: supporting,
                conflicting_sources: conflicting,
                agreement: agreement(support_count, conflict_count),
                needs_review: !verified,
                verification_method,
                matched_chunks,
            },
            issues,
        }
    }

    fn matches(&self, keywords: &HashSet<String>, content: &str) -> bool {
        if keywords.is_empty() {
            return false;
        }
        let chunk_keywords = keyword_set(content, self.config.keyword_min_len);
        let shared = keywords.intersection(&chunk_keywords).count();
        shared as f64 / keywords.len() as f64 >= self.config.overlap_threshold
    }

    fn judge(
        &self,
        keywords: &HashSet<String>,
        claim_numbers: &[f64],
        claim_negations: &HashSet<String>,
        content: &str,
    ) -> Judgement {
        let chunk_numbers = numbers(content);
        if !claim_numbers.is_empty() && !chunk_numbers.is_empty() {
            let tolerance = self.config.numeric_tolerance;
            let disagrees = claim_numbers
                .iter()
                .any(|a| !chunk_numbers.iter().any(|b| within(*a, *b, tolerance)));
            if disagrees {
                return Judgement::Conflict;
            }
        }

        let mut best: f64 = 0.0;
        for sentence in split_sentences(content) {
            let sentence_keywords = keyword_set(sentence, self.config.keyword_min_len);
            let shared = keywords.intersection(&sentence_keywords).count();
            if shared >= self.config.negation_shared_keywords
                && negation_terms(sentence).difference(claim_negations).next().is_some()
            {
                return Judgement::Conflict;
            }
            best = best.max(jaccard(keywords, &sentence_keywords));
        }

        if best > self.config.support_similarity {
            Judgement::Support { similarity: best }
        } else {
            Judgement::Neutral
        }
    }
}

fn issues_for(
    claim_type: ClaimType,
    matched_chunks: usize,
    supporting: usize,
    conflicting: usize,
) -> Vec<ClaimIssue> {
    let mut issues = Vec::new();
    if claim_type.is_factual() && matched_chunks == 0 {
        issues.push(ClaimIssue {
            kind: IssueKind::Unsourced,
            severity: Severity::Critical,
            message: format!("{} claim has no matching source material", claim_type.as_str()),
            recommendation: "Add a citation to a credible source or remove the claim".to_string(),
        });
    }
    if supporting < 2 {
        issues.push(ClaimIssue {
            kind: IssueKind::Unverified,
            severity: if claim_type.is_factual() { Severity::High } else { Severity::Medium },
            message: format!("Supported by {} source(s), at least 2 required", supporting),
            recommendation: "Find an independent source that confirms the claim".to_string(),
        });
    }
    if conflicting > 0 {
        issues.push(ClaimIssue {
            kind: IssueKind::Conflicting,
            severity: Severity::High,
            message: format!("Contradicted by {} source(s)", conflicting),
            recommendation: "Review the conflicting sources and revise the claim or present both positions"
                .to_string(),
        });
    }
    issues
}

fn is_year(value: f64, raw: &str) -> bool {
    raw.len() == 4 && !raw.contains(['.', ',']) && (1800.0..=2100.0).contains(&value)
}

/// Quantities in a text; years are dates, not quantities
fn numbers(text: &str) -> Vec<f64> {
    NUMBER
        .find_iter(text)
        .filter_map(|m| {
            let raw = m.as_str();
            let value: f64 = raw.replace(',', "").parse().ok()?;
            (!is_year(value, raw)).then_some(value)
        })
        .collect()
}

fn within(a: f64, b: f64, tolerance: f64) -> bool {
    let scale = a.abs().max(b.abs());
    scale == 0.0 || (a - b).abs() / scale <= tolerance
}

fn negation_terms(text: &str) -> HashSet<String> {
    NEGATION
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::Arc;
    use veritas_domain::{ChunkMetadata, Source, SourceType};

    const SENTENCES: &[&str] = &[
        "Rust guarantees memory safety without garbage collection.",
        "Garbage collection is not required for memory safety in Rust.",
        "Rust memory safety guarantees grew 40% during the survey.",
        "Rust memory safety guarantees grew 12% during the survey.",
        "Bread needs flour and water and patience.",
    ];

    proptest! {
        /// Property: verified implies two supporters and no conflicts
        #[test]
        fn test_verified_invariant(
            picks in proptest::collection::vec((0usize..SENTENCES.len(), 0usize..3), 0..8),
            claim in 0usize..SENTENCES.len(),
        ) {
            let chunks: Vec<Chunk> = picks
                .iter()
                .enumerate()
                .map(|(i, (sentence, source))| {
                    let source = Arc::new(Source::new(format!("https://s{}.example", source), "S", SourceType::Blog));
                    Chunk::new(format!("c{}", i), SENTENCES[*sentence], source, ChunkMetadata::default())
                })
                .collect();
            let verified = ClaimVerifier::default().verify(SENTENCES[claim], ClaimType::Fact, &chunks);
            if verified.verified {
                prop_assert!(verified.verification.supporting_sources.len() >= 2);
                prop_assert!(verified.verification.conflicting_sources.is_empty());
            }
            prop_assert!((0.0..=100.0).contains(&verified.confidence));
        }
    }
}
