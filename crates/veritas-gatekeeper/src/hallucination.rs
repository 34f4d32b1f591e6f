//! Hallucination detection for verified claims and synthesized text

use crate::config::DetectorConfig;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};
use veritas_domain::text::is_stop_word;
use veritas_domain::{Chunk, Claim, ClaimId, Severity, Source};

static STATISTIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s?(%|percent\b|million\b|billion\b)").expect("valid regex")
});

static QUOTED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""([^"]{8,})"|“([^”]{8,})”"#).expect("valid regex"));

static ATTRIBUTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[Aa]ccording to ((?:[A-Z][\w.'-]*)(?:\s+[A-Z][\w.'-]*){0,3})").expect("valid regex")
});

static ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z][a-z]+(?:\s+[A-Z][a-z]+)+\b").expect("valid regex"));

static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("valid regex"));

/// What to do with a claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    /// Claim is grounded
    Keep,
    /// Claim has no basis in the sources
    Remove,
    /// Claim needs stronger sourcing
    AddCitation,
    /// Claim needs rewording or reconciliation
    Revise,
}

impl Recommendation {
    /// Get the recommendation name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::Keep => "keep",
            Recommendation::Remove => "remove",
            Recommendation::AddCitation => "add_citation",
            Recommendation::Revise => "revise",
        }
    }
}

/// Verdict for one claim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimAssessment {
    /// Assessed claim
    pub claim_id: ClaimId,
    /// Whether the claim is treated as a hallucination
    pub is_hallucination: bool,
    /// Whether any chunk matched the claim
    pub found_in_sources: bool,
    /// Suggested action
    pub recommendation: Recommendation,
    /// Why
    pub reason: String,
}

/// Kind of pattern-based finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    /// Number not present in any source
    FabricatedStatistic,
    /// Quoted text not present verbatim in any source
    FabricatedQuote,
    /// Attribution to someone who authored none of the sources
    UnknownAttribution,
    /// Named entity that no source mentions
    UnexplainedEntity,
}

impl PatternKind {
    fn severity(&self) -> Severity {
        match self {
            PatternKind::FabricatedStatistic | PatternKind::FabricatedQuote => Severity::Critical,
            PatternKind::UnknownAttribution => Severity::High,
            PatternKind::UnexplainedEntity => Severity::Low,
        }
    }

    /// Whether this finding counts toward the critical total
    pub fn is_critical(&self) -> bool {
        self.severity().is_blocking()
    }
}

/// A suspicious span of text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternFlag {
    /// Finding kind
    pub kind: PatternKind,
    /// Offending text
    pub text: String,
    /// How serious the finding is
    pub severity: Severity,
}

/// Aggregate risk bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// Score below 10
    Low,
    /// Score below 30
    Medium,
    /// Score below 60
    High,
    /// Score of 60 or more
    Critical,
}

impl RiskLevel {
    /// Bucket a risk score
    pub fn from_score(score: f64) -> Self {
        if score < 10.0 {
            RiskLevel::Low
        } else if score < 30.0 {
            RiskLevel::Medium
        } else if score < 60.0 {
            RiskLevel::High
        } else {
            RiskLevel::Critical
        }
    }
}

/// Detection results for one synthesized text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HallucinationReport {
    /// One entry per claim, in claim order
    pub assessments: Vec<ClaimAssessment>,
    /// Pattern-based findings on the text
    pub flags: Vec<PatternFlag>,
    /// Claims treated as hallucinations
    pub hallucinated_count: usize,
    /// Claims not found in any source plus fabricated statistics and quotes
    pub critical_count: usize,
    /// Aggregate risk (0-100)
    pub risk_score: f64,
    /// Risk bucket
    pub risk_level: RiskLevel,
}

impl HallucinationReport {
    /// Assessment for a claim
    pub fn assessment(&self, claim_id: ClaimId) -> Option<&ClaimAssessment> {
        self.assessments.iter().find(|a| a.claim_id == claim_id)
    }
}

/// Searchable text of every distinct source behind a set of chunks
struct Evidence {
    text: String,
    numbers: HashSet<String>,
    authors: Vec<String>,
}

impl Evidence {
    fn from_chunks(chunks: &[Chunk]) -> Self {
        let mut seen = HashSet::new();
        let sources: Vec<&Arc<Source>> = chunks
            .iter()
            .map(|c| &c.source)
            .filter(|s| seen.insert(s.id.as_str()))
            .collect();

        let mut parts: Vec<String> = Vec::new();
        let mut authors = Vec::new();
        for source in &sources {
            parts.push(source.title.clone());
            parts.extend(source.authors.iter().cloned());
            parts.extend(source.publication.iter().cloned());
            for value in source.metadata.values() {
                match value {
                    Value::String(s) => parts.push(s.clone()),
                    other => parts.push(other.to_string()),
                }
            }
            authors.extend(
                source
                    .authors
                    .iter()
                    .map(|a| a.trim().to_lowercase())
                    .filter(|a| !a.is_empty()),
            );
        }
        parts.extend(chunks.iter().map(|c| c.content.clone()));

        let text = parts.join("\n").to_lowercase();
        let numbers = NUMBER.find_iter(&text).map(|m| normalize_number(m.as_str())).collect();
        Self { text, numbers, authors }
    }

    fn has_number(&self, raw: &str) -> bool {
        self.numbers.contains(&normalize_number(raw))
    }

    fn mentions(&self, phrase: &str) -> bool {
        self.text.contains(&phrase.to_lowercase())
    }

    fn has_author(&self, name: &str) -> bool {
        let name = name.trim().to_lowercase();
        if name.is_empty() {
            return false;
        }
        self.authors
            .iter()
            .any(|author| author.contains(&name) || name.contains(author.as_str()))
    }
}

fn normalize_number(raw: &str) -> String {
    match raw.split_once('.') {
        Some((whole, frac)) if frac.chars().all(|c| c == '0') => whole.to_string(),
        _ => raw.to_string(),
    }
}

/// Flags claims and spans of text that the sources do not back
#[derive(Debug, Clone, Default)]
pub struct HallucinationDetector {
    config: DetectorConfig,
}

impl HallucinationDetector {
    /// Create a detector
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    /// Assess one verified claim
    ///
    /// Checks run in a fixed order and the first that fires decides.
    pub fn assess(&self, claim: &Claim) -> ClaimAssessment {
        let found_in_sources = claim.found_in_sources();
        let (is_hallucination, recommendation, reason) = if !found_in_sources {
            (true, Recommendation::Remove, "No source chunk matches the claim".to_string())
        } else if claim.confidence < self.config.min_confidence {
            (
                true,
                Recommendation::AddCitation,
                format!("Confidence {:.0} is below {:.0}", claim.confidence, self.config.min_confidence),
            )
        } else if !claim.verified {
            (
                true,
                Recommendation::Revise,
                "Claim is not confirmed by two independent sources".to_string(),
            )
        } else if claim.has_conflicts() {
            (true, Recommendation::Revise, "Sources contradict the claim".to_string())
        } else {
            (false, Recommendation::Keep, "Claim is grounded in the sources".to_string())
        };
        ClaimAssessment {
            claim_id: claim.id,
            is_hallucination,
            found_in_sources,
            recommendation,
            reason,
        }
    }

    /// Pattern-based findings on a text
    pub fn scan(&self, text: &str, chunks: &[Chunk]) -> Vec<PatternFlag> {
        let evidence = Evidence::from_chunks(chunks);
        let mut flags = Vec::new();
        let mut flagged: HashSet<(PatternKind, String)> = HashSet::new();
        let mut push = |flags: &mut Vec<PatternFlag>, kind: PatternKind, text: &str| {
            if flagged.insert((kind, text.to_string())) {
                flags.push(PatternFlag {
                    kind,
                    text: text.to_string(),
                    severity: kind.severity(),
                });
            }
        };

        for caps in STATISTIC.captures_iter(text) {
            if !evidence.has_number(&caps[1]) {
                push(&mut flags, PatternKind::FabricatedStatistic, &caps[0]);
            }
        }

        for caps in QUOTED.captures_iter(text) {
            let quote = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str()).trim();
            if !quote.is_empty() && !evidence.mentions(quote) {
                push(&mut flags, PatternKind::FabricatedQuote, quote);
            }
        }

        for caps in ATTRIBUTION.captures_iter(text) {
            let name = caps[1].trim_end_matches(['.', ',', '\'']);
            if !evidence.has_author(name) {
                push(&mut flags, PatternKind::UnknownAttribution, name);
            }
        }

        let mut entity_flags = 0;
        for m in ENTITY.find_iter(text) {
            if entity_flags >= self.config.max_entity_flags {
                break;
            }
            let phrase = strip_leading_stop_word(m.as_str());
            if !phrase.contains(' ') || evidence.mentions(phrase) {
                continue;
            }
            let before = flags.len();
            push(&mut flags, PatternKind::UnexplainedEntity, phrase);
            if flags.len() > before {
                entity_flags += 1;
            }
        }

        debug!("Pattern scan produced {} flags", flags.len());
        flags
    }

    /// Assess every claim and scan the text
    pub fn analyze(&self, text: &str, claims: &[Claim], chunks: &[Chunk]) -> HallucinationReport {
        let assessments: Vec<ClaimAssessment> = claims.iter().map(|c| self.assess(c)).collect();
        let flags = self.scan(text, chunks);

        let hallucinated_count = assessments.iter().filter(|a| a.is_hallucination).count();
        let critical_count = assessments.iter().filter(|a| !a.found_in_sources).count()
            + flags.iter().filter(|f| f.kind.is_critical()).count();
        let share = if assessments.is_empty() {
            0.0
        } else {
            hallucinated_count as f64 / assessments.len() as f64 * 100.0
        };
        let risk_score = (share + 10.0 * critical_count as f64).min(100.0);
        let risk_level = RiskLevel::from_score(risk_score);

        info!(
            "Hallucination risk {:.0} ({:?}): {}/{} claims flagged, {} critical",
            risk_score,
            risk_level,
            hallucinated_count,
            assessments.len(),
            critical_count
        );
        HallucinationReport {
            assessments,
            flags,
            hallucinated_count,
            critical_count,
            risk_score,
            risk_level,
        }
    }
}

fn strip_leading_stop_word(phrase: &str) -> &str {
    match phrase.split_once(' ') {
        Some((first, rest)) if is_stop_word(&first.to_lowercase()) => rest,
        _ => phrase,
    }
}
