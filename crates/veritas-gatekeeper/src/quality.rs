//! Publication quality gate

use crate::config::QualityConfig;
use crate::error::GatekeeperError;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;
use veritas_domain::text::word_count;
use veritas_domain::{
    Claim, QualityBreakdown, QualityDimension, QualityIssue, QualityScore, Severity, Source,
};

static ABSOLUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(always|never|everyone|nobody|undeniably|unquestionably|indisputably|definitely|certainly|without (a )?doubt|proven fact|all experts agree)\b",
    )
    .expect("valid regex")
});

static LOADED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(disastrous|shocking|outrageous|ridiculous|amazing|revolutionary|miracle|catastrophic|insane|unbelievable|game-changing|terrible|stupid)\b",
    )
    .expect("valid regex")
});

static DEFINITION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(is an?|are an?|refers to|is defined as|means|known as)\b").expect("valid regex")
});

static STRUCTURE: Lazy<[Regex; 6]> = Lazy::new(|| {
    [
        Regex::new(r"(?m)^\s*#{1,6}\s+\S").expect("valid regex"),
        Regex::new(r"(?m)^\s*([-*+]|\d+[.)])\s+\S").expect("valid regex"),
        Regex::new(r"(?i)\b(for example|for instance|e\.g\.|such as)\b").expect("valid regex"),
        Regex::new(r"(?i)\b(because|therefore|as a result|this means)\b").expect("valid regex"),
        Regex::new(r"(?i)\b(is an?|refers to|is defined as)\b").expect("valid regex"),
        Regex::new(r"(?i)\b(in summary|in conclusion|to summarize|key takeaways?)\b").expect("valid regex"),
    ]
});

/// Kind of bias finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BiasKind {
    /// Absolute or universal wording
    AbsoluteLanguage,
    /// Emotionally loaded wording
    LoadedLanguage,
    /// Every source is of one type
    SingleSourceType,
}

/// A bias finding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiasFinding {
    /// Finding kind
    pub kind: BiasKind,
    /// How serious the finding is
    pub severity: Severity,
    /// Distinct offending terms, or the single source type
    pub evidence: Vec<String>,
}

/// Flags one-sided wording and one-sided sourcing
#[derive(Debug, Clone, Copy, Default)]
pub struct BiasDetector;

impl BiasDetector {
    /// Create a detector
    pub fn new() -> Self {
        Self
    }

    /// Findings for a text and the sources behind it
    pub fn detect(&self, text: &str, sources: &[Arc<Source>]) -> Vec<BiasFinding> {
        let mut findings = Vec::new();
        for (kind, pattern) in [
            (BiasKind::AbsoluteLanguage, &*ABSOLUTE),
            (BiasKind::LoadedLanguage, &*LOADED),
        ] {
            let hits: Vec<String> = pattern.find_iter(text).map(|m| m.as_str().to_lowercase()).collect();
            if hits.is_empty() {
                continue;
            }
            let severity = match hits.len() {
                1..=2 => Severity::Low,
                3..=5 => Severity::Medium,
                _ => Severity::High,
            };
            let mut evidence: Vec<String> = Vec::new();
            for hit in hits {
                if !evidence.contains(&hit) {
                    evidence.push(hit);
                }
            }
            findings.push(BiasFinding { kind, severity, evidence });
        }

        let types: HashSet<_> = sources.iter().map(|s| s.source_type).collect();
        if sources.len() > 1 && types.len() == 1 {
            findings.push(BiasFinding {
                kind: BiasKind::SingleSourceType,
                severity: Severity::Medium,
                evidence: types.iter().map(|t| t.as_str().to_string()).collect(),
            });
        }
        findings
    }
}

/// Everything the quality gate looks at
#[derive(Debug, Clone, Copy)]
pub struct QualityInput<'a> {
    /// Synthesized text
    pub text: &'a str,
    /// Verified claims extracted from the text
    pub claims: &'a [Claim],
    /// Distinct sources behind the text
    pub sources: &'a [Arc<Source>],
}

struct Threshold {
    dimension: QualityDimension,
    critical_below: Option<f64>,
    issue_below: f64,
    severity: Severity,
    recommendation: &'static str,
}

const THRESHOLDS: [Threshold; 7] = [
    Threshold {
        dimension: QualityDimension::SourceCredibility,
        critical_below: Some(50.0),
        issue_below: 70.0,
        severity: Severity::Medium,
        recommendation: "Replace low-credibility sources with academic or official material",
    },
    Threshold {
        dimension: QualityDimension::CitationCoverage,
        critical_below: Some(60.0),
        issue_below: 90.0,
        severity: Severity::Medium,
        recommendation: "Cite a source for every factual, statistical and quoted claim",
    },
    Threshold {
        dimension: QualityDimension::FactVerification,
        critical_below: Some(50.0),
        issue_below: 75.0,
        severity: Severity::High,
        recommendation: "Confirm unverified claims with a second independent source",
    },
    Threshold {
        dimension: QualityDimension::ConceptClarity,
        critical_below: None,
        issue_below: 60.0,
        severity: Severity::Medium,
        recommendation: "Expand the text and define the key concepts explicitly",
    },
    Threshold {
        dimension: QualityDimension::PerspectiveDiversity,
        critical_below: None,
        issue_below: 60.0,
        severity: Severity::Medium,
        recommendation: "Tone down absolute language and draw on more types of sources",
    },
    Threshold {
        dimension: QualityDimension::Currency,
        critical_below: None,
        issue_below: 50.0,
        severity: Severity::Low,
        recommendation: "Add recent sources",
    },
    Threshold {
        dimension: QualityDimension::EducationalValue,
        critical_below: None,
        issue_below: 40.0,
        severity: Severity::Low,
        recommendation: "Add examples, explanations and a summary",
    },
];

/// Scores a synthesized text across seven weighted dimensions
#[derive(Debug, Clone, Default)]
pub struct QualityScorer {
    config: QualityConfig,
    bias: BiasDetector,
}

impl QualityScorer {
    /// Create a scorer, validating the configuration
    pub fn new(config: QualityConfig) -> Result<Self, GatekeeperError> {
        config.validate().map_err(GatekeeperError::Config)?;
        Ok(Self {
            config,
            bias: BiasDetector::new(),
        })
    }

    /// Scorer configuration
    pub fn config(&self) -> &QualityConfig {
        &self.config
    }

    /// Score a text
    pub fn score(&self, input: &QualityInput<'_>) -> QualityScore {
        let bias = self.bias.detect(input.text, input.sources);
        let breakdown = QualityBreakdown {
            source_credibility: source_credibility(input.sources),
            citation_coverage: citation_coverage(input.claims),
            fact_verification: fact_verification(input.claims),
            concept_clarity: self.concept_clarity(input.text),
            perspective_diversity: perspective_diversity(&bias, input.sources),
            currency: self.currency(input.sources),
            educational_value: educational_value(input.text),
        };
        let weights = &self.config.weights;
        let overall = (breakdown.source_credibility * weights.source_credibility
            + breakdown.citation_coverage * weights.citation_coverage
            + breakdown.fact_verification * weights.fact_verification
            + breakdown.concept_clarity * weights.concept_clarity
            + breakdown.perspective_diversity * weights.perspective_diversity
            + breakdown.currency * weights.currency
            + breakdown.educational_value * weights.educational_value)
            .clamp(0.0, 100.0);

        let mut issues = Vec::new();
        let mut recommendations = Vec::new();
        if input.sources.is_empty() {
            issues.push(QualityIssue {
                dimension: QualityDimension::SourceCredibility,
                severity: Severity::Critical,
                message: "No sources back the text".to_string(),
            });
            recommendations.push("Retrieve sources before publishing".to_string());
        }
        for threshold in &THRESHOLDS {
            let value = breakdown.get(threshold.dimension);
            let severity = match threshold.critical_below {
                Some(critical) if value < critical => Severity::Critical,
                _ if value < threshold.issue_below => threshold.severity,
                _ => continue,
            };
            issues.push(QualityIssue {
                dimension: threshold.dimension,
                severity,
                message: format!("{} is {:.0}, below {:.0}", threshold.dimension.as_str(), value, threshold.issue_below),
            });
            recommendations.push(threshold.recommendation.to_string());
        }
        for finding in &bias {
            recommendations.push(match finding.kind {
                BiasKind::AbsoluteLanguage => format!("Qualify absolute wording: {}", finding.evidence.join(", ")),
                BiasKind::LoadedLanguage => format!("Replace loaded wording: {}", finding.evidence.join(", ")),
                BiasKind::SingleSourceType => "Add sources of a different type".to_string(),
            });
        }
        recommendations.dedup();

        let ready_to_publish = overall >= self.config.publish_threshold
            && !issues.iter().any(|i| i.severity.is_blocking());
        info!(
            "Quality {:.1} (ready: {}, {} issues)",
            overall,
            ready_to_publish,
            issues.len()
        );
        QualityScore {
            overall,
            breakdown,
            issues,
            ready_to_publish,
            recommendations,
        }
    }

    fn concept_clarity(&self, text: &str) -> f64 {
        let words = word_count(text);
        let mut score: f64 = 100.0;
        if words < self.config.min_words {
            score -= 40.0 * (self.config.min_words - words) as f64 / self.config.min_words as f64;
        }
        if concepts_explained(text) == 0 {
            score -= 40.0;
        }
        score.clamp(0.0, 100.0)
    }

    fn currency(&self, sources: &[Arc<Source>]) -> f64 {
        if sources.is_empty() {
            return 0.0;
        }
        let today = self
            .config
            .reference_date
            .unwrap_or_else(|| chrono::Utc::now().date_naive());
        let total: f64 = sources.iter().map(|s| age_score(s, today)).sum();
        total / sources.len() as f64
    }
}

fn source_credibility(sources: &[Arc<Source>]) -> f64 {
    if sources.is_empty() {
        return 0.0;
    }
    sources.iter().map(|s| f64::from(s.credibility_score)).sum::<f64>() / sources.len() as f64
}

fn citation_coverage(claims: &[Claim]) -> f64 {
    let citable: Vec<&Claim> = claims.iter().filter(|c| c.claim_type.requires_citation()).collect();
    if citable.is_empty() {
        return 100.0;
    }
    let cited = citable.iter().filter(|c| !c.sources.is_empty()).count();
    cited as f64 / citable.len() as f64 * 100.0
}

fn fact_verification(claims: &[Claim]) -> f64 {
    if claims.is_empty() {
        return 0.0;
    }
    claims.iter().filter(|c| c.verified).count() as f64 / claims.len() as f64 * 100.0
}

/// Number of sentences that define something
pub fn concepts_explained(text: &str) -> usize {
    veritas_domain::text::split_sentences(text)
        .into_iter()
        .filter(|s| DEFINITION.is_match(s))
        .count()
}

fn perspective_diversity(bias: &[BiasFinding], sources: &[Arc<Source>]) -> f64 {
    let penalty: f64 = bias
        .iter()
        .map(|f| match f.severity {
            Severity::Critical | Severity::High => 20.0,
            Severity::Medium => 10.0,
            Severity::Low => 5.0,
        })
        .sum();
    let types: HashSet<_> = sources.iter().map(|s| s.source_type).collect();
    let bonus = (5.0 * types.len().saturating_sub(1) as f64).min(20.0);
    (100.0 - penalty + bonus).clamp(0.0, 100.0)
}

fn age_score(source: &Source, today: NaiveDate) -> f64 {
    match source.age_days(today) {
        None => 50.0,
        Some(age) if age <= 365 => 100.0,
        Some(age) if age <= 730 => 75.0,
        Some(age) if age <= 1825 => 50.0,
        Some(_) => 25.0,
    }
}

fn educational_value(text: &str) -> f64 {
    let present = STRUCTURE.iter().filter(|p| p.is_match(text)).count();
    present as f64 / STRUCTURE.len() as f64 * 100.0
}
