//! Quality score module - the final publishability verdict

use crate::severity::Severity;
use serde::{Deserialize, Serialize};

/// One of the seven scored quality dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QualityDimension {
    /// Mean credibility of the sources used
    SourceCredibility,
    /// Share of citable claims that carry a source
    CitationCoverage,
    /// Share of claims that are verified
    FactVerification,
    /// Length and concept coverage of the text
    ConceptClarity,
    /// Bias penalties and source-type diversity
    PerspectiveDiversity,
    /// Recency of the sources used
    Currency,
    /// Explanatory structure of the text
    EducationalValue,
}

impl QualityDimension {
    /// All dimensions in breakdown order
    pub const ALL: [QualityDimension; 7] = [
        QualityDimension::SourceCredibility,
        QualityDimension::CitationCoverage,
        QualityDimension::FactVerification,
        QualityDimension::ConceptClarity,
        QualityDimension::PerspectiveDiversity,
        QualityDimension::Currency,
        QualityDimension::EducationalValue,
    ];

    /// Get the dimension name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityDimension::SourceCredibility => "sourceCredibility",
            QualityDimension::CitationCoverage => "citationCoverage",
            QualityDimension::FactVerification => "factVerification",
            QualityDimension::ConceptClarity => "conceptClarity",
            QualityDimension::PerspectiveDiversity => "perspectiveDiversity",
            QualityDimension::Currency => "currency",
            QualityDimension::EducationalValue => "educationalValue",
        }
    }
}

/// Per-dimension scores (each 0-100)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityBreakdown {
    /// Mean source credibility
    pub source_credibility: f64,
    /// Citable claims with a source
    pub citation_coverage: f64,
    /// Verified claims
    pub fact_verification: f64,
    /// Length and concept coverage
    pub concept_clarity: f64,
    /// Bias and diversity
    pub perspective_diversity: f64,
    /// Recency
    pub currency: f64,
    /// Explanatory structure
    pub educational_value: f64,
}

impl QualityBreakdown {
    /// Score for one dimension
    pub fn get(&self, dimension: QualityDimension) -> f64 {
        match dimension {
            QualityDimension::SourceCredibility => self.source_credibility,
            QualityDimension::CitationCoverage => self.citation_coverage,
            QualityDimension::FactVerification => self.fact_verification,
            QualityDimension::ConceptClarity => self.concept_clarity,
            QualityDimension::PerspectiveDiversity => self.perspective_diversity,
            QualityDimension::Currency => self.currency,
            QualityDimension::EducationalValue => self.educational_value,
        }
    }
}

/// A quality problem tied to one dimension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityIssue {
    /// Affected dimension
    pub dimension: QualityDimension,
    /// How serious the issue is
    pub severity: Severity,
    /// Human-readable description
    pub message: String,
}

/// Aggregate publishability verdict for one synthesis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityScore {
    /// Weighted overall score (0-100)
    pub overall: f64,
    /// Per-dimension scores
    pub breakdown: QualityBreakdown,
    /// Problems found
    pub issues: Vec<QualityIssue>,
    /// `overall >= threshold` and no critical issue
    pub ready_to_publish: bool,
    /// Suggested improvements
    pub recommendations: Vec<String>,
}

impl QualityScore {
    /// Whether any issue is critical
    pub fn has_critical_issue(&self) -> bool {
        self.issues.iter().any(|i| i.severity.is_blocking())
    }
}
