//! Claim module - atomic assertions extracted from synthesized text

use crate::severity::Severity;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a claim based on UUIDv7
///
/// UUIDv7 provides:
/// - Chronological sortability (claims sort in extraction order)
/// - 128-bit uniqueness
/// - No coordination required for distributed generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ClaimId(u128);

impl ClaimId {
    /// Generate a new UUIDv7-based ClaimId
    ///
    /// # Examples
    ///
    /// ```
    /// use veritas_domain::ClaimId;
    ///
    /// let id = ClaimId::new();
    /// assert!(id.value() > 0);
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Create a new ClaimId from a raw u128 value
    pub fn from_value(value: u128) -> Self {
        Self(value)
    }

    /// Parse a ClaimId from a UUID string
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(|u| Self(u.as_u128()))
            .map_err(|e| format!("Invalid claim id: {}", e))
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }
}

impl Default for ClaimId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClaimId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

impl From<ClaimId> for String {
    fn from(id: ClaimId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for ClaimId {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_string(&s)
    }
}

/// Kind of assertion a claim makes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimType {
    /// Plain factual statement
    Fact,
    /// Numeric or quantitative statement
    Statistic,
    /// Quotation or attributed statement
    Quote,
    /// Hedged or evaluative statement
    Opinion,
    /// Inference drawn from evidence
    Interpretation,
}

impl ClaimType {
    /// Get the claim type name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimType::Fact => "fact",
            ClaimType::Statistic => "statistic",
            ClaimType::Quote => "quote",
            ClaimType::Opinion => "opinion",
            ClaimType::Interpretation => "interpretation",
        }
    }

    /// Claims whose correctness can be checked against sources
    pub fn is_factual(&self) -> bool {
        matches!(self, ClaimType::Fact | ClaimType::Statistic)
    }

    /// Claims that must carry at least one citation
    pub fn requires_citation(&self) -> bool {
        matches!(self, ClaimType::Fact | ClaimType::Statistic | ClaimType::Quote)
    }
}

/// How the supporting evidence relates to the claim text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationMethod {
    /// A source sentence nearly matches the claim
    DirectQuote,
    /// A single source restates the claim
    Paraphrase,
    /// Several sources jointly support the claim
    Synthesis,
    /// No direct support was found
    #[default]
    Inference,
}

/// Cross-reference outcome for a claim
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verification {
    /// Distinct source ids that support the claim
    pub supporting_sources: Vec<String>,
    /// Distinct source ids that contradict the claim
    pub conflicting_sources: Vec<String>,
    /// Fraction of judging sources that support the claim (0.0-1.0)
    pub agreement: f64,
    /// Whether a human should look at this claim
    pub needs_review: bool,
    /// How the evidence relates to the claim
    pub verification_method: VerificationMethod,
    /// Number of chunks that shared enough keywords with the claim
    pub matched_chunks: usize,
}

/// Category of a verification issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueKind {
    /// Factual claim without any matching source
    Unsourced,
    /// Fewer than two supporting sources
    Unverified,
    /// At least one source contradicts the claim
    Conflicting,
}

/// A problem found while verifying a claim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimIssue {
    /// Issue category
    pub kind: IssueKind,
    /// How serious the issue is
    pub severity: Severity,
    /// Human-readable description
    pub message: String,
    /// Suggested remedy
    pub recommendation: String,
}

/// An atomic assertion extracted from synthesized text
///
/// Created by the verifier. Afterwards only `confidence` may change
/// (ensemble validation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claim {
    /// Unique identifier
    pub id: ClaimId,
    /// The sentence as written
    pub statement: String,
    /// Kind of assertion
    #[serde(rename = "type")]
    pub claim_type: ClaimType,
    /// Supporting source ids
    pub sources: Vec<String>,
    /// True iff at least two sources support and none conflict
    pub verified: bool,
    /// Confidence (0-100)
    pub confidence: f64,
    /// Cross-reference details
    pub verification: Verification,
    /// Problems found during verification
    pub issues: Vec<ClaimIssue>,
}

impl Claim {
    /// Whether verification found any conflicting source
    pub fn has_conflicts(&self) -> bool {
        !self.verification.conflicting_sources.is_empty()
    }

    /// Whether any chunk matched the claim at all
    pub fn found_in_sources(&self) -> bool {
        self.verification.matched_chunks > 0
    }

    /// Whether any issue is critical
    pub fn has_critical_issue(&self) -> bool {
        self.issues.iter().any(|i| i.severity.is_blocking())
    }
}
