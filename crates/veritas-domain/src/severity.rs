//! Severity levels shared by claim issues, hallucination flags and quality issues

use serde::{Deserialize, Serialize};

/// How serious a reported problem is
///
/// Ordered from most to least severe so that `a < b` means `a` is worse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Blocks publication
    Critical,
    /// Must be addressed before publication is recommended
    High,
    /// Should be addressed
    Medium,
    /// Informational
    Low,
}

impl Severity {
    /// Get the severity name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }

    /// Whether this severity blocks publication
    pub fn is_blocking(&self) -> bool {
        matches!(self, Severity::Critical)
    }
}
