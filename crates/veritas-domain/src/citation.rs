//! Citation module - stable reference handles to sources

use crate::source::Source;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A stable reference to a source used in output text
///
/// Identifiers are `cite_N`, numbered monotonically within a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Citation {
    /// Identifier (`cite_N`)
    pub id: String,
    /// Marker inserted into text (`[N]`)
    pub inline_marker: String,
    /// Cited source
    pub source: Arc<Source>,
    /// Quoted passage, when citing a specific passage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quoted_text: Option<String>,
    /// Date the source was accessed
    pub access_date: NaiveDate,
}

impl Citation {
    /// Create citation number `n` (1-based)
    pub fn numbered(
        n: usize,
        source: Arc<Source>,
        quoted_text: Option<String>,
        access_date: NaiveDate,
    ) -> Self {
        Self {
            id: format!("cite_{}", n),
            inline_marker: format!("[{}]", n),
            source,
            quoted_text,
            access_date,
        }
    }

    /// The citation number parsed back from the identifier
    pub fn number(&self) -> Option<usize> {
        self.id.strip_prefix("cite_").and_then(|n| n.parse().ok())
    }
}
