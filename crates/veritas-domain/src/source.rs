//! Source module - external documents and their credibility scores

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Kind of publication a source comes from
///
/// The kind drives the authority base score and several type-specific
/// scoring branches (citations, methodology, recency).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceType {
    /// Peer-reviewed papers and preprints
    Academic,
    /// Vendor or project documentation
    OfficialDocs,
    /// Analyst and industry research reports
    IndustryResearch,
    /// Commentary from recognized experts
    ExpertCommentary,
    /// News reporting
    News,
    /// Forums, Q&A sites and social discussion
    Community,
    /// Personal or company blogs
    Blog,
}

impl SourceType {
    /// All source types, most authoritative first
    pub const ALL: [SourceType; 7] = [
        SourceType::Academic,
        SourceType::OfficialDocs,
        SourceType::IndustryResearch,
        SourceType::ExpertCommentary,
        SourceType::News,
        SourceType::Community,
        SourceType::Blog,
    ];

    /// Get the source type name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Academic => "academic",
            SourceType::OfficialDocs => "official-docs",
            SourceType::IndustryResearch => "industry-research",
            SourceType::ExpertCommentary => "expert-commentary",
            SourceType::News => "news",
            SourceType::Community => "community",
            SourceType::Blog => "blog",
        }
    }

    /// Parse a source type from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "academic" => Some(SourceType::Academic),
            "official-docs" => Some(SourceType::OfficialDocs),
            "industry-research" => Some(SourceType::IndustryResearch),
            "expert-commentary" => Some(SourceType::ExpertCommentary),
            "news" => Some(SourceType::News),
            "community" => Some(SourceType::Community),
            "blog" => Some(SourceType::Blog),
            _ => None,
        }
    }
}

impl std::str::FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid source type: {}", s))
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-signal credibility components
///
/// Caps: authority 30, recency 20, citations 20, methodology 15, bias 15.
/// The caps sum to 100, so the total never exceeds 100.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredibilityBreakdown {
    /// Publisher/author authority (0-30)
    pub authority: u32,
    /// Freshness relative to topic volatility (0-20)
    pub recency: u32,
    /// Citation impact (0-20)
    pub citations: u32,
    /// Methodological transparency (0-15)
    pub methodology: u32,
    /// Absence of bias signals (0-15)
    pub bias: u32,
}

impl CredibilityBreakdown {
    /// Maximum authority score
    pub const MAX_AUTHORITY: u32 = 30;
    /// Maximum recency score
    pub const MAX_RECENCY: u32 = 20;
    /// Maximum citations score
    pub const MAX_CITATIONS: u32 = 20;
    /// Maximum methodology score
    pub const MAX_METHODOLOGY: u32 = 15;
    /// Maximum bias score
    pub const MAX_BIAS: u32 = 15;

    /// Sum of all components
    pub fn total(&self) -> u32 {
        self.authority + self.recency + self.citations + self.methodology + self.bias
    }

    /// Whether every component is within its cap
    pub fn within_caps(&self) -> bool {
        self.authority <= Self::MAX_AUTHORITY
            && self.recency <= Self::MAX_RECENCY
            && self.citations <= Self::MAX_CITATIONS
            && self.methodology <= Self::MAX_METHODOLOGY
            && self.bias <= Self::MAX_BIAS
    }
}

/// An external document with a computed credibility score
///
/// Sources are produced by an external provider, scored once during
/// ingestion and then shared read-only by every chunk derived from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    /// Stable identifier (UUIDv5 of the URL unless supplied)
    pub id: String,

    /// Canonical URL
    pub url: String,

    /// Document title
    pub title: String,

    /// Kind of publication
    #[serde(rename = "type")]
    pub source_type: SourceType,

    /// Publication date, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,

    /// Named authors
    #[serde(default)]
    pub authors: Vec<String>,

    /// Journal, outlet or publisher
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication: Option<String>,

    /// Digital Object Identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,

    /// Number of times this work has been cited
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citation_count: Option<u64>,

    /// Total credibility score (0-100), sum of the breakdown
    #[serde(default)]
    pub credibility_score: u32,

    /// Per-signal credibility components
    #[serde(default)]
    pub credibility_breakdown: CredibilityBreakdown,

    /// Whether the source declares a conflict of interest
    #[serde(default)]
    pub has_conflict_of_interest: bool,

    /// Provider metadata; `content` holds the document text
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Source {
    /// Create a new unscored source with a URL-derived identifier
    ///
    /// # Examples
    ///
    /// ```
    /// use veritas_domain::{Source, SourceType};
    ///
    /// let a = Source::new("https://example.org/paper", "Paper", SourceType::Academic);
    /// let b = Source::new("https://example.org/paper", "Paper", SourceType::Academic);
    /// assert_eq!(a.id, b.id);
    /// ```
    pub fn new(url: impl Into<String>, title: impl Into<String>, source_type: SourceType) -> Self {
        let url = url.into();
        let id = uuid::Uuid::new_v5(&uuid::Uuid::NAMESPACE_URL, url.as_bytes()).to_string();
        Self {
            id,
            url,
            title: title.into(),
            source_type,
            date: None,
            authors: Vec::new(),
            publication: None,
            doi: None,
            citation_count: None,
            credibility_score: 0,
            credibility_breakdown: CredibilityBreakdown::default(),
            has_conflict_of_interest: false,
            metadata: Map::new(),
        }
    }

    /// Set the document text (`metadata.content`)
    pub fn with_content(self, content: impl Into<String>) -> Self {
        self.with_metadata("content", Value::String(content.into()))
    }

    /// Set an arbitrary metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Set the publication date
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Set the author list
    pub fn with_authors<I, S>(mut self, authors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.authors = authors.into_iter().map(Into::into).collect();
        self
    }

    /// Set the publication name
    pub fn with_publication(mut self, publication: impl Into<String>) -> Self {
        self.publication = Some(publication.into());
        self
    }

    /// Set the DOI
    pub fn with_doi(mut self, doi: impl Into<String>) -> Self {
        self.doi = Some(doi.into());
        self
    }

    /// Set the citation count
    pub fn with_citation_count(mut self, count: u64) -> Self {
        self.citation_count = Some(count);
        self
    }

    /// Declare a conflict of interest
    pub fn with_conflict_of_interest(mut self, conflicted: bool) -> Self {
        self.has_conflict_of_interest = conflicted;
        self
    }

    /// The document text, if the provider supplied one
    pub fn content(&self) -> Option<&str> {
        self.metadata
            .get("content")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    /// Whether a metadata entry is present and truthy
    ///
    /// `true`, non-empty strings, non-zero numbers and non-empty
    /// arrays/objects count as set.
    pub fn metadata_flag(&self, key: &str) -> bool {
        match self.metadata.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(Value::Number(n)) => n.as_f64().map_or(false, |v| v != 0.0),
            Some(Value::Array(a)) => !a.is_empty(),
            Some(Value::Object(o)) => !o.is_empty(),
            _ => false,
        }
    }

    /// Host part of the URL, lowercased, without a leading `www.`
    pub fn domain(&self) -> String {
        let without_scheme = self
            .url
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(&self.url);
        let host = without_scheme
            .split(|c| c == '/' || c == '?' || c == '#')
            .next()
            .unwrap_or_default();
        let host = host.rsplit('@').next().unwrap_or(host);
        let host = host.split(':').next().unwrap_or(host).to_lowercase();
        host.strip_prefix("www.").map(str::to_string).unwrap_or(host)
    }

    /// Age of the source in whole days relative to `today`
    ///
    /// Future dates count as age zero; `None` when the date is unknown.
    pub fn age_days(&self, today: NaiveDate) -> Option<i64> {
        self.date.map(|d| (today - d).num_days().max(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_type_round_trip() {
        for source_type in SourceType::ALL {
            assert_eq!(SourceType::parse(source_type.as_str()), Some(source_type));
        }
        assert_eq!(SourceType::parse("official_docs"), Some(SourceType::OfficialDocs));
        assert!("podcast".parse::<SourceType>().is_err());
    }

    #[test]
    fn test_url_derived_id_is_stable() {
        let a = Source::new("https://a.example/x", "A", SourceType::Blog);
        let b = Source::new("https://a.example/x", "Other title", SourceType::News);
        let c = Source::new("https://a.example/y", "A", SourceType::Blog);
        assert_eq!(a.id, b.id);
        assert_ne!(a.id, c.id);
    }

    #[test]
    fn test_content_requires_text() {
        let source = Source::new("https://a.example", "A", SourceType::Blog);
        assert!(source.content().is_none());

        let source = source.with_content("   ");
        assert!(source.content().is_none());

        let source = source.with_content("Actual text");
        assert_eq!(source.content(), Some("Actual text"));
    }

    #[test]
    fn test_metadata_flag() {
        let source = Source::new("https://a.example", "A", SourceType::Blog)
            .with_metadata("sponsored", Value::Bool(true))
            .with_metadata("opinion", Value::Bool(false))
            .with_metadata("methodology", Value::String("survey".into()))
            .with_metadata("sampleSize", serde_json::json!(0));

        assert!(source.metadata_flag("sponsored"));
        assert!(!source.metadata_flag("opinion"));
        assert!(source.metadata_flag("methodology"));
        assert!(!source.metadata_flag("sampleSize"));
        assert!(!source.metadata_flag("missing"));
    }

    #[test]
    fn test_domain_extraction() {
        let source = Source::new("https://www.Example.com:8080/path?q=1", "A", SourceType::Blog);
        assert_eq!(source.domain(), "example.com");

        let source = Source::new("news.example.org/story", "A", SourceType::News);
        assert_eq!(source.domain(), "news.example.org");
    }

    #[test]
    fn test_age_days() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let source = Source::new("https://a.example", "A", SourceType::Blog);
        assert_eq!(source.age_days(today), None);

        let source = source.with_date(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(source.age_days(today), Some(31));

        let future = Source::new("https://b.example", "B", SourceType::Blog)
            .with_date(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert_eq!(future.age_days(today), Some(0));
    }

    #[test]
    fn test_serialized_field_names() {
        let source = Source::new("https://a.example", "A", SourceType::OfficialDocs)
            .with_citation_count(3);
        let json = serde_json::to_value(&source).unwrap();
        assert_eq!(json["type"], "official-docs");
        assert_eq!(json["citationCount"], 3);
        assert!(json.get("credibilityBreakdown").is_some());
        assert!(json.get("doi").is_none());
    }

    #[test]
    fn test_breakdown_caps() {
        let breakdown = CredibilityBreakdown {
            authority: 30,
            recency: 20,
            citations: 20,
            methodology: 15,
            bias: 15,
        };
        assert!(breakdown.within_caps());
        assert_eq!(breakdown.total(), 100);

        let over = CredibilityBreakdown { authority: 31, ..breakdown };
        assert!(!over.within_caps());
    }
}
