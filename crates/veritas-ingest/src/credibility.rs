//! Source credibility scoring
//!
//! Five independent signals, each capped, summing to at most 100:
//!
//! | signal      | cap | inputs                                        |
//! |-------------|-----|-----------------------------------------------|
//! | authority   | 30  | source type, authors, DOI, publication tier   |
//! | recency     | 20  | age against a topic-dependent half-life       |
//! | citations   | 20  | citation count, stricter scale for academia   |
//! | methodology | 15  | declared methodology, sample size, data source|
//! | bias        | 15  | conflict of interest, sponsorship, blocklist  |
//!
//! Scoring is a pure function of the source and the scorer configuration.

use crate::config::CredibilityConfig;
use chrono::NaiveDate;
use regex::Regex;
use serde_json::Value;
use tracing::debug;
use veritas_domain::{CredibilityBreakdown, Source, SourceType};

/// Recency score for a source without a date
pub const UNKNOWN_DATE_RECENCY: u32 = 5;

/// Recency decay parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecencyCurve {
    /// Score the curve decays toward
    pub floor: f64,
    /// Days until the above-floor part halves
    pub half_life_days: f64,
}

/// Fast-moving topics age quickly
pub const FAST_MOVING_CURVE: RecencyCurve = RecencyCurve {
    floor: 5.0,
    half_life_days: 180.0,
};

/// Academic work ages slowly
pub const ACADEMIC_CURVE: RecencyCurve = RecencyCurve {
    floor: 10.0,
    half_life_days: 1825.0,
};

/// Everything else
pub const STANDARD_CURVE: RecencyCurve = RecencyCurve {
    floor: 7.0,
    half_life_days: 730.0,
};

/// Scores sources against a [`CredibilityConfig`]
#[derive(Debug, Clone)]
pub struct CredibilityScorer {
    config: CredibilityConfig,
    fast_moving: Vec<Regex>,
}

impl CredibilityScorer {
    /// Create a scorer, compiling the fast-moving keyword table
    pub fn new(config: CredibilityConfig) -> Self {
        let fast_moving = config
            .fast_moving_keywords
            .iter()
            .filter_map(|k| Regex::new(&format!(r"(?i)\b{}\b", regex::escape(k.trim()))).ok())
            .collect();
        Self { config, fast_moving }
    }

    /// Scorer with default tables
    pub fn default_config() -> Self {
        Self::new(CredibilityConfig::default())
    }

    /// Score a source, returning it with score and breakdown populated
    ///
    /// # Examples
    ///
    /// ```
    /// use veritas_domain::{Source, SourceType};
    /// use veritas_ingest::CredibilityScorer;
    ///
    /// let scorer = CredibilityScorer::default_config();
    /// let source = scorer.score(Source::new("https://blog.example/post", "Post", SourceType::Blog));
    /// assert_eq!(source.credibility_score, source.credibility_breakdown.total());
    /// ```
    pub fn score(&self, mut source: Source) -> Source {
        let breakdown = self.breakdown(&source);
        source.credibility_score = breakdown.total();
        source.credibility_breakdown = breakdown;
        debug!(
            "Scored source {} ({}): {} = {:?}",
            source.id, source.source_type, source.credibility_score, breakdown
        );
        source
    }

    /// Compute the five credibility components
    pub fn breakdown(&self, source: &Source) -> CredibilityBreakdown {
        CredibilityBreakdown {
            authority: self.authority(source),
            recency: self.recency(source),
            citations: citations(source),
            methodology: methodology(source),
            bias: self.bias(source),
        }
    }

    fn reference_date(&self) -> NaiveDate {
        self.config
            .reference_date
            .unwrap_or_else(|| chrono::Utc::now().date_naive())
    }

    /// Authority (0-30)
    pub fn authority(&self, source: &Source) -> u32 {
        let base = match source.source_type {
            SourceType::Academic => 30,
            SourceType::OfficialDocs => 28,
            SourceType::IndustryResearch => 25,
            SourceType::ExpertCommentary => 20,
            SourceType::News => 15,
            SourceType::Community => 10,
            SourceType::Blog => 8,
        };
        let authors = if source.authors.iter().any(|a| !a.trim().is_empty()) { 2 } else { 0 };
        let doi = if source.doi.as_deref().map_or(false, |d| !d.trim().is_empty()) { 3 } else { 0 };
        let publication = source
            .publication
            .as_deref()
            .map_or(0, |p| self.publication_bonus(p));

        (base + authors + doi + publication).min(CredibilityBreakdown::MAX_AUTHORITY)
    }

    fn publication_bonus(&self, publication: &str) -> u32 {
        let publication = publication.trim().to_lowercase();
        self.config
            .publication_tiers
            .iter()
            .filter(|tier| {
                let name = tier.name.trim().to_lowercase();
                !name.is_empty()
                    && (publication == name
                        || publication
                            .strip_prefix(&name)
                            .map_or(false, |rest| rest.starts_with(' ')))
            })
            .map(|tier| tier.bonus.min(5))
            .max()
            .unwrap_or(0)
    }

    /// Whether the source covers a fast-moving topic
    ///
    /// Keywords match as whole words in the title, `metadata.topic` and
    /// `metadata.tags`.
    pub fn is_fast_moving(&self, source: &Source) -> bool {
        let mut haystack = source.title.clone();
        if let Some(topic) = source.metadata.get("topic").and_then(Value::as_str) {
            haystack.push('\n');
            haystack.push_str(topic);
        }
        match source.metadata.get("tags") {
            Some(Value::Array(tags)) => {
                for tag in tags.iter().filter_map(Value::as_str) {
                    haystack.push('\n');
                    haystack.push_str(tag);
                }
            }
            Some(Value::String(tags)) => {
                haystack.push('\n');
                haystack.push_str(tags);
            }
            _ => {}
        }
        self.fast_moving.iter().any(|re| re.is_match(&haystack))
    }

    /// Decay curve that applies to a source
    pub fn recency_curve(&self, source: &Source) -> RecencyCurve {
        if self.is_fast_moving(source) {
            FAST_MOVING_CURVE
        } else if source.source_type == SourceType::Academic {
            ACADEMIC_CURVE
        } else {
            STANDARD_CURVE
        }
    }

    /// Recency (0-20)
    pub fn recency(&self, source: &Source) -> u32 {
        let Some(age) = source.age_days(self.reference_date()) else {
            return UNKNOWN_DATE_RECENCY;
        };
        let curve = self.recency_curve(source);
        let max = CredibilityBreakdown::MAX_RECENCY as f64;
        let score = curve.floor + (max - curve.floor) * 0.5f64.powf(age as f64 / curve.half_life_days);
        (score.round() as u32).min(CredibilityBreakdown::MAX_RECENCY)
    }

    /// Bias (0-15)
    pub fn bias(&self, source: &Source) -> u32 {
        let mut penalty = 0u32;
        if source.has_conflict_of_interest || source.metadata_flag("conflictOfInterest") {
            penalty += 8;
        }
        if source.metadata_flag("sponsored") {
            penalty += 5;
        }
        if source.metadata_flag("selfPublished") || source.metadata_flag("self_published") {
            penalty += 4;
        }
        if source.metadata_flag("opinion") {
            penalty += 3;
        }
        if source.metadata_flag("editorial") {
            penalty += 3;
        }
        if self.is_blocklisted(source) {
            penalty += 6;
        }
        CredibilityBreakdown::MAX_BIAS.saturating_sub(penalty)
    }

    /// Whether the source domain is on the blocklist
    pub fn is_blocklisted(&self, source: &Source) -> bool {
        let domain = source.domain();
        self.config.blocklist.iter().any(|blocked| {
            let blocked = blocked.trim().to_lowercase();
            let blocked = blocked.strip_prefix("www.").unwrap_or(&blocked);
            !blocked.is_empty()
                && (domain == blocked || domain.ends_with(&format!(".{}", blocked)))
        })
    }
}

impl Default for CredibilityScorer {
    fn default() -> Self {
        Self::default_config()
    }
}

/// Citations (0-20)
pub fn citations(source: &Source) -> u32 {
    let academic = source.source_type == SourceType::Academic;
    match (source.citation_count, academic) {
        (None, true) => 5,
        (None, false) => 10,
        (Some(n), true) if n > 1000 => 20,
        (Some(n), true) if n > 100 => 16,
        (Some(n), true) if n > 10 => 12,
        (Some(_), true) => 8,
        (Some(n), false) if n > 100 => 20,
        (Some(n), false) if n > 20 => 16,
        (Some(n), false) if n > 5 => 12,
        (Some(_), false) => 8,
    }
}

/// Methodology (0-15)
pub fn methodology(source: &Source) -> u32 {
    let mut score = 0;
    if source.metadata_flag("methodology") {
        score += 10;
    }
    score += match source.source_type {
        SourceType::Academic => 5,
        SourceType::OfficialDocs | SourceType::IndustryResearch => 4,
        _ => 0,
    };
    if source.metadata_flag("sampleSize") || source.metadata_flag("sample_size") {
        score += 3;
    }
    if source.metadata_flag("dataSource") || source.metadata_flag("data_source") {
        score += 2;
    }
    score.min(CredibilityBreakdown::MAX_METHODOLOGY)
}
