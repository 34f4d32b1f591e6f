//! Citation numbering, bibliography rendering and export

use chrono::{Datelike, NaiveDate};
use std::collections::HashMap;
use std::sync::Arc;
use veritas_domain::{Citation, Source, SourceType};

/// Bibliography style
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CitationStyle {
    /// American Psychological Association
    Apa,
    /// Modern Language Association
    Mla,
}

type CitationKey = (String, Option<String>);

/// Assigns `cite_N` identifiers to (source, quote) pairs in first-seen order
///
/// Rendering never fails: fields a source lacks are left out of the entry.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use std::sync::Arc;
/// use veritas_domain::{Source, SourceType};
/// use veritas_synthesizer::CitationManager;
///
/// let today = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
/// let mut manager = CitationManager::new(today);
/// let source = Arc::new(Source::new("https://doc.rust-lang.org/book", "The Book", SourceType::OfficialDocs));
///
/// assert_eq!(manager.cite(&source, None).id, "cite_1");
/// assert_eq!(manager.cite(&source, None).id, "cite_1");
/// assert_eq!(manager.cite(&source, Some("ownership")).id, "cite_2");
/// ```
#[derive(Debug, Clone)]
pub struct CitationManager {
    access_date: NaiveDate,
    citations: Vec<Citation>,
    index: HashMap<CitationKey, usize>,
}

impl CitationManager {
    /// Create an empty manager stamping citations with `access_date`
    pub fn new(access_date: NaiveDate) -> Self {
        Self {
            access_date,
            citations: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Citation for a source, optionally for a quoted passage
    ///
    /// Citing the same pair again returns the existing citation.
    pub fn cite(&mut self, source: &Arc<Source>, quoted_text: Option<&str>) -> &Citation {
        let key = (source.id.clone(), quoted_text.map(str::to_string));
        let position = match self.index.get(&key) {
            Some(&position) => position,
            None => self.push(key, Arc::clone(source), self.access_date),
        };
        &self.citations[position]
    }

    fn push(&mut self, key: CitationKey, source: Arc<Source>, access_date: NaiveDate) -> usize {
        let position = self.citations.len();
        let citation = Citation::numbered(position + 1, source, key.1.clone(), access_date);
        self.citations.push(citation);
        self.index.insert(key, position);
        position
    }

    /// Look up a citation by identifier
    pub fn get(&self, id: &str) -> Option<&Citation> {
        self.citations.iter().find(|c| c.id == id)
    }

    /// All citations in numbering order
    pub fn citations(&self) -> &[Citation] {
        &self.citations
    }

    /// Number of citations
    pub fn len(&self) -> usize {
        self.citations.len()
    }

    /// Whether nothing has been cited
    pub fn is_empty(&self) -> bool {
        self.citations.is_empty()
    }

    /// Fold another manager's citations into this one
    ///
    /// Incoming citations are renumbered after the existing ones; pairs
    /// already present keep their current id. Returns the mapping from the
    /// incoming ids to the ids they now have here.
    pub fn merge(&mut self, other: &CitationManager) -> HashMap<String, String> {
        let mut mapping = HashMap::with_capacity(other.len());
        for citation in &other.citations {
            let key = (citation.source.id.clone(), citation.quoted_text.clone());
            let position = match self.index.get(&key) {
                Some(&position) => position,
                None => self.push(key, Arc::clone(&citation.source), citation.access_date),
            };
            mapping.insert(citation.id.clone(), self.citations[position].id.clone());
        }
        mapping
    }

    /// Render one citation
    pub fn format(citation: &Citation, style: CitationStyle) -> String {
        match style {
            CitationStyle::Apa => format_apa(citation),
            CitationStyle::Mla => format_mla(citation),
        }
    }

    /// Numbered bibliography, one entry per line
    pub fn bibliography(&self, style: CitationStyle) -> String {
        self.citations
            .iter()
            .map(|c| format!("{} {}", c.inline_marker, Self::format(c, style)))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Machine-readable export of every citation
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.citations)
    }

    /// BibTeX export, keyed by citation id
    pub fn to_bibtex(&self) -> String {
        self.citations
            .iter()
            .map(bibtex_entry)
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// "Ada Lovelace" -> "Lovelace, A."
fn apa_name(name: &str) -> String {
    let parts: Vec<&str> = name.split_whitespace().collect();
    match parts.split_last() {
        None => String::new(),
        Some((last, [])) => last.to_string(),
        Some((last, given)) => {
            let initials: Vec<String> = given
                .iter()
                .filter_map(|g| g.chars().next())
                .map(|c| format!("{}.", c.to_uppercase()))
                .collect();
            format!("{}, {}", last, initials.join(" "))
        }
    }
}

/// "Ada Lovelace" -> "Lovelace, Ada"
fn inverted_name(name: &str) -> String {
    let parts: Vec<&str> = name.split_whitespace().collect();
    match parts.split_last() {
        None => String::new(),
        Some((last, [])) => last.to_string(),
        Some((last, given)) => format!("{}, {}", last, given.join(" ")),
    }
}

fn authors(source: &Source) -> Vec<&str> {
    source
        .authors
        .iter()
        .map(|a| a.trim())
        .filter(|a| !a.is_empty())
        .collect()
}

fn terminate(mut text: String) -> String {
    if !text.ends_with(['.', '?', '!']) {
        text.push('.');
    }
    text
}

fn locator(source: &Source) -> Option<String> {
    match &source.doi {
        Some(doi) if !doi.trim().is_empty() => Some(format!("https://doi.org/{}", doi.trim())),
        _ if !source.url.trim().is_empty() => Some(source.url.trim().to_string()),
        _ => None,
    }
}

fn format_apa(citation: &Citation) -> String {
    let source = &citation.source;
    let names: Vec<String> = authors(source).into_iter().map(apa_name).collect();
    let mut parts = Vec::new();

    let author_part = match names.as_slice() {
        [] => None,
        [one] => Some(one.clone()),
        [init @ .., last] => Some(format!("{}, & {}", init.join(", "), last)),
    };
    if let Some(author_part) = author_part {
        parts.push(terminate(author_part));
    }

    parts.push(match source.date {
        Some(date) => format!("({}).", date.year()),
        None => "(n.d.).".to_string(),
    });

    if !source.title.trim().is_empty() {
        parts.push(terminate(source.title.trim().to_string()));
    }
    if let Some(publication) = source.publication.as_deref().filter(|p| !p.trim().is_empty()) {
        parts.push(terminate(publication.trim().to_string()));
    }
    if let Some(locator) = locator(source) {
        parts.push(locator);
    }
    parts.join(" ")
}

fn mla_date(date: NaiveDate) -> String {
    date.format("%-d %b. %Y").to_string()
}

fn format_mla(citation: &Citation) -> String {
    let source = &citation.source;
    let names = authors(source);
    let mut parts = Vec::new();

    let author_part = match names.as_slice() {
        [] => None,
        [one] => Some(inverted_name(one)),
        [first, second] => Some(format!("{}, and {}", inverted_name(first), second)),
        [first, ..] => Some(format!("{}, et al", inverted_name(first))),
    };
    if let Some(author_part) = author_part {
        parts.push(terminate(author_part));
    }

    if !source.title.trim().is_empty() {
        parts.push(format!("\"{}.\"", source.title.trim().trim_end_matches('.')));
    }

    let mut container = Vec::new();
    if let Some(publication) = source.publication.as_deref().filter(|p| !p.trim().is_empty()) {
        container.push(publication.trim().to_string());
    }
    if let Some(date) = source.date {
        container.push(mla_date(date));
    }
    if let Some(locator) = locator(source) {
        container.push(locator);
    }
    if !container.is_empty() {
        parts.push(terminate(container.join(", ")));
    }

    parts.push(format!("Accessed {}.", mla_date(citation.access_date)));
    parts.join(" ")
}

fn bibtex_type(source_type: SourceType) -> &'static str {
    match source_type {
        SourceType::Academic => "article",
        SourceType::OfficialDocs => "manual",
        SourceType::IndustryResearch => "techreport",
        _ => "misc",
    }
}

fn bibtex_value(value: &str) -> String {
    value.replace(['{', '}'], "")
}

fn bibtex_entry(citation: &Citation) -> String {
    let source = &citation.source;
    let mut fields: Vec<(&str, String)> = vec![("title", bibtex_value(&source.title))];

    let names = authors(source);
    if !names.is_empty() {
        fields.push(("author", bibtex_value(&names.join(" and "))));
    }
    if let Some(publication) = source.publication.as_deref().filter(|p| !p.trim().is_empty()) {
        let key = match source.source_type {
            SourceType::Academic => "journal",
            SourceType::IndustryResearch => "institution",
            _ => "howpublished",
        };
        fields.push((key, bibtex_value(publication)));
    }
    if let Some(date) = source.date {
        fields.push(("year", date.year().to_string()));
    }
    if let Some(doi) = source.doi.as_deref().filter(|d| !d.trim().is_empty()) {
        fields.push(("doi", bibtex_value(doi.trim())));
    }
    if !source.url.trim().is_empty() {
        fields.push(("url", bibtex_value(source.url.trim())));
    }
    fields.push(("note", format!("Accessed {}", citation.access_date)));

    let body = fields
        .iter()
        .map(|(key, value)| format!("  {} = {{{}}}", key, value))
        .collect::<Vec<_>>()
        .join(",\n");
    format!("@{}{{{},\n{}\n}}", bibtex_type(source.source_type), citation.id, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }

    fn paper() -> Arc<Source> {
        Arc::new(
            Source::new("https://example.org/paper", "Attention Is All You Need", SourceType::Academic)
                .with_authors(["Ashish Vaswani", "Noam Shazeer", "Niki Parmar"])
                .with_publication("NeurIPS")
                .with_doi("10.5555/3295222")
                .with_date(NaiveDate::from_ymd_opt(2017, 6, 12).unwrap()),
        )
    }

    fn bare() -> Arc<Source> {
        Arc::new(Source::new("https://forum.example/t/1", "Thread", SourceType::Community))
    }

    #[test]
    fn test_first_seen_numbering() {
        let mut manager = CitationManager::new(today());
        assert_eq!(manager.cite(&bare(), None).id, "cite_1");
        assert_eq!(manager.cite(&paper(), None).id, "cite_2");
        assert_eq!(manager.cite(&bare(), None).id, "cite_1");
        assert_eq!(manager.cite(&paper(), Some("attention")).inline_marker, "[3]");
        assert_eq!(manager.len(), 3);
        assert_eq!(manager.get("cite_3").unwrap().quoted_text.as_deref(), Some("attention"));
    }

    #[test]
    fn test_apa_full_entry() {
        let mut manager = CitationManager::new(today());
        let citation = manager.cite(&paper(), None).clone();
        assert_eq!(
            CitationManager::format(&citation, CitationStyle::Apa),
            "Vaswani, A., Shazeer, N., & Parmar, N. (2017). Attention Is All You Need. NeurIPS. https://doi.org/10.5555/3295222"
        );
    }

    #[test]
    fn test_missing_fields_are_omitted() {
        let mut manager = CitationManager::new(today());
        let citation = manager.cite(&bare(), None).clone();
        assert_eq!(
            CitationManager::format(&citation, CitationStyle::Apa),
            "(n.d.). Thread. https://forum.example/t/1"
        );
        assert_eq!(
            CitationManager::format(&citation, CitationStyle::Mla),
            "\"Thread.\" https://forum.example/t/1. Accessed 1 Mar. 2025."
        );
    }

    #[test]
    fn test_mla_et_al() {
        let mut manager = CitationManager::new(today());
        let citation = manager.cite(&paper(), None).clone();
        let rendered = CitationManager::format(&citation, CitationStyle::Mla);
        assert!(rendered.starts_with("Vaswani, Ashish, et al. \"Attention Is All You Need.\""));
        assert!(rendered.contains("NeurIPS, 12 Jun. 2017"));
    }

    #[test]
    fn test_bibliography_lines() {
        let mut manager = CitationManager::new(today());
        manager.cite(&paper(), None);
        manager.cite(&bare(), None);
        let bibliography = manager.bibliography(CitationStyle::Apa);
        let lines: Vec<&str> = bibliography.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("[1] Vaswani"));
        assert!(lines[1].starts_with("[2] (n.d.)"));
    }

    #[test]
    fn test_merge_renumbers_and_reuses() {
        let mut left = CitationManager::new(today());
        left.cite(&paper(), None);

        let mut right = CitationManager::new(today());
        right.cite(&bare(), None);
        right.cite(&paper(), None);

        let mapping = left.merge(&right);
        assert_eq!(mapping["cite_1"], "cite_2");
        assert_eq!(mapping["cite_2"], "cite_1");
        assert_eq!(left.len(), 2);
        assert_eq!(left.get("cite_2").unwrap().source.id, bare().id);
    }

    #[test]
    fn test_json_export() {
        let mut manager = CitationManager::new(today());
        manager.cite(&paper(), Some("attention"));
        let json: serde_json::Value = serde_json::from_str(&manager.to_json().unwrap()).unwrap();
        assert_eq!(json[0]["id"], "cite_1");
        assert_eq!(json[0]["inlineMarker"], "[1]");
        assert_eq!(json[0]["quotedText"], "attention");
    }

    #[test]
    fn test_bibtex_export() {
        let mut manager = CitationManager::new(today());
        manager.cite(&paper(), None);
        manager.cite(&Arc::new(Source::new("https://b.example", "Odd {title}", SourceType::Blog)), None);
        let bibtex = manager.to_bibtex();
        assert!(bibtex.starts_with("@article{cite_1,\n  title = {Attention Is All You Need},"));
        assert!(bibtex.contains("  author = {Ashish Vaswani and Noam Shazeer and Niki Parmar},"));
        assert!(bibtex.contains("  journal = {NeurIPS},"));
        assert!(bibtex.contains("@misc{cite_2,\n  title = {Odd title},"));
    }
}
