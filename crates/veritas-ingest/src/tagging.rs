//! Chunk tagging: self-containment, entities, topics and keywords

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use veritas_domain::text::{content_words, is_stop_word, sentence_spans, tokenize};

static MULTI_WORD_PHRASE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z][a-z0-9]+(?:[ \t]+[A-Z][a-z0-9]+)+\b").expect("valid regex"));

static ACRONYM: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[A-Z]{2,}[0-9]*\b").expect("valid regex"));

static BACK_REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(as (mentioned|noted|discussed|described|shown|stated|explained) (above|earlier|before|previously)|see above|the above|aforementioned|the previous (section|example|chapter|step)|as we saw)\b",
    )
    .expect("valid regex")
});

/// Words that cannot open a self-contained chunk
const LEADING_PRONOUNS: &[&str] = &[
    "he", "her", "his", "it", "its", "she", "that", "their", "them", "these", "they", "this",
    "those",
];

/// Tags derived from chunk text
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChunkTags {
    /// False when the text opens with an unresolved back-reference
    pub is_self_contained: bool,
    /// Capitalized multi-word phrases and acronyms, in order of appearance
    pub entities: Vec<String>,
    /// Frequent long content words
    pub topics: Vec<String>,
    /// Frequent content words
    pub keywords: Vec<String>,
}

/// Derives [`ChunkTags`] from chunk text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkTagger {
    /// Maximum entities kept
    pub max_entities: usize,
    /// Maximum topics kept
    pub max_topics: usize,
    /// Maximum keywords kept
    pub max_keywords: usize,
    /// Minimum characters in a topic word
    pub topic_min_len: usize,
    /// Minimum occurrences of a topic word
    pub topic_min_count: usize,
}

impl Default for ChunkTagger {
    fn default() -> Self {
        Self {
            max_entities: 20,
            max_topics: 5,
            max_keywords: 10,
            topic_min_len: 5,
            topic_min_count: 2,
        }
    }
}

impl ChunkTagger {
    /// Tag a piece of text
    pub fn tag(&self, text: &str) -> ChunkTags {
        ChunkTags {
            is_self_contained: is_self_contained(text),
            entities: self.entities(text),
            topics: rank_by_frequency(
                content_words(text, self.topic_min_len),
                self.topic_min_count,
                self.max_topics,
            ),
            keywords: rank_by_frequency(content_words(text, 3), 1, self.max_keywords),
        }
    }

    /// Capitalized multi-word phrases and acronyms
    ///
    /// A leading stop word ("The", "In") is dropped from a phrase; a phrase
    /// left with a single word is discarded.
    pub fn entities(&self, text: &str) -> Vec<String> {
        let mut found: Vec<(usize, String)> = Vec::new();

        for m in MULTI_WORD_PHRASE.find_iter(text) {
            let words: Vec<&str> = m.as_str().split_whitespace().collect();
            let skip = usize::from(is_stop_word(&words[0].to_lowercase()));
            if words.len() - skip >= 2 {
                found.push((m.start(), words[skip..].join(" ")));
            }
        }
        for m in ACRONYM.find_iter(text) {
            found.push((m.start(), m.as_str().to_string()));
        }

        found.sort_by_key(|(pos, _)| *pos);
        let mut entities: Vec<String> = Vec::new();
        for (_, entity) in found {
            if entities.len() >= self.max_entities {
                break;
            }
            if !entities.contains(&entity) {
                entities.push(entity);
            }
        }
        entities
    }
}

/// Whether text can be read without the preceding chunk
pub fn is_self_contained(text: &str) -> bool {
    let opens_with_pronoun = tokenize(text)
        .first()
        .map_or(false, |w| LEADING_PRONOUNS.binary_search(&w.as_str()).is_ok());
    if opens_with_pronoun {
        return false;
    }
    let first_sentence = sentence_spans(text)
        .first()
        .map_or("", |&(s, e)| &text[s..e]);
    !BACK_REFERENCE.is_match(first_sentence)
}

/// Words ordered by count, ties by first occurrence
fn rank_by_frequency(words: Vec<String>, min_count: usize, limit: usize) -> Vec<String> {
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (i, w) in words.iter().enumerate() {
        counts.entry(w.as_str()).or_insert((0, i)).0 += 1;
    }
    let mut ranked: Vec<(&str, usize, usize)> = counts
        .into_iter()
        .filter(|(_, (count, _))| *count >= min_count)
        .map(|(w, (count, first))| (w, count, first))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    ranked.into_iter().take(limit).map(|(w, _, _)| w.to_string()).collect()
}
