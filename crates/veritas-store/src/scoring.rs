//! Chunk scoring shared by every backend
//!
//! Two rankings exist: cosine similarity against a query embedding, and a
//! lexical score counting case-insensitive whole-word occurrences of each
//! regex-escaped query term. [`Ranker`] computes both in one pass and picks
//! the vector ranking only when a query embedding was supplied and at least
//! one stored chunk carries an embedding.

use crate::topk::TopK;
use regex::Regex;
use std::collections::HashSet;
use veritas_domain::text::{is_stop_word, tokenize};
use veritas_domain::traits::SearchOptions;
use veritas_domain::Chunk;

/// Cosine similarity of two vectors
///
/// Returns 0.0 for vectors of different lengths or zero magnitude instead
/// of panicking; stored embeddings may come from different providers.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Lexical matcher over the distinct terms of a query
#[derive(Debug, Clone)]
pub struct QueryMatcher {
    patterns: Vec<Regex>,
}

impl QueryMatcher {
    /// Build a matcher from a free-text query
    ///
    /// Stop words are dropped unless the query has nothing else.
    pub fn new(query: &str) -> Self {
        let tokens = tokenize(query);
        let mut terms: Vec<String> = tokens.iter().filter(|t| !is_stop_word(t)).cloned().collect();
        if terms.is_empty() {
            terms = tokens;
        }

        let mut seen = HashSet::new();
        let patterns = terms
            .into_iter()
            .filter(|t| seen.insert(t.clone()))
            .filter_map(|t| Regex::new(&format!(r"(?i)\b{}\b", regex::escape(&t))).ok())
            .collect();

        Self { patterns }
    }

    /// Whether the query produced no terms
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Sum of term occurrence counts in `text`
    pub fn score(&self, text: &str) -> f32 {
        self.patterns
            .iter()
            .map(|p| p.find_iter(text).count())
            .sum::<usize>() as f32
    }
}

/// Single-pass ranking of a chunk stream
pub struct Ranker<'a> {
    embedding: Option<&'a [f32]>,
    matcher: Option<QueryMatcher>,
    exclude: &'a HashSet<String>,
    vector: TopK,
    lexical: TopK,
    saw_embedding: bool,
}

impl<'a> Ranker<'a> {
    /// Ranker for [`VectorStore::search`](veritas_domain::traits::VectorStore::search)
    pub fn for_search(query: &str, k: usize, options: &'a SearchOptions) -> Self {
        Self {
            embedding: options.embedding.as_deref(),
            matcher: Some(QueryMatcher::new(query)),
            exclude: &options.exclude_ids,
            vector: TopK::new(k),
            lexical: TopK::new(k),
            saw_embedding: false,
        }
    }

    /// Ranker for pure vector similarity
    pub fn for_similarity(embedding: &'a [f32], k: usize, exclude: &'a HashSet<String>) -> Self {
        Self {
            embedding: Some(embedding),
            matcher: None,
            exclude,
            vector: TopK::new(k),
            lexical: TopK::new(0),
            saw_embedding: false,
        }
    }

    /// Score one chunk
    pub fn offer(&mut self, chunk: Chunk) {
        let has_embedding = chunk.has_embedding();
        self.saw_embedding |= has_embedding;
        if self.exclude.contains(&chunk.id) {
            return;
        }

        let lexical = self
            .matcher
            .as_ref()
            .map(|m| m.score(&chunk.content))
            .unwrap_or(0.0);

        let similarity = match (self.embedding, chunk.embedding.as_deref()) {
            (Some(query), Some(stored)) if has_embedding => Some(cosine_similarity(query, stored)),
            _ => None,
        };

        match similarity {
            Some(similarity) => {
                if lexical > 0.0 {
                    self.lexical.push(lexical, chunk.clone());
                }
                self.vector.push(similarity, chunk);
            }
            None if lexical > 0.0 => self.lexical.push(lexical, chunk),
            None => {}
        }
    }

    /// Whether the vector ranking will be used
    pub fn uses_vectors(&self) -> bool {
        self.embedding.is_some() && self.saw_embedding
    }

    /// Ranked chunks, best first
    pub fn finish(self) -> Vec<Chunk> {
        if self.uses_vectors() {
            self.vector.into_sorted()
        } else {
            self.lexical.into_sorted()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use veritas_domain::{ChunkMetadata, Source, SourceType};

    fn chunk(id: &str, content: &str, embedding: Option<Vec<f32>>) -> Chunk {
        let source = Arc::new(Source::new("https://a.example", "A", SourceType::Blog));
        let chunk = Chunk::new(id, content, source, ChunkMetadata::default());
        match embedding {
            Some(e) => chunk.with_embedding(e),
            None => chunk,
        }
    }

    #[test]
    fn test_cosine_identical_and_orthogonal() {
        assert!((cosine_similarity(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_never_panics() {
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn test_matcher_counts_whole_words() {
        let matcher = QueryMatcher::new("What is Rust?");
        assert_eq!(matcher.score("Rust is fast. rust is safe. Trust it."), 2.0);
    }

    #[test]
    fn test_matcher_escapes_terms() {
        let matcher = QueryMatcher::new("c++ (v2)");
        assert!(!matcher.is_empty());
        assert_eq!(matcher.score("nothing matches here"), 0.0);
    }

    #[test]
    fn test_ranker_lexical_excludes_zero_scores() {
        let options = SearchOptions::default();
        let mut ranker = Ranker::for_search("tokio runtime", 5, &options);
        ranker.offer(chunk("a", "The tokio runtime schedules tasks", None));
        ranker.offer(chunk("b", "Unrelated text", None));
        ranker.offer(chunk("c", "tokio", None));

        let ids: Vec<String> = ranker.finish().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, ["a", "c"]);
    }

    #[test]
    fn test_ranker_prefers_vectors_when_available() {
        let options = SearchOptions::with_embedding(vec![1.0, 0.0]);
        let mut ranker = Ranker::for_search("zzz", 5, &options);
        ranker.offer(chunk("far", "text", Some(vec![0.0, 1.0])));
        ranker.offer(chunk("near", "text", Some(vec![1.0, 0.1])));
        ranker.offer(chunk("plain", "zzz", None));

        assert!(ranker.uses_vectors());
        let ids: Vec<String> = ranker.finish().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, ["near", "far"]);
    }

    #[test]
    fn test_ranker_falls_back_without_stored_embeddings() {
        let options = SearchOptions::with_embedding(vec![1.0, 0.0]);
        let mut ranker = Ranker::for_search("zzz", 5, &options);
        ranker.offer(chunk("plain", "zzz zzz", None));

        assert!(!ranker.uses_vectors());
        assert_eq!(ranker.finish().len(), 1);
    }

    #[test]
    fn test_ranker_excludes_ids() {
        let mut options = SearchOptions::default();
        options.exclude_ids.insert("a".to_string());
        let mut ranker = Ranker::for_search("alpha", 5, &options);
        ranker.offer(chunk("a", "alpha", None));
        ranker.offer(chunk("b", "alpha", None));

        let ids: Vec<String> = ranker.finish().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, ["b"]);
    }
}
