//! Text utilities shared by the chunker, retrieval and verification layers
//!
//! Everything here is deterministic and allocation-light. Tokens are
//! lowercased runs of alphanumeric characters; sentences end at `.`, `!`
//! or `?` followed by whitespace or end of text.

use std::collections::HashSet;

/// English stop words, sorted for binary search
const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "few",
    "for", "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers",
    "herself", "him", "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its",
    "itself", "just", "me", "more", "most", "my", "myself", "no", "nor", "not", "now", "of",
    "off", "on", "once", "only", "or", "other", "our", "ours", "ourselves", "out", "over", "own",
    "same", "she", "should", "so", "some", "such", "than", "that", "the", "their", "theirs",
    "them", "themselves", "then", "there", "these", "they", "this", "those", "through", "to",
    "too", "under", "until", "up", "very", "was", "we", "were", "what", "when", "where", "which",
    "while", "who", "whom", "why", "will", "with", "would", "you", "your", "yours", "yourself",
    "yourselves",
];

/// Whether a lowercased word is a stop word
pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.binary_search(&word).is_ok()
}

/// Lowercased alphanumeric tokens in order of appearance
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Tokens that are not stop words and have at least `min_len` characters
pub fn content_words(text: &str, min_len: usize) -> Vec<String> {
    tokenize(text)
        .into_iter()
        .filter(|t| t.chars().count() >= min_len && !is_stop_word(t))
        .collect()
}

/// Distinct content words
pub fn keyword_set(text: &str, min_len: usize) -> HashSet<String> {
    content_words(text, min_len).into_iter().collect()
}

/// Jaccard similarity of two sets; zero when both are empty
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// Number of whitespace-separated words
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Token estimate blending word and character counts
///
/// `ceil((words * 1.35 + chars / 4) / 2)`
pub fn estimate_tokens(text: &str) -> usize {
    let words = word_count(text) as f64;
    let chars = text.chars().count() as f64;
    ((words * 1.35 + chars / 4.0) / 2.0).ceil() as usize
}

/// Byte spans of whitespace-separated words
pub fn word_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = None;
    for (i, c) in text.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(s)) => {
                spans.push((s, i));
                start = None;
            }
            (false, None) => start = Some(i),
            _ => {}
        }
    }
    if let Some(s) = start {
        spans.push((s, text.len()));
    }
    spans
}

/// Byte spans of sentences, trimmed of surrounding whitespace
pub fn sentence_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?') {
            let at_boundary = chars.peek().map_or(true, |(_, next)| next.is_whitespace());
            if at_boundary {
                let end = i + c.len_utf8();
                push_trimmed(text, start, end, &mut spans);
                start = end;
            }
        }
    }
    push_trimmed(text, start, text.len(), &mut spans);
    spans
}

fn push_trimmed(text: &str, start: usize, end: usize, spans: &mut Vec<(usize, usize)>) {
    let slice = &text[start..end];
    let leading = slice.len() - slice.trim_start().len();
    let trimmed = slice.trim();
    if !trimmed.is_empty() {
        let s = start + leading;
        spans.push((s, s + trimmed.len()));
    }
}

/// Sentences of a text, trimmed
pub fn split_sentences(text: &str) -> Vec<&str> {
    sentence_spans(text)
        .into_iter()
        .map(|(s, e)| &text[s..e])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_words_sorted() {
        let mut sorted = STOP_WORDS.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, STOP_WORDS);
        assert!(is_stop_word("the"));
        assert!(!is_stop_word("rust"));
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("AI adoption grew 40% in 2024."), ["ai", "adoption", "grew", "40", "in", "2024"]);
    }

    #[test]
    fn test_content_words_filter() {
        let words = content_words("The quick brown fox is over the lazy dog", 4);
        assert_eq!(words, ["quick", "brown", "lazy"]);
    }

    #[test]
    fn test_jaccard() {
        let a = keyword_set("alpha beta gamma", 1);
        let b = keyword_set("beta gamma delta", 1);
        assert!((jaccard(&a, &b) - 0.5).abs() < 1e-9);
        assert_eq!(jaccard(&HashSet::new(), &HashSet::new()), 0.0);
    }

    #[test]
    fn test_estimate_tokens() {
        // 4 words * 1.35 = 5.4, 19 chars / 4 = 4.75, (10.15 / 2).ceil() = 6
        assert_eq!(estimate_tokens("one two three four!"), 6);
        assert_eq!(estimate_tokens(""), 0);
    }

    #[test]
    fn test_sentence_split_keeps_decimals() {
        let text = "Growth was 3.5 percent. Analysts agree!  Is it final?";
        assert_eq!(
            split_sentences(text),
            ["Growth was 3.5 percent.", "Analysts agree!", "Is it final?"]
        );
    }

    #[test]
    fn test_spans_index_original_text() {
        let text = "  First one. Second  ";
        for (s, e) in sentence_spans(text) {
            assert_eq!(&text[s..e], text[s..e].trim());
        }
        assert_eq!(word_spans("ab  cd"), [(0, 2), (4, 6)]);
    }
}
