//! Concept-bounded semantic chunking
//!
//! Text is parsed into logical units, units are grouped into concepts, and
//! concepts are greedily packed into token-budgeted chunks with a
//! word-aligned overlap between neighbours.
//!
//! ```text
//! text → units (heading | paragraph | list | code) → concepts → pieces → chunks
//! ```
//!
//! All offsets are byte offsets into the source text. Every chunk's
//! content equals `text[start_char..end_char]`.

use crate::config::ChunkerConfig;
use crate::tagging::ChunkTagger;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use veritas_domain::text::{estimate_tokens, sentence_spans, word_spans};
use veritas_domain::{Chunk, ChunkMetadata, ConceptType, Source};

static LIST_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([-*+•]|\d+[.)])\s+\S").expect("valid regex"));

static TRANSITION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(however|for example|for instance|in contrast|on the other hand|additionally|moreover|furthermore|similarly|conversely|nevertheless|in summary|in conclusion|to summarize|finally)\b",
    )
    .expect("valid regex")
});

/// Longest line still considered a typographic heading
const MAX_HEADING_CHARS: usize = 80;

/// Structural kind of a logical unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    /// ATX, setext or typographic heading
    Heading,
    /// Run of prose lines
    Paragraph,
    /// Consecutive bullet or numbered lines
    List,
    /// Fenced code block, fences included
    Code,
}

/// A logical unit of the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unit {
    /// Structural kind
    pub kind: UnitKind,
    /// Trimmed start offset
    pub start: usize,
    /// Trimmed end offset
    pub end: usize,
}

/// A run of units about one idea
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Concept {
    /// Rhetorical role
    pub concept_type: ConceptType,
    /// Start offset
    pub start: usize,
    /// End offset
    pub end: usize,
}

/// Boundaries of one produced chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSpan {
    /// Start offset
    pub start: usize,
    /// End offset
    pub end: usize,
    /// Dominant concept type
    pub concept_type: ConceptType,
    /// Estimated tokens
    pub tokens: usize,
}

/// One keyword rule of a [`ConceptRules`] table
#[derive(Debug, Clone)]
pub struct ConceptRule {
    /// Type assigned when this rule wins
    pub concept_type: ConceptType,
    /// Cue pattern; every match counts as a hit
    pub pattern: Regex,
}

/// Swappable keyword table for concept typing
///
/// The rule with the most hits wins; ties go to the earlier rule. No hits
/// means [`ConceptType::General`].
#[derive(Debug, Clone)]
pub struct ConceptRules {
    rules: Vec<ConceptRule>,
}

impl ConceptRules {
    /// Build a table from rules in priority order
    pub fn new(rules: Vec<ConceptRule>) -> Self {
        Self { rules }
    }

    /// Build a table from `(type, pattern)` pairs
    pub fn from_patterns(patterns: &[(ConceptType, &str)]) -> Result<Self, regex::Error> {
        let rules = patterns
            .iter()
            .map(|(concept_type, pattern)| {
                Ok(ConceptRule {
                    concept_type: *concept_type,
                    pattern: Regex::new(pattern)?,
                })
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self::new(rules))
    }

    /// Classify a piece of text
    pub fn classify(&self, text: &str) -> ConceptType {
        let mut best = (0usize, ConceptType::General);
        for rule in &self.rules {
            let hits = rule.pattern.find_iter(text).count();
            if hits > best.0 {
                best = (hits, rule.concept_type);
            }
        }
        best.1
    }
}

static DEFAULT_CONCEPT_RULES: Lazy<ConceptRules> = Lazy::new(|| {
    ConceptRules::from_patterns(&[
        (
            ConceptType::Definition,
            r"(?i)\b(is defined as|refers to|is an?|are an?|means|definition|known as|stands for)\b",
        ),
        (
            ConceptType::Example,
            r"(?i)(\bfor example\b|\bfor instance\b|\be\.g\.|\bsuch as\b|\bexamples?\b|\bconsider\b|\bimagine\b)",
        ),
        (
            ConceptType::Procedure,
            r"(?i)\b(steps?|first|then|next|finally|install|configure|run|how to|make sure)\b",
        ),
        (
            ConceptType::Comparison,
            r"(?i)(\bversus\b|\bvs\.?|\bcompared (to|with)\b|\bin contrast\b|\bwhereas\b|\bunlike\b|\b(better|worse|faster|slower) than\b|\bdiffers?\b)",
        ),
        (
            ConceptType::Explanation,
            r"(?i)\b(because|therefore|thus|as a result|due to|causes?|why|which means|leads to|so that)\b",
        ),
    ])
    .expect("valid concept rules")
});

impl Default for ConceptRules {
    fn default() -> Self {
        DEFAULT_CONCEPT_RULES.clone()
    }
}

#[derive(Debug, Clone, Copy)]
struct Piece {
    start: usize,
    end: usize,
    concept_type: ConceptType,
}

#[derive(Debug)]
struct Draft {
    start: usize,
    end: usize,
    // Concept types and the tokens each contributed, overlap excluded
    parts: Vec<(ConceptType, usize)>,
}

impl Draft {
    fn new(piece: &Piece, tokens: usize) -> Self {
        Self {
            start: piece.start,
            end: piece.end,
            parts: vec![(piece.concept_type, tokens)],
        }
    }

    fn dominant_type(&self) -> ConceptType {
        let mut totals: Vec<(ConceptType, usize)> = Vec::new();
        for &(kind, tokens) in &self.parts {
            match totals.iter_mut().find(|(k, _)| *k == kind) {
                Some(entry) => entry.1 += tokens,
                None => totals.push((kind, tokens)),
            }
        }
        let mut best = (ConceptType::General, 0usize);
        for (kind, tokens) in totals {
            if tokens > best.1 {
                best = (kind, tokens);
            }
        }
        best.0
    }
}

/// Splits source text into concept-bounded chunks
#[derive(Debug, Clone)]
pub struct SemanticChunker {
    config: ChunkerConfig,
    rules: ConceptRules,
    tagger: ChunkTagger,
}

impl SemanticChunker {
    /// Create a chunker with the default concept rules
    pub fn new(config: ChunkerConfig) -> Self {
        Self {
            config,
            rules: ConceptRules::default(),
            tagger: ChunkTagger::default(),
        }
    }

    /// Replace the concept rule table
    pub fn with_rules(mut self, rules: ConceptRules) -> Self {
        self.rules = rules;
        self
    }

    /// Replace the tagger
    pub fn with_tagger(mut self, tagger: ChunkTagger) -> Self {
        self.tagger = tagger;
        self
    }

    /// Chunker configuration
    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Chunk a source's `metadata.content`; nothing when it has none
    pub fn chunk_source(&self, source: &Arc<Source>) -> Vec<Chunk> {
        match source.content() {
            Some(text) => self.chunk(text, source),
            None => Vec::new(),
        }
    }

    /// Chunk text owned by `source`
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use veritas_domain::{Source, SourceType};
    /// use veritas_ingest::{ChunkerConfig, SemanticChunker};
    ///
    /// let source = Arc::new(Source::new("https://a.example", "A", SourceType::Blog));
    /// let chunker = SemanticChunker::new(ChunkerConfig::default());
    /// let chunks = chunker.chunk("# Title\n\nOne short paragraph.", &source);
    /// assert_eq!(chunks.len(), 1);
    /// assert_eq!(chunks[0].metadata.total_chunks, 1);
    /// ```
    pub fn chunk(&self, text: &str, source: &Arc<Source>) -> Vec<Chunk> {
        let spans = self.spans(text);
        let total = spans.len();
        spans
            .into_iter()
            .enumerate()
            .map(|(position, span)| {
                let content = &text[span.start..span.end];
                let tags = self.tagger.tag(content);
                Chunk::new(
                    Chunk::make_id(&source.id, position),
                    content,
                    Arc::clone(source),
                    ChunkMetadata {
                        concept_type: span.concept_type,
                        position,
                        total_chunks: total,
                        tokens: span.tokens,
                        start_char: span.start,
                        end_char: span.end,
                        is_self_contained: tags.is_self_contained,
                        entities: tags.entities,
                        topics: tags.topics,
                        keywords: tags.keywords,
                    },
                )
            })
            .collect()
    }

    /// Chunk boundaries for a text
    pub fn spans(&self, text: &str) -> Vec<ChunkSpan> {
        let concepts = self.concepts(text);
        let pieces = self.pieces(text, &concepts);
        self.pack(text, &pieces)
    }

    /// Group units into typed concepts
    pub fn concepts(&self, text: &str) -> Vec<Concept> {
        let mut concepts = Vec::new();
        let mut current: Option<(usize, usize)> = None;

        let close = |current: &mut Option<(usize, usize)>, concepts: &mut Vec<Concept>| {
            if let Some((start, end)) = current.take() {
                concepts.push(Concept {
                    concept_type: self.rules.classify(&text[start..end]),
                    start,
                    end,
                });
            }
        };

        for unit in parse_units(text) {
            match unit.kind {
                UnitKind::Code => {
                    close(&mut current, &mut concepts);
                    concepts.push(Concept {
                        concept_type: ConceptType::Example,
                        start: unit.start,
                        end: unit.end,
                    });
                }
                UnitKind::Heading => {
                    close(&mut current, &mut concepts);
                    current = Some((unit.start, unit.end));
                }
                UnitKind::Paragraph | UnitKind::List => {
                    let starts_concept = TRANSITION.is_match(&text[unit.start..unit.end]);
                    if starts_concept || current.is_none() {
                        close(&mut current, &mut concepts);
                        current = Some((unit.start, unit.end));
                    } else if let Some((_, end)) = current.as_mut() {
                        *end = unit.end;
                    }
                }
            }
        }
        close(&mut current, &mut concepts);
        concepts
    }

    // Concepts within budget stay whole; larger ones split by sentence,
    // and sentences that are still too large split by word.
    fn pieces(&self, text: &str, concepts: &[Concept]) -> Vec<Piece> {
        let max = self.config.max_chunk_size;
        let mut pieces = Vec::new();
        for concept in concepts {
            let piece = |start, end| Piece {
                start,
                end,
                concept_type: concept.concept_type,
            };
            if estimate_tokens(&text[concept.start..concept.end]) <= max {
                pieces.push(piece(concept.start, concept.end));
                continue;
            }
            for (s, e) in sentence_spans(&text[concept.start..concept.end]) {
                let (s, e) = (concept.start + s, concept.start + e);
                if estimate_tokens(&text[s..e]) <= max {
                    pieces.push(piece(s, e));
                } else {
                    for (ws, we) in word_windows(text, s, e, max) {
                        pieces.push(piece(ws, we));
                    }
                }
            }
        }
        pieces
    }

    fn pack(&self, text: &str, pieces: &[Piece]) -> Vec<ChunkSpan> {
        let ChunkerConfig {
            max_chunk_size: max,
            min_chunk_size: min,
            overlap_size,
        } = self.config;

        let mut spans = Vec::new();
        let mut current: Option<Draft> = None;

        for piece in pieces {
            let piece_tokens = estimate_tokens(&text[piece.start..piece.end]);
            if current.is_none() {
                current = Some(Draft::new(piece, piece_tokens));
                continue;
            }
            let Some(draft) = current.as_mut() else {
                continue;
            };

            let held = estimate_tokens(&text[draft.start..draft.end]);
            let combined = estimate_tokens(&text[draft.start..piece.end]);
            if combined <= max || held < min {
                draft.end = piece.end;
                draft.parts.push((piece.concept_type, piece_tokens));
                continue;
            }

            let closed = std::mem::replace(draft, Draft::new(piece, piece_tokens));
            if let Some(overlap_start) = overlap_start(text, closed.start, closed.end, overlap_size) {
                if estimate_tokens(&text[overlap_start..piece.end]) <= max {
                    draft.start = overlap_start;
                }
            }
            spans.push(finish(text, &closed));
        }

        if let Some(draft) = current {
            spans.push(finish(text, &draft));
        }
        spans
    }
}

impl Default for SemanticChunker {
    fn default() -> Self {
        Self::new(ChunkerConfig::default())
    }
}

fn finish(text: &str, draft: &Draft) -> ChunkSpan {
    ChunkSpan {
        start: draft.start,
        end: draft.end,
        concept_type: draft.dominant_type(),
        tokens: estimate_tokens(&text[draft.start..draft.end]),
    }
}

/// Start of the longest word-aligned tail of `text[start..end]` within
/// `budget` tokens, never the chunk start itself
fn overlap_start(text: &str, start: usize, end: usize, budget: usize) -> Option<usize> {
    if budget == 0 {
        return None;
    }
    let mut best = None;
    for (ws, _) in word_spans(&text[start..end]).into_iter().rev() {
        let ws = start + ws;
        if ws == start || estimate_tokens(&text[ws..end]) > budget {
            break;
        }
        best = Some(ws);
    }
    best
}

/// Split `text[start..end]` into word-aligned windows of at most `max`
/// tokens; a single word over budget becomes its own window
fn word_windows(text: &str, start: usize, end: usize, max: usize) -> Vec<(usize, usize)> {
    let mut windows = Vec::new();
    let mut window: Option<(usize, usize)> = None;
    for (ws, we) in word_spans(&text[start..end]) {
        let (ws, we) = (start + ws, start + we);
        window = match window {
            None => Some((ws, we)),
            Some((s, e)) if estimate_tokens(&text[s..we]) > max => {
                windows.push((s, e));
                Some((ws, we))
            }
            Some((s, _)) => Some((s, we)),
        };
    }
    windows.extend(window);
    windows
}

/// Parse text into logical units
pub fn parse_units(text: &str) -> Vec<Unit> {
    let lines = line_spans(text);
    let line = |i: usize| &text[lines[i].0..lines[i].1];
    let blank = |i: usize| line(i).trim().is_empty();

    let mut units = Vec::new();
    let mut push = |kind, first: usize, last: usize| {
        if let Some((start, end)) = trim_span(text, lines[first].0, lines[last].1) {
            units.push(Unit { kind, start, end });
        }
    };

    let mut i = 0;
    while i < lines.len() {
        let trimmed = line(i).trim();
        if trimmed.is_empty() || is_rule(trimmed) {
            i += 1;
            continue;
        }

        if let Some(marker) = fence_marker(trimmed) {
            let mut j = i + 1;
            while j < lines.len() && !line(j).trim_start().starts_with(marker) {
                j += 1;
            }
            let last = j.min(lines.len() - 1);
            push(UnitKind::Code, i, last);
            i = last + 1;
            continue;
        }

        if is_atx_heading(trimmed) {
            push(UnitKind::Heading, i, i);
            i += 1;
            continue;
        }

        if LIST_ITEM.is_match(line(i)) {
            let mut j = i + 1;
            while j < lines.len()
                && !blank(j)
                && (LIST_ITEM.is_match(line(j)) || line(j).starts_with(char::is_whitespace))
            {
                j += 1;
            }
            push(UnitKind::List, i, j - 1);
            i = j;
            continue;
        }

        if i + 1 < lines.len() && is_rule(line(i + 1).trim()) && !line(i + 1).trim().starts_with('*') {
            push(UnitKind::Heading, i, i + 1);
            i += 2;
            continue;
        }

        let mut j = i + 1;
        while j < lines.len() {
            let next = line(j);
            let next_trimmed = next.trim();
            if next_trimmed.is_empty()
                || fence_marker(next_trimmed).is_some()
                || is_atx_heading(next_trimmed)
                || LIST_ITEM.is_match(next)
                || is_rule(next_trimmed)
                || (j + 1 < lines.len() && is_rule(line(j + 1).trim()))
            {
                break;
            }
            j += 1;
        }

        let single_line = j == i + 1;
        let followed_by_blank = j < lines.len() && blank(j);
        let kind = if single_line && followed_by_blank && is_typographic_heading(trimmed) {
            UnitKind::Heading
        } else {
            UnitKind::Paragraph
        };
        push(kind, i, j - 1);
        i = j;
    }
    units
}

/// Line spans excluding terminators
fn line_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut offset = 0;
    for raw in text.split_inclusive('\n') {
        let content = raw.trim_end_matches(['\n', '\r']);
        spans.push((offset, offset + content.len()));
        offset += raw.len();
    }
    spans
}

fn trim_span(text: &str, start: usize, end: usize) -> Option<(usize, usize)> {
    let slice = &text[start..end];
    let trimmed = slice.trim();
    if trimmed.is_empty() {
        return None;
    }
    let s = start + (slice.len() - slice.trim_start().len());
    Some((s, s + trimmed.len()))
}

fn fence_marker(trimmed: &str) -> Option<&'static str> {
    if trimmed.starts_with("```") {
        Some("```")
    } else if trimmed.starts_with("~~~") {
        Some("~~~")
    } else {
        None
    }
}

fn is_atx_heading(trimmed: &str) -> bool {
    let hashes = trimmed.chars().take_while(|&c| c == '#').count();
    (1..=6).contains(&hashes)
        && trimmed[hashes..]
            .chars()
            .next()
            .map_or(true, char::is_whitespace)
}

/// Setext underline or thematic break (`===`, `---`, `***`)
fn is_rule(trimmed: &str) -> bool {
    let mut chars = trimmed.chars().filter(|c| !c.is_whitespace());
    let Some(first) = chars.next() else {
        return false;
    };
    matches!(first, '=' | '-' | '*') && trimmed.len() >= 3 && chars.all(|c| c == first)
}

/// Short capitalized line without terminal punctuation
fn is_typographic_heading(trimmed: &str) -> bool {
    let starts_upper = trimmed.chars().next().map_or(false, char::is_uppercase);
    let ends_bare = !trimmed.ends_with(['.', ',', ':', ';', '!', '?']);
    starts_upper
        && ends_bare
        && trimmed.chars().count() <= MAX_HEADING_CHARS
        && trimmed.split_whitespace().count() <= 10
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use veritas_domain::SourceType;

    fn source() -> Arc<Source> {
        Arc::new(Source::new("https://docs.example/guide", "Guide", SourceType::OfficialDocs))
    }

    fn small() -> SemanticChunker {
        SemanticChunker::new(ChunkerConfig {
            max_chunk_size: 40,
            min_chunk_size: 10,
            overlap_size: 8,
        })
    }

    #[test]
    fn test_parse_units_recognizes_structure() {
        let text = "# Install\n\nRun the installer.\n\n- one\n- two\n\n```sh\ncargo build\n```\n\nSetup\n=====\nBody text here.";
        let kinds: Vec<UnitKind> = parse_units(text).iter().map(|u| u.kind).collect();
        assert_eq!(
            kinds,
            vec![
                UnitKind::Heading,
                UnitKind::Paragraph,
                UnitKind::List,
                UnitKind::Code,
                UnitKind::Heading,
                UnitKind::Paragraph,
            ]
        );
    }

    #[test]
    fn test_typographic_heading_needs_blank_line() {
        let units = parse_units("Getting Started\n\nThe runtime starts here.");
        assert_eq!(units[0].kind, UnitKind::Heading);

        let units = parse_units("Getting Started\nThe runtime starts here.");
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].kind, UnitKind::Paragraph);
    }

    #[test]
    fn test_unterminated_fence_runs_to_end() {
        let text = "Intro paragraph.\n\n```rust\nfn main() {}\n";
        let units = parse_units(text);
        assert_eq!(units.last().unwrap().kind, UnitKind::Code);
        assert_eq!(&text[units[1].start..units[1].end], "```rust\nfn main() {}");
    }

    #[test]
    fn test_code_block_is_its_own_example_concept() {
        let chunker = SemanticChunker::default();
        let text = "A task is a lightweight unit of work.\n\n```rust\ntokio::spawn(async {});\n```\n\nTasks are scheduled cooperatively.";
        let concepts = chunker.concepts(text);
        assert_eq!(concepts.len(), 3);
        assert_eq!(concepts[1].concept_type, ConceptType::Example);
        assert!(text[concepts[1].start..concepts[1].end].starts_with("```"));
    }

    #[test]
    fn test_transition_marker_starts_concept() {
        let chunker = SemanticChunker::default();
        let text = "Threads are preemptive.\n\nHowever, tasks yield at await points.\n\nThey are cheap.";
        let concepts = chunker.concepts(text);
        assert_eq!(concepts.len(), 2);
        assert!(text[concepts[1].start..concepts[1].end].starts_with("However"));
    }

    #[test]
    fn test_concept_rules_pick_most_hits() {
        let rules = ConceptRules::default();
        assert_eq!(rules.classify("A mutex is a lock. It means exclusive access."), ConceptType::Definition);
        assert_eq!(rules.classify("First install it, then run it, next configure it."), ConceptType::Procedure);
        assert_eq!(rules.classify("Rust versus Go, compared to C."), ConceptType::Comparison);
        assert_eq!(rules.classify("Bread rises."), ConceptType::General);
    }

    #[test]
    fn test_custom_rules_replace_defaults() {
        let rules = ConceptRules::from_patterns(&[(ConceptType::Comparison, r"(?i)\bbread\b")]).unwrap();
        let chunker = SemanticChunker::default().with_rules(rules);
        let concepts = chunker.concepts("Bread is a food.");
        assert_eq!(concepts[0].concept_type, ConceptType::Comparison);
    }

    #[test]
    fn test_content_matches_offsets() {
        let text = "# Runtime\n\nThe runtime drives futures. It polls tasks when they are woken.\n\nHowever, blocking calls stall the worker thread and should be moved off it.\n\n## Timers\n\nTimers fire after a deadline. For example, sleep waits for a duration.";
        let chunks = small().chunk(text, &source());
        assert!(chunks.len() > 1);
        for (i, chunk) in chunks.iter().enumerate() {
            let m = &chunk.metadata;
            assert_eq!(chunk.content, &text[m.start_char..m.end_char]);
            assert_eq!(chunk.content, chunk.content.trim());
            assert_eq!(m.position, i);
            assert_eq!(m.total_chunks, chunks.len());
            assert_eq!(chunk.id, Chunk::make_id(&chunk.source.id, i));
        }
    }

    #[test]
    fn test_overlap_carries_trailing_words() {
        let text = "Alpha beta gamma delta epsilon zeta eta theta iota kappa. Lambda mu nu xi omicron pi rho sigma tau upsilon. Phi chi psi omega alpha beta gamma delta epsilon zeta.";
        let chunker = SemanticChunker::new(ChunkerConfig {
            max_chunk_size: 20,
            min_chunk_size: 5,
            overlap_size: 4,
        });
        let spans = chunker.spans(text);
        assert!(spans.len() >= 2);
        for pair in spans.windows(2) {
            assert!(pair[1].start > pair[0].start);
            assert!(pair[1].start < pair[0].end, "next chunk should begin inside the previous one");
        }
    }

    #[test]
    fn test_oversized_sentence_splits_by_word() {
        let text = (0..200).map(|i| format!("word{}", i)).collect::<Vec<_>>().join(" ");
        let chunker = SemanticChunker::new(ChunkerConfig {
            max_chunk_size: 30,
            min_chunk_size: 0,
            overlap_size: 0,
        });
        let spans = chunker.spans(&text);
        assert!(spans.len() > 1);
        assert!(spans.iter().all(|s| s.tokens <= 30));
        assert_eq!(spans.first().unwrap().start, 0);
        assert_eq!(spans.last().unwrap().end, text.len());
    }

    #[test]
    fn test_empty_text_yields_no_chunks() {
        assert!(SemanticChunker::default().chunk("  \n\n ", &source()).is_empty());
        let source = Arc::new(Source::new("https://a.example", "A", SourceType::Blog));
        assert!(SemanticChunker::default().chunk_source(&source).is_empty());
    }

    #[test]
    fn test_chunk_type_follows_dominant_concept() {
        let text = "```rust\nlet rt = tokio::runtime::Runtime::new();\nrt.block_on(async { work().await });\n```";
        let chunks = SemanticChunker::default().chunk(text, &source());
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].metadata.concept_type, ConceptType::Example);
    }

    proptest! {
        /// Property: chunking is deterministic and order-preserving
        #[test]
        fn test_chunking_is_deterministic(
            paragraphs in prop::collection::vec("[A-Za-z]{1,10}( [a-z]{1,10}){0,30}\\.", 1..12)
        ) {
            let text = paragraphs.join("\n\n");
            let chunker = small();
            let first = chunker.spans(&text);
            let second = chunker.spans(&text);
            prop_assert_eq!(&first, &second);
            for pair in first.windows(2) {
                prop_assert!(pair[0].start < pair[1].start);
                prop_assert!(pair[0].end <= pair[1].end);
            }
            for span in &first {
                prop_assert!(span.start < span.end && span.end <= text.len());
            }
        }
    }
}
