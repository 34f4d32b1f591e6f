//! Draft generation with an extractive fallback

use crate::citations::CitationManager;
use crate::config::DraftConfig;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info, warn};
use veritas_domain::text::{keyword_set, split_sentences};
use veritas_domain::traits::{GenerativeProvider, InvokeOptions};
use veritas_domain::Chunk;
use veritas_llm::{parse_structured, LlmError, Retrying, StructuredOutput};

static MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\[(\d+)\]").expect("valid regex"));

/// Remove inline citation markers such as ` [3]`
pub fn strip_markers(text: &str) -> String {
    MARKER.replace_all(text, "").into_owned()
}

/// How a draft was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftOrigin {
    /// Written by the generative model
    Model,
    /// Assembled from evidence sentences
    Extractive,
}

/// Generated answer text with inline citation markers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Draft {
    /// Text with `[N]` markers
    pub content: String,
    /// How the text was produced
    pub origin: DraftOrigin,
    /// Citations referenced by the text, in first-use order
    pub citation_ids: Vec<String>,
}

/// Provider for deployments without a generative model
///
/// Every call fails with [`LlmError::ModelNotAvailable`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NoModel;

#[async_trait]
impl GenerativeProvider for NoModel {
    type Error = LlmError;

    async fn invoke(&self, _prompt: &str, _options: InvokeOptions) -> Result<String, Self::Error> {
        Err(LlmError::ModelNotAvailable("no generative model configured".to_string()))
    }
}

/// Writes a cited answer from the working set
pub struct DraftGenerator<P> {
    provider: Option<Retrying<P>>,
    config: DraftConfig,
}

impl DraftGenerator<NoModel> {
    /// Generator that only builds extractive drafts
    pub fn extractive(config: DraftConfig) -> Self {
        Self {
            provider: None,
            config,
        }
    }
}

impl<P> DraftGenerator<P>
where
    P: GenerativeProvider<Error = LlmError>,
{
    /// Generator calling `provider` under the configured retry policy
    pub fn new(provider: P, config: DraftConfig) -> Self {
        let policy = config.retry.clone();
        Self {
            provider: Some(Retrying::new(provider, policy)),
            config,
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &DraftConfig {
        &self.config
    }

    /// Build the draft for `query`, citing sources through `citations`
    ///
    /// Never fails: model errors and empty answers fall back to the
    /// extractive summary.
    pub async fn generate(&self, query: &str, chunks: &[Chunk], citations: &mut CitationManager) -> Draft {
        if chunks.is_empty() {
            info!("No evidence for '{}', returning empty draft", query);
            return Draft {
                content: format!("No sources were found for '{}'.", query),
                origin: DraftOrigin::Extractive,
                citation_ids: Vec::new(),
            };
        }

        if let Some(provider) = &self.provider {
            let prompt = self.build_prompt(query, chunks, citations);
            match provider.invoke(&prompt, InvokeOptions { expect_json: true }).await {
                Ok(raw) => match Self::parse_content(&raw) {
                    Some(content) => {
                        let citation_ids = referenced_ids(&content, citations);
                        info!(
                            "Generated draft for '{}' ({} chars, {} citations)",
                            query,
                            content.len(),
                            citation_ids.len()
                        );
                        return Draft {
                            content,
                            origin: DraftOrigin::Model,
                            citation_ids,
                        };
                    }
                    None => warn!("Model returned no usable draft, using extractive summary"),
                },
                Err(e) => warn!("Draft generation failed: {}, using extractive summary", e),
            }
        }

        self.extractive_draft(query, chunks, citations)
    }

    /// Prompt with numbered evidence for the model
    pub fn build_prompt(&self, query: &str, chunks: &[Chunk], citations: &mut CitationManager) -> String {
        let mut prompt = String::from(
            "You are a research assistant. Answer the question using only the numbered evidence below.\n\
             Put the evidence marker, such as [1], after every sentence that relies on it.\n\
             Do not add facts, numbers or quotes that are not in the evidence.\n\n",
        );
        prompt.push_str(&format!("Question: {}\n\nEvidence:\n", query));

        for chunk in chunks.iter().take(self.config.max_context_chunks) {
            let marker = citations.cite(&chunk.source, None).inline_marker.clone();
            let excerpt: String = chunk.content.chars().take(self.config.max_chunk_chars).collect();
            prompt.push_str(&format!("{} {}: {}\n", marker, chunk.source.title, excerpt.trim()));
        }

        prompt.push_str("\nRespond with JSON only:\n{\"content\": \"the answer with inline markers\"}");
        prompt
    }

    fn parse_content(raw: &str) -> Option<String> {
        let content = match parse_structured(raw) {
            StructuredOutput::Text(text) => text,
            json => json.str_field("content")?.to_string(),
        };
        let content = content.trim();
        (!content.is_empty()).then(|| content.to_string())
    }

    fn extractive_draft(&self, query: &str, chunks: &[Chunk], citations: &mut CitationManager) -> Draft {
        let terms = keyword_set(query, 3);
        let mut seen = HashSet::new();
        let mut ranked = Vec::new();

        for chunk in chunks {
            for sentence in split_sentences(&chunk.content) {
                if !seen.insert(sentence.to_lowercase()) {
                    continue;
                }
                let overlap = keyword_set(sentence, 3).intersection(&terms).count();
                ranked.push((overlap, sentence, chunk));
            }
        }
        // Stable sort keeps evidence order among equal scores
        ranked.sort_by(|a, b| b.0.cmp(&a.0));

        let mut sentences = Vec::new();
        let mut citation_ids: Vec<String> = Vec::new();
        for (overlap, sentence, chunk) in ranked.into_iter().take(self.config.extractive_sentences) {
            let citation = citations.cite(&chunk.source, None);
            debug!("Extracted sentence (overlap {}) cited as {}", overlap, citation.id);
            if !citation_ids.contains(&citation.id) {
                citation_ids.push(citation.id.clone());
            }
            sentences.push(with_marker(sentence, &citation.inline_marker));
        }

        info!("Built extractive draft for '{}' from {} sentences", query, sentences.len());
        Draft {
            content: sentences.join(" "),
            origin: DraftOrigin::Extractive,
            citation_ids,
        }
    }
}

/// Place `marker` before the sentence's terminal punctuation
fn with_marker(sentence: &str, marker: &str) -> String {
    let sentence = sentence.trim();
    match sentence.char_indices().last() {
        Some((i, c)) if matches!(c, '.' | '!' | '?') => {
            format!("{} {}{}", sentence[..i].trim_end(), marker, c)
        }
        _ => format!("{} {}.", sentence, marker),
    }
}

fn referenced_ids(content: &str, citations: &CitationManager) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for captures in MARKER.captures_iter(content) {
        let id = format!("cite_{}", &captures[1]);
        if citations.get(&id).is_some() && !ids.contains(&id) {
            ids.push(id);
        }
    }
    ids
}
