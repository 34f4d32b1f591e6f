//! Parse model output into structured values
//!
//! Free-text models do not reliably return bare JSON. Output goes through
//! an ordered chain: fenced JSON block, raw JSON, brace/bracket boundary
//! extraction. When every strategy fails the raw text is kept as an
//! unstructured result; parsing itself never fails.

use crate::LlmError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

static FENCED_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```[A-Za-z]*[ \t]*\r?\n?(.*?)```").expect("valid fenced-block regex"));

/// Which strategy produced a structured value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStrategy {
    /// JSON inside a markdown code fence
    FencedBlock,
    /// The whole response was JSON
    RawJson,
    /// JSON found between the outermost braces or brackets
    Boundary,
    /// Nothing parsed; the text is kept as-is
    PlainText,
}

/// Result of parsing model output
#[derive(Debug, Clone, PartialEq)]
pub enum StructuredOutput {
    /// A JSON value
    Json(Value),
    /// Unstructured text
    Text(String),
}

impl StructuredOutput {
    /// The JSON value, if parsing succeeded
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            StructuredOutput::Json(value) => Some(value),
            StructuredOutput::Text(_) => None,
        }
    }

    /// A string field of a JSON object
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.as_json()?.get(key)?.as_str()
    }

    /// Text form: bare JSON strings unwrap, other values serialize
    pub fn into_text(self) -> String {
        match self {
            StructuredOutput::Json(Value::String(s)) => s,
            StructuredOutput::Json(value) => value.to_string(),
            StructuredOutput::Text(text) => text,
        }
    }
}

type Strategy = fn(&str) -> Option<Value>;

const STRATEGIES: [(ParseStrategy, Strategy); 3] = [
    (ParseStrategy::FencedBlock, fenced_block),
    (ParseStrategy::RawJson, raw_json),
    (ParseStrategy::Boundary, boundary),
];

/// Parse model output, reporting which strategy succeeded
pub fn parse_with_strategy(raw: &str) -> (StructuredOutput, ParseStrategy) {
    for (strategy, parse) in STRATEGIES {
        if let Some(value) = parse(raw) {
            debug!("Parsed model output via {:?}", strategy);
            return (StructuredOutput::Json(value), strategy);
        }
    }
    debug!("Model output is not JSON, keeping {} chars as text", raw.len());
    (StructuredOutput::Text(raw.trim().to_string()), ParseStrategy::PlainText)
}

/// Parse model output through the fallback chain
///
/// # Examples
///
/// ```
/// use veritas_llm::{parse_structured, StructuredOutput};
///
/// let out = parse_structured("Sure! Here it is: {\"status\": \"supported\"} Hope that helps.");
/// assert_eq!(out.str_field("status"), Some("supported"));
///
/// let out = parse_structured("no json here");
/// assert_eq!(out, StructuredOutput::Text("no json here".to_string()));
/// ```
pub fn parse_structured(raw: &str) -> StructuredOutput {
    parse_with_strategy(raw).0
}

/// Parse model output into a typed value
pub fn parse_as<T: DeserializeOwned>(raw: &str) -> Result<T, LlmError> {
    match parse_structured(raw) {
        StructuredOutput::Json(value) => serde_json::from_value(value)
            .map_err(|e| LlmError::InvalidResponse(format!("Unexpected JSON shape: {}", e))),
        StructuredOutput::Text(_) => Err(LlmError::InvalidResponse(
            "Response contains no JSON".to_string(),
        )),
    }
}

fn fenced_block(raw: &str) -> Option<Value> {
    FENCED_BLOCK
        .captures_iter(raw)
        .filter_map(|caps| caps.get(1))
        .find_map(|body| serde_json::from_str(body.as_str().trim()).ok())
}

fn raw_json(raw: &str) -> Option<Value> {
    serde_json::from_str(raw.trim()).ok()
}

fn boundary(raw: &str) -> Option<Value> {
    let object = span(raw, '{', '}');
    let array = span(raw, '[', ']');

    // Try the span that opens first so an object wrapping an array wins
    let mut candidates = [object, array];
    candidates.sort_by_key(|c| c.map_or(usize::MAX, |(start, _)| start));

    candidates
        .into_iter()
        .flatten()
        .find_map(|(start, end)| serde_json::from_str(&raw[start..=end]).ok())
}

fn span(raw: &str, open: char, close: char) -> Option<(usize, usize)> {
    let start = raw.find(open)?;
    let end = raw.rfind(close)?;
    (end > start).then_some((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn test_fenced_block_first() {
        let raw = "Here you go:\n```json\n{\"content\": \"fenced\"}\n```\n{\"content\": \"later\"}";
        let (out, strategy) = parse_with_strategy(raw);
        assert_eq!(strategy, ParseStrategy::FencedBlock);
        assert_eq!(out.str_field("content"), Some("fenced"));
    }

    #[test]
    fn test_fence_without_language_tag() {
        let raw = "```\n[1, 2, 3]\n```";
        let (out, strategy) = parse_with_strategy(raw);
        assert_eq!(strategy, ParseStrategy::FencedBlock);
        assert_eq!(out.as_json(), Some(&serde_json::json!([1, 2, 3])));
    }

    #[test]
    fn test_raw_json() {
        let (out, strategy) = parse_with_strategy("  {\"a\": 1}  ");
        assert_eq!(strategy, ParseStrategy::RawJson);
        assert_eq!(out.as_json(), Some(&serde_json::json!({"a": 1})));
    }

    #[test]
    fn test_boundary_extraction() {
        let raw = "The verdict is {\"status\": \"flagged\", \"explanation\": \"no\"} and that's it.";
        let (out, strategy) = parse_with_strategy(raw);
        assert_eq!(strategy, ParseStrategy::Boundary);
        assert_eq!(out.str_field("status"), Some("flagged"));
    }

    #[test]
    fn test_boundary_prefers_outer_object() {
        let raw = "result: {\"items\": [1, 2]} end";
        let out = parse_structured(raw);
        assert_eq!(out.as_json(), Some(&serde_json::json!({"items": [1, 2]})));
    }

    #[test]
    fn test_broken_fence_falls_through() {
        let raw = "```json\n{not json}\n```";
        let (out, strategy) = parse_with_strategy(raw);
        assert_eq!(strategy, ParseStrategy::PlainText);
        assert!(out.as_json().is_none());
    }

    #[test]
    fn test_plain_text_kept() {
        let out = parse_structured("  Just a paragraph.  ");
        assert_eq!(out.clone().into_text(), "Just a paragraph.");
        assert_eq!(out, StructuredOutput::Text("Just a paragraph.".into()));
    }

    #[test]
    fn test_parse_as_typed() {
        #[derive(Deserialize)]
        struct Verdict {
            status: String,
        }

        let verdict: Verdict = parse_as("```json\n{\"status\": \"unclear\"}\n```").unwrap();
        assert_eq!(verdict.status, "unclear");
        assert!(parse_as::<Verdict>("nothing").is_err());
        assert!(parse_as::<Verdict>("{\"other\": 1}").is_err());
    }
}
