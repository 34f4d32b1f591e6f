//! Veritas Model Provider Layer
//!
//! Pluggable generative and embedding providers behind the boundary traits
//! from `veritas-domain`.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic scripted generative provider for testing
//! - `OllamaProvider`: Local Ollama API integration (generation and embeddings)
//! - `HashEmbeddingModel`: Content-seeded pseudo-embeddings, fully offline
//! - `ResilientEmbedder`: Batched embedding with a deterministic fallback
//!
//! # Resilience
//!
//! Model output is untrusted and model calls fail. [`RetryPolicy`] adds
//! per-attempt timeouts and exponential backoff, [`structured`] turns free
//! text into JSON through an ordered fallback chain.
//!
//! # Examples
//!
//! ```
//! use veritas_llm::MockProvider;
//! use veritas_domain::traits::{GenerativeProvider, InvokeOptions};
//!
//! let runtime = tokio::runtime::Runtime::new().unwrap();
//! let provider = MockProvider::new("Hello from the model!");
//! let result = runtime
//!     .block_on(provider.invoke("test prompt", InvokeOptions::default()))
//!     .unwrap();
//! assert_eq!(result, "Hello from the model!");
//! ```

#![warn(missing_docs)]

pub mod embedding;
pub mod ollama;
pub mod retry;
pub mod structured;

use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;
use veritas_domain::traits::{GenerativeProvider, InvokeOptions};

pub use embedding::{HashEmbeddingModel, ResilientEmbedder};
pub use ollama::OllamaProvider;
pub use retry::{RetryPolicy, Retrying};
pub use structured::{parse_as, parse_structured, ParseStrategy, StructuredOutput};

/// Errors that can occur during model operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from the model
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded, with the provider's retry hint when present
    #[error("Rate limit exceeded")]
    RateLimited {
        /// Provider-supplied wait before retrying
        retry_after: Option<Duration>,
    },

    /// A single attempt exceeded its deadline
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Generic error
    #[error("Model error: {0}")]
    Other(String),
}

impl LlmError {
    /// Whether retrying the same request may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LlmError::Communication(_) | LlmError::RateLimited { .. } | LlmError::Timeout(_)
        )
    }

    /// Provider retry hint, if any
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            LlmError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
enum MockReply {
    Text(String),
    Fail(LlmError),
}

#[derive(Debug, Default)]
struct MockState {
    responses: Vec<(String, MockReply)>,
    queued_failures: Vec<LlmError>,
    prompts: Vec<String>,
}

/// Mock generative provider for deterministic testing
///
/// Returns pre-configured responses without making any network calls.
/// A configured key matches a prompt exactly or, failing that, as a
/// substring (first configured key wins). Queued failures are returned
/// before any response.
///
/// # Examples
///
/// ```
/// use veritas_llm::MockProvider;
///
/// let mut provider = MockProvider::default();
/// provider.add_response("prompt1", "response1");
/// provider.add_error("prompt2");
/// assert_eq!(provider.call_count(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    delay: Option<Duration>,
    state: Arc<Mutex<MockState>>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            delay: None,
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Sleep before answering (for timeout tests)
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Add a specific response for prompts matching `key`
    pub fn add_response(&mut self, key: impl Into<String>, response: impl Into<String>) {
        self.lock()
            .responses
            .push((key.into(), MockReply::Text(response.into())));
    }

    /// Configure to return an error for prompts matching `key`
    pub fn add_error(&mut self, key: impl Into<String>) {
        self.lock().responses.push((
            key.into(),
            MockReply::Fail(LlmError::Other("Mock error".to_string())),
        ));
    }

    /// Fail the next call with `error`, regardless of prompt
    pub fn queue_failure(&self, error: LlmError) {
        self.lock().queued_failures.push(error);
    }

    /// Get the number of times invoke was called
    pub fn call_count(&self) -> usize {
        self.lock().prompts.len()
    }

    /// Prompts received so far, in call order
    pub fn prompts(&self) -> Vec<String> {
        self.lock().prompts.clone()
    }

    /// Reset the call count
    pub fn reset_call_count(&self) {
        self.lock().prompts.clear();
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn reply_for(&self, prompt: &str) -> Result<String, LlmError> {
        let mut state = self.lock();
        state.prompts.push(prompt.to_string());

        if !state.queued_failures.is_empty() {
            return Err(state.queued_failures.remove(0));
        }

        let reply = state
            .responses
            .iter()
            .find(|(key, _)| key == prompt)
            .or_else(|| state.responses.iter().find(|(key, _)| prompt.contains(key.as_str())))
            .map(|(_, reply)| reply.clone());

        match reply {
            Some(MockReply::Text(text)) => Ok(text),
            Some(MockReply::Fail(error)) => Err(error),
            None => Ok(self.default_response.clone()),
        }
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

#[async_trait]
impl GenerativeProvider for MockProvider {
    type Error = LlmError;

    async fn invoke(&self, prompt: &str, _options: InvokeOptions) -> Result<String, Self::Error> {
        let reply = self.reply_for(prompt);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        reply
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn invoke(provider: &MockProvider, prompt: &str) -> Result<String, LlmError> {
        provider.invoke(prompt, InvokeOptions::default()).await
    }

    #[tokio::test]
    async fn test_mock_provider_default() {
        let provider = MockProvider::new("Test response");
        assert_eq!(invoke(&provider, "any prompt").await.unwrap(), "Test response");
    }

    #[tokio::test]
    async fn test_mock_provider_specific_responses() {
        let mut provider = MockProvider::default();
        provider.add_response("hello", "world");
        provider.add_response("foo", "bar");

        assert_eq!(invoke(&provider, "hello").await.unwrap(), "world");
        assert_eq!(invoke(&provider, "say foo please").await.unwrap(), "bar");
        assert_eq!(invoke(&provider, "unknown").await.unwrap(), "Default mock response");
    }

    #[tokio::test]
    async fn test_mock_provider_call_count() {
        let provider = MockProvider::new("test");
        assert_eq!(provider.call_count(), 0);

        invoke(&provider, "prompt1").await.unwrap();
        invoke(&provider, "prompt2").await.unwrap();
        assert_eq!(provider.call_count(), 2);
        assert_eq!(provider.prompts(), ["prompt1", "prompt2"]);

        provider.reset_call_count();
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_mock_provider_error() {
        let mut provider = MockProvider::default();
        provider.add_error("bad prompt");

        let result = invoke(&provider, "bad prompt").await;
        assert!(matches!(result.unwrap_err(), LlmError::Other(_)));
    }

    #[tokio::test]
    async fn test_queued_failures_come_first() {
        let provider = MockProvider::new("ok");
        provider.queue_failure(LlmError::Timeout(Duration::from_secs(1)));

        assert!(invoke(&provider, "p").await.is_err());
        assert_eq!(invoke(&provider, "p").await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_mock_provider_clone_shares_state() {
        let provider1 = MockProvider::new("test");
        let provider2 = provider1.clone();

        invoke(&provider1, "test").await.unwrap();
        assert_eq!(provider2.call_count(), 1);
    }

    #[test]
    fn test_retryable_classification() {
        assert!(LlmError::Communication("reset".into()).is_retryable());
        assert!(LlmError::RateLimited { retry_after: None }.is_retryable());
        assert!(LlmError::Timeout(Duration::from_secs(1)).is_retryable());
        assert!(!LlmError::InvalidResponse("bad".into()).is_retryable());
        assert!(!LlmError::ModelNotAvailable("m".into()).is_retryable());
    }
}
