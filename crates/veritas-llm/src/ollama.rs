//! Ollama Provider Implementation
//!
//! Provides integration with Ollama's local model API for both text
//! generation (`/api/generate`) and embeddings (`/api/embed`).
//!
//! Each call is a single attempt bounded by the HTTP client timeout.
//! Compose with [`crate::Retrying`] for backoff; HTTP 429 responses carry
//! the `Retry-After` hint through [`LlmError::RateLimited`].
//!
//! # Examples
//!
//! ```no_run
//! use veritas_llm::{OllamaProvider, RetryPolicy, Retrying};
//!
//! let provider = OllamaProvider::new("http://localhost:11434", "llama3")
//!     .with_embedding_model("nomic-embed-text");
//! let provider = Retrying::new(provider, RetryPolicy::default());
//! ```

use crate::LlmError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use veritas_domain::traits::{EmbeddingModel, GenerativeProvider, InvokeOptions};

/// Default Ollama API endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Default timeout for model requests (30 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default embedding model
pub const DEFAULT_EMBEDDING_MODEL: &str = "nomic-embed-text";

/// Ollama API provider for local inference
pub struct OllamaProvider {
    endpoint: String,
    model: String,
    embedding_model: String,
    timeout: Duration,
    client: reqwest::Client,
}

/// Request body for Ollama generate API
#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
}

/// Response from Ollama generate API
#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Request body for Ollama embed API
#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

/// Response from Ollama embed API
#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl OllamaProvider {
    /// Create a new Ollama provider
    ///
    /// # Parameters
    ///
    /// - `endpoint`: Ollama API endpoint (e.g., "http://localhost:11434")
    /// - `model`: Generation model to use (e.g., "llama3", "mistral")
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_timeout(endpoint, model, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a provider with a custom request timeout
    pub fn with_timeout(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            timeout,
            client,
        }
    }

    /// Create a new Ollama provider on the default endpoint
    pub fn default_endpoint(model: impl Into<String>) -> Self {
        Self::new(DEFAULT_ENDPOINT, model)
    }

    /// Set the embedding model name
    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = model.into();
        self
    }

    async fn post<B, R>(&self, path: &str, body: &B, model: &str) -> Result<R, LlmError>
    where
        B: Serialize + ?Sized,
        R: serde::de::DeserializeOwned,
    {
        let url = format!("{}{}", self.endpoint, path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(self.timeout)
                } else {
                    LlmError::Communication(format!("Request failed: {}", e))
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<R>()
                .await
                .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)));
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(LlmError::ModelNotAvailable(model.to_string()));
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_retry_after);
            return Err(LlmError::RateLimited { retry_after });
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        if status.is_server_error() {
            Err(LlmError::Communication(format!("HTTP {}: {}", status, error_text)))
        } else {
            Err(LlmError::InvalidResponse(format!("HTTP {}: {}", status, error_text)))
        }
    }
}

/// Parse a `Retry-After` header given in whole seconds
fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

#[async_trait]
impl GenerativeProvider for OllamaProvider {
    type Error = LlmError;

    async fn invoke(&self, prompt: &str, options: InvokeOptions) -> Result<String, Self::Error> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            format: options.expect_json.then_some("json"),
        };
        let response: GenerateResponse = self.post("/api/generate", &request, &self.model).await?;
        Ok(response.response)
    }
}

#[async_trait]
impl EmbeddingModel for OllamaProvider {
    type Error = LlmError;

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, Self::Error> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let request = EmbedRequest {
            model: &self.embedding_model,
            input: texts,
        };
        let response: EmbedResponse = self
            .post("/api/embed", &request, &self.embedding_model)
            .await?;

        if response.embeddings.len() != texts.len() {
            return Err(LlmError::InvalidResponse(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                response.embeddings.len()
            )));
        }
        Ok(response.embeddings)
    }

    fn dimension(&self) -> Option<usize> {
        None
    }
}
