//! Retry policy for external model calls
//!
//! Every attempt runs under its own deadline. Retryable failures back off
//! exponentially (`base * 2^attempt`, capped at `max_delay`); a provider
//! retry hint replaces the computed delay when present.

use crate::LlmError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};
use veritas_domain::traits::{EmbeddingModel, GenerativeProvider, InvokeOptions};

/// Timeout and backoff settings for one class of model calls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry, in milliseconds
    pub base_delay_ms: u64,
    /// Upper bound on any single delay, in milliseconds
    pub max_delay_ms: u64,
    /// Deadline for each attempt, in milliseconds
    pub attempt_timeout_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 500,
            max_delay_ms: 8_000,
            attempt_timeout_ms: 30_000,
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no backoff
    pub fn no_retry(attempt_timeout: Duration) -> Self {
        Self {
            max_retries: 0,
            attempt_timeout_ms: attempt_timeout.as_millis() as u64,
            ..Self::default()
        }
    }

    /// Validate the policy
    pub fn validate(&self) -> Result<(), String> {
        if self.attempt_timeout_ms == 0 {
            return Err("attempt_timeout_ms must be positive".to_string());
        }
        if self.base_delay_ms > self.max_delay_ms {
            return Err(format!(
                "base_delay_ms ({}) must not exceed max_delay_ms ({})",
                self.base_delay_ms, self.max_delay_ms
            ));
        }
        Ok(())
    }

    /// Deadline for each attempt
    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.attempt_timeout_ms)
    }

    /// Delay before retry number `attempt` (zero-based) after `error`
    pub fn delay_for(&self, attempt: u32, error: &LlmError) -> Duration {
        let max = Duration::from_millis(self.max_delay_ms);
        if let Some(hint) = error.retry_after() {
            return hint.min(max);
        }
        let factor = 2u64.saturating_pow(attempt);
        Duration::from_millis(self.base_delay_ms.saturating_mul(factor)).min(max)
    }

    /// Run `op` until it succeeds, fails permanently or retries run out
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, LlmError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, LlmError>>,
    {
        let timeout = self.attempt_timeout();
        let mut attempt = 0;

        loop {
            let result = match tokio::time::timeout(timeout, op()).await {
                Ok(result) => result,
                Err(_) => Err(LlmError::Timeout(timeout)),
            };

            match result {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    let delay = self.delay_for(attempt, &e);
                    warn!(
                        "{} attempt {} failed ({}), retrying in {:?}",
                        label,
                        attempt + 1,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    debug!("{} giving up after {} attempt(s): {}", label, attempt + 1, e);
                    return Err(e);
                }
            }
        }
    }
}

/// Provider wrapper that applies a [`RetryPolicy`] to every call
#[derive(Debug, Clone)]
pub struct Retrying<P> {
    inner: P,
    policy: RetryPolicy,
}

impl<P> Retrying<P> {
    /// Wrap a provider
    pub fn new(inner: P, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    /// The wrapped provider
    pub fn inner(&self) -> &P {
        &self.inner
    }
}

#[async_trait]
impl<P> GenerativeProvider for Retrying<P>
where
    P: GenerativeProvider<Error = LlmError>,
{
    type Error = LlmError;

    async fn invoke(&self, prompt: &str, options: InvokeOptions) -> Result<String, Self::Error> {
        self.policy
            .run("generate", || self.inner.invoke(prompt, options))
            .await
    }
}

#[async_trait]
impl<P> EmbeddingModel for Retrying<P>
where
    P: EmbeddingModel<Error = LlmError>,
{
    type Error = LlmError;

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, Self::Error> {
        self.policy.run("embed", || self.inner.embed(texts)).await
    }

    fn dimension(&self) -> Option<usize> {
        self.inner.dimension()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockProvider;

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay_ms: 1,
            max_delay_ms: 5,
            attempt_timeout_ms: 200,
        }
    }

    #[test]
    fn test_exponential_delays_are_capped() {
        let policy = RetryPolicy {
            base_delay_ms: 100,
            max_delay_ms: 1_000,
            ..RetryPolicy::default()
        };
        let err = LlmError::Communication("x".into());
        assert_eq!(policy.delay_for(0, &err), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2, &err), Duration::from_millis(400));
        assert_eq!(policy.delay_for(10, &err), Duration::from_millis(1_000));
    }

    #[test]
    fn test_retry_after_hint_wins() {
        let policy = RetryPolicy::default();
        let err = LlmError::RateLimited {
            retry_after: Some(Duration::from_secs(2)),
        };
        assert_eq!(policy.delay_for(0, &err), Duration::from_secs(2));

        let err = LlmError::RateLimited {
            retry_after: Some(Duration::from_secs(600)),
        };
        assert_eq!(policy.delay_for(0, &err), Duration::from_millis(policy.max_delay_ms));
    }

    #[test]
    fn test_validate() {
        assert!(RetryPolicy::default().validate().is_ok());
        let bad = RetryPolicy {
            base_delay_ms: 10,
            max_delay_ms: 1,
            ..RetryPolicy::default()
        };
        assert!(bad.validate().is_err());
    }

    #[tokio::test]
    async fn test_recovers_from_transient_failures() {
        let provider = MockProvider::new("done");
        provider.queue_failure(LlmError::Communication("reset".into()));
        provider.queue_failure(LlmError::RateLimited { retry_after: None });

        let retrying = Retrying::new(provider.clone(), fast_policy(3));
        let result = retrying.invoke("p", InvokeOptions::default()).await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_permanent_failure_is_not_retried() {
        let provider = MockProvider::new("done");
        provider.queue_failure(LlmError::InvalidResponse("garbage".into()));

        let retrying = Retrying::new(provider.clone(), fast_policy(3));
        assert!(retrying.invoke("p", InvokeOptions::default()).await.is_err());
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_attempt_timeout() {
        let provider = MockProvider::new("slow").with_delay(Duration::from_millis(500));
        let retrying = Retrying::new(provider.clone(), fast_policy(1));

        let result = retrying.invoke("p", InvokeOptions::default()).await;
        assert!(matches!(result, Err(LlmError::Timeout(_))));
        assert_eq!(provider.call_count(), 2);
    }
}
