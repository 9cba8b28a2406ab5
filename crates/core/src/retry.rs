//! Bounded retries around an `LLMClient`.
//!
//! Wraps any client and re-sends a request on transient failures. Errors that
//! would fail the same way on every attempt (see [`LlmError::is_retryable`])
//! propagate immediately.

use crate::llm_client::{GenerationRequest, LLMClient, LlmError};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Values below 1 are treated as 1.
    pub max_attempts: u32,
    /// Pause between attempts.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(500),
        }
    }
}

/// An `LLMClient` that retries transient failures of an inner client.
pub struct RetryingClient {
    inner: Arc<dyn LLMClient>,
    policy: RetryPolicy,
}

impl RetryingClient {
    pub fn new(inner: Arc<dyn LLMClient>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl LLMClient for RetryingClient {
    async fn generate(&self, request: GenerationRequest) -> Result<String, LlmError> {
        let attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.inner.generate(request.clone()).await {
                Ok(text) => return Ok(text),
                Err(err) if err.is_retryable() && attempt < attempts => {
                    warn!(attempt, max_attempts = attempts, error = %err, "Model request failed, retrying");
                    tokio::time::sleep(self.policy.backoff).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
