use async_openai::{
    Client,
    config::OpenAIConfig,
    error::OpenAIError,
    types::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs},
};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Temperature used for yes/no classification.
pub const CLASSIFICATION_TEMPERATURE: f32 = 0.0;
/// Temperature used for open-ended generation.
pub const CREATIVE_TEMPERATURE: f32 = 0.7;

/// A single prompt-in, text-out request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl GenerationRequest {
    /// A deterministic, one-token request used to classify an answer as yes/no.
    pub fn classification(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            temperature: CLASSIFICATION_TEMPERATURE,
            max_tokens: 1,
        }
    }

    /// An open-ended request with the given output budget.
    pub fn creative(prompt: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            prompt: prompt.into(),
            temperature: CREATIVE_TEMPERATURE,
            max_tokens,
        }
    }
}

/// Failures of the text-generation service.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LlmError {
    #[error("Request timed out after {after:?}")]
    Timeout { after: Duration },

    #[error("Rate limited by the model service")]
    RateLimited,

    #[error("Request failed: {reason}")]
    RequestFailed { reason: String },

    #[error("Invalid response: {reason}")]
    InvalidResponse { reason: String },

    #[error("LLM response had no text content")]
    EmptyResponse,

    #[error("Authentication failed: {reason}")]
    AuthFailed { reason: String },

    #[error("Request rejected: {reason}")]
    InvalidRequest { reason: String },

    #[error("Model {model} not available")]
    ModelNotAvailable { model: String },
}

impl LlmError {
    /// Returns `true` if the failure is transient and the same request may
    /// succeed when sent again.
    ///
    /// Authentication, request validation and model availability errors will
    /// fail identically on every attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LlmError::Timeout { .. }
                | LlmError::RateLimited { .. }
                | LlmError::RequestFailed { .. }
                | LlmError::InvalidResponse { .. }
                | LlmError::EmptyResponse
        )
    }

    /// Returns `true` if the service was unreachable or overloaded, as opposed
    /// to answering with something unusable.
    ///
    /// A session may carry on past an outage. A response that stays empty or
    /// undecodable after retries usually means a misconfigured endpoint or
    /// credentials behind a gateway, so it is not an outage.
    pub fn is_outage(&self) -> bool {
        matches!(
            self,
            LlmError::Timeout { .. } | LlmError::RateLimited | LlmError::RequestFailed { .. }
        )
    }
}

impl From<OpenAIError> for LlmError {
    fn from(err: OpenAIError) -> Self {
        match err {
            OpenAIError::ApiError(api) => {
                let code = api.code.as_deref().unwrap_or_default();
                let kind = api.r#type.as_deref().unwrap_or_default();
                match (code, kind) {
                    ("invalid_api_key", _) | (_, "authentication_error") => LlmError::AuthFailed {
                        reason: api.message,
                    },
                    ("rate_limit_exceeded", _) | (_, "rate_limit_error") => LlmError::RateLimited,
                    ("model_not_found", _) => LlmError::ModelNotAvailable {
                        model: api.param.unwrap_or(api.message),
                    },
                    (_, "invalid_request_error") => LlmError::InvalidRequest {
                        reason: api.message,
                    },
                    _ => LlmError::RequestFailed {
                        reason: api.message,
                    },
                }
            }
            OpenAIError::Reqwest(e) => {
                let status = e.status().map(|s| s.as_u16());
                if e.is_timeout() {
                    LlmError::Timeout {
                        after: Duration::ZERO,
                    }
                } else if matches!(status, Some(401) | Some(403)) {
                    LlmError::AuthFailed {
                        reason: e.to_string(),
                    }
                } else if status == Some(429) {
                    LlmError::RateLimited
                } else {
                    LlmError::RequestFailed {
                        reason: e.to_string(),
                    }
                }
            }
            err @ OpenAIError::JSONDeserialize(..) => LlmError::InvalidResponse {
                reason: err.to_string(),
            },
            OpenAIError::InvalidArgument(reason) => LlmError::InvalidRequest { reason },
            other => LlmError::RequestFailed {
                reason: other.to_string(),
            },
        }
    }
}

/// A generic client for a text-generation service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Sends one prompt and returns the generated text verbatim.
    async fn generate(&self, request: GenerationRequest) -> Result<String, LlmError>;
}

/// An implementation of `LLMClient` for any OpenAI-compatible API.
pub struct OpenAICompatibleClient {
    client: Client<OpenAIConfig>,
    model: String,
    timeout: Duration,
}

impl OpenAICompatibleClient {
    /// Creates a new client for an OpenAI-compatible service.
    ///
    /// # Arguments
    ///
    /// * `config` - The configuration for the OpenAI client, including API key and base URL.
    /// * `model` - The chat model identifier (e.g., "gpt-3.5-turbo").
    /// * `timeout` - Upper bound on a single request, including the response body.
    pub fn new(config: OpenAIConfig, model: String, timeout: Duration) -> Self {
        Self {
            client: Client::with_config(config),
            model,
            timeout,
        }
    }
}

#[async_trait]
impl LLMClient for OpenAICompatibleClient {
    async fn generate(&self, request: GenerationRequest) -> Result<String, LlmError> {
        let message = ChatCompletionRequestUserMessageArgs::default()
            .content(request.prompt)
            .build()
            .map_err(LlmError::from)?;
        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![message.into()])
            .temperature(request.temperature)
            .max_completion_tokens(request.max_tokens)
            .build()
            .map_err(LlmError::from)?;

        debug!(model = %self.model, temperature = request.temperature, max_tokens = request.max_tokens, "Sending completion request");
        let response = tokio::time::timeout(self.timeout, self.client.chat().create(chat_request))
            .await
            .map_err(|_| LlmError::Timeout {
                after: self.timeout,
            })??;

        let answer = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(LlmError::EmptyResponse)?;

        if answer.trim().is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_openai::error::ApiError;
    use axum::{
        Json, Router,
        extract::State,
        response::{IntoResponse, Response},
        routing::post,
    };
    use serde_json::{Value, json};
    use std::sync::{Arc, Mutex};

    /// What the stub completion endpoint saw and how it answers.
    #[derive(Clone)]
    struct StubState {
        /// `None` keeps the request hanging forever.
        reply: Option<Value>,
        bodies: Arc<Mutex<Vec<Value>>>,
    }

    async fn stub_completions(State(state): State<StubState>, Json(body): Json<Value>) -> Response {
        state.bodies.lock().unwrap().push(body);
        match state.reply {
            Some(reply) => Json(reply).into_response(),
            None => std::future::pending::<Response>().await,
        }
    }

    /// Starts a completion endpoint on a random port and returns its API base.
    async fn start_stub(reply: Option<Value>) -> (String, Arc<Mutex<Vec<Value>>>) {
        let bodies = Arc::new(Mutex::new(Vec::new()));
        let router = Router::new()
            .route("/v1/chat/completions", post(stub_completions))
            .with_state(StubState {
                reply,
                bodies: bodies.clone(),
            });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        (format!("http://{addr}/v1"), bodies)
    }

    fn stub_client(api_base: &str, timeout: Duration) -> OpenAICompatibleClient {
        let config = OpenAIConfig::new()
            .with_api_base(api_base)
            .with_api_key("test-key");
        OpenAICompatibleClient::new(config, "gpt-test".to_string(), timeout)
    }

    fn completion(content: Option<&str>) -> Value {
        json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "created": 1,
            "model": "gpt-test",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }]
        })
    }

    fn api_error(code: Option<&str>, kind: Option<&str>) -> OpenAIError {
        OpenAIError::ApiError(ApiError {
            message: "boom".to_string(),
            r#type: kind.map(str::to_string),
            param: None,
            code: code.map(str::to_string),
        })
    }

    #[test]
    fn request_presets() {
        let c = GenerationRequest::classification("q");
        assert_eq!(c.temperature, 0.0);
        assert_eq!(c.max_tokens, 1);

        let g = GenerationRequest::creative("q", 256);
        assert_eq!(g.temperature, 0.7);
        assert_eq!(g.max_tokens, 256);
    }

    #[test]
    fn api_errors_are_classified() {
        assert!(matches!(
            LlmError::from(api_error(Some("invalid_api_key"), None)),
            LlmError::AuthFailed { .. }
        ));
        assert!(matches!(
            LlmError::from(api_error(Some("rate_limit_exceeded"), None)),
            LlmError::RateLimited { .. }
        ));
        assert!(matches!(
            LlmError::from(api_error(Some("model_not_found"), None)),
            LlmError::ModelNotAvailable { .. }
        ));
        assert!(matches!(
            LlmError::from(api_error(None, Some("invalid_request_error"))),
            LlmError::InvalidRequest { .. }
        ));
        assert!(matches!(
            LlmError::from(api_error(None, Some("server_error"))),
            LlmError::RequestFailed { .. }
        ));
    }

    #[test]
    fn retryable_classification() {
        assert!(LlmError::Timeout { after: Duration::from_secs(1) }.is_retryable());
        assert!(LlmError::RateLimited.is_retryable());
        assert!(LlmError::EmptyResponse.is_retryable());
        assert!(LlmError::RequestFailed { reason: "503".into() }.is_retryable());
        assert!(LlmError::InvalidResponse { reason: "bad json".into() }.is_retryable());

        assert!(!LlmError::AuthFailed { reason: "bad key".into() }.is_retryable());
        assert!(!LlmError::InvalidRequest { reason: "too long".into() }.is_retryable());
        assert!(!LlmError::ModelNotAvailable { model: "gpt-x".into() }.is_retryable());
    }

    #[test]
    fn unusable_answers_are_not_outages() {
        assert!(LlmError::Timeout { after: Duration::from_secs(1) }.is_outage());
        assert!(LlmError::RateLimited.is_outage());
        assert!(LlmError::RequestFailed { reason: "503".into() }.is_outage());

        assert!(!LlmError::EmptyResponse.is_outage());
        assert!(!LlmError::InvalidResponse { reason: "bad json".into() }.is_outage());
        assert!(!LlmError::AuthFailed { reason: "bad key".into() }.is_outage());
    }

    #[tokio::test]
    async fn sends_one_user_message_with_request_parameters() {
        let (api_base, bodies) = start_stub(Some(completion(Some("yes")))).await;
        let client = stub_client(&api_base, Duration::from_secs(5));

        let answer = client
            .generate(GenerationRequest::classification("Is this a yes?"))
            .await
            .unwrap();
        assert_eq!(answer, "yes");

        let bodies = bodies.lock().unwrap();
        assert_eq!(bodies.len(), 1);
        let body = &bodies[0];
        assert_eq!(body["model"], "gpt-test");
        assert_eq!(body["temperature"].as_f64(), Some(0.0));
        assert_eq!(body["max_completion_tokens"], 1);
        assert_eq!(body["messages"].as_array().map(Vec::len), Some(1));
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "Is this a yes?");
    }

    #[tokio::test]
    async fn blank_or_missing_content_is_an_empty_response() {
        let (api_base, _) = start_stub(Some(completion(Some("  \n ")))).await;
        let err = stub_client(&api_base, Duration::from_secs(5))
            .generate(GenerationRequest::creative("q", 10))
            .await
            .unwrap_err();
        assert_eq!(err, LlmError::EmptyResponse);

        let (api_base, _) = start_stub(Some(completion(None))).await;
        let err = stub_client(&api_base, Duration::from_secs(5))
            .generate(GenerationRequest::creative("q", 10))
            .await
            .unwrap_err();
        assert_eq!(err, LlmError::EmptyResponse);
    }

    #[tokio::test]
    async fn unanswered_request_times_out() {
        let (api_base, _) = start_stub(None).await;
        let timeout = Duration::from_millis(300);

        let err = stub_client(&api_base, timeout)
            .generate(GenerationRequest::creative("q", 10))
            .await
            .unwrap_err();
        assert_eq!(err, LlmError::Timeout { after: timeout });
    }
}
