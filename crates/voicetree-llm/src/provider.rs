//! LLM provider trait

use serde_json::Value;

/// Result type for LLM operations
pub type LlmResult<T> = Result<T, LlmError>;

/// LLM error types
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("authentication failed: {0}")]
    AuthFailed(String),

    #[error("rate limited: retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("malformed output: {0}")]
    MalformedOutput(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl LlmError {
    /// Transient errors are worth another attempt; schema violations are
    /// retried too, since the model may produce valid output next time.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LlmError::RateLimited { .. }
                | LlmError::Unavailable(_)
                | LlmError::Network(_)
                | LlmError::MalformedOutput(_)
        )
    }
}

/// A single completion request. The pipeline only ever needs one user turn;
/// conversation state lives in the prompts, not the transport.
#[derive(Clone, Debug)]
pub struct LlmRequest {
    pub model: String,
    pub prompt: String,
    /// JSON schema the response must conform to (provider-native format).
    pub response_schema: Option<Value>,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl LlmRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            response_schema: None,
            temperature: 0.3,
            max_output_tokens: 8192,
        }
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.response_schema = Some(schema);
        self
    }
}

/// LLM provider trait. One blocking-style call per request; the pipeline
/// awaits every call in place.
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Complete a request, returning the raw response text (JSON when a
    /// response schema was supplied).
    async fn complete(&self, request: LlmRequest) -> LlmResult<String>;
}
