/// OpenAI Chat Completions API types.
use serde::{Deserialize, Serialize};
use tasklane_domain::TasklaneError;

/// OpenAI API error types
#[derive(Debug, thiserror::Error)]
pub enum OpenAiError {
    /// Network-level error (connection failed, timeout, etc.)
    #[error("Network error: {0}")]
    Network(String),

    /// OpenAI API returned an error response
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Rate limit exceeded - should retry after delay
    #[error("Rate limit exceeded (retry after {0}s)")]
    RateLimit(u64),

    /// Authentication failed (invalid API key)
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Response body doesn't match expected schema
    #[error("Invalid response schema: {0}")]
    InvalidSchema(String),
}

impl From<OpenAiError> for TasklaneError {
    fn from(value: OpenAiError) -> Self {
        match value {
            OpenAiError::Network(msg) => TasklaneError::Network(msg),
            OpenAiError::Api { status, message } => {
                TasklaneError::Network(format!("model API error ({status}): {message}"))
            }
            OpenAiError::RateLimit(secs) => {
                TasklaneError::Network(format!("model rate limited, retry after {secs}s"))
            }
            OpenAiError::Authentication(msg) => {
                TasklaneError::InvalidInput(format!("model authentication failed: {msg}"))
            }
            OpenAiError::InvalidSchema(msg) => TasklaneError::Validation(msg),
        }
    }
}

/// Internal types for the Chat Completions API
#[derive(Debug, Serialize)]
pub(crate) struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ResponseFormat {
    #[serde(rename = "type")]
    pub format_type: String,
}

/// Response from the Chat Completions API
#[derive(Debug, Deserialize)]
pub(crate) struct ChatCompletionResponse {
    pub choices: Vec<Choice>,
    pub usage: Usage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Choice {
    pub message: Message,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Message {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Usage {
    pub total_tokens: i32,
    pub prompt_tokens: i32,
    pub completion_tokens: i32,
}
