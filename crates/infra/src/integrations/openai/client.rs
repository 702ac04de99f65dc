/// OpenAI-backed command model.
use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use tasklane_core::ports::CommandModel;
use tasklane_domain::{Result as DomainResult, TasklaneError};
use tracing::debug;

use crate::http::HttpClient;

use super::types::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, OpenAiError, ResponseFormat,
};

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_MAX_TOKENS: u32 = 2_000;
const DEFAULT_TEMPERATURE: f32 = 0.2;

/// [`CommandModel`] implementation over the OpenAI Chat Completions API.
///
/// Returns the raw JSON object the model produced; validation is the
/// pipeline's job.
pub struct OpenAiCommandModel {
    http_client: HttpClient,
    api_key: String,
    model: String,
    api_url: String,
}

impl OpenAiCommandModel {
    /// Create a new client.
    ///
    /// # Arguments
    /// * `api_key` - OpenAI API key (required)
    /// * `http_client` - HTTP client with retry logic
    pub fn new(api_key: String, http_client: HttpClient) -> Self {
        Self {
            http_client,
            api_key,
            model: DEFAULT_MODEL.to_string(),
            api_url: OPENAI_API_URL.to_string(),
        }
    }

    /// Use a different chat model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Point the client at a different endpoint (for testing).
    #[cfg(test)]
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    async fn call_api(&self, system_prompt: &str, input: &str) -> Result<Value, OpenAiError> {
        let request_payload = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage { role: "system".to_string(), content: system_prompt.to_string() },
                ChatMessage { role: "user".to_string(), content: input.to_string() },
            ],
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            response_format: ResponseFormat { format_type: "json_object".to_string() },
        };

        let request_builder = self
            .http_client
            .request(Method::POST, &self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request_payload);

        // Retries are handled inside HttpClient.
        let response = self.http_client.send(request_builder).await.map_err(|err| match err {
            TasklaneError::Network(msg) => OpenAiError::Network(msg),
            TasklaneError::Internal(msg) => OpenAiError::Network(msg),
            other => OpenAiError::Network(format!("HTTP error: {other}")),
        })?;

        let status = response.status();
        debug!(status = status.as_u16(), "received model API response");

        if !status.is_success() {
            return Err(self.handle_error_status(status.as_u16(), response).await);
        }

        let chat_response: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|err| OpenAiError::InvalidSchema(format!("failed to parse response: {err}")))?;

        debug!(
            total_tokens = chat_response.usage.total_tokens,
            prompt_tokens = chat_response.usage.prompt_tokens,
            completion_tokens = chat_response.usage.completion_tokens,
            "model call complete"
        );

        let choice = chat_response
            .choices
            .first()
            .ok_or_else(|| OpenAiError::InvalidSchema("response contained no choices".to_string()))?;

        serde_json::from_str(&choice.message.content).map_err(|err| {
            OpenAiError::InvalidSchema(format!(
                "model content is not valid JSON: {err}. Content: {}",
                choice.message.content
            ))
        })
    }

    async fn handle_error_status(&self, status: u16, response: reqwest::Response) -> OpenAiError {
        let message = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());

        match status {
            401 | 403 => OpenAiError::Authentication(format!("invalid API key ({status})")),
            429 => OpenAiError::RateLimit(60),
            _ => OpenAiError::Api { status, message },
        }
    }
}

#[async_trait]
impl CommandModel for OpenAiCommandModel {
    async fn propose(&self, system_prompt: &str, input: &str) -> DomainResult<Value> {
        self.call_api(system_prompt, input).await.map_err(TasklaneError::from)
    }
}
