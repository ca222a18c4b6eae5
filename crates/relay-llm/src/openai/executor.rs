//! `OpenAI` executor implementing [`TaskExecutor`].
//!
//! One non-streaming chat completion per task: system prompt plus the task
//! as the user message. The first choice's content is the result.

use async_trait::async_trait;
use relay_core::{ExecutorError, TaskExecutor};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use tracing::{debug, error, instrument};

use super::types::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, DEFAULT_BASE_URL, OpenAiConfig,
    parse_api_error,
};

/// `OpenAI`-backed executor.
#[derive(Debug)]
pub struct OpenAiExecutor {
    config: OpenAiConfig,
    client: reqwest::Client,
}

impl OpenAiExecutor {
    /// Create a new executor. Fails when the API key is blank.
    pub fn new(config: OpenAiConfig) -> Result<Self, ExecutorError> {
        Self::with_client(config, reqwest::Client::new())
    }

    /// Create a new executor with a shared HTTP client.
    pub fn with_client(
        config: OpenAiConfig,
        client: reqwest::Client,
    ) -> Result<Self, ExecutorError> {
        if config.api_key.trim().is_empty() {
            return Err(ExecutorError::Misconfigured(
                "OPENAI_API_KEY is not set".to_string(),
            ));
        }
        Ok(Self { config, client })
    }

    /// Configured model id.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn build_headers(&self) -> Result<HeaderMap, ExecutorError> {
        let mut headers = HeaderMap::new();
        let _ = headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let auth = HeaderValue::from_str(&format!("Bearer {}", self.config.api_key))
            .map_err(|e| ExecutorError::Misconfigured(format!("invalid API key header: {e}")))?;
        let _ = headers.insert(AUTHORIZATION, auth);
        Ok(headers)
    }

    fn build_request(&self, task: &str) -> ChatCompletionRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(prompt) = self.config.system_prompt.as_deref().filter(|p| !p.is_empty()) {
            messages.push(ChatMessage {
                role: "system".into(),
                content: prompt.to_string(),
            });
        }
        messages.push(ChatMessage {
            role: "user".into(),
            content: task.to_string(),
        });
        ChatCompletionRequest {
            model: self.config.model.clone(),
            messages,
        }
    }

    fn endpoint(&self) -> String {
        let base = self
            .config
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/');
        format!("{base}/v1/chat/completions")
    }
}

#[async_trait]
impl TaskExecutor for OpenAiExecutor {
    fn name(&self) -> &str {
        "openai"
    }

    #[instrument(skip_all, fields(model = %self.config.model))]
    async fn execute(&self, task: &str) -> Result<String, ExecutorError> {
        let request = self.build_request(task);
        debug!(message_count = request.messages.len(), "sending chat completion");

        let response = self
            .client
            .post(self.endpoint())
            .headers(self.build_headers()?)
            .json(&request)
            .send()
            .await
            .map_err(|e| ExecutorError::Failed(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = parse_api_error(&body);
            error!(status = status.as_u16(), %message, "OpenAI API error");
            return Err(ExecutorError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ExecutorError::Failed(format!("invalid response body: {e}")))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ExecutorError::Failed("response contained no content".to_string()))
    }
}
