//! `OpenAI` executor configuration and chat-completions wire types.

use serde::{Deserialize, Serialize};

/// Default base URL for the `OpenAI` API.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Default model.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Executor configuration.
#[derive(Clone, Debug)]
pub struct OpenAiConfig {
    /// Model id.
    pub model: String,
    /// Bearer API key.
    pub api_key: String,
    /// Base URL override.
    pub base_url: Option<String>,
    /// System prompt prepended to every task.
    pub system_prompt: Option<String>,
}

impl OpenAiConfig {
    /// Configuration with default model and endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_key: api_key.into(),
            base_url: None,
            system_prompt: None,
        }
    }
}

/// One chat message.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    /// `system`, `user`, or `assistant`.
    pub role: String,
    /// Message text.
    pub content: String,
}

/// Request body for `POST /v1/chat/completions`.
#[derive(Clone, Debug, Serialize)]
pub struct ChatCompletionRequest {
    /// Model id.
    pub model: String,
    /// Conversation so far.
    pub messages: Vec<ChatMessage>,
}

/// Response body (only the fields the executor reads).
#[derive(Clone, Debug, Deserialize)]
pub struct ChatCompletionResponse {
    /// Candidate completions.
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

/// One candidate completion.
#[derive(Clone, Debug, Deserialize)]
pub struct ChatChoice {
    /// The assistant message.
    pub message: ChatChoiceMessage,
}

/// Assistant message within a choice.
#[derive(Clone, Debug, Deserialize)]
pub struct ChatChoiceMessage {
    /// Text content; absent for tool-call-only replies.
    #[serde(default)]
    pub content: Option<String>,
}

/// Error envelope returned with non-2xx statuses.
#[derive(Clone, Debug, Deserialize)]
pub struct ApiErrorBody {
    /// Error details.
    pub error: ApiErrorDetail,
}

/// Error details.
#[derive(Clone, Debug, Deserialize)]
pub struct ApiErrorDetail {
    /// Human-readable message.
    pub message: String,
}

/// Extract a readable message from an error response body.
pub fn parse_api_error(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| {
            if body.trim().is_empty() {
                "empty error response".to_string()
            } else {
                body.trim().to_string()
            }
        })
}
