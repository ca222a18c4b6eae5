use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default system prompt for the `OpenAI` executor.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an automation agent. Carry out the user's task \
     and reply with a short summary of the final result.";

/// Available executor backends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutorKind {
    /// `OpenAI` chat completions.
    #[default]
    OpenAi,
    /// Returns the task text unchanged.
    Echo,
}

impl ExecutorKind {
    /// Parse a name as used in env vars and CLI flags.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "openai" => Some(Self::OpenAi),
            "echo" => Some(Self::Echo),
            _ => None,
        }
    }
}

/// Executor settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExecutorSettings {
    /// Which backend runs tasks.
    pub kind: ExecutorKind,
    /// Model id for LLM-backed executors.
    pub model: String,
    /// API base URL (without the `/v1/...` path).
    pub base_url: String,
    /// System prompt sent with every task.
    pub system_prompt: String,
    /// Upper bound on one invocation. `None` waits indefinitely.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            kind: ExecutorKind::default(),
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com".to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            timeout_ms: None,
        }
    }
}

impl ExecutorSettings {
    /// Invocation timeout as a [`Duration`].
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}
