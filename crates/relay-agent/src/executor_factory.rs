//! Executor selection from settings.

use std::sync::Arc;

use relay_core::{ExecutorError, TaskExecutor};
use relay_llm::{EchoExecutor, OpenAiConfig, OpenAiExecutor};
use relay_settings::{ExecutorKind, ExecutorSettings};
use tracing::info;

/// Environment variable holding the `OpenAI` API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Build the configured executor.
///
/// `api_key` is only consulted for the `openai` backend, where a missing or
/// blank key is [`ExecutorError::Misconfigured`].
pub fn build_executor(
    settings: &ExecutorSettings,
    api_key: Option<String>,
    client: reqwest::Client,
) -> Result<Arc<dyn TaskExecutor>, ExecutorError> {
    match settings.kind {
        ExecutorKind::Echo => {
            info!("using echo executor");
            Ok(Arc::new(EchoExecutor))
        }
        ExecutorKind::OpenAi => {
            let config = OpenAiConfig {
                model: settings.model.clone(),
                api_key: api_key.unwrap_or_default(),
                base_url: Some(settings.base_url.clone()),
                system_prompt: Some(settings.system_prompt.clone()),
            };
            let executor = OpenAiExecutor::with_client(config, client)?;
            info!(model = executor.model(), "using OpenAI executor");
            Ok(Arc::new(executor))
        }
    }
}
