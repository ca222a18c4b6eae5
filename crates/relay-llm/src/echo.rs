//! Executor that echoes the task back.

use async_trait::async_trait;
use relay_core::{ExecutorError, TaskExecutor};

/// Returns the task text unchanged. Useful for exercising the relay
/// without an API key.
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoExecutor;

#[async_trait]
impl TaskExecutor for EchoExecutor {
    fn name(&self) -> &str {
        "echo"
    }

    async fn execute(&self, task: &str) -> Result<String, ExecutorError> {
        Ok(task.to_string())
    }
}
