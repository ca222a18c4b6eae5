//! Contract for the external task executor.

use async_trait::async_trait;

/// Errors surfaced by a [`TaskExecutor`].
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    /// The executor ran but could not produce a result.
    #[error("executor failed: {0}")]
    Failed(String),

    /// A remote API rejected the request.
    #[error("api error (status {status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the response body.
        message: String,
    },

    /// The invocation exceeded the configured time limit.
    #[error("executor timed out after {timeout_ms}ms")]
    TimedOut {
        /// Configured limit in milliseconds.
        timeout_ms: u64,
    },

    /// The executor cannot run with the current configuration.
    #[error("executor misconfigured: {0}")]
    Misconfigured(String),
}

/// The opaque worker that performs one task.
///
/// The relay guarantees at most one `execute` call is in flight at a time,
/// so implementations may hold exclusive resources (a browser session, a
/// conversation) across a call.
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Run `task` and return a textual summary of the result.
    async fn execute(&self, task: &str) -> Result<String, ExecutorError>;

    /// Called after every invocation, successful or not, while exclusive
    /// access is still held.
    async fn after_task(&self) {}
}
