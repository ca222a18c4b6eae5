//! Fan-out seam between the task serializer and the connection layer.

use async_trait::async_trait;

/// Delivers one outbound text message to every connected client.
#[async_trait]
pub trait Broadcaster: Send + Sync {
    /// Send `message` to all current clients. Returns the number of
    /// clients the message was queued for. Never fails as a whole:
    /// per-client failures are handled by the implementation.
    async fn broadcast(&self, message: &str) -> usize;
}
