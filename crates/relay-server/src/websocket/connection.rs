//! Per-client connection handle.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;

/// Result of queueing one outbound message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendStatus {
    /// Queued for the connection's writer.
    Queued,
    /// The outbound queue is full; the message was dropped.
    Full,
    /// The writer is gone; the connection is dead.
    Closed,
}

/// Handle to one connected client.
///
/// Outbound messages go through a bounded queue drained by the
/// connection's writer task, which keeps per-connection delivery order.
pub struct ClientConnection {
    /// Opaque connection id, unique per process.
    pub id: String,
    tx: mpsc::Sender<Arc<String>>,
    drops: AtomicU64,
    cancel: CancellationToken,
    connected_at: Instant,
}

impl ClientConnection {
    /// Create a handle around the writer's queue.
    pub fn new(id: String, tx: mpsc::Sender<Arc<String>>) -> Self {
        Self {
            id,
            tx,
            drops: AtomicU64::new(0),
            cancel: CancellationToken::new(),
            connected_at: Instant::now(),
        }
    }

    /// Queue a message without waiting.
    pub fn send(&self, message: Arc<String>) -> SendStatus {
        match self.tx.try_send(message) {
            Ok(()) => SendStatus::Queued,
            Err(TrySendError::Full(_)) => {
                let _ = self.drops.fetch_add(1, Ordering::Relaxed);
                SendStatus::Full
            }
            Err(TrySendError::Closed(_)) => SendStatus::Closed,
        }
    }

    /// Total messages dropped because the queue was full.
    pub fn drop_count(&self) -> u64 {
        self.drops.load(Ordering::Relaxed)
    }

    /// Ask the connection's tasks to shut down.
    pub fn disconnect(&self) {
        self.cancel.cancel();
    }

    /// Whether [`disconnect`](Self::disconnect) was called.
    pub fn is_disconnected(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves once the connection is asked to shut down.
    pub async fn disconnected(&self) {
        self.cancel.cancelled().await;
    }

    /// Time since the connection was established.
    pub fn age(&self) -> std::time::Duration {
        self.connected_at.elapsed()
    }
}
