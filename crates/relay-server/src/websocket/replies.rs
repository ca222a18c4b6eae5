//! Routing of the next inbound frame to a waiting caller.
//!
//! A caller asks for the next message from the most recently connected
//! client. While that request is pending, the client's next frame resolves it
//! instead of being submitted as a task.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, instrument};

use super::broadcast::BroadcastManager;
use crate::errors::ReplyError;

struct PendingReply {
    seq: u64,
    conn_id: String,
    tx: oneshot::Sender<String>,
}

/// Single-slot tracker for a pending client reply.
pub struct ClientReplies {
    registry: Arc<BroadcastManager>,
    pending: Mutex<Option<PendingReply>>,
    next_seq: AtomicU64,
}

impl ClientReplies {
    /// Create a tracker over the given registry.
    pub fn new(registry: Arc<BroadcastManager>) -> Self {
        Self {
            registry,
            pending: Mutex::new(None),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Wait for the next frame from the current client.
    ///
    /// A newer call replaces this one, which then fails with
    /// [`ReplyError::Superseded`].
    #[instrument(skip(self))]
    pub async fn wait_for_client_response(&self, timeout: Duration) -> Result<String, ReplyError> {
        let conn_id = self
            .registry
            .current_connection_id()
            .ok_or(ReplyError::NoClient)?;
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock();
            if pending.is_some() {
                debug!("replacing pending client reply");
            }
            *pending = Some(PendingReply {
                seq,
                conn_id: conn_id.clone(),
                tx,
            });
        }
        debug!(%conn_id, "waiting for client response");

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(_)) => Err(ReplyError::Superseded),
            Err(_) => {
                let mut pending = self.pending.lock();
                if pending.as_ref().is_some_and(|p| p.seq == seq) {
                    *pending = None;
                }
                Err(ReplyError::TimedOut {
                    timeout_ms: timeout.as_millis() as u64,
                })
            }
        }
    }

    /// Offer an inbound frame to the pending waiter.
    ///
    /// Returns `None` when the waiter took it, or the text back when it
    /// should be handled as a task.
    pub fn route(&self, conn_id: &str, text: String) -> Option<String> {
        let waiter = {
            let mut pending = self.pending.lock();
            match pending.as_ref() {
                Some(p) if p.conn_id == conn_id => pending.take(),
                _ => None,
            }
        };
        match waiter {
            Some(p) => p.tx.send(text).err(),
            None => Some(text),
        }
    }

    /// Fail the pending waiter if it is bound to `conn_id`.
    pub fn abandon(&self, conn_id: &str) {
        let mut pending = self.pending.lock();
        if pending.as_ref().is_some_and(|p| p.conn_id == conn_id) {
            debug!(%conn_id, "client left while a reply was pending");
            *pending = None;
        }
    }

    /// Whether a waiter is pending.
    pub fn is_pending(&self) -> bool {
        self.pending.lock().is_some()
    }
}
