//! Connection registry and fan-out to connected WebSocket clients.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use metrics::{counter, gauge};
use relay_core::Broadcaster;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::connection::{ClientConnection, SendStatus};
use crate::metrics::{WS_BROADCAST_DROPS_TOTAL, WS_CONNECTIONS_ACTIVE};

/// Maximum total lifetime message drops before forcibly disconnecting a slow client.
const MAX_TOTAL_DROPS: u64 = 100;

/// Registry of connected clients and the broadcast channel over them.
pub struct BroadcastManager {
    /// Connected clients indexed by connection ID.
    connections: RwLock<HashMap<String, Arc<ClientConnection>>>,
    /// Most recently registered connection still present.
    latest: parking_lot::Mutex<Option<String>>,
    /// Atomic counter tracking total connections (avoids read-locking for count queries).
    active_count: AtomicUsize,
}

impl BroadcastManager {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            latest: parking_lot::Mutex::new(None),
            active_count: AtomicUsize::new(0),
        }
    }

    /// Register a connection. Returns `false` (and changes nothing) when the
    /// id is already present.
    pub async fn add(&self, connection: Arc<ClientConnection>) -> bool {
        let mut conns = self.connections.write().await;
        if conns.contains_key(&connection.id) {
            debug!(conn_id = %connection.id, "connection already registered");
            return false;
        }
        let id = connection.id.clone();
        let _ = conns.insert(id.clone(), connection);
        *self.latest.lock() = Some(id);
        let count = self.active_count.fetch_add(1, Ordering::Relaxed) + 1;
        gauge!(WS_CONNECTIONS_ACTIVE).set(count as f64);
        true
    }

    /// Unregister a connection by ID. Returns whether it was present.
    pub async fn remove(&self, connection_id: &str) -> bool {
        let mut conns = self.connections.write().await;
        let removed = self.remove_locked(&mut conns, connection_id);
        drop(conns);
        removed
    }

    fn remove_locked(
        &self,
        conns: &mut HashMap<String, Arc<ClientConnection>>,
        connection_id: &str,
    ) -> bool {
        let Some(conn) = conns.remove(connection_id) else {
            return false;
        };
        conn.disconnect();
        {
            let mut latest = self.latest.lock();
            if latest.as_deref() == Some(connection_id) {
                *latest = None;
            }
        }
        let count = self.active_count.fetch_sub(1, Ordering::Relaxed) - 1;
        gauge!(WS_CONNECTIONS_ACTIVE).set(count as f64);
        true
    }

    /// Snapshot of the currently registered connections.
    pub async fn active_connections(&self) -> Vec<Arc<ClientConnection>> {
        self.connections.read().await.values().cloned().collect()
    }

    /// Look up one connection.
    pub async fn get(&self, connection_id: &str) -> Option<Arc<ClientConnection>> {
        self.connections.read().await.get(connection_id).cloned()
    }

    /// Id of the most recently registered connection, if it is still open.
    pub fn current_connection_id(&self) -> Option<String> {
        self.latest.lock().clone()
    }

    /// Number of active connections.
    pub fn connection_count(&self) -> usize {
        self.active_count.load(Ordering::Relaxed)
    }

    /// Send `message` to every registered connection.
    ///
    /// Dead connections are unregistered; slow ones are unregistered once
    /// they pass the drop threshold. Returns the number of connections the
    /// message was queued for.
    pub async fn broadcast_text(&self, message: &str) -> usize {
        let payload = Arc::new(message.to_string());
        let mut to_remove = Vec::new();
        let mut delivered = 0usize;
        {
            let conns = self.connections.read().await;
            for conn in conns.values() {
                match conn.send(Arc::clone(&payload)) {
                    SendStatus::Queued => delivered += 1,
                    SendStatus::Closed => {
                        debug!(conn_id = %conn.id, "connection closed during broadcast");
                        to_remove.push(conn.id.clone());
                    }
                    SendStatus::Full => {
                        counter!(WS_BROADCAST_DROPS_TOTAL).increment(1);
                        let drops = conn.drop_count();
                        if drops >= MAX_TOTAL_DROPS {
                            warn!(conn_id = %conn.id, drops, "disconnecting slow client");
                            to_remove.push(conn.id.clone());
                        } else {
                            warn!(
                                conn_id = %conn.id,
                                total_drops = drops,
                                "failed to send message to client (channel full)"
                            );
                        }
                    }
                }
            }
            debug!(recipients = conns.len(), delivered, "broadcast message");
        }
        if !to_remove.is_empty() {
            let mut conns = self.connections.write().await;
            for id in &to_remove {
                let _ = self.remove_locked(&mut conns, id);
            }
        }
        delivered
    }
}

impl Default for BroadcastManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Broadcaster for BroadcastManager {
    async fn broadcast(&self, message: &str) -> usize {
        self.broadcast_text(message).await
    }
}
