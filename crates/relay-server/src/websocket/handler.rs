//! Per-connection read loop, writer task, and task pump.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use metrics::{counter, histogram};
use relay_core::{Normalized, normalize, normalize_bytes};
use relay_runtime::{SubmitOutcome, TaskSerializer};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use super::connection::ClientConnection;
use crate::metrics::{
    WS_CONNECTION_DURATION_SECONDS, WS_CONNECTIONS_TOTAL, WS_DISCONNECTIONS_TOTAL,
};
use crate::state::AppState;

/// A data frame waiting for the task pump.
///
/// Frames are queued raw and normalized when dequeued, so a frame without a
/// timestamp is stamped after the connection's previous task has finished.
#[derive(Debug)]
enum Inbound {
    Text(String),
    Binary(Bytes),
}

impl Inbound {
    fn normalize(&self) -> Normalized {
        match self {
            Self::Text(text) => normalize(text),
            Self::Binary(bytes) => normalize_bytes(bytes),
        }
    }
}

/// Generate a connection id.
fn next_connection_id() -> String {
    format!("conn_{}", uuid::Uuid::now_v7().simple())
}

/// Serve one upgraded socket until the client leaves or is dropped.
#[instrument(skip_all, fields(conn_id = tracing::field::Empty))]
pub async fn handle_socket(socket: WebSocket, state: AppState) {
    let conn_id = next_connection_id();
    let _ = tracing::Span::current().record("conn_id", conn_id.as_str());

    let (mut ws_tx, mut ws_rx) = socket.split();
    let (out_tx, mut out_rx) = mpsc::channel::<Arc<String>>(state.outbound_buffer);
    let conn = Arc::new(ClientConnection::new(conn_id.clone(), out_tx));
    let _ = state.broadcast.add(Arc::clone(&conn)).await;
    counter!(WS_CONNECTIONS_TOTAL).increment(1);
    info!(connections = state.broadcast.connection_count(), "client connected");

    // Writer: drain the outbound queue into the socket.
    let writer_conn = Arc::clone(&conn);
    let writer = tokio::spawn(async move {
        loop {
            tokio::select! {
                () = writer_conn.disconnected() => break,
                msg = out_rx.recv() => {
                    let Some(text) = msg else { break };
                    if ws_tx.send(Message::Text(text.as_str().into())).await.is_err() {
                        debug!(conn_id = %writer_conn.id, "socket send failed");
                        break;
                    }
                }
            }
        }
        let _ = ws_tx.close().await;
        writer_conn.disconnect();
    });

    // Pump: submit this connection's tasks one at a time, in receipt order.
    // The queue is bounded; a full queue stops the read loop until the pump
    // catches up.
    let (task_tx, task_rx) = mpsc::channel::<Inbound>(state.outbound_buffer);
    let _pump = tokio::spawn(pump_tasks(Arc::clone(&state.serializer), task_rx));

    loop {
        let frame = tokio::select! {
            () = conn.disconnected() => break,
            frame = ws_rx.next() => frame,
        };
        let message = match frame {
            Some(Ok(message)) => message,
            Some(Err(e)) => {
                debug!(error = %e, "socket read failed");
                break;
            }
            None => break,
        };
        let inbound = match message {
            Message::Text(text) => match state.replies.route(&conn.id, text.to_string()) {
                Some(text) => Inbound::Text(text),
                None => {
                    debug!("frame delivered to pending reply");
                    continue;
                }
            },
            Message::Binary(bytes) => Inbound::Binary(bytes),
            Message::Close(_) => break,
            Message::Ping(_) | Message::Pong(_) => continue,
        };

        let queued = tokio::select! {
            () = conn.disconnected() => break,
            queued = task_tx.send(inbound) => queued,
        };
        if queued.is_err() {
            warn!("task pump stopped, dropping frame");
            break;
        }
    }

    conn.disconnect();
    let _ = state.broadcast.remove(&conn.id).await;
    state.replies.abandon(&conn.id);
    drop(task_tx);
    let _ = writer.await;

    counter!(WS_DISCONNECTIONS_TOTAL).increment(1);
    histogram!(WS_CONNECTION_DURATION_SECONDS).record(conn.age().as_secs_f64());
    info!(connections = state.broadcast.connection_count(), "client disconnected");
}

/// Normalize and submit queued frames one at a time. Frames already queued
/// when the client leaves are still submitted.
async fn pump_tasks(serializer: Arc<TaskSerializer>, mut rx: mpsc::Receiver<Inbound>) {
    while let Some(frame) = rx.recv().await {
        let normalized = frame.normalize();
        if !normalized.is_structured() {
            debug!("frame is not a structured task, using literal text");
        }
        if serializer.submit(normalized.into_record()).await == SubmitOutcome::ShuttingDown {
            break;
        }
    }
}
