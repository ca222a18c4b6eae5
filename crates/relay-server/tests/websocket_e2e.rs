//! End-to-end tests: a real listener on `127.0.0.1:0` driven by
//! `tokio-tungstenite` clients.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use futures::{SinkExt, StreamExt};
use relay_core::{ExecutorError, ResultStore, TaskExecutor};
use relay_runtime::TaskSerializer;
use relay_server::{AppState, BroadcastManager, bind, serve};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const WAIT: Duration = Duration::from_secs(5);

/// Replies "done" to every task.
struct Done;

#[async_trait]
impl TaskExecutor for Done {
    fn name(&self) -> &str {
        "done"
    }

    async fn execute(&self, _task: &str) -> Result<String, ExecutorError> {
        Ok("done".to_string())
    }
}

/// Takes a moment, then reports which task it ran.
struct Slow;

#[async_trait]
impl TaskExecutor for Slow {
    fn name(&self) -> &str {
        "slow"
    }

    async fn execute(&self, task: &str) -> Result<String, ExecutorError> {
        tokio::time::sleep(Duration::from_millis(300)).await;
        Ok(format!("did {task}"))
    }
}

struct Harness {
    addr: SocketAddr,
    state: AppState,
    _shutdown: oneshot::Sender<()>,
}

async fn start() -> Harness {
    start_with(Arc::new(Done)).await
}

async fn start_with(executor: Arc<dyn TaskExecutor>) -> Harness {
    let listener = bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let state = AppState::new(Arc::new(BroadcastManager::new()), |broadcaster| {
        TaskSerializer::new(executor, broadcaster, Arc::new(ResultStore::new()))
    });
    let (tx, rx) = oneshot::channel::<()>();
    let _server = tokio::spawn(serve(listener, state.clone(), async move {
        let _ = rx.await;
    }));
    Harness {
        addr,
        state,
        _shutdown: tx,
    }
}

impl Harness {
    async fn connect(&self, path: &str) -> Client {
        let (ws, _) = connect_async(format!("ws://{}{path}", self.addr)).await.unwrap();
        ws
    }

    async fn wait_for_connections(&self, n: usize) {
        tokio::time::timeout(WAIT, async {
            while self.state.broadcast.connection_count() != n {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
    }
}

async fn next_text(ws: &mut Client) -> String {
    tokio::time::timeout(WAIT, async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => return text.to_string(),
                Some(Ok(_)) => {}
                other => panic!("connection ended: {other:?}"),
            }
        }
    })
    .await
    .unwrap()
}

async fn send(ws: &mut Client, text: &str) {
    ws.send(Message::Text(text.into())).await.unwrap();
}

#[tokio::test]
async fn structured_task_broadcasts_progress_and_result() {
    let h = start().await;
    let mut client = h.connect("/ws").await;
    h.wait_for_connections(1).await;

    send(
        &mut client,
        r#"{"text":"go to example.com","timestamp":"2024-01-01T00:00:00"}"#,
    )
    .await;

    assert_eq!(next_text(&mut client).await, "Processing...");
    assert_eq!(next_text(&mut client).await, "done 🚀");

    let floor = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    tokio::time::timeout(WAIT, async {
        while h.state.serializer.watermark().is_none_or(|w| w <= floor) {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn broadcast_fans_out_to_idle_client() {
    let h = start().await;
    let mut a = h.connect("/ws").await;
    let mut b = h.connect("/").await;
    h.wait_for_connections(2).await;

    send(&mut a, r#"{"text":"task from a"}"#).await;

    for client in [&mut a, &mut b] {
        assert_eq!(next_text(client).await, "Processing...");
        assert_eq!(next_text(client).await, "done 🚀");
    }
}

#[tokio::test]
async fn plain_text_is_dispatched() {
    let h = start().await;
    let mut client = h.connect("/ws").await;
    h.wait_for_connections(1).await;

    send(&mut client, "hello").await;
    assert_eq!(next_text(&mut client).await, "Processing...");
    assert_eq!(next_text(&mut client).await, "done 🚀");
}

#[tokio::test]
async fn plain_tasks_sent_back_to_back_both_run() {
    let h = start_with(Arc::new(Slow)).await;
    let mut client = h.connect("/ws").await;
    h.wait_for_connections(1).await;

    // The second task arrives while the first is still executing.
    send(&mut client, "first").await;
    send(&mut client, "second").await;

    assert_eq!(next_text(&mut client).await, "Processing...");
    assert_eq!(next_text(&mut client).await, "did first 🚀");
    assert_eq!(next_text(&mut client).await, "Processing...");
    assert_eq!(next_text(&mut client).await, "did second 🚀");
}

#[tokio::test]
async fn stale_task_is_dropped_silently() {
    let h = start().await;
    let mut client = h.connect("/ws").await;
    h.wait_for_connections(1).await;

    send(&mut client, "first").await;
    assert_eq!(next_text(&mut client).await, "Processing...");
    assert_eq!(next_text(&mut client).await, "done 🚀");
    tokio::time::timeout(WAIT, async {
        while h.state.serializer.watermark().is_none() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    // Same connection, so the pump handles these in order: the stale one
    // produces nothing and the fresh one is the next thing broadcast.
    send(
        &mut client,
        r#"{"text":"old","timestamp":"2000-01-01T00:00:00Z","requestId":"old-1"}"#,
    )
    .await;
    send(&mut client, r#"{"text":"new","requestId":"new-1"}"#).await;

    assert_eq!(next_text(&mut client).await, "Processing...");
    assert_eq!(next_text(&mut client).await, "done 🚀");
    assert!(h.state.serializer.results().get("old-1").is_none());
}

#[tokio::test]
async fn pending_reply_takes_next_frame() {
    let h = start().await;
    let mut client = h.connect("/ws").await;
    h.wait_for_connections(1).await;

    let replies = Arc::clone(&h.state.replies);
    let waiter = tokio::spawn(async move { replies.wait_for_client_response(WAIT).await });
    tokio::time::timeout(WAIT, async {
        while !h.state.replies.is_pending() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    send(&mut client, "yes").await;
    assert_eq!(waiter.await.unwrap().unwrap(), "yes");

    // The reply was not treated as a task.
    send(&mut client, "real task").await;
    assert_eq!(next_text(&mut client).await, "Processing...");
    assert_eq!(next_text(&mut client).await, "done 🚀");
    assert!(h.state.serializer.results().len() <= 1);
}

#[tokio::test]
async fn health_and_results_over_http() {
    let h = start().await;
    let mut client = h.connect("/ws").await;
    h.wait_for_connections(1).await;

    let health: serde_json::Value = reqwest::get(format!("http://{}/health", h.addr))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["connections"], 1);

    send(&mut client, r#"{"text":"x","requestId":"req-42"}"#).await;
    assert_eq!(next_text(&mut client).await, "Processing...");
    assert_eq!(next_text(&mut client).await, "done 🚀");

    let url = format!("http://{}/results/req-42", h.addr);
    let entry = tokio::time::timeout(WAIT, async {
        loop {
            let response = reqwest::get(&url).await.unwrap();
            if response.status() == 200 {
                return response.json::<serde_json::Value>().await.unwrap();
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();
    assert_eq!(entry["status"], "completed");
    assert_eq!(entry["result"], "done");

    let deleted = reqwest::Client::new().delete(&url).send().await.unwrap();
    assert_eq!(deleted.status(), 204);
    assert_eq!(reqwest::get(&url).await.unwrap().status(), 404);
}

#[tokio::test]
async fn disconnect_unregisters_client() {
    let h = start().await;
    let mut client = h.connect("/ws").await;
    h.wait_for_connections(1).await;

    client.close(None).await.unwrap();
    h.wait_for_connections(0).await;
    assert!(h.state.broadcast.current_connection_id().is_none());
}

#[tokio::test]
async fn bind_failure_is_reported() {
    let h = start().await;
    let err = bind(&h.addr.to_string()).await.unwrap_err();
    assert!(err.to_string().starts_with("failed to bind"));
}
