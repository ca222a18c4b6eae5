//! Test doubles for the serializer's seams.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use relay_core::{Broadcaster, ExecutorError, TaskExecutor};
use tokio::sync::Notify;

/// Records every broadcast message in order.
#[derive(Default)]
pub struct RecordingBroadcaster {
    messages: Mutex<Vec<String>>,
}

impl RecordingBroadcaster {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }
}

#[async_trait]
impl Broadcaster for RecordingBroadcaster {
    async fn broadcast(&self, message: &str) -> usize {
        self.messages.lock().push(message.to_string());
        1
    }
}

/// What a [`ScriptedExecutor`] does on each call.
#[derive(Clone)]
pub enum Script {
    Reply(String),
    Fail(String),
    Sleep(Duration, String),
    /// Wait until the shared notify fires, then reply.
    Block(Arc<Notify>, String),
}

/// Executor that follows a script and tracks concurrency.
pub struct ScriptedExecutor {
    script: Script,
    pub calls: AtomicUsize,
    pub after_calls: AtomicUsize,
    pub tasks: Mutex<Vec<String>>,
    active: AtomicUsize,
    pub max_active: AtomicUsize,
}

impl ScriptedExecutor {
    pub fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: AtomicUsize::new(0),
            after_calls: AtomicUsize::new(0),
            tasks: Mutex::new(Vec::new()),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TaskExecutor for ScriptedExecutor {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn execute(&self, task: &str) -> Result<String, ExecutorError> {
        let _ = self.calls.fetch_add(1, Ordering::SeqCst);
        self.tasks.lock().push(task.to_string());
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        let _ = self.max_active.fetch_max(now_active, Ordering::SeqCst);

        let result = match &self.script {
            Script::Reply(r) => Ok(r.clone()),
            Script::Fail(e) => Err(ExecutorError::Failed(e.clone())),
            Script::Sleep(d, r) => {
                tokio::time::sleep(*d).await;
                Ok(r.clone())
            }
            Script::Block(notify, r) => {
                notify.notified().await;
                Ok(r.clone())
            }
        };

        let _ = self.active.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn after_task(&self) {
        let _ = self.after_calls.fetch_add(1, Ordering::SeqCst);
    }
}
