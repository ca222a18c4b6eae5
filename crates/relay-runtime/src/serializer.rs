//! Task serializer: single-flight execution gate with a completion watermark.
//!
//! States cycle `Idle → Dispatching → Idle`. A submission is checked against
//! the watermark first; a stale one is dropped without touching the gate. An
//! accepted one waits for the gate (FIFO), broadcasts a processing notice,
//! runs the executor, broadcasts the result or a failure notice, advances the
//! watermark to the completion time, and releases the gate.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use metrics::{counter, gauge, histogram};
use parking_lot::Mutex;
use relay_core::{Broadcaster, ExecutorError, ResultStore, TaskExecutor, TaskRecord};
use serde_json::json;
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

/// Interim notice broadcast when a task starts.
pub const PROCESSING_NOTICE: &str = "Processing...";

/// Decorative suffix appended to successful results.
pub const COMPLETION_MARKER: &str = "🚀";

/// Prefix of the notice broadcast when the executor fails.
pub const FAILURE_PREFIX: &str = "Task failed:";

/// Completion broadcast for a successful result.
pub fn completion_message(result: &str) -> String {
    format!("{result} {COMPLETION_MARKER}")
}

/// What happened to one submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The task predates the last completion and was dropped unexecuted.
    Stale {
        /// Watermark the task was compared against.
        watermark: DateTime<Utc>,
    },
    /// The executor returned a result.
    Completed {
        /// Executor output (without the completion marker).
        result: String,
    },
    /// The executor failed or timed out.
    Failed {
        /// Error description as broadcast to clients.
        error: String,
    },
    /// The serializer was shut down before the task reached the gate.
    ShuttingDown,
}

/// Decrements the in-flight count on every exit path, including cancellation.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        let now = counter.fetch_add(1, Ordering::SeqCst) + 1;
        debug_assert_eq!(now, 1, "more than one task in flight");
        gauge!("relay_tasks_in_flight").set(now as f64);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let now = self.0.fetch_sub(1, Ordering::SeqCst) - 1;
        gauge!("relay_tasks_in_flight").set(now as f64);
    }
}

/// Serializes task execution across all connections.
pub struct TaskSerializer {
    executor: Arc<dyn TaskExecutor>,
    broadcaster: Arc<dyn Broadcaster>,
    results: Arc<ResultStore>,
    /// Capacity-1 gate; the permit is held for the whole dispatch.
    gate: Semaphore,
    /// Completion time of the most recently finished task.
    watermark: Mutex<Option<DateTime<Utc>>>,
    in_flight: AtomicUsize,
    executor_timeout: Option<Duration>,
}

impl TaskSerializer {
    /// Create a serializer with no executor timeout.
    pub fn new(
        executor: Arc<dyn TaskExecutor>,
        broadcaster: Arc<dyn Broadcaster>,
        results: Arc<ResultStore>,
    ) -> Self {
        Self {
            executor,
            broadcaster,
            results,
            gate: Semaphore::new(1),
            watermark: Mutex::new(None),
            in_flight: AtomicUsize::new(0),
            executor_timeout: None,
        }
    }

    /// Bound each executor invocation. `None` waits indefinitely.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.executor_timeout = timeout;
        self
    }

    /// Current completion watermark.
    pub fn watermark(&self) -> Option<DateTime<Utc>> {
        *self.watermark.lock()
    }

    /// Whether a task currently holds the gate.
    pub fn is_busy(&self) -> bool {
        self.gate.available_permits() == 0
    }

    /// Number of executor invocations in progress (0 or 1).
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Shared result store entries are written to.
    pub fn results(&self) -> &Arc<ResultStore> {
        &self.results
    }

    /// Stop accepting work. Queued and future submissions return
    /// [`SubmitOutcome::ShuttingDown`]; a running task finishes normally.
    pub fn shutdown(&self) {
        info!("task serializer shutting down");
        self.gate.close();
    }

    /// The watermark `record` is stale against, if any.
    fn stale_against(&self, record: &TaskRecord) -> Option<DateTime<Utc>> {
        let watermark = *self.watermark.lock();
        watermark.filter(|watermark| record.timestamp() < *watermark)
    }

    /// Submit one task and wait for it to be dropped or finished.
    #[instrument(skip_all, fields(request_id = record.request_id()))]
    pub async fn submit(&self, record: TaskRecord) -> SubmitOutcome {
        counter!("relay_tasks_submitted_total").increment(1);

        if let Some(watermark) = self.stale_against(&record) {
            counter!("relay_tasks_stale_total").increment(1);
            info!(
                task = record.text(),
                timestamp = %record.timestamp(),
                %watermark,
                "discarding outdated task"
            );
            return SubmitOutcome::Stale { watermark };
        }

        let Ok(_permit) = self.gate.acquire().await else {
            debug!("gate closed, rejecting task");
            return SubmitOutcome::ShuttingDown;
        };
        let _in_flight = InFlight::enter(&self.in_flight);

        info!(task = record.text(), timestamp = %record.timestamp(), "received task");
        let _ = self.broadcaster.broadcast(PROCESSING_NOTICE).await;

        let started = Instant::now();
        let result = self.invoke(record.text()).await;
        self.executor.after_task().await;
        histogram!("relay_task_duration_seconds").record(started.elapsed().as_secs_f64());

        let outcome = match result {
            Ok(result) => {
                info!(result = %result, "task completed");
                counter!("relay_tasks_finished_total", "status" => "completed").increment(1);
                let _ = self
                    .broadcaster
                    .broadcast(&completion_message(&result))
                    .await;
                self.results.set(
                    record.request_id(),
                    json!({
                        "status": "completed",
                        "task": record.text(),
                        "result": result,
                        "finishedAt": Utc::now().to_rfc3339(),
                    }),
                );
                SubmitOutcome::Completed { result }
            }
            Err(e) => {
                let error = e.to_string();
                warn!(error = %error, "task failed");
                counter!("relay_tasks_finished_total", "status" => "failed").increment(1);
                let _ = self
                    .broadcaster
                    .broadcast(&format!("{FAILURE_PREFIX} {error}"))
                    .await;
                self.results.set(
                    record.request_id(),
                    json!({
                        "status": "failed",
                        "task": record.text(),
                        "error": error,
                        "finishedAt": Utc::now().to_rfc3339(),
                    }),
                );
                SubmitOutcome::Failed { error }
            }
        };

        *self.watermark.lock() = Some(Utc::now());
        outcome
    }

    async fn invoke(&self, task: &str) -> Result<String, ExecutorError> {
        debug!(executor = self.executor.name(), "invoking executor");
        match self.executor_timeout {
            Some(limit) => tokio::time::timeout(limit, self.executor.execute(task))
                .await
                .unwrap_or(Err(ExecutorError::TimedOut {
                    timeout_ms: limit.as_millis() as u64,
                })),
            None => self.executor.execute(task).await,
        }
    }
}
