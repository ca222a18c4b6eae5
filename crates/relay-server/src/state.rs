//! Shared state handed to every route and connection.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use relay_core::Broadcaster;
use relay_runtime::TaskSerializer;

use crate::websocket::broadcast::BroadcastManager;
use crate::websocket::replies::ClientReplies;

/// Default per-connection outbound queue depth.
pub const DEFAULT_OUTBOUND_BUFFER: usize = 256;

/// Shared application state passed to Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Connection registry and broadcast channel.
    pub broadcast: Arc<BroadcastManager>,
    /// Execution gate and completion watermark.
    pub serializer: Arc<TaskSerializer>,
    /// Pending client reply slot.
    pub replies: Arc<ClientReplies>,
    /// Prometheus handle for `/metrics`, when a recorder is installed.
    pub metrics: Option<PrometheusHandle>,
    /// Per-connection outbound queue depth.
    pub outbound_buffer: usize,
}

impl AppState {
    /// Wire a serializer to a broadcast manager.
    ///
    /// `make_serializer` receives the broadcaster the serializer must emit
    /// through, so both share one registry.
    pub fn new(
        broadcast: Arc<BroadcastManager>,
        make_serializer: impl FnOnce(Arc<dyn Broadcaster>) -> TaskSerializer,
    ) -> Self {
        let serializer = Arc::new(make_serializer(Arc::clone(&broadcast) as Arc<dyn Broadcaster>));
        let replies = Arc::new(ClientReplies::new(Arc::clone(&broadcast)));
        Self {
            broadcast,
            serializer,
            replies,
            metrics: None,
            outbound_buffer: DEFAULT_OUTBOUND_BUFFER,
        }
    }

    /// Attach a Prometheus handle.
    #[must_use]
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Override the outbound queue depth. Zero keeps the default.
    #[must_use]
    pub fn with_outbound_buffer(mut self, depth: usize) -> Self {
        if depth > 0 {
            self.outbound_buffer = depth;
        }
        self
    }
}
