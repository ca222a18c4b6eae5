//! Prometheus metrics recorder and `/metrics` endpoint handler.

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::info;

/// Install the Prometheus metrics recorder (global).
///
/// Returns the `PrometheusHandle` used to render the `/metrics` endpoint.
/// Call once at startup before any metrics are recorded; a second call fails.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    info!("prometheus metrics recorder installed");
    Ok(handle)
}

/// Render Prometheus text format from the installed recorder.
pub fn render(handle: &PrometheusHandle) -> String {
    handle.render()
}

// Metric name constants to avoid typos across crates.

/// Tasks submitted to the serializer (counter).
pub const TASKS_SUBMITTED_TOTAL: &str = "relay_tasks_submitted_total";
/// Tasks dropped as stale (counter).
pub const TASKS_STALE_TOTAL: &str = "relay_tasks_stale_total";
/// Tasks finished (counter, labels: status).
pub const TASKS_FINISHED_TOTAL: &str = "relay_tasks_finished_total";
/// Tasks currently holding the gate (gauge).
pub const TASKS_IN_FLIGHT: &str = "relay_tasks_in_flight";
/// Executor invocation duration seconds (histogram).
pub const TASK_DURATION_SECONDS: &str = "relay_task_duration_seconds";
/// WebSocket connections opened total (counter).
pub const WS_CONNECTIONS_TOTAL: &str = "ws_connections_total";
/// WebSocket disconnections total (counter).
pub const WS_DISCONNECTIONS_TOTAL: &str = "ws_disconnections_total";
/// Active WebSocket connections (gauge).
pub const WS_CONNECTIONS_ACTIVE: &str = "ws_connections_active";
/// Broadcast drops total (counter).
pub const WS_BROADCAST_DROPS_TOTAL: &str = "ws_broadcast_drops_total";
/// WebSocket connection duration seconds (histogram).
pub const WS_CONNECTION_DURATION_SECONDS: &str = "ws_connection_duration_seconds";
