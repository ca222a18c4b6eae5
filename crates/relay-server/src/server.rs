//! Router, listener binding, and the serve loop.

use std::future::Future;

use axum::Json;
use axum::Router;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, instrument};

use crate::errors::ServerError;
use crate::metrics;
use crate::state::AppState;
use crate::websocket::handler::handle_socket;

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(ws_handler))
        .route("/ws", get(ws_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/results/{id}", get(get_result).delete(reset_result))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Bind the listening socket.
pub async fn bind(address: &str) -> Result<TcpListener, ServerError> {
    TcpListener::bind(address)
        .await
        .map_err(|source| ServerError::Bind {
            address: address.to_string(),
            source,
        })
}

/// Serve until `shutdown` resolves.
///
/// On shutdown the serializer stops admitting tasks; a task already
/// executing runs to completion.
#[instrument(skip_all)]
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ServerError> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "relay listening");
    }
    let serializer = std::sync::Arc::clone(&state.serializer);
    let router = build_router(state);
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            shutdown.await;
            info!("shutdown signal received");
            serializer.shutdown();
        })
        .await?;
    info!("relay stopped");
    Ok(())
}

/// WebSocket upgrade handler.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Health check HTTP endpoint.
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "connections": state.broadcast.connection_count(),
        "busy": state.serializer.is_busy(),
        "lastCompleted": state.serializer.watermark().map(|w| w.to_rfc3339()),
    }))
}

/// Prometheus scrape endpoint.
async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, metrics::render(handle)),
        None => (
            StatusCode::NOT_FOUND,
            "metrics recorder not installed".to_string(),
        ),
    }
}

async fn get_result(Path(id): Path<String>, State(state): State<AppState>) -> impl IntoResponse {
    match state.serializer.results().get(&id) {
        Some(value) => (StatusCode::OK, Json(value)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "not found", "requestId": id})),
        )
            .into_response(),
    }
}

async fn reset_result(Path(id): Path<String>, State(state): State<AppState>) -> StatusCode {
    if state.serializer.results().reset(&id) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}
