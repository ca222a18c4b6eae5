//! # relay-server
//!
//! Axum WebSocket server for the task relay.
//!
//! - [`websocket::broadcast::BroadcastManager`]: connection registry and fan-out
//! - [`websocket::handler`]: per-connection read loop, writer, and task pump
//! - [`websocket::replies::ClientReplies`]: next-frame delivery to a waiting caller
//! - [`server`]: router (`/`, `/ws`, `/health`, `/metrics`, `/results/{id}`), bind, serve
//! - [`metrics`]: Prometheus recorder and metric names

#![deny(unsafe_code)]

pub mod errors;
pub mod metrics;
pub mod server;
pub mod state;
pub mod websocket;

pub use errors::{ReplyError, ServerError};
pub use server::{bind, build_router, serve};
pub use state::AppState;
pub use websocket::broadcast::BroadcastManager;
pub use websocket::replies::ClientReplies;
