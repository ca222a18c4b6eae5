//! WebSocket connection management, broadcasting, and reply routing.
//!
//! ## Submodules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `connection` | Per-client handle: bounded outbound queue, drop count, cancellation |
//! | `broadcast` | Connection registry and fan-out to every client |
//! | `handler` | Per-connection read loop, writer task, and task pump |
//! | `replies` | Hands the next inbound frame to a waiting caller |
//!
//! ## Data Flow
//!
//! `handler` reads a frame → `replies` (if a waiter is pending) or the
//! normalizer → task pump → serializer → `broadcast` → every client's writer.

pub mod broadcast;
pub mod connection;
pub mod handler;
pub mod replies;
