//! # relay-core
//!
//! Shared vocabulary for the task relay.
//!
//! - **Task records**: [`task::TaskRecord`], the normalized `{text, timestamp}` unit of work
//! - **Normalizer**: [`task::normalize`] turns any inbound frame into a record and never fails
//! - **Result store**: [`result_store::ResultStore`] keyed by request id
//! - **Seams**: [`executor::TaskExecutor`] (the opaque worker) and
//!   [`broadcast::Broadcaster`] (fan-out to connected clients)
//! - **Logging**: [`logging::init_subscriber`] for binaries
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by all other relay crates.

#![deny(unsafe_code)]

pub mod broadcast;
pub mod executor;
pub mod logging;
pub mod result_store;
pub mod task;

pub use broadcast::Broadcaster;
pub use executor::{ExecutorError, TaskExecutor};
pub use result_store::ResultStore;
pub use task::{Normalized, TaskRecord, normalize, normalize_bytes};
