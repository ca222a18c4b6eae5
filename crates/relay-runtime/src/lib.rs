//! # relay-runtime
//!
//! Task serialization for the relay.
//!
//! - **Serializer**: [`TaskSerializer`] owns the execution gate and the
//!   completion watermark. Stale tasks are dropped before they queue;
//!   accepted tasks run one at a time against the configured executor.
//! - **Outcomes**: [`SubmitOutcome`] reports what happened to a submission.
//!
//! ## Crate Position
//!
//! Depends on: relay-core. Depended on by: relay-server, relay-agent.

#![deny(unsafe_code)]

pub mod serializer;
#[cfg(test)]
pub(crate) mod testutil;

pub use serializer::{
    COMPLETION_MARKER, FAILURE_PREFIX, PROCESSING_NOTICE, SubmitOutcome, TaskSerializer,
    completion_message,
};
