//! Server error types.

use std::io;

use thiserror::Error;

/// Failures starting or running the listener.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listening socket could not be bound.
    #[error("failed to bind {address}: {source}")]
    Bind {
        /// Address that was requested.
        address: String,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The accept loop ended with an error.
    #[error("server error: {0}")]
    Serve(#[from] io::Error),
}

/// Failures waiting for a client reply.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReplyError {
    /// No client is connected.
    #[error("no client connected")]
    NoClient,
    /// The client did not answer in time.
    #[error("no client response within {timeout_ms}ms")]
    TimedOut {
        /// Timeout that elapsed.
        timeout_ms: u64,
    },
    /// A newer waiter replaced this one, or the client went away.
    #[error("client response wait was superseded")]
    Superseded,
}
