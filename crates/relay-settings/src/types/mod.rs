//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase")]` for the JSON file
//! format. Each type implements [`Default`] with production default values
//! and is marked `#[serde(default)]`, so partial JSON is accepted.

mod executor;
mod server;

pub use executor::*;
pub use server::*;

use serde::{Deserialize, Serialize};

/// Root settings type for the task relay.
///
/// # JSON Format
///
/// ```json
/// {
///   "server": { "host": "0.0.0.0", "port": 9000 },
///   "executor": { "kind": "echo" },
///   "logging": { "level": "debug" }
/// }
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RelaySettings {
    /// Settings schema version.
    pub version: String,
    /// Listening socket and connection tuning.
    pub server: ServerSettings,
    /// Which executor runs tasks and how.
    pub executor: ExecutorSettings,
    /// Log output configuration.
    pub logging: LoggingSettings,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_string(),
            server: ServerSettings::default(),
            executor: ExecutorSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl RelaySettings {
    /// Correct invalid values in place.
    ///
    /// Called automatically during loading. Out-of-range values are
    /// replaced with defaults and a warning rather than rejected.
    pub fn validate(&mut self) {
        if self.server.outbound_buffer == 0 {
            let fallback = ServerSettings::default().outbound_buffer;
            tracing::warn!("server.outboundBuffer must be positive, using {fallback}");
            self.server.outbound_buffer = fallback;
        }
        if self.server.host.trim().is_empty() {
            tracing::warn!("server.host is empty, using localhost");
            self.server.host = ServerSettings::default().host;
        }
        if self.executor.timeout_ms == Some(0) {
            tracing::warn!("executor.timeoutMs of 0 disables the timeout");
            self.executor.timeout_ms = None;
        }
        if self.executor.model.trim().is_empty() {
            self.executor.model = ExecutorSettings::default().model;
        }
    }
}

/// Logging configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}
