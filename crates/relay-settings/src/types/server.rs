use serde::{Deserialize, Serialize};

/// Listening socket and connection settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Host or IP to bind.
    pub host: String,
    /// TCP port to bind.
    pub port: u16,
    /// Per-connection outbound queue depth before messages are dropped.
    pub outbound_buffer: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8765,
            outbound_buffer: 256,
        }
    }
}

impl ServerSettings {
    /// `host:port` string suitable for `TcpListener::bind`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
