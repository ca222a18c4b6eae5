//! Command-line flags. Flags win over every settings layer.

use std::path::PathBuf;

use clap::Parser;
use relay_settings::{ExecutorKind, RelaySettings};

/// Task relay server.
#[derive(Parser, Debug, Default)]
#[command(name = "relay", about = "Relay WebSocket tasks to a single serialized executor")]
pub struct Cli {
    /// Host to bind.
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind (0 for auto-assign).
    #[arg(long)]
    pub port: Option<u16>,

    /// Executor backend (`openai` or `echo`).
    #[arg(long, value_parser = parse_executor)]
    pub executor: Option<ExecutorKind>,

    /// Settings file (defaults to `$RELAY_SETTINGS` or `~/.relay/settings.json`).
    #[arg(long)]
    pub settings: Option<PathBuf>,
}

fn parse_executor(name: &str) -> Result<ExecutorKind, String> {
    ExecutorKind::from_name(name)
        .ok_or_else(|| format!("unknown executor '{name}' (expected openai or echo)"))
}

impl Cli {
    /// Overlay the flags that were given onto `settings`.
    pub fn apply(&self, settings: &mut RelaySettings) {
        if let Some(host) = &self.host {
            settings.server.host.clone_from(host);
        }
        if let Some(port) = self.port {
            settings.server.port = port;
        }
        if let Some(kind) = self.executor {
            settings.executor.kind = kind;
        }
    }
}
