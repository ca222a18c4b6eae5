//! # relay
//!
//! Task relay binary: wires settings, logging, metrics, the executor, and
//! the WebSocket server together.

#![deny(unsafe_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use relay_agent::cli::Cli;
use relay_agent::executor_factory::{API_KEY_ENV, build_executor};
use relay_core::ResultStore;
use relay_runtime::TaskSerializer;
use relay_server::{AppState, BroadcastManager};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings_path = cli
        .settings
        .clone()
        .unwrap_or_else(relay_settings::settings_path);
    let mut settings = relay_settings::load_settings_from_path(&settings_path)
        .with_context(|| format!("Failed to load settings from {}", settings_path.display()))?;
    cli.apply(&mut settings);

    relay_core::logging::init_subscriber(&settings.logging.level, settings.logging.json)
        .context("Failed to initialize logging")?;
    tracing::debug!(path = %settings_path.display(), "settings loaded");

    let metrics = match relay_server::metrics::install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!(error = %e, "metrics recorder unavailable, /metrics disabled");
            None
        }
    };

    let executor = build_executor(
        &settings.executor,
        std::env::var(API_KEY_ENV).ok(),
        reqwest::Client::new(),
    )
    .context("Failed to create executor")?;

    let timeout = settings.executor.timeout();
    let results = Arc::new(ResultStore::new());
    let mut state = AppState::new(Arc::new(BroadcastManager::new()), |broadcaster| {
        TaskSerializer::new(executor, broadcaster, results).with_timeout(timeout)
    })
    .with_outbound_buffer(settings.server.outbound_buffer);
    if let Some(handle) = metrics {
        state = state.with_metrics(handle);
    }

    let address = settings.server.bind_address();
    let listener = relay_server::bind(&address)
        .await
        .context("Failed to bind server")?;

    relay_server::serve(listener, state, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    })
    .await
    .context("Server stopped with an error")?;

    tracing::info!("Shutdown complete");
    Ok(())
}
