//! Tracing subscriber bootstrap for relay binaries.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};

/// Install the global tracing subscriber.
///
/// The filter comes from `RUST_LOG` when set, otherwise from
/// `default_level` (e.g. `"info"` or `"relay_server=debug,info"`).
/// `json` switches the output to one JSON object per line.
pub fn init_subscriber(default_level: &str, json: bool) -> Result<(), TryInitError> {
    let filter = build_filter(default_level);
    let json_layer = json.then(|| tracing_subscriber::fmt::layer().json());
    let text_layer = (!json).then(|| tracing_subscriber::fmt::layer().with_target(true));
    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .try_init()
}

fn build_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}
