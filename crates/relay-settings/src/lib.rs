//! # relay-settings
//!
//! Configuration management with layered sources for the task relay.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`RelaySettings::default()`]
//! 2. **User file**: `~/.relay/settings.json` or `$RELAY_SETTINGS` (deep-merged over defaults)
//! 3. **Environment variables**: `WS_HOST`, `WS_PORT`, `OPENAI_*`, `RELAY_*` (highest priority)
//!
//! Settings are loaded once at startup and passed down explicitly; there is
//! no process-wide cache.
//!
//! # Usage
//!
//! ```no_run
//! let settings = relay_settings::load_settings().unwrap_or_default();
//! println!("listening on {}", settings.server.bind_address());
//! ```

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    apply_env_overrides, deep_merge, load_settings, load_settings_from_path, settings_path,
};
pub use types::*;
