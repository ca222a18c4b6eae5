//! Settings loading: defaults, JSON file deep-merge, environment overrides.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::errors::{Result, SettingsError};
use crate::types::{ExecutorKind, RelaySettings};

/// Env var pointing at an alternate settings file.
pub const SETTINGS_PATH_ENV: &str = "RELAY_SETTINGS";

/// Resolve the settings file path.
///
/// `$RELAY_SETTINGS` wins; otherwise `~/.relay/settings.json`
/// (or `./.relay/settings.json` when `HOME` is unset).
pub fn settings_path() -> PathBuf {
    if let Ok(path) = std::env::var(SETTINGS_PATH_ENV) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".relay").join("settings.json")
}

/// Load settings from the default path with environment overrides.
pub fn load_settings() -> Result<RelaySettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from `path`.
///
/// A missing file is not an error: defaults are used. The file is
/// deep-merged over the defaults, then environment overrides are applied
/// and the result validated.
pub fn load_settings_from_path(path: &Path) -> Result<RelaySettings> {
    let mut settings = read_file_layer(path)?;
    apply_env_overrides(&mut settings, |var| std::env::var(var).ok())?;
    settings.validate();
    Ok(settings)
}

fn read_file_layer(path: &Path) -> Result<RelaySettings> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(?path, "no settings file, using defaults");
            return Ok(RelaySettings::default());
        }
        Err(source) => {
            return Err(SettingsError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    let user: Value = serde_json::from_str(&raw)?;
    let defaults = serde_json::to_value(RelaySettings::default())?;
    let merged = deep_merge(defaults, user);
    let settings = serde_json::from_value(merged)?;
    tracing::debug!(?path, "settings file loaded");
    Ok(settings)
}

/// Recursively merge `overlay` into `base`.
///
/// Objects merge key by key; any other overlay value (including arrays)
/// replaces the base value. `null` in the overlay leaves the base intact.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                let merged = match base.remove(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value,
                };
                let _ = base.insert(key, merged);
            }
            Value::Object(base)
        }
        (base, Value::Null) => base,
        (_, overlay) => overlay,
    }
}

/// Apply environment overrides using `lookup` to read variables.
///
/// | Variable | Field |
/// |----------|-------|
/// | `WS_HOST` | `server.host` |
/// | `WS_PORT` | `server.port` |
/// | `OPENAI_MODEL` | `executor.model` |
/// | `OPENAI_BASE_URL` | `executor.baseUrl` |
/// | `RELAY_EXECUTOR` | `executor.kind` |
/// | `RELAY_EXECUTOR_TIMEOUT_MS` | `executor.timeoutMs` |
/// | `RELAY_LOG_LEVEL` | `logging.level` |
/// | `RELAY_LOG_JSON` | `logging.json` |
pub fn apply_env_overrides(
    settings: &mut RelaySettings,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<()> {
    let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

    if let Some(host) = get("WS_HOST") {
        settings.server.host = host;
    }
    if let Some(port) = get("WS_PORT") {
        settings.server.port = port
            .trim()
            .parse()
            .map_err(|_| SettingsError::InvalidEnv {
                var: "WS_PORT",
                value: port,
            })?;
    }
    if let Some(model) = get("OPENAI_MODEL") {
        settings.executor.model = model;
    }
    if let Some(url) = get("OPENAI_BASE_URL") {
        settings.executor.base_url = url;
    }
    if let Some(kind) = get("RELAY_EXECUTOR") {
        settings.executor.kind =
            ExecutorKind::from_name(&kind).ok_or(SettingsError::InvalidEnv {
                var: "RELAY_EXECUTOR",
                value: kind,
            })?;
    }
    if let Some(ms) = get("RELAY_EXECUTOR_TIMEOUT_MS") {
        settings.executor.timeout_ms =
            Some(ms.trim().parse().map_err(|_| SettingsError::InvalidEnv {
                var: "RELAY_EXECUTOR_TIMEOUT_MS",
                value: ms,
            })?);
    }
    if let Some(level) = get("RELAY_LOG_LEVEL") {
        settings.logging.level = level;
    }
    if let Some(json) = get("RELAY_LOG_JSON") {
        settings.logging.json = matches!(json.trim(), "1" | "true" | "yes");
    }
    Ok(())
}
