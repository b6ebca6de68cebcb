//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`EduSettings::default()`]
//! 2. If the settings file exists, deep-merge its values over the defaults
//! 3. Apply environment variable overrides (highest priority)
//!
//! The variable names (`GITEA_*`, `CHECKMK_*`) are the ones the lab
//! deployment already exports, so an existing `.env` keeps working.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::{Result, SettingsError};
use crate::types::EduSettings;

/// `~/.edugitops`.
pub fn edugitops_home() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".edugitops")
}

/// Resolve the path to the settings file (`~/.edugitops/settings.json`).
pub fn settings_path() -> PathBuf {
    edugitops_home().join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<EduSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<EduSettings> {
    let mut settings = load_file_layer(path)?;
    apply_env_overrides(&mut settings);
    check(&settings)?;
    Ok(settings)
}

fn load_file_layer(path: &Path) -> Result<EduSettings> {
    let defaults = serde_json::to_value(EduSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    Ok(serde_json::from_value(merged)?)
}

fn check(settings: &EduSettings) -> Result<()> {
    if settings.monitor.command_timeout_ms == 0 {
        return Err(SettingsError::InvalidValue(
            "monitor.commandTimeoutMs must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

/// Recursive deep merge of two JSON values.
///
/// - Objects are merged recursively (source overrides target per-key)
/// - Arrays and primitives are replaced entirely by source
/// - Null values in source are skipped (preserving target)
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply overrides from the process environment.
pub fn apply_env_overrides(settings: &mut EduSettings) {
    apply_overrides(settings, |key| std::env::var(key).ok());
}

/// Apply overrides read through `lookup`.
///
/// Empty values are ignored. Invalid numbers and booleans are logged and
/// ignored (the file/default value stays).
pub fn apply_overrides<F>(settings: &mut EduSettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let string = |key: &str| lookup(key).filter(|v| !v.is_empty());

    // ── Data ────────────────────────────────────────────────────────
    if let Some(v) = string("EDUGITOPS_DATA_DIR") {
        settings.data.dir = Some(v);
    }

    // ── Remote ──────────────────────────────────────────────────────
    if let Some(v) = string("EDUGITOPS_REMOTE_ENABLED") {
        match parse_bool(&v) {
            Some(b) => settings.remote.enabled = b,
            None => warn_invalid("EDUGITOPS_REMOTE_ENABLED", &v),
        }
    }
    if let Some(v) = string("GITEA_API_URL") {
        settings.remote.api_url = v;
    }
    if let Some(v) = string("GITEA_REPO_OWNER") {
        settings.remote.owner = v;
    }
    if let Some(v) = string("GITEA_REPO_NAME") {
        settings.remote.repo = v;
    }
    if let Some(v) = string("GITEA_BRANCH") {
        settings.remote.branch = v;
    }
    if let Some(v) = string("GITEA_FILE_PATH_REMOTE") {
        settings.remote.roster_path = v;
    }
    if let Some(v) = string("GITEA_CATALOGO_PATH_REMOTE") {
        settings.remote.catalog_path = v;
    }
    if let Some(v) = string("GITEA_USER") {
        settings.remote.user = v;
    }
    if let Some(v) = string("GITEA_PASSWORD") {
        settings.remote.password = Some(v);
    }

    // ── Monitor ─────────────────────────────────────────────────────
    if let Some(v) = string("EDUGITOPS_SCRIPTS_DIR") {
        settings.monitor.scripts_dir = v;
    }
    if let Some(v) = string("EDUGITOPS_ENV_FILE") {
        settings.monitor.env_file = Some(v);
    }
    if let Some(v) = string("EDUGITOPS_COMMAND_TIMEOUT_MS") {
        match parse_u64_range(&v, 1_000, 3_600_000) {
            Some(ms) => settings.monitor.command_timeout_ms = ms,
            None => warn_invalid("EDUGITOPS_COMMAND_TIMEOUT_MS", &v),
        }
    }
    let checkmk = [
        ("CHECKMK_HOST_NAME", &mut settings.monitor.host_name),
        ("CHECKMK_HOST_IP", &mut settings.monitor.host_ip),
        ("CHECKMK_API_USER", &mut settings.monitor.api_user),
        ("CHECKMK_API_SECRET", &mut settings.monitor.api_secret),
        ("CHECKMK_SITE", &mut settings.monitor.site),
        ("CHECKMK_URL", &mut settings.monitor.url),
    ];
    for (key, slot) in checkmk {
        if let Some(v) = string(key) {
            *slot = Some(v);
        }
    }

    // ── Logging ─────────────────────────────────────────────────────
    if let Some(v) = string("EDUGITOPS_LOG_LEVEL") {
        settings.logging.level = v;
    }
}

fn warn_invalid(key: &str, value: &str) {
    tracing::warn!(key, value, "invalid env var, ignoring");
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
