//! Environment handed to the Checkmk scripts.
//!
//! Layers, lowest to highest priority:
//! 1. the process environment
//! 2. `CHECKMK_*` values from settings, only for keys the process lacks
//! 3. a `KEY=VALUE` env file

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::Path;

use edugitops_settings::MonitorSettings;
use tracing::{debug, warn};

/// Parse `KEY=VALUE` lines. Blank lines, `#` comments and lines without `=`
/// are ignored; keys and values are trimmed.
pub fn parse_env_file(text: &str) -> BTreeMap<String, String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .filter(|(key, _)| !key.is_empty())
        .collect()
}

/// Read and parse an env file; a missing or unreadable file is empty.
pub fn load_env_file(path: &Path) -> BTreeMap<String, String> {
    match std::fs::read_to_string(path) {
        Ok(text) => {
            let vars = parse_env_file(&text);
            debug!(path = %path.display(), count = vars.len(), "env file loaded");
            vars
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read env file, ignoring it");
            BTreeMap::new()
        }
    }
}

/// Keep the variables whose key and value are valid UTF-8.
///
/// Pass `std::env::vars_os()`; other pairs are dropped with a warning.
pub fn unicode_vars<I>(vars: I) -> Vec<(String, String)>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    vars.into_iter()
        .filter_map(|(key, value)| match (key.into_string(), value.into_string()) {
            (Ok(key), Ok(value)) => Some((key, value)),
            (key, _) => {
                let key = key.unwrap_or_else(|k| k.to_string_lossy().into_owned());
                warn!(key = %key, "skipping non-UTF-8 environment variable");
                None
            }
        })
        .collect()
}

/// Combine the three layers.
pub fn build_env<I>(
    process: I,
    settings: &MonitorSettings,
    file: BTreeMap<String, String>,
) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut env: BTreeMap<String, String> = process.into_iter().collect();
    for (key, value) in settings.checkmk_env() {
        let _ = env.entry(key.to_string()).or_insert(value);
    }
    env.extend(file);
    env
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
