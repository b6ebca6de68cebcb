//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase", default)]`: missing
//! fields in the settings file get their [`Default`] value.

mod monitor;
mod remote;

pub use monitor::*;
pub use remote::*;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root settings type.
///
/// Loaded from `~/.edugitops/settings.json` with defaults applied for
/// missing fields. Environment variables override specific values.
///
/// ```json
/// {
///   "data": { "dir": "/srv/edugitops" },
///   "remote": { "owner": "profe", "repo": "labs" },
///   "monitor": { "hostName": "minikube" }
/// }
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EduSettings {
    /// Local document locations.
    pub data: DataSettings,
    /// Remote git contents API.
    pub remote: RemoteSettings,
    /// Checkmk rule translation.
    pub monitor: MonitorSettings,
    /// Log output.
    pub logging: LoggingSettings,
}

/// Local document locations.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DataSettings {
    /// Directory holding both documents. `None` means `~/.edugitops/data`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
    /// Roster file name inside `dir`.
    pub roster_file: String,
    /// Catalog file name inside `dir`.
    pub catalog_file: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            dir: None,
            roster_file: "alumnos.yaml".to_string(),
            catalog_file: "catalogo-servicios.yaml".to_string(),
        }
    }
}

impl DataSettings {
    /// Resolved data directory.
    pub fn dir(&self) -> PathBuf {
        self.dir.as_ref().map_or_else(
            || crate::loader::edugitops_home().join("data"),
            PathBuf::from,
        )
    }

    /// Full path of the roster document.
    pub fn roster_path(&self) -> PathBuf {
        self.dir().join(&self.roster_file)
    }

    /// Full path of the catalog document.
    pub fn catalog_path(&self) -> PathBuf {
        self.dir().join(&self.catalog_file)
    }
}

/// Log output settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default filter when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
