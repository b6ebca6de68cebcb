//! Checkmk rule translation settings.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// How the monitoring sync reaches Checkmk.
///
/// The Checkmk REST calls live in shell scripts under `scripts_dir`; the
/// `CHECKMK_*` values below are exported to them unless the process
/// environment already defines the same key.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MonitorSettings {
    /// Directory containing the Checkmk scripts.
    pub scripts_dir: String,
    /// Script file names inside `scripts_dir`.
    pub scripts: MonitorScripts,
    /// Optional `KEY=VALUE` file layered over the environment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env_file: Option<String>,
    /// Per-command timeout in milliseconds.
    pub command_timeout_ms: u64,
    /// `CHECKMK_HOST_NAME`: the monitored host that owns every rule.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_name: Option<String>,
    /// `CHECKMK_HOST_IP`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_ip: Option<String>,
    /// `CHECKMK_API_USER`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_user: Option<String>,
    /// `CHECKMK_API_SECRET`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_secret: Option<String>,
    /// `CHECKMK_SITE`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
    /// `CHECKMK_URL`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            scripts_dir: "monitoring-scripts".to_string(),
            scripts: MonitorScripts::default(),
            env_file: None,
            command_timeout_ms: 120_000,
            host_name: None,
            host_ip: None,
            api_user: None,
            api_secret: None,
            site: None,
            url: None,
        }
    }
}

impl MonitorSettings {
    /// Full path of a script inside `scripts_dir`.
    pub fn script_path(&self, file: &str) -> PathBuf {
        PathBuf::from(&self.scripts_dir).join(file)
    }

    /// The `CHECKMK_*` variables that have a value, in a fixed order.
    pub fn checkmk_env(&self) -> Vec<(&'static str, String)> {
        [
            ("CHECKMK_HOST_NAME", &self.host_name),
            ("CHECKMK_HOST_IP", &self.host_ip),
            ("CHECKMK_API_USER", &self.api_user),
            ("CHECKMK_API_SECRET", &self.api_secret),
            ("CHECKMK_SITE", &self.site),
            ("CHECKMK_URL", &self.url),
        ]
        .into_iter()
        .filter_map(|(key, value)| {
            value
                .as_ref()
                .filter(|v| !v.is_empty())
                .map(|v| (key, v.clone()))
        })
        .collect()
    }
}

/// Script file names, one per external command.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MonitorScripts {
    /// Deletes every HTTP rule created by a previous run.
    pub delete_http_rules: String,
    /// Deletes every TCP rule created by a previous run.
    pub delete_tcp_rules: String,
    /// Deletes the monitored host.
    pub delete_host: String,
    /// Creates the monitored host.
    pub create_host: String,
    /// `<host> <url> <service>`.
    pub create_http_rule: String,
    /// `<host> <target> <port> <service>`.
    pub create_tcp_rule: String,
    /// Activates pending changes.
    pub activate: String,
}

impl Default for MonitorScripts {
    fn default() -> Self {
        Self {
            delete_http_rules: "checkmk-borrar-reglas-http2.sh".to_string(),
            delete_tcp_rules: "checkmk-borrar-reglas-tcp.sh".to_string(),
            delete_host: "checkmk-borrar-host.sh".to_string(),
            create_host: "checkmk-crear-host.sh".to_string(),
            create_http_rule: "checkmk-crear-regla-http2.sh".to_string(),
            create_tcp_rule: "checkmk-crear-regla-tcp.sh".to_string(),
            activate: "checkmk-activar-cambios.sh".to_string(),
        }
    }
}
