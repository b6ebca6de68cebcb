//! Remote git contents API settings.

use serde::{Deserialize, Serialize};

/// Where the authoritative copy of the documents lives.
///
/// Addresses `GET/PUT {api_url}/repos/{owner}/{repo}/contents/{path}` on a
/// Gitea (or GitHub-compatible) server.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RemoteSettings {
    /// Whether pull/push are available at all.
    pub enabled: bool,
    /// API base, e.g. `http://localhost:3000/api/v1`.
    pub api_url: String,
    /// Repository owner.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Branch read and written.
    pub branch: String,
    /// Roster path inside the repository.
    pub roster_path: String,
    /// Catalog path inside the repository.
    pub catalog_path: String,
    /// Basic-auth user.
    pub user: String,
    /// Basic-auth password or token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Timeout for content reads in milliseconds.
    pub get_timeout_ms: u64,
    /// Timeout for content writes in milliseconds.
    pub put_timeout_ms: u64,
    /// Commit message used when the caller gives none.
    pub default_commit_message: String,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            api_url: "http://localhost:3000/api/v1".to_string(),
            owner: "admin".to_string(),
            repo: "demo-tfm".to_string(),
            branch: "main".to_string(),
            roster_path: "edugitops/alumnos.yaml".to_string(),
            catalog_path: "edugitops/catalogo-servicios.yaml".to_string(),
            user: "admin".to_string(),
            password: None,
            get_timeout_ms: 5_000,
            put_timeout_ms: 10_000,
            default_commit_message: "Update alumnos.yaml from EduGitOps".to_string(),
        }
    }
}

impl RemoteSettings {
    /// Whether enough is set to talk to the remote.
    pub fn is_configured(&self) -> bool {
        self.enabled
            && !self.api_url.trim().is_empty()
            && !self.owner.trim().is_empty()
            && !self.repo.trim().is_empty()
    }
}
