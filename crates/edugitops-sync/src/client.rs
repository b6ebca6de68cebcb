//! Git hosting contents API client.
//!
//! Speaks the Gitea/GitHub `repos/{owner}/{repo}/contents/{path}` endpoint:
//! `GET ?ref=<branch>` returns `{content: <base64>, sha}`, `PUT` takes
//! `{content, message, branch, sha?}` and commits the new file.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use edugitops_settings::RemoteSettings;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::SyncError;

/// A file read from the remote.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteFile {
    /// Decoded UTF-8 text.
    pub text: String,
    /// Blob sha, needed to update the file.
    pub sha: Option<String>,
}

#[derive(Deserialize)]
struct ContentsResponse {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    sha: Option<String>,
}

#[derive(Serialize)]
struct PutRequest<'a> {
    content: String,
    message: &'a str,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

/// HTTP client for one repository branch.
pub struct ContentsClient {
    http: reqwest::Client,
    settings: RemoteSettings,
}

impl ContentsClient {
    /// Client for the repository described by `settings`.
    pub fn new(settings: RemoteSettings) -> Result<Self, SyncError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("edugitops/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(SyncError::Client)?;
        Ok(Self { http, settings })
    }

    /// Branch every request targets.
    pub fn branch(&self) -> &str {
        &self.settings.branch
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.settings.api_url.trim_end_matches('/'),
            self.settings.owner,
            self.settings.repo,
            path.trim_start_matches('/')
        )
    }

    async fn get_contents(&self, path: &str) -> Result<Option<ContentsResponse>, SyncError> {
        let url = self.url(path);
        debug!(%url, branch = %self.settings.branch, "fetching remote contents");

        let response = self
            .http
            .get(&url)
            .query(&[("ref", self.settings.branch.as_str())])
            .basic_auth(&self.settings.user, self.settings.password.as_deref())
            .timeout(Duration::from_millis(self.settings.get_timeout_ms))
            .send()
            .await
            .map_err(SyncError::Connection)?;

        let status = response.status().as_u16();
        if status == 404 {
            debug!(%url, "remote file not found");
            return Ok(None);
        }
        let body = response.text().await.map_err(SyncError::Connection)?;
        if status != 200 {
            return Err(SyncError::from_status(status, body));
        }

        serde_json::from_str(&body)
            .map(Some)
            .map_err(|e| SyncError::Decode(format!("unexpected contents response: {e}")))
    }

    /// Read and decode `path`. A missing file is `Ok(None)`.
    pub async fn fetch(&self, path: &str) -> Result<Option<RemoteFile>, SyncError> {
        let Some(contents) = self.get_contents(path).await? else {
            return Ok(None);
        };
        let encoded = contents
            .content
            .ok_or_else(|| SyncError::Decode(format!("{path} has no content field")))?;
        Ok(Some(RemoteFile {
            text: decode_content(&encoded)?,
            sha: contents.sha,
        }))
    }

    /// Current blob sha of `path`, or `None` when the file does not exist.
    ///
    /// An existing file reported without a sha is a [`SyncError::Decode`]:
    /// writing without one would overwrite it unconditionally.
    pub async fn current_sha(&self, path: &str) -> Result<Option<String>, SyncError> {
        match self.get_contents(path).await? {
            None => Ok(None),
            Some(contents) => contents
                .sha
                .filter(|sha| !sha.is_empty())
                .map(Some)
                .ok_or_else(|| SyncError::Decode(format!("{path} exists but has no sha"))),
        }
    }

    /// Commit `text` as the new content of `path`.
    ///
    /// Passing the previous `sha` updates the file; omitting it creates the
    /// file. Returns the response status (200 or 201).
    pub async fn put(
        &self,
        path: &str,
        text: &str,
        message: &str,
        sha: Option<&str>,
    ) -> Result<u16, SyncError> {
        let url = self.url(path);
        let request = PutRequest {
            content: STANDARD.encode(text.as_bytes()),
            message,
            branch: &self.settings.branch,
            sha,
        };
        debug!(%url, has_sha = sha.is_some(), bytes = text.len(), "writing remote contents");

        let response = self
            .http
            .put(&url)
            .basic_auth(&self.settings.user, self.settings.password.as_deref())
            .timeout(Duration::from_millis(self.settings.put_timeout_ms))
            .json(&request)
            .send()
            .await
            .map_err(SyncError::Connection)?;

        let status = response.status().as_u16();
        if matches!(status, 200 | 201) {
            return Ok(status);
        }
        let body = response.text().await.map_err(SyncError::Connection)?;
        Err(SyncError::from_status(status, body))
    }
}

/// Decode the base64 `content` of a contents response.
///
/// The API wraps the encoding at 60 columns, so whitespace is dropped first.
pub fn decode_content(encoded: &str) -> Result<String, SyncError> {
    let compact: String = encoded.split_whitespace().collect();
    let bytes = STANDARD
        .decode(compact)
        .map_err(|e| SyncError::Decode(format!("invalid base64: {e}")))?;
    String::from_utf8(bytes).map_err(|e| SyncError::Decode(format!("content is not UTF-8: {e}")))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
