//! [`DocumentStore`] decorator that adds pull/push against the remote.

use std::fmt;

use edugitops_core::{Catalog, Roster, StudentRecord};
use edugitops_settings::RemoteSettings;
use edugitops_store::{Document, DocumentStore, StoreError};
use tracing::{info, warn};

use crate::client::ContentsClient;
use crate::errors::SyncError;

/// Outcome of the last pull, shown next to the data it refreshed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncStatus {
    /// Both documents were refreshed.
    Synced,
    /// One document was refreshed, the other kept its local copy.
    Partial,
    /// Neither document could be refreshed.
    Failed,
    /// Remote sync is disabled.
    NotConfigured,
}

impl SyncStatus {
    /// Whether every document came from the remote.
    pub fn is_synced(self) -> bool {
        self == Self::Synced
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Synced => f.write_str("synced"),
            Self::Partial => f.write_str("partial"),
            Self::Failed => f.write_str("failed"),
            Self::NotConfigured => f.write_str("not configured"),
        }
    }
}

/// Per-document result of a pull.
///
/// Documents are independent: a failure on one never rolls back the other.
#[derive(Debug)]
pub struct PullReport {
    /// Documents overwritten with the remote copy.
    pub pulled: Vec<Document>,
    /// Documents that kept their local copy, with the reason.
    pub failures: Vec<(Document, SyncError)>,
    configured: bool,
}

impl PullReport {
    fn not_configured() -> Self {
        Self {
            pulled: Vec::new(),
            failures: Vec::new(),
            configured: false,
        }
    }

    /// Overall status.
    pub fn status(&self) -> SyncStatus {
        if !self.configured {
            SyncStatus::NotConfigured
        } else if self.failures.is_empty() {
            SyncStatus::Synced
        } else if self.pulled.is_empty() {
            SyncStatus::Failed
        } else {
            SyncStatus::Partial
        }
    }
}

/// Result of a successful push.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PushOutcome {
    /// The remote file did not exist and was created.
    pub created: bool,
    /// HTTP status of the write (200 or 201).
    pub status: u16,
}

/// Wraps a local store, adding pull/push against the remote repository.
///
/// Reads and writes pass straight through to the wrapped store.
pub struct RemoteSync<S> {
    inner: S,
    client: Option<ContentsClient>,
    settings: RemoteSettings,
}

impl<S: DocumentStore> RemoteSync<S> {
    /// Decorate `inner`. With unconfigured `settings` the remote operations
    /// report [`SyncStatus::NotConfigured`] / [`SyncError::NotConfigured`].
    pub fn new(inner: S, settings: RemoteSettings) -> Result<Self, SyncError> {
        let client = if settings.is_configured() {
            Some(ContentsClient::new(settings.clone())?)
        } else {
            None
        };
        Ok(Self {
            inner,
            client,
            settings,
        })
    }

    /// The wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Whether pull/push can reach a remote.
    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    fn remote_path(&self, doc: Document) -> &str {
        match doc {
            Document::Roster => &self.settings.roster_path,
            Document::Catalog => &self.settings.catalog_path,
        }
    }

    /// Overwrite the local roster and catalog with the remote copies.
    pub async fn pull(&self) -> PullReport {
        let Some(client) = &self.client else {
            return PullReport::not_configured();
        };

        let mut report = PullReport {
            pulled: Vec::new(),
            failures: Vec::new(),
            configured: true,
        };
        for doc in [Document::Roster, Document::Catalog] {
            match self.pull_one(client, doc).await {
                Ok(()) => report.pulled.push(doc),
                Err(e) => {
                    warn!(document = %doc, error = %e, "pull failed, keeping local copy");
                    report.failures.push((doc, e));
                }
            }
        }

        info!(status = %report.status(), "pull finished");
        report
    }

    async fn pull_one(&self, client: &ContentsClient, doc: Document) -> Result<(), SyncError> {
        let path = self.remote_path(doc);
        let file = client
            .fetch(path)
            .await?
            .ok_or_else(|| SyncError::Status {
                status: 404,
                body: format!("{path} not found on branch {}", client.branch()),
            })?;
        self.inner.write_raw(doc, &file.text)?;
        info!(document = %doc, path, "document pulled");
        Ok(())
    }

    /// Commit the local roster text to the remote.
    ///
    /// The current remote sha is read first; a missing remote file is
    /// created. A stale sha is reported as the remote's rejection, never
    /// retried.
    pub async fn push(&self, message: Option<&str>) -> Result<PushOutcome, SyncError> {
        let client = self.client.as_ref().ok_or(SyncError::NotConfigured)?;

        let text = self.inner.raw_text(Document::Roster);
        if text.trim().is_empty() {
            return Err(SyncError::EmptyLocal);
        }

        let message = message
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(self.settings.default_commit_message.as_str());
        let path = self.remote_path(Document::Roster);

        let sha = client.current_sha(path).await?;
        let status = client.put(path, &text, message, sha.as_deref()).await?;

        let outcome = PushOutcome {
            created: sha.is_none(),
            status,
        };
        info!(path, created = outcome.created, status, "roster pushed");
        Ok(outcome)
    }
}

impl<S: DocumentStore> DocumentStore for RemoteSync<S> {
    fn load_roster(&self) -> Roster {
        self.inner.load_roster()
    }

    fn load_roster_for_update(&self) -> Result<Roster, StoreError> {
        self.inner.load_roster_for_update()
    }

    fn load_catalog(&self) -> Catalog {
        self.inner.load_catalog()
    }

    fn raw_text(&self, doc: Document) -> String {
        self.inner.raw_text(doc)
    }

    fn save_roster(&self, roster: &[StudentRecord]) -> Result<(), StoreError> {
        self.inner.save_roster(roster)
    }

    fn write_raw(&self, doc: Document, text: &str) -> Result<(), StoreError> {
        self.inner.write_raw(doc, text)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
