//! # edugitops
//!
//! One entry point over the whole system: roster CRUD, raw-text validation,
//! remote pull/push and the Checkmk monitoring sync.
//!
//! [`EduGitOps`] owns a local YAML store wrapped in the remote sync
//! decorator; every call works on freshly loaded documents, so the facade
//! itself holds no roster state.

#![deny(unsafe_code)]

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

pub use edugitops_core::{
    Catalog, CatalogEntry, CheckDescriptor, Protocol, Roster, StudentRecord, ValidationError,
};
pub use edugitops_monitor::{
    CommandOutput, CommandRunner, CommandSpec, MonitorError, RunReport, RunState, Step,
    TokioCommandRunner,
};
pub use edugitops_settings::EduSettings;
pub use edugitops_store::{Document, DocumentStore, LocalStore, Outcome, RosterError, StoreError};
pub use edugitops_sync::{PullReport, PushOutcome, SyncError, SyncStatus};

use edugitops_monitor::MonitorSync;
use edugitops_store::RosterManager;
use edugitops_sync::RemoteSync;

type Store = Arc<RemoteSync<LocalStore>>;

/// The core-facing API.
pub struct EduGitOps<R = TokioCommandRunner> {
    store: Store,
    roster: RosterManager<Store>,
    monitor: MonitorSync<R>,
}

impl EduGitOps<TokioCommandRunner> {
    /// Wire everything from `settings`, running Checkmk scripts as real
    /// processes.
    pub fn from_settings(settings: &EduSettings) -> Result<Self, SyncError> {
        let runner =
            TokioCommandRunner::new(Duration::from_millis(settings.monitor.command_timeout_ms));
        Self::with_runner(settings, runner)
    }
}

impl<R: CommandRunner> EduGitOps<R> {
    /// Wire everything from `settings` with a custom command runner.
    ///
    /// Fails only when the remote HTTP client cannot be built.
    pub fn with_runner(settings: &EduSettings, runner: R) -> Result<Self, SyncError> {
        let local = LocalStore::new(settings.data.roster_path(), settings.data.catalog_path());
        let store = Arc::new(RemoteSync::new(local, settings.remote.clone())?);
        Ok(Self {
            roster: RosterManager::new(Arc::clone(&store)),
            store,
            monitor: MonitorSync::new(runner, settings.monitor.clone()),
        })
    }

    /// The command runner used by the monitoring sync.
    pub fn runner(&self) -> &R {
        self.monitor.runner()
    }

    /// Current roster.
    pub fn load_roster(&self) -> Roster {
        self.store.load_roster()
    }

    /// Current catalog.
    pub fn load_catalog(&self) -> Catalog {
        self.store.load_catalog()
    }

    /// Next free student id.
    pub fn next_id(&self) -> String {
        self.roster.next_id()
    }

    /// Create or update a student.
    pub fn upsert(&self, id: &str, name: &str, apps: Vec<String>) -> Result<Outcome, RosterError> {
        self.roster.upsert(id, name, apps)
    }

    /// Delete a student; returns the id to show next.
    pub fn delete(&self, id: &str) -> Result<Option<String>, RosterError> {
        self.roster.delete(id)
    }

    /// Student with `id`.
    pub fn find(&self, id: &str) -> Option<StudentRecord> {
        self.roster.find(id)
    }

    /// Student to display for an optional selection.
    pub fn selected_or_first(&self, selected: Option<&str>) -> Option<StudentRecord> {
        self.roster.selected_or_first(selected)
    }

    /// Validate hand-edited roster text and persist it on success.
    pub fn validate_raw_text(&self, text: &str) -> Result<Roster, RosterError> {
        self.roster.validate_raw_text(text)
    }

    /// Exact persisted roster text.
    pub fn raw_roster(&self) -> String {
        self.roster.raw_text()
    }

    /// Whether pull/push have a remote to talk to.
    pub fn remote_configured(&self) -> bool {
        self.store.is_configured()
    }

    /// Refresh the local documents from the remote.
    pub async fn pull(&self) -> PullReport {
        self.store.pull().await
    }

    /// Commit the local roster to the remote.
    pub async fn push(&self, message: Option<&str>) -> Result<PushOutcome, SyncError> {
        self.store.push(message).await
    }

    /// Rebuild the Checkmk rules from the current roster, with the process
    /// environment layered with settings and the env file.
    pub async fn run_monitoring_sync(&self) -> Result<RunReport, MonitorError> {
        let env = self.monitor.command_env();
        self.run_monitoring_sync_with_env(&env).await
    }

    /// [`Self::run_monitoring_sync`] with an explicit script environment.
    pub async fn run_monitoring_sync_with_env(
        &self,
        env: &BTreeMap<String, String>,
    ) -> Result<RunReport, MonitorError> {
        let roster = self.load_roster();
        let catalog = self.load_catalog();
        info!(
            students = roster.len(),
            services = catalog.len(),
            "starting monitoring sync"
        );
        self.monitor.run(&roster, &catalog, env).await
    }
}
