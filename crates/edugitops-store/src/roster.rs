//! Student create/update/delete over a [`DocumentStore`].
//!
//! Every operation loads fresh copies of the roster and catalog, works on
//! them in memory and hands the whole roster back to the store. There is no
//! locking: two concurrent writers are last-writer-wins.

use edugitops_core::model::name_key;
use edugitops_core::{Roster, StudentRecord, derive_checks, unique_apps, validate};
use tracing::{debug, info};

use crate::errors::RosterError;
use crate::traits::{Document, DocumentStore};

/// Whether an upsert added a record or replaced one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// A new record was appended.
    Created,
    /// An existing record was replaced in place.
    Updated,
}

/// CRUD orchestrator for the roster.
#[derive(Clone, Debug)]
pub struct RosterManager<S> {
    store: S,
}

impl<S: DocumentStore> RosterManager<S> {
    /// Manage the roster held by `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Current roster.
    pub fn load(&self) -> Roster {
        self.store.load_roster()
    }

    /// Record with `id`, if any.
    pub fn find(&self, id: &str) -> Option<StudentRecord> {
        self.load().into_iter().find(|s| s.id == id)
    }

    /// The record to show when `selected` is requested: that record if it
    /// exists, otherwise the first one.
    pub fn selected_or_first(&self, selected: Option<&str>) -> Option<StudentRecord> {
        let roster = self.load();
        selected
            .and_then(|id| roster.iter().position(|s| s.id == id))
            .or((!roster.is_empty()).then_some(0))
            .map(|i| roster[i].clone())
    }

    /// Next free id: highest numeric id plus one, zero-padded to 3 digits.
    ///
    /// Ids that are not plain numbers are ignored.
    pub fn next_id(&self) -> String {
        next_id_for(&self.load())
    }

    /// Create or update the student with `id`.
    ///
    /// Repeated apps are dropped and checks are derived from the catalog,
    /// skipping apps it does not know. An update keeps the record's position
    /// in the roster. A roster holding a record that does not fit the schema
    /// is left alone and reported as
    /// [`StoreError::Corrupt`](crate::errors::StoreError::Corrupt).
    pub fn upsert(&self, id: &str, name: &str, apps: Vec<String>) -> Result<Outcome, RosterError> {
        let id = id.trim();
        let name = name.trim();
        if id.is_empty() {
            return Err(RosterError::InvalidInput("id must not be empty".to_string()));
        }
        if name.is_empty() {
            return Err(RosterError::InvalidInput("name must not be empty".to_string()));
        }

        let mut roster = self.store.load_roster_for_update()?;
        let catalog = self.store.load_catalog();
        let apps = unique_apps(apps);

        let key = name_key(name);
        if roster.iter().any(|s| s.name_key() == key && s.id != id) {
            return Err(RosterError::NameInUse {
                name: name.to_string(),
            });
        }

        let checks = derive_checks(name, &apps, &catalog);
        let outcome = match roster.iter_mut().find(|s| s.id == id) {
            Some(existing) => {
                existing.name = name.to_string();
                existing.apps = apps;
                existing.checks = checks;
                Outcome::Updated
            }
            None => {
                roster.push(StudentRecord {
                    name: name.to_string(),
                    id: id.to_string(),
                    apps,
                    checks,
                });
                Outcome::Created
            }
        };

        self.store.save_roster(&roster)?;
        info!(id, name, ?outcome, "student saved");
        Ok(outcome)
    }

    /// Remove the student with `id`.
    ///
    /// Returns the id of the record to show next (the first remaining one).
    /// An unknown id, or a roster with malformed records, leaves the file
    /// untouched.
    pub fn delete(&self, id: &str) -> Result<Option<String>, RosterError> {
        let mut roster = self.store.load_roster_for_update()?;
        let before = roster.len();
        roster.retain(|s| s.id != id);
        if roster.len() == before {
            return Err(RosterError::NotFound { id: id.to_string() });
        }

        self.store.save_roster(&roster)?;
        info!(id, remaining = roster.len(), "student deleted");
        Ok(roster.first().map(|s| s.id.clone()))
    }

    /// Validate hand-edited roster text against the current catalog and
    /// persist the normalized result.
    pub fn validate_raw_text(&self, text: &str) -> Result<Roster, RosterError> {
        let catalog = self.store.load_catalog();
        let roster = validate(text, &catalog)?;
        self.store.save_roster(&roster)?;
        info!(students = roster.len(), "raw roster validated and saved");
        Ok(roster)
    }

    /// Exact persisted roster text for the raw editor.
    pub fn raw_text(&self) -> String {
        let text = self.store.raw_text(Document::Roster);
        debug!(bytes = text.len(), "raw roster read");
        text
    }
}

fn next_id_for(roster: &[StudentRecord]) -> String {
    let max = roster
        .iter()
        .filter_map(|s| s.id.trim().parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    format!("{:03}", max.saturating_add(1))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
