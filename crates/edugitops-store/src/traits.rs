//! The document store abstraction.

use std::fmt;
use std::sync::Arc;

use edugitops_core::{Catalog, Roster, StudentRecord};

use crate::errors::StoreError;

/// The two persisted documents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Document {
    /// `alumnos.yaml`.
    Roster,
    /// `catalogo-servicios.yaml`.
    Catalog,
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Roster => f.write_str("roster"),
            Self::Catalog => f.write_str("catalog"),
        }
    }
}

/// Owner of the persisted roster and catalog.
///
/// Loads are best-effort and never fail: a missing or malformed document
/// reads as empty. Writes report failures.
pub trait DocumentStore: Send + Sync {
    /// Current roster, skipping records that do not fit the schema.
    fn load_roster(&self) -> Roster;

    /// Current roster for a load-modify-store cycle.
    ///
    /// Unlike [`Self::load_roster`] nothing is skipped: a record that does
    /// not fit the schema is a [`StoreError::Corrupt`], so a rewrite never
    /// drops it.
    fn load_roster_for_update(&self) -> Result<Roster, StoreError>;

    /// Current catalog, skipping entries that do not fit the schema.
    fn load_catalog(&self) -> Catalog;

    /// Exact persisted text of `doc`, or `""` if there is none.
    fn raw_text(&self, doc: Document) -> String;

    /// Replace the roster with `roster`.
    fn save_roster(&self, roster: &[StudentRecord]) -> Result<(), StoreError>;

    /// Replace `doc` with `text` verbatim.
    fn write_raw(&self, doc: Document, text: &str) -> Result<(), StoreError>;
}

impl<T: DocumentStore + ?Sized> DocumentStore for Arc<T> {
    fn load_roster(&self) -> Roster {
        (**self).load_roster()
    }

    fn load_roster_for_update(&self) -> Result<Roster, StoreError> {
        (**self).load_roster_for_update()
    }

    fn load_catalog(&self) -> Catalog {
        (**self).load_catalog()
    }

    fn raw_text(&self, doc: Document) -> String {
        (**self).raw_text(doc)
    }

    fn save_roster(&self, roster: &[StudentRecord]) -> Result<(), StoreError> {
        (**self).save_roster(roster)
    }

    fn write_raw(&self, doc: Document, text: &str) -> Result<(), StoreError> {
        (**self).write_raw(doc, text)
    }
}
