//! Store and CRUD error types.

use std::path::PathBuf;

use edugitops_core::ValidationError;
use thiserror::Error;

/// A document could not be written, or could not be read back strictly
/// enough to be rewritten.
///
/// Best-effort reads never fail (they degrade to an empty document); only
/// saves and the strict read that precedes a rewrite report these.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem failure.
    #[error("I/O failure on {}: {source}", path.display())]
    Io {
        /// Target document path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The roster could not be rendered as YAML.
    #[error("failed to serialize roster: {0}")]
    Serialize(#[from] serde_yaml::Error),

    /// The persisted document has content a rewrite would drop.
    #[error("{} cannot be rewritten: {}{reason}", path.display(), element_prefix(*index))]
    Corrupt {
        /// Document path.
        path: PathBuf,
        /// 1-based list position of the offending element, or `None` when
        /// the document as a whole is unreadable.
        index: Option<usize>,
        /// Parser message.
        reason: String,
    },
}

fn element_prefix(index: Option<usize>) -> String {
    index.map(|i| format!("element #{i}: ")).unwrap_or_default()
}

/// Why a roster mutation was refused.
#[derive(Debug, Error)]
pub enum RosterError {
    /// Empty id or blank name.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Another record already uses the name.
    #[error("the name '{name}' is already used by another student")]
    NameInUse {
        /// The requested name.
        name: String,
    },

    /// No record has the id.
    #[error("student not found: {id}")]
    NotFound {
        /// The requested id.
        id: String,
    },

    /// Raw text failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Persisting the roster failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
