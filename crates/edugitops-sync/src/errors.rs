//! Remote sync error types.

use edugitops_store::StoreError;
use thiserror::Error;

/// Why a pull or push did not complete.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Remote sync is disabled or missing its address.
    #[error("remote sync is not configured")]
    NotConfigured,

    /// Nothing to push: the local roster is missing or empty.
    #[error("the local roster is empty or missing")]
    EmptyLocal,

    /// The remote rejected the credentials (401/403).
    #[error("remote rejected the credentials ({status}): {body}")]
    Auth {
        /// HTTP status.
        status: u16,
        /// Response body.
        body: String,
    },

    /// The remote answered with an unexpected status.
    #[error("remote returned {status}: {body}")]
    Status {
        /// HTTP status.
        status: u16,
        /// Response body.
        body: String,
    },

    /// The HTTP client could not be built (TLS backend unavailable).
    #[error("could not build the HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// The request never got an answer (refused, timed out, reset).
    #[error("could not reach the remote: {0}")]
    Connection(#[source] reqwest::Error),

    /// The response did not carry a usable document.
    #[error("invalid remote content: {0}")]
    Decode(String),

    /// Writing the pulled document locally failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SyncError {
    /// Error for a non-success HTTP status.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => Self::Auth { status, body },
            _ => Self::Status { status, body },
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
