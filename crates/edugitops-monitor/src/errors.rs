//! Monitoring sync error types.

use thiserror::Error;

use crate::state::Step;

/// Why a monitoring sync stopped.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// `CHECKMK_HOST_NAME` is not set anywhere.
    #[error("CHECKMK_HOST_NAME must be set in the environment, the .env file or the settings")]
    MissingHostName,

    /// The command could not be started.
    #[error("failed to start {command}: {source}")]
    Spawn {
        /// Program path.
        command: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The command exited with a non-zero status.
    #[error("{step} failed: {command} exited with code {exit_code}")]
    Command {
        /// Phase the command belonged to.
        step: Step,
        /// Program path.
        command: String,
        /// Exit status (124 on timeout).
        exit_code: i32,
    },
}

impl MonitorError {
    /// Process exit code that mirrors this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::MissingHostName => 1,
            Self::Spawn { .. } => 127,
            Self::Command { exit_code, .. } => *exit_code,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
