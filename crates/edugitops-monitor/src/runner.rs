//! External command execution.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::errors::MonitorError;

/// Exit code reported for a command that ran past its timeout.
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// One command invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandSpec {
    /// Program to execute.
    pub program: PathBuf,
    /// Positional arguments.
    pub args: Vec<String>,
    /// Complete environment of the child (nothing is inherited).
    pub env: BTreeMap<String, String>,
}

impl CommandSpec {
    /// Program path as shown in logs and errors.
    pub fn display_name(&self) -> String {
        self.program.display().to_string()
    }
}

/// What a finished command reported.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit status; -1 when killed by a signal, 124 on timeout.
    pub exit_code: i32,
    /// Captured stdout.
    pub stdout: String,
    /// Captured stderr.
    pub stderr: String,
    /// Wall time in milliseconds.
    pub duration_ms: u64,
    /// Whether the command was killed after the timeout.
    pub timed_out: bool,
}

impl CommandOutput {
    /// Whether the command exited with status 0.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs external commands. Implemented over `tokio::process` for real runs
/// and by recording fakes in tests.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `spec` to completion.
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, MonitorError>;
}

/// [`CommandRunner`] backed by `tokio::process::Command`.
pub struct TokioCommandRunner {
    timeout: Duration,
}

impl TokioCommandRunner {
    /// Runner that kills commands after `timeout`.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, MonitorError> {
        let start = Instant::now();
        let command = spec.display_name();

        let mut cmd = tokio::process::Command::new(&spec.program);
        let _ = cmd
            .args(&spec.args)
            .env_clear()
            .envs(&spec.env)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true);

        debug!(command = %command, args = ?spec.args, "spawning command");

        let child = cmd.spawn().map_err(|source| MonitorError::Spawn {
            command: command.clone(),
            source,
        })?;

        let output = tokio::select! {
            result = child.wait_with_output() => {
                result.map_err(|source| MonitorError::Spawn {
                    command: command.clone(),
                    source,
                })?
            }
            () = tokio::time::sleep(self.timeout) => {
                let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
                warn!(command = %command, timeout_ms, "command timed out");
                return Ok(CommandOutput {
                    exit_code: TIMEOUT_EXIT_CODE,
                    stdout: String::new(),
                    stderr: "command timed out".into(),
                    duration_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
                    timed_out: true,
                });
            }
        };

        let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        let exit_code = output.status.code().unwrap_or(-1);
        debug!(command = %command, exit_code, duration_ms, "command completed");

        Ok(CommandOutput {
            exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            duration_ms,
            timed_out: false,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
