//! # edugitops-monitor
//!
//! Rebuilds the Checkmk monitoring configuration from the roster.
//!
//! The Checkmk REST calls live in shell scripts; this crate decides which
//! scripts run, in which order, with which arguments and environment:
//!
//! - [`plan_rules`]: roster + catalog → one [`RuleSpec`] per student app
//! - [`MonitorSync`]: the four-phase run as an explicit [`RunState`] machine
//! - [`CommandRunner`]: the process seam, with [`TokioCommandRunner`] for real
//!   runs (per-command timeout, exit code 124 on expiry)

#![deny(unsafe_code)]

pub mod env;
pub mod errors;
pub mod orchestrator;
pub mod rules;
pub mod runner;
pub mod state;

pub use errors::MonitorError;
pub use orchestrator::{MonitorSync, RunReport};
pub use rules::{RuleSpec, plan_rules};
pub use runner::{CommandOutput, CommandRunner, CommandSpec, TIMEOUT_EXIT_CODE, TokioCommandRunner};
pub use state::{RunState, Step};
