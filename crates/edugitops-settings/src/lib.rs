//! # edugitops-settings
//!
//! Layered configuration for EduGitOps.
//!
//! Settings are resolved in three layers (lowest to highest priority):
//! 1. Compiled defaults ([`EduSettings::default()`])
//! 2. `~/.edugitops/settings.json` (deep-merged over defaults)
//! 3. Environment variables (`GITEA_*`, `CHECKMK_*`, `EDUGITOPS_*`)
//!
//! There is no global instance: the binary loads settings once and hands them
//! to the components that need them.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{load_settings, load_settings_from_path, settings_path};
pub use types::*;
