//! # edugitops-core
//!
//! Shared vocabulary for the EduGitOps workspace:
//!
//! - **Model**: [`CatalogEntry`], [`Catalog`], [`StudentRecord`], [`Roster`]
//!   in the exact YAML shape of `alumnos.yaml` / `catalogo-servicios.yaml`
//! - **Derivation**: [`derive()`] maps a student's name and apps to the
//!   canonical list of monitoring checks
//! - **Validation**: [`validate()`] turns hand-edited YAML into a trusted
//!   [`Roster`] or a single user-facing [`ValidationError`]
//! - **Logging**: `tracing` subscriber setup and a capture layer for tests

#![deny(unsafe_code)]

pub mod derive;
pub mod logging;
pub mod model;
pub mod validate;

pub use derive::{CheckDescriptor, derive, derive_checks, derive_strict};
pub use model::{Catalog, CatalogEntry, Protocol, Roster, StudentRecord, unique_apps};
pub use validate::{ValidationError, validate};
