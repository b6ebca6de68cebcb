//! # edugitops-store
//!
//! Persistence for the roster and the service catalog:
//!
//! - [`DocumentStore`]: the seam every other component reads and writes
//!   through (the remote sync layer decorates it)
//! - [`LocalStore`]: YAML files in the data directory
//! - [`RosterManager`]: student create/update/delete, raw-text validation and
//!   id allocation on top of any store

#![deny(unsafe_code)]

pub mod errors;
pub mod local;
pub mod roster;
pub mod traits;

pub use errors::{RosterError, StoreError};
pub use local::LocalStore;
pub use roster::{Outcome, RosterManager};
pub use traits::{Document, DocumentStore};
