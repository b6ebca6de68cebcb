//! # edugitops-sync
//!
//! Keeps the local documents in step with a git repository through its
//! hosting contents API (Gitea, GitHub-compatible):
//!
//! - [`RemoteSync::pull`] overwrites the local roster and catalog, each file
//!   independently, and reports a [`SyncStatus`]
//! - [`RemoteSync::push`] commits the local roster using the remote sha for
//!   optimistic concurrency
//!
//! [`RemoteSync`] decorates any [`edugitops_store::DocumentStore`], so the
//! rest of the system reads and writes through it unchanged.

#![deny(unsafe_code)]

pub mod client;
pub mod errors;
pub mod remote;

pub use client::{ContentsClient, RemoteFile, decode_content};
pub use errors::SyncError;
pub use remote::{PullReport, PushOutcome, RemoteSync, SyncStatus};
