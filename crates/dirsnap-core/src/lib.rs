//! Core types for dirsnap.
//!
//! This crate provides the data structures shared by the dirsnap crates:
//! captured entries, snapshots and their summaries, the exclusion filter,
//! configuration and the common error type.

mod config;
mod entry;
mod error;
mod filter;
mod snapshot;

pub use config::{BinaryPolicy, SnapshotConfig, SnapshotConfigBuilder};
pub use entry::{Entry, EntryKind, FileContent, validate_name};
pub use error::{Result, SnapshotError};
pub use filter::{DEFAULT_EXCLUSIONS, PathFilter};
pub use snapshot::{SAVED_AT_FORMAT, Snapshot, Summary};
