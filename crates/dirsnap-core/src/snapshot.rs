//! Snapshot container and summary statistics.

use std::path::PathBuf;

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::entry::Entry;
use crate::error::{Result, SnapshotError};

/// Format used for the human-readable `lastSaved` timestamp.
pub const SAVED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Aggregate counts for a captured directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// When the summary was computed. Display only.
    #[serde(rename = "lastSaved")]
    pub saved_at: String,
    /// Number of files at any depth.
    pub total_files: u64,
    /// Number of directories at any depth, root excluded.
    pub total_directories: u64,
}

impl Summary {
    /// Create a summary stamped with the current local time.
    pub fn new(total_files: u64, total_directories: u64) -> Self {
        Self {
            saved_at: Local::now().format(SAVED_AT_FORMAT).to_string(),
            total_files,
            total_directories,
        }
    }

    /// Summarize an in-memory tree.
    pub fn of_tree(root: &Entry) -> Self {
        Self::new(root.file_count(), root.dir_count())
    }

    /// Check whether the counts agree with a tree.
    pub fn matches(&self, root: &Entry) -> bool {
        self.total_files == root.file_count() && self.total_directories == root.dir_count()
    }
}

/// A captured directory tree with its remark and summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Root directory entry.
    pub root: Entry,

    /// Free-text annotation supplied at save time.
    pub remark: String,

    /// Counts for `root`.
    pub summary: Summary,

    /// Absolute path the tree was captured from. Informational only;
    /// restore never relies on it.
    pub source: PathBuf,
}

impl Snapshot {
    /// Create a new snapshot. The root must be a directory.
    pub fn new(
        root: Entry,
        source: impl Into<PathBuf>,
        remark: impl Into<String>,
        summary: Summary,
    ) -> Result<Self> {
        let source = source.into();
        if !root.is_dir() {
            return Err(SnapshotError::NotADirectory { path: source });
        }
        Ok(Self {
            root,
            remark: remark.into(),
            summary,
            source,
        })
    }

    /// Name of the root directory.
    pub fn name(&self) -> &str {
        &self.root.name
    }

    /// Get the total number of files.
    pub fn total_files(&self) -> u64 {
        self.summary.total_files
    }

    /// Get the total number of directories.
    pub fn total_directories(&self) -> u64 {
        self.summary.total_directories
    }
}
