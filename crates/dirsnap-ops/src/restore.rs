//! Recreate a directory tree on disk from snapshot entries.

use std::fs;
use std::path::Path;

use tracing::{info, warn};

use dirsnap_core::{Entry, EntryKind, PathFilter, Result, Snapshot, SnapshotError, validate_name};

/// Where the snapshot root ends up relative to the destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RestoreLayout {
    /// The root's children are written directly into the destination.
    #[default]
    Contents,
    /// A directory named after the root is created inside the destination.
    Nested,
}

/// Counts collected while restoring.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    /// Directories created or merged into.
    pub directories: usize,
    /// Files written.
    pub files: usize,
    /// Entries skipped because their name is excluded.
    pub skipped: usize,
    /// Total bytes written.
    pub bytes: u64,
}

impl RestoreReport {
    /// Get a human-readable summary of the restore.
    pub fn summary(&self) -> String {
        let mut line = format!(
            "Restored {} files and {} directories ({})",
            self.files,
            self.directories,
            humansize::format_size(self.bytes, humansize::BINARY)
        );
        if self.skipped > 0 {
            line.push_str(&format!(", skipped {} excluded", self.skipped));
        }
        line
    }
}

/// Writes entries back to the filesystem.
///
/// Directories are merged into existing ones and files are overwritten,
/// so restoring the same snapshot twice yields the same tree. Nothing is
/// rolled back if a write fails halfway.
#[derive(Debug, Clone, Default)]
pub struct Restorer {
    filter: PathFilter,
}

impl Restorer {
    /// Create a restorer with the default exclusions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the exclusion filter.
    pub fn with_filter(mut self, filter: PathFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Restore `entry` as `parent/<entry.name>`.
    pub fn restore(&self, entry: &Entry, parent: &Path) -> Result<RestoreReport> {
        let mut report = RestoreReport::default();
        self.restore_entry(entry, parent, &mut report)?;
        Ok(report)
    }

    /// Restore the children of `root` directly into `destination`.
    ///
    /// `destination` is created when missing. A file entry is restored as
    /// `destination/<name>`.
    pub fn restore_contents(&self, root: &Entry, destination: &Path) -> Result<RestoreReport> {
        let mut report = RestoreReport::default();
        match &root.kind {
            EntryKind::Directory { children } => {
                fs::create_dir_all(destination)
                    .map_err(|e| SnapshotError::write(destination, e))?;
                for child in children {
                    self.restore_entry(child, destination, &mut report)?;
                }
            }
            EntryKind::File { .. } => self.restore_entry(root, destination, &mut report)?,
        }
        Ok(report)
    }

    /// Restore a whole snapshot using the given layout.
    pub fn restore_snapshot(
        &self,
        snapshot: &Snapshot,
        destination: &Path,
        layout: RestoreLayout,
    ) -> Result<RestoreReport> {
        match layout {
            RestoreLayout::Contents => self.restore_contents(&snapshot.root, destination),
            RestoreLayout::Nested => {
                fs::create_dir_all(destination)
                    .map_err(|e| SnapshotError::write(destination, e))?;
                self.restore(&snapshot.root, destination)
            }
        }
    }

    fn restore_entry(&self, entry: &Entry, parent: &Path, report: &mut RestoreReport) -> Result<()> {
        validate_name(&entry.name).map_err(|reason| {
            SnapshotError::malformed(format!("{}/{}", parent.display(), entry.name), reason)
        })?;

        if self.filter.is_excluded(&entry.name) {
            warn!(path = %parent.join(entry.name.as_str()).display(), "skipping excluded entry");
            report.skipped += 1;
            return Ok(());
        }

        let path = parent.join(entry.name.as_str());
        match &entry.kind {
            EntryKind::Directory { children } => {
                fs::create_dir_all(&path).map_err(|e| SnapshotError::write(&path, e))?;
                info!(path = %path.display(), "Directory created");
                report.directories += 1;

                for child in children {
                    self.restore_entry(child, &path, report)?;
                }
            }
            EntryKind::File { content } => {
                fs::write(&path, content.as_bytes()).map_err(|e| SnapshotError::write(&path, e))?;
                info!(path = %path.display(), bytes = content.len(), "File created");
                report.files += 1;
                report.bytes += content.len() as u64;
            }
        }
        Ok(())
    }
}
