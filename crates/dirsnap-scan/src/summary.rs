//! Independent counting walk used to build a [`Summary`].

use std::path::Path;

use jwalk::{Parallelism, WalkDir};
use tracing::debug;

use dirsnap_core::{PathFilter, SnapshotConfig, SnapshotError, Summary};

/// Counts files and directories below a root.
///
/// This does not reuse the tree built by [`crate::TreeWalker`]: it walks
/// the filesystem again, applying the same exclusion filter, so the counts
/// reflect the directory as it is when the summary is taken.
#[derive(Debug, Clone, Default)]
pub struct Summarizer {
    filter: PathFilter,
}

impl Summarizer {
    /// Create a summarizer with the default exclusions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a summarizer from a snapshot configuration.
    pub fn with_config(config: &SnapshotConfig) -> Self {
        Self {
            filter: config.filter(),
        }
    }

    /// Replace the exclusion filter.
    pub fn with_filter(mut self, filter: PathFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Count every regular file and every directory below `dir`.
    ///
    /// The root itself is not counted. Symbolic links are not followed and
    /// not counted.
    pub fn summarize(&self, dir: &Path) -> Result<Summary, SnapshotError> {
        let root = dir.canonicalize().map_err(|e| SnapshotError::io(dir, e))?;
        if !root.is_dir() {
            return Err(SnapshotError::NotADirectory { path: root });
        }

        let filter = self.filter.clone();
        let walker = WalkDir::new(&root)
            .parallelism(Parallelism::Serial)
            .skip_hidden(false)
            .follow_links(false)
            .min_depth(1)
            .process_read_dir(move |_depth, _path, _state, children| {
                // Pruning here keeps jwalk from descending into excluded dirs.
                children.retain(|child| match child {
                    Ok(entry) => !filter.is_excluded(&entry.file_name().to_string_lossy()),
                    Err(_) => true,
                });
            });

        let mut total_files: u64 = 0;
        let mut total_directories: u64 = 0;

        for entry_result in walker {
            let entry = entry_result.map_err(|err| walk_error(&root, err))?;
            let file_type = entry.file_type();
            if file_type.is_dir() {
                total_directories += 1;
            } else if file_type.is_file() {
                total_files += 1;
            }
        }

        debug!(
            root = %root.display(),
            total_files, total_directories, "summary computed"
        );

        Ok(Summary::new(total_files, total_directories))
    }
}

fn walk_error(root: &Path, err: jwalk::Error) -> SnapshotError {
    let path = err
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.to_path_buf());
    let source = match err.io_error() {
        Some(io) => std::io::Error::new(io.kind(), io.to_string()),
        None => std::io::Error::other(err.to_string()),
    };
    SnapshotError::io(path, source)
}
