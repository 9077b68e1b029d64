//! Directory traversal for dirsnap.
//!
//! Two independent walks live here:
//!
//! - [`TreeWalker`] builds the full [`Entry`] tree, file contents included.
//! - [`Summarizer`] re-walks the same directory and only counts files and
//!   directories.
//!
//! Both consult the same [`PathFilter`], so the summary always agrees with
//! the tree unless the directory changes between the two walks.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use dirsnap_scan::{Summarizer, TreeWalker};
//!
//! let root = Path::new("/path/to/project");
//! let tree = TreeWalker::new().capture(root).unwrap();
//! let summary = Summarizer::new().summarize(root).unwrap();
//!
//! assert_eq!(tree.file_count(), summary.total_files);
//! ```

mod summary;
mod walker;

pub use summary::Summarizer;
pub use walker::{TreeWalker, relative_path};

// Re-export core types for convenience
pub use dirsnap_core::{
    BinaryPolicy, Entry, EntryKind, FileContent, PathFilter, SnapshotConfig, SnapshotError,
    Summary,
};
