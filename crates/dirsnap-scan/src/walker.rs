//! Recursive tree walker that captures names and file contents.

use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};

use dirsnap_core::{
    BinaryPolicy, Entry, EntryKind, FileContent, PathFilter, SnapshotConfig, SnapshotError,
};

/// Walks a directory and builds an in-memory [`Entry`] tree.
///
/// Traversal is single-threaded and children keep the order the
/// filesystem lists them in. Symbolic links, sockets and devices are
/// skipped; the first I/O error aborts the walk.
#[derive(Debug, Clone, Default)]
pub struct TreeWalker {
    filter: PathFilter,
    binary_policy: BinaryPolicy,
}

impl TreeWalker {
    /// Create a walker with the default exclusions and binary policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a walker from a snapshot configuration.
    pub fn with_config(config: &SnapshotConfig) -> Self {
        Self {
            filter: config.filter(),
            binary_policy: config.binary_policy,
        }
    }

    /// Replace the exclusion filter.
    pub fn with_filter(mut self, filter: PathFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Replace the binary content policy.
    pub fn with_binary_policy(mut self, policy: BinaryPolicy) -> Self {
        self.binary_policy = policy;
        self
    }

    /// Capture `path`, computing every relative path against `base`.
    pub fn walk(&self, path: &Path, base: &Path) -> Result<Entry, SnapshotError> {
        let path = path.canonicalize().map_err(|e| SnapshotError::io(path, e))?;
        let base = base.canonicalize().map_err(|e| SnapshotError::io(base, e))?;

        let metadata = fs::metadata(&path).map_err(|e| SnapshotError::io(&path, e))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());

        if metadata.is_dir() {
            self.walk_dir(&path, name, &base)
        } else if metadata.is_file() {
            self.walk_file(&path, name, &base)
        } else {
            Err(SnapshotError::io(
                &path,
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "not a regular file or directory",
                ),
            ))
        }
    }

    /// Capture a whole directory; `root` is also the relativization base.
    pub fn capture(&self, root: &Path) -> Result<Entry, SnapshotError> {
        let entry = self.walk(root, root)?;
        if !entry.is_dir() {
            return Err(SnapshotError::NotADirectory {
                path: root.to_path_buf(),
            });
        }
        Ok(entry)
    }

    fn walk_dir(&self, path: &Path, name: String, base: &Path) -> Result<Entry, SnapshotError> {
        debug!(path = %path.display(), "walking directory");
        let mut node = Entry::new_directory(name, relative_string(path, base));

        let read_dir = fs::read_dir(path).map_err(|e| SnapshotError::io(path, e))?;
        for dir_entry in read_dir {
            let dir_entry = dir_entry.map_err(|e| SnapshotError::io(path, e))?;
            let child_path = dir_entry.path();
            let child_name = dir_entry.file_name();
            let child_name = match child_name.to_str() {
                Some(n) => n.to_string(),
                None => {
                    warn!(path = %child_path.display(), "file name is not UTF-8, converting lossily");
                    child_name.to_string_lossy().into_owned()
                }
            };

            if self.filter.is_excluded(&child_name) {
                debug!(path = %child_path.display(), "excluded");
                continue;
            }

            let file_type = dir_entry
                .file_type()
                .map_err(|e| SnapshotError::io(&child_path, e))?;

            let child = if file_type.is_dir() {
                self.walk_dir(&child_path, child_name, base)?
            } else if file_type.is_file() {
                self.walk_file(&child_path, child_name, base)?
            } else {
                warn!(path = %child_path.display(), "skipping entry that is not a regular file or directory");
                continue;
            };
            node.push_child(child);
        }

        Ok(node)
    }

    fn walk_file(&self, path: &Path, name: String, base: &Path) -> Result<Entry, SnapshotError> {
        let bytes = fs::read(path).map_err(|e| SnapshotError::io(path, e))?;
        let content = self.decode_content(path, bytes)?;
        debug!(path = %path.display(), bytes = content.len(), "captured file");

        Ok(Entry {
            name: name.into(),
            relative_path: relative_string(path, base),
            kind: EntryKind::File { content },
        })
    }

    fn decode_content(&self, path: &Path, bytes: Vec<u8>) -> Result<FileContent, SnapshotError> {
        match String::from_utf8(bytes) {
            Ok(text) => Ok(FileContent::Text(text)),
            Err(err) => match self.binary_policy {
                BinaryPolicy::Reject => Err(SnapshotError::NotUtf8Content {
                    path: path.to_path_buf(),
                }),
                BinaryPolicy::Lossy => {
                    warn!(path = %path.display(), "replacing invalid UTF-8 sequences");
                    Ok(FileContent::Text(
                        String::from_utf8_lossy(err.as_bytes()).into_owned(),
                    ))
                }
                BinaryPolicy::Base64 => {
                    debug!(path = %path.display(), "storing binary content");
                    Ok(FileContent::Binary(err.into_bytes()))
                }
            },
        }
    }
}

/// Express `path` relative to `base` by comparing path components.
///
/// Both paths should be absolute and free of `.`/`..` (canonicalized).
/// When `path` lies outside `base` the result climbs with `..`.
pub fn relative_path(path: &Path, base: &Path) -> PathBuf {
    let path_parts: Vec<Component<'_>> = path.components().collect();
    let base_parts: Vec<Component<'_>> = base.components().collect();

    let common = path_parts
        .iter()
        .zip(&base_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in common..base_parts.len() {
        relative.push("..");
    }
    for part in &path_parts[common..] {
        relative.push(part.as_os_str());
    }
    relative
}

fn relative_string(path: &Path, base: &Path) -> String {
    relative_path(path, base).to_string_lossy().into_owned()
}
