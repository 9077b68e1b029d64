//! File and directory entry types.

use compact_str::CompactString;

/// Characters that may not appear in an entry name on this platform.
#[cfg(windows)]
const INVALID_NAME_CHARS: &[char] = &['/', '\\', '\0'];
#[cfg(not(windows))]
const INVALID_NAME_CHARS: &[char] = &['/', '\0'];

/// Check that `name` is a single, safe path component.
///
/// Entry names come from documents that may have been edited by hand, so
/// anything that could resolve outside its parent directory is refused.
pub fn validate_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Name cannot be empty".into());
    }

    if name == "." || name == ".." {
        return Err(format!("Name cannot be '{name}'"));
    }

    for &c in INVALID_NAME_CHARS {
        if name.contains(c) {
            return Err(format!("Name cannot contain {c:?}"));
        }
    }

    Ok(())
}

/// Captured contents of a regular file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    /// UTF-8 text.
    Text(String),
    /// Raw bytes that were not valid UTF-8.
    Binary(Vec<u8>),
}

impl FileContent {
    /// Get the content as raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            FileContent::Text(text) => text.as_bytes(),
            FileContent::Binary(bytes) => bytes,
        }
    }

    /// Size of the content in bytes.
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// Check if the content is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check if this is binary content.
    pub fn is_binary(&self) -> bool {
        matches!(self, FileContent::Binary(_))
    }
}

impl From<&str> for FileContent {
    fn from(text: &str) -> Self {
        FileContent::Text(text.to_string())
    }
}

impl From<String> for FileContent {
    fn from(text: String) -> Self {
        FileContent::Text(text)
    }
}

/// Type of captured entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    /// Directory with its children in listing order.
    Directory { children: Vec<Entry> },
    /// Regular file with its contents.
    File { content: FileContent },
}

/// A single file or directory in a snapshot tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Base name (never contains a path separator).
    pub name: CompactString,

    /// Path relative to the snapshot root; empty for the root itself.
    pub relative_path: String,

    /// Entry type and payload.
    pub kind: EntryKind,
}

impl Entry {
    /// Create a new file entry.
    pub fn new_file(
        name: impl Into<CompactString>,
        relative_path: impl Into<String>,
        content: impl Into<FileContent>,
    ) -> Self {
        Self {
            name: name.into(),
            relative_path: relative_path.into(),
            kind: EntryKind::File {
                content: content.into(),
            },
        }
    }

    /// Create a new, empty directory entry.
    pub fn new_directory(name: impl Into<CompactString>, relative_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            relative_path: relative_path.into(),
            kind: EntryKind::Directory {
                children: Vec::new(),
            },
        }
    }

    /// Builder-style helper to append a child to a directory.
    ///
    /// Has no effect on file entries.
    pub fn with_child(mut self, child: Entry) -> Self {
        self.push_child(child);
        self
    }

    /// Append a child to a directory entry.
    pub fn push_child(&mut self, child: Entry) {
        if let EntryKind::Directory { children } = &mut self.kind {
            children.push(child);
        }
    }

    /// Check if this entry is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self.kind, EntryKind::Directory { .. })
    }

    /// Check if this entry is a file.
    pub fn is_file(&self) -> bool {
        matches!(self.kind, EntryKind::File { .. })
    }

    /// Children of a directory; empty for files.
    pub fn children(&self) -> &[Entry] {
        match &self.kind {
            EntryKind::Directory { children } => children,
            EntryKind::File { .. } => &[],
        }
    }

    /// Contents of a file; `None` for directories.
    pub fn content(&self) -> Option<&FileContent> {
        match &self.kind {
            EntryKind::File { content } => Some(content),
            EntryKind::Directory { .. } => None,
        }
    }

    /// Look up a direct child by name.
    pub fn child(&self, name: &str) -> Option<&Entry> {
        self.children().iter().find(|c| c.name == name)
    }

    /// Get the number of direct children.
    pub fn child_count(&self) -> usize {
        self.children().len()
    }

    /// Number of files in this subtree, 1 for a file.
    pub fn file_count(&self) -> u64 {
        match &self.kind {
            EntryKind::File { .. } => 1,
            EntryKind::Directory { children } => children.iter().map(Entry::file_count).sum(),
        }
    }

    /// Number of directories below this entry, not counting itself.
    pub fn dir_count(&self) -> u64 {
        self.children()
            .iter()
            .filter(|c| c.is_dir())
            .map(|c| c.dir_count() + 1)
            .sum()
    }

    /// Total size of all file contents in this subtree.
    pub fn content_bytes(&self) -> u64 {
        match &self.kind {
            EntryKind::File { content } => content.len() as u64,
            EntryKind::Directory { children } => children.iter().map(Entry::content_bytes).sum(),
        }
    }

    /// Compare name, type, child order and content, ignoring relative paths.
    ///
    /// Relative paths are informational and do not take part in restore.
    pub fn same_tree(&self, other: &Entry) -> bool {
        if self.name != other.name {
            return false;
        }
        match (&self.kind, &other.kind) {
            (EntryKind::File { content: a }, EntryKind::File { content: b }) => a == b,
            (EntryKind::Directory { children: a }, EntryKind::Directory { children: b }) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_tree(y))
            }
            _ => false,
        }
    }
}
