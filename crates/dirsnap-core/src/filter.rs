//! Name-based exclusion filter.

/// Entry names that are never captured or restored.
pub const DEFAULT_EXCLUSIONS: &[&str] = &["node_modules", ".git"];

/// Decides whether a directory entry should be skipped.
///
/// Matching is by exact name only. There is no wildcard or path matching;
/// the filter is consulted independently at every directory level, so a
/// nested `node_modules` is excluded just like a top-level one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathFilter {
    names: Vec<String>,
}

impl PathFilter {
    /// Create a filter from an explicit set of names.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns true iff `name` equals one of the excluded names.
    pub fn is_excluded(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// The excluded names.
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

impl Default for PathFilter {
    fn default() -> Self {
        Self::new(DEFAULT_EXCLUSIONS.iter().copied())
    }
}
