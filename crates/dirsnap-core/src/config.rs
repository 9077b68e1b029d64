//! Snapshot configuration types.

use std::path::PathBuf;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::filter::{DEFAULT_EXCLUSIONS, PathFilter};

/// How file contents that are not valid UTF-8 are captured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinaryPolicy {
    /// Fail the save with `NotUtf8Content`.
    Reject,
    /// Replace invalid sequences with U+FFFD and store as text.
    Lossy,
    /// Store the raw bytes base64-encoded under the `file-binary` type.
    #[default]
    Base64,
}

/// Configuration for capturing a directory tree.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct SnapshotConfig {
    /// Directory to capture.
    pub root: PathBuf,

    /// Entry names skipped at every level.
    #[builder(default = "default_exclusions()")]
    #[serde(default = "default_exclusions")]
    pub exclusions: Vec<String>,

    /// Handling of non-UTF-8 file contents.
    #[builder(default)]
    #[serde(default)]
    pub binary_policy: BinaryPolicy,

    /// Pretty-print the JSON document.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub pretty: bool,
}

fn default_exclusions() -> Vec<String> {
    DEFAULT_EXCLUSIONS.iter().map(|s| s.to_string()).collect()
}

fn default_true() -> bool {
    true
}

impl SnapshotConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        match self.root {
            Some(ref root) if root.as_os_str().is_empty() => {
                Err("Root path cannot be empty".to_string())
            }
            Some(_) => Ok(()),
            None => Err("Root path is required".to_string()),
        }
    }
}

impl SnapshotConfig {
    /// Create a new snapshot config builder.
    pub fn builder() -> SnapshotConfigBuilder {
        SnapshotConfigBuilder::default()
    }

    /// Create a config with defaults for capturing `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            exclusions: default_exclusions(),
            binary_policy: BinaryPolicy::default(),
            pretty: true,
        }
    }

    /// Build the exclusion filter described by this config.
    pub fn filter(&self) -> PathFilter {
        PathFilter::new(self.exclusions.iter().cloned())
    }
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self::new(".")
    }
}
