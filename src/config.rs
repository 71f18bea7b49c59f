//! Result storage configuration.
//!
//! The results directory is always passed in explicitly. Nothing here reads
//! the process working directory or the environment.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Results directory relative to the workspace root.
pub const RESULTS_SUBDIR: &str = "var/results";

/// Extension of every result artifact.
pub const ARTIFACT_EXTENSION: &str = ".json.xz";

/// Default maximum artifact age: 7 days.
pub const DEFAULT_MAX_AGE_HOURS: u64 = 168;

/// Default number of artifacts kept by the count phase.
pub const DEFAULT_MAX_FILES: usize = 50;

/// Default xz preset.
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// Age and count limits of a retention sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    #[serde(default = "default_max_age_hours")]
    pub max_age_hours: u64,

    #[serde(default = "default_max_files")]
    pub max_files: usize,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            max_age_hours: DEFAULT_MAX_AGE_HOURS,
            max_files: DEFAULT_MAX_FILES,
        }
    }
}

impl RetentionPolicy {
    pub fn new(max_age_hours: u64, max_files: usize) -> Self {
        Self {
            max_age_hours,
            max_files,
        }
    }
}

fn default_max_age_hours() -> u64 {
    DEFAULT_MAX_AGE_HOURS
}

fn default_max_files() -> usize {
    DEFAULT_MAX_FILES
}

fn default_compression_level() -> u32 {
    DEFAULT_COMPRESSION_LEVEL
}

/// Configuration for a `ResultFileManager`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultsConfig {
    /// Directory holding the artifacts
    pub results_dir: PathBuf,

    /// Retention limits used by `apply_retention`
    #[serde(default)]
    pub retention: RetentionPolicy,

    /// xz preset (0-9)
    #[serde(default = "default_compression_level")]
    pub compression_level: u32,
}

impl ResultsConfig {
    /// Config for an explicit results directory
    pub fn new(results_dir: impl Into<PathBuf>) -> Self {
        Self {
            results_dir: results_dir.into(),
            retention: RetentionPolicy::default(),
            compression_level: DEFAULT_COMPRESSION_LEVEL,
        }
    }

    /// Config for `<workspace_root>/var/results`
    pub fn for_workspace(workspace_root: impl AsRef<Path>) -> Self {
        Self::new(workspace_root.as_ref().join(RESULTS_SUBDIR))
    }

    /// Set the maximum artifact age
    pub fn max_age_hours(mut self, hours: u64) -> Self {
        self.retention.max_age_hours = hours;
        self
    }

    /// Set the number of artifacts kept
    pub fn max_files(mut self, count: usize) -> Self {
        self.retention.max_files = count;
        self
    }

    /// Set the xz preset, clamped to 0-9
    pub fn compression_level(mut self, level: u32) -> Self {
        self.compression_level = level.min(9);
        self
    }
}
