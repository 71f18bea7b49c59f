//! Result file lifecycle: naming, provisioning, retention and statistics.
//!
//! Artifacts live in one flat directory and are named
//! `<command>_<YYYY-MM-DD>_<HH-MM-SS>.json.xz`, so a consumer can find them
//! by convention alone.
//!
//! # Failure model
//!
//! Only `ensure_results_directory` (and the artifact writer) propagate errors.
//! Listing, statistics and retention are maintenance work: failures are
//! logged and turned into empty results or a `SweepOutcome::Failed`, never
//! into an `Err` that could abort the calling command.
//!
//! Several processes may sweep the same directory at once. A file that
//! disappears between listing and stat/delete is skipped silently.

use crate::artifact::{write_artifact, ArtifactReceipt};
use crate::config::{RetentionPolicy, ResultsConfig, ARTIFACT_EXTENSION, DEFAULT_COMPRESSION_LEVEL};
use crate::errors::{ResultsError, ResultsResult};
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// `strftime` layout of the timestamp part of artifact names.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// One artifact on disk, read fresh on every scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultFileRecord {
    pub path: PathBuf,
    pub modified: SystemTime,
    pub size_bytes: u64,
}

impl ResultFileRecord {
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }

    /// Command and timestamp encoded in the file name
    pub fn parsed_name(&self) -> Option<(String, NaiveDateTime)> {
        self.file_name().and_then(parse_result_file_name)
    }
}

/// Summary of the results directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultFileStats {
    pub total_files: usize,
    pub total_size_bytes: u64,
    pub oldest_file: Option<ResultFileRecord>,
    pub newest_file: Option<ResultFileRecord>,
}

/// A file the sweep could not delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepFailure {
    pub path: PathBuf,
    pub message: String,
}

/// Deletions made by a retention sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    pub deleted_by_age: usize,
    pub deleted_by_count: usize,
    pub failures: Vec<SweepFailure>,
}

impl SweepReport {
    /// Total deletions across both phases
    pub fn deleted(&self) -> usize {
        self.deleted_by_age + self.deleted_by_count
    }
}

/// Result of a retention sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SweepOutcome {
    /// The sweep ran over the whole directory (individual deletes may still have failed)
    Completed(SweepReport),

    /// The sweep stopped early; `partial` holds what was done before
    Failed { partial: SweepReport, error: String },
}

impl SweepOutcome {
    /// Files deleted, best effort
    pub fn deleted(&self) -> usize {
        self.report().deleted()
    }

    pub fn report(&self) -> &SweepReport {
        match self {
            Self::Completed(report) => report,
            Self::Failed { partial, .. } => partial,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

/// Manages the artifacts of one results directory.
#[derive(Debug, Clone)]
pub struct ResultFileManager {
    results_dir: PathBuf,
    retention: RetentionPolicy,
    compression_level: u32,
}

impl ResultFileManager {
    /// Manager for an explicit results directory, with default retention
    pub fn new(results_dir: impl Into<PathBuf>) -> Self {
        Self {
            results_dir: results_dir.into(),
            retention: RetentionPolicy::default(),
            compression_level: DEFAULT_COMPRESSION_LEVEL,
        }
    }

    pub fn from_config(config: &ResultsConfig) -> Self {
        Self {
            results_dir: config.results_dir.clone(),
            retention: config.retention,
            compression_level: config.compression_level,
        }
    }

    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }

    pub fn retention(&self) -> RetentionPolicy {
        self.retention
    }

    /// `<dir>/<command>_<YYYY-MM-DD>_<HH-MM-SS>.json.xz`
    ///
    /// Uses local wall-clock time when `timestamp` is `None`. Two calls in the
    /// same second for the same command return the same path.
    pub fn generate_result_file_path(
        &self,
        command: &str,
        timestamp: Option<NaiveDateTime>,
    ) -> PathBuf {
        let timestamp = timestamp.unwrap_or_else(|| Local::now().naive_local());
        self.results_dir.join(format!(
            "{}_{}{}",
            sanitize_command_name(command),
            timestamp.format(TIMESTAMP_FORMAT),
            ARTIFACT_EXTENSION
        ))
    }

    /// Create the results directory (and parents) if absent.
    pub fn ensure_results_directory(&self) -> ResultsResult<PathBuf> {
        fs::create_dir_all(&self.results_dir).map_err(|source| ResultsError::CreateDirectory {
            path: self.results_dir.clone(),
            source,
        })?;
        Ok(self.results_dir.clone())
    }

    /// Every artifact in the directory; empty on any failure.
    pub fn list_result_files(&self) -> Vec<ResultFileRecord> {
        match self.scan() {
            Ok(files) => files,
            Err(e) if e.kind() == io::ErrorKind::NotFound => vec![],
            Err(e) => {
                log::warn!(
                    "Failed to list results directory {}: {e}",
                    self.results_dir.display()
                );
                vec![]
            }
        }
    }

    /// Most recent artifact of `command`, by the timestamp in its name.
    pub fn latest_result_for(&self, command: &str) -> Option<ResultFileRecord> {
        let command = sanitize_command_name(command);
        self.list_result_files()
            .into_iter()
            .filter_map(|record| {
                let (name, timestamp) = record.parsed_name()?;
                (name == command).then_some((timestamp, record))
            })
            .max_by(|(a_ts, a), (b_ts, b)| a_ts.cmp(b_ts).then(a.modified.cmp(&b.modified)))
            .map(|(_, record)| record)
    }

    /// Retention sweep against the current time.
    pub fn clean_old_result_files(&self, max_age_hours: u64, max_files: usize) -> SweepOutcome {
        self.clean_old_result_files_at(SystemTime::now(), max_age_hours, max_files)
    }

    /// Retention sweep using the manager's configured policy.
    pub fn apply_retention(&self) -> SweepOutcome {
        self.clean_old_result_files(self.retention.max_age_hours, self.retention.max_files)
    }

    /// Retention sweep relative to `now`.
    ///
    /// 1. Age phase: delete artifacts modified at or before `now - max_age_hours`.
    /// 2. Count phase: keep the `max_files` newest survivors, delete the rest.
    ///    Equal modification times order by file name, later names first.
    pub fn clean_old_result_files_at(
        &self,
        now: SystemTime,
        max_age_hours: u64,
        max_files: usize,
    ) -> SweepOutcome {
        let files = match self.scan() {
            Ok(files) => files,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return SweepOutcome::Completed(SweepReport::default());
            }
            Err(e) => {
                log::warn!(
                    "Skipping cleanup, cannot list {}: {e}",
                    self.results_dir.display()
                );
                return SweepOutcome::Failed {
                    partial: SweepReport::default(),
                    error: e.to_string(),
                };
            }
        };

        let report = sweep_records(files, now, max_age_hours, max_files);

        if report.deleted() > 0 {
            log::info!(
                "Removed {} old result files from {} ({} by age, {} by count)",
                report.deleted(),
                self.results_dir.display(),
                report.deleted_by_age,
                report.deleted_by_count
            );
        }
        SweepOutcome::Completed(report)
    }

    /// File count, total size and age bounds; zeroed if the directory is
    /// missing or unreadable.
    pub fn get_result_file_stats(&self) -> ResultFileStats {
        let files = self.list_result_files();

        ResultFileStats {
            total_files: files.len(),
            total_size_bytes: files.iter().map(|f| f.size_bytes).sum(),
            oldest_file: files.iter().min_by_key(|f| f.modified).cloned(),
            newest_file: files.iter().max_by_key(|f| f.modified).cloned(),
        }
    }

    /// Write `document` as a new artifact for `command`.
    pub fn save_artifact(
        &self,
        command: &str,
        document: &serde_json::Value,
    ) -> ResultsResult<ArtifactReceipt> {
        self.ensure_results_directory()?;
        let path = self.generate_result_file_path(command, None);
        write_artifact(&path, document, self.compression_level)
    }

    fn scan(&self) -> io::Result<Vec<ResultFileRecord>> {
        let mut files = Vec::new();

        for entry in fs::read_dir(&self.results_dir)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("Failed to read results entry: {e}");
                    continue;
                }
            };

            let path = entry.path();
            let is_artifact = path
                .file_name()
                .and_then(|n| n.to_str())
                .map_or(false, |n| n.ends_with(ARTIFACT_EXTENSION));
            if !is_artifact {
                continue;
            }

            let meta = match entry.metadata() {
                Ok(meta) => meta,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    log::debug!("Result file vanished during scan: {}", path.display());
                    continue;
                }
                Err(e) => {
                    log::warn!("Failed to stat {}: {e}", path.display());
                    continue;
                }
            };
            if !meta.is_file() {
                continue;
            }

            let modified = match meta.modified() {
                Ok(modified) => modified,
                Err(e) => {
                    log::warn!("No modification time for {}: {e}", path.display());
                    continue;
                }
            };

            files.push(ResultFileRecord {
                path,
                modified,
                size_bytes: meta.len(),
            });
        }

        Ok(files)
    }
}

// Both sweep phases over an already listed set of artifacts.
fn sweep_records(
    files: Vec<ResultFileRecord>,
    now: SystemTime,
    max_age_hours: u64,
    max_files: usize,
) -> SweepReport {
    let mut report = SweepReport::default();

    // Overflowing ages disable the age phase.
    let cutoff = max_age_hours
        .checked_mul(3600)
        .and_then(|secs| now.checked_sub(Duration::from_secs(secs)));

    let mut survivors = Vec::with_capacity(files.len());
    for record in files {
        let expired = cutoff.map_or(false, |cutoff| record.modified <= cutoff);
        if !expired {
            survivors.push(record);
        } else if remove_result_file(&record, &mut report) {
            report.deleted_by_age += 1;
        }
    }

    survivors.sort_by(|a, b| {
        b.modified
            .cmp(&a.modified)
            .then_with(|| b.path.file_name().cmp(&a.path.file_name()))
    });
    for record in survivors.iter().skip(max_files) {
        if remove_result_file(record, &mut report) {
            report.deleted_by_count += 1;
        }
    }

    report
}

// Returns true only when this call deleted the file.
fn remove_result_file(record: &ResultFileRecord, report: &mut SweepReport) -> bool {
    match fs::remove_file(&record.path) {
        Ok(()) => {
            log::debug!("Deleted result file {}", record.path.display());
            true
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::debug!("Result file already removed: {}", record.path.display());
            false
        }
        Err(e) => {
            log::warn!("Failed to delete {}: {e}", record.path.display());
            report.failures.push(SweepFailure {
                path: record.path.clone(),
                message: e.to_string(),
            });
            false
        }
    }
}

/// Make `command` safe as a file name prefix.
///
/// Anything outside `[A-Za-z0-9_.-]` becomes `-`.
pub fn sanitize_command_name(command: &str) -> String {
    let cleaned: String = command
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "result".to_string()
    } else {
        cleaned
    }
}

/// Split an artifact file name into command and timestamp.
pub fn parse_result_file_name(file_name: &str) -> Option<(String, NaiveDateTime)> {
    let stem = file_name.strip_suffix(ARTIFACT_EXTENSION)?;
    let mut parts = stem.rsplitn(3, '_');
    let time = parts.next()?;
    let date = parts.next()?;
    let command = parts.next()?;
    if command.is_empty() {
        return None;
    }
    let timestamp =
        NaiveDateTime::parse_from_str(&format!("{date}_{time}"), TIMESTAMP_FORMAT).ok()?;
    Some((command.to_string(), timestamp))
}
