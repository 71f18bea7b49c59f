//! Standard error types for reporting.
//!
//! Two error layers:
//!
//! 1. **ResultsError**: filesystem/artifact failures that propagate to the caller
//!    (results directory cannot be created, artifact cannot be written or read).
//!
//! 2. **CommandError**: domain failures of a command (data source unreachable,
//!    invalid input). These are NOT control flow: they are stored in the
//!    `ResponseEnvelope` with recovery instructions attached, and the envelope
//!    is returned normally.
//!
//! # Maintenance Rule
//!
//! Retention sweeps and directory statistics never produce either layer.
//! They report through `SweepOutcome` / zeroed stats instead.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════
// LAYER 1: Propagated filesystem errors
// ═══════════════════════════════════════════════════════════════════

/// Fatal result-file error, surfaced to the caller without retry.
#[derive(Debug, Error)]
pub enum ResultsError {
    /// The results directory could not be created (e.g. permission denied)
    #[error("failed to create results directory {}: {source}", .path.display())]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading or writing an artifact failed
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Artifact content is not valid JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ResultsError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Path the failure relates to, if any
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::CreateDirectory { path, .. } | Self::Io { path, .. } => Some(path),
            Self::Json(_) => None,
        }
    }
}

/// Result type alias for propagated filesystem operations
pub type ResultsResult<T> = Result<T, ResultsError>;

// ═══════════════════════════════════════════════════════════════════
// Construction errors
// ═══════════════════════════════════════════════════════════════════

/// A hint query that does not satisfy the hint grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HintError {
    #[error("hint query is empty")]
    EmptyQuery,

    #[error("hint query must start with '.': {0}")]
    MissingLeadingDot(String),

    #[error("single-item hint must be rooted at .raw or .calculated: {0}")]
    UnrootedQuery(String),
}

/// Violation of the raw/calculated namespace split.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    #[error("key '{key}' already present in the {existing} namespace")]
    KeyCollision { key: String, existing: String },
}

/// Failure to build a merged parent document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    #[error("parent fields already contain the collection key '{0}'")]
    CollectionKeyTaken(String),
}

// ═══════════════════════════════════════════════════════════════════
// LAYER 2: Domain errors (carried as data in the envelope)
// ═══════════════════════════════════════════════════════════════════

/// Terminal error of a command, recorded with `ResponseEnvelope::set_error`.
///
/// The message says what went wrong; `recovery_instructions` say what to do
/// about it.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("[{code}] {message}")]
pub struct CommandError {
    pub code: ErrorCode,

    pub message: String,

    /// Structured details (path, host, attempts) kept out of the message
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub context: BTreeMap<String, serde_json::Value>,

    /// Whether re-running the command can succeed
    pub recoverable: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<SuggestedAction>,

    /// Free-text recovery steps for the consumer
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recovery_instructions: Vec<String>,
}

impl CommandError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: BTreeMap::new(),
            recoverable: code.is_recoverable(),
            suggested_action: None,
            recovery_instructions: Vec::new(),
        }
    }

    /// Attach a context entry. Values that fail to serialize are skipped.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    pub fn with_suggestion(mut self, action: SuggestedAction) -> Self {
        self.suggested_action = Some(action);
        self
    }

    /// Attach a recovery instruction line
    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.recovery_instructions.push(instruction.into());
        self
    }

    /// One-line message for the downstream text consumer.
    ///
    /// `Error: <message>`, followed by the suggested action if there is one.
    /// Unrecoverable errors without a suggestion say so explicitly.
    pub fn to_consumer_message(&self) -> String {
        let mut msg = format!("Error: {}", self.message);
        match &self.suggested_action {
            Some(SuggestedAction::Retry { after_ms }) => {
                msg.push_str(&format!(". Retry after {}ms", after_ms));
            }
            Some(SuggestedAction::Alternative { description }) => {
                msg.push_str(&format!(". Try: {}", description));
            }
            Some(SuggestedAction::ReportBug) => {
                msg.push_str(". This may be a bug, please report it");
            }
            None if !self.recoverable => msg.push_str(". Re-running will not help"),
            None => {}
        }
        msg
    }

    // ═══════════════════════════════════════════════════════════
    // Constructors per code
    // ═══════════════════════════════════════════════════════════

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, format!("{} not found", resource.into())).with_suggestion(
            SuggestedAction::Alternative {
                description: "Check the name or list the available items first".into(),
            },
        )
    }

    /// Upstream data source could not be reached
    pub fn source_unavailable(source: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::SourceUnavailable,
            format!("{} unavailable: {}", source.into(), reason.into()),
        )
        .with_suggestion(SuggestedAction::Retry { after_ms: 5000 })
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::PermissionDenied, message)
    }

    /// A broken invariant inside the command itself
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message).with_suggestion(SuggestedAction::ReportBug)
    }

    /// Results directory or artifact could not be written
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StorageError, message)
            .with_suggestion(SuggestedAction::Retry { after_ms: 1000 })
    }
}

/// Machine-readable class of a command failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    InvalidInput,
    PermissionDenied,
    /// Repository host or API unreachable
    SourceUnavailable,
    StorageError,
    Internal,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::InvalidInput => "INVALID_INPUT",
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::SourceUnavailable => "SOURCE_UNAVAILABLE",
            Self::StorageError => "STORAGE_ERROR",
            Self::Internal => "INTERNAL",
        }
    }

    /// Permission and internal failures do not go away on a re-run.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::PermissionDenied | Self::Internal)
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the consumer should try next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SuggestedAction {
    Retry { after_ms: u64 },
    Alternative { description: String },
    ReportBug,
}

impl From<ResultsError> for CommandError {
    fn from(e: ResultsError) -> Self {
        let err = match &e {
            ResultsError::CreateDirectory { source, .. } | ResultsError::Io { source, .. }
                if source.kind() == std::io::ErrorKind::PermissionDenied =>
            {
                CommandError::permission_denied(e.to_string())
            }
            ResultsError::Json(_) => CommandError::internal(e.to_string()),
            _ => CommandError::storage(e.to_string()),
        };
        match e.path() {
            Some(path) => err.with_context("path", path.display().to_string()),
            None => err,
        }
    }
}
