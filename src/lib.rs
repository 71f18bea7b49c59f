//! # Agentic Reports v0.2.0
//!
//! Command result reporting for the AgenticOS ecosystem.
//!
//! Every command produces two outputs from the same data:
//!
//! - a flat key/value stream for the downstream text consumer
//!   (`ResponseEnvelope::render`), and
//! - a compressed, provenance-tagged JSON artifact for later querying
//!   (`var/results/<command>_<YYYY-MM-DD>_<HH-MM-SS>.json.xz`).
//!
//! This crate is the shared core:
//!
//! - **DataProvider trait**: hints + lossless namespaced document + lossy flat view
//! - **ResponseEnvelope**: data, action log, instructions, at most one error
//! - **ResultFileManager**: artifact naming, directory provisioning, retention, stats
//! - **Hints**: `jq` paths into artifacts, with merge-time rewriting
//! - **Errors**: two layers, propagated `ResultsError` + enveloped `CommandError`
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! agentic-reports = "0.2"
//! ```
//!
//! ```rust,ignore
//! use agentic_reports::prelude::*;
//!
//! struct RepoSummary { /* ... */ }
//!
//! impl DataProvider for RepoSummary {
//!     fn hints(&self) -> Vec<Hint> { /* ... */ }
//!     fn to_namespaced_document(&self) -> NamespacedDocument { /* ... */ }
//!     fn to_flat_view(&self) -> FlatData { /* ... */ }
//! }
//!
//! let mut envelope = ResponseEnvelope::new();
//! envelope.ingest(&summary);
//!
//! let manager = ResultFileManager::from_config(&ResultsConfig::for_workspace(root));
//! let receipt = manager.save_artifact("summary", &summary.to_json())?;
//! for example in summary.jq_examples(&receipt.path) {
//!     envelope.add_instruction(example);
//! }
//! manager.apply_retention();
//! ```
//!
//! ## Artifact shapes
//!
//! - single item: `{"raw": {...}, "calculated": {...}}`
//! - merged: `{<parent fields>, "items": [{"raw": ..., "calculated": ...}, ...]}`

pub mod artifact;
pub mod config;
pub mod envelope;
pub mod errors;
pub mod hints;
pub mod merge;
pub mod provider;
pub mod results;
pub mod types;

// Re-export everything in prelude for convenience
pub mod prelude {
    pub use crate::artifact::*;
    pub use crate::config::*;
    pub use crate::envelope::*;
    pub use crate::errors::*;
    pub use crate::hints::*;
    pub use crate::merge::*;
    pub use crate::provider::*;
    pub use crate::results::*;
    pub use crate::types::*;
}

// Also re-export at crate root
pub use prelude::*;
