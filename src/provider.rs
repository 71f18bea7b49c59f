//! Data contract every provider implements, and the command contract.

use crate::envelope::ResponseEnvelope;
use crate::hints::{generate_jq_examples, Hint};
use crate::types::{FlatData, NamespacedDocument};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Separator used when a list collapses into one flat value.
pub const LIST_SEPARATOR: &str = ", ";

/// The contract every domain-data provider implements.
///
/// A provider exposes the same underlying fields two ways:
///
/// - `to_namespaced_document` is lossless and is the only view persisted to
///   the artifact.
/// - `to_flat_view` is a lossy projection for the text consumer. Every value is
///   a string; lists and objects collapse (see [`flatten_value`]).
///
/// Single-item hints returned by `hints` must resolve against the namespaced
/// document to the same values the flat view exposes.
pub trait DataProvider {
    /// Query hints valid against `to_namespaced_document`
    fn hints(&self) -> Vec<Hint>;

    /// Lossless raw/calculated view
    fn to_namespaced_document(&self) -> NamespacedDocument;

    /// Lossy string view for the text consumer
    fn to_flat_view(&self) -> FlatData;

    // ═══════════════════════════════════════════════════════
    // DEFAULT IMPLEMENTATIONS
    // ═══════════════════════════════════════════════════════

    /// Artifact JSON for this provider
    fn to_json(&self) -> serde_json::Value {
        self.to_namespaced_document().to_value()
    }

    /// Runnable query examples against an artifact holding this provider's document
    fn jq_examples(&self, artifact_path: &Path) -> Vec<String> {
        generate_jq_examples(&self.hints(), artifact_path)
    }
}

/// A command whose only reportable output is a `ResponseEnvelope`.
///
/// Domain failures go into the envelope's error, never out of `execute`.
pub trait ReportCommand {
    /// Command name, also the artifact file name prefix
    fn name(&self) -> &str;

    /// Run the command and report
    fn execute(&self) -> ResponseEnvelope;

    /// Short description for listings
    fn description(&self) -> String {
        String::new()
    }

    fn info(&self) -> CommandInfo {
        CommandInfo {
            name: self.name().to_string(),
            description: self.description(),
        }
    }
}

/// Information about a command (for discovery)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandInfo {
    pub name: String,
    pub description: String,
}

/// Render a JSON value as a single flat string.
///
/// Strings pass through, null is empty, arrays join with `", "`, objects
/// render as `key=value` pairs.
pub fn flatten_value(value: &serde_json::Value) -> String {
    use serde_json::Value;

    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => join_list(items.iter().map(flatten_value)),
        Value::Object(map) => join_list(
            map.iter()
                .map(|(k, v)| format!("{}={}", k, flatten_value(v))),
        ),
    }
}

/// Join list items for the flat view.
pub fn join_list<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|s| s.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(LIST_SEPARATOR)
}

/// Flat view of every top-level field of a document, raw first.
///
/// Convenience for providers whose flat keys equal their document keys.
pub fn flatten_document(doc: &NamespacedDocument) -> FlatData {
    doc.raw()
        .iter()
        .chain(doc.calculated().iter())
        .map(|(k, v)| (k.clone(), flatten_value(v)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Repo;

    impl DataProvider for Repo {
        fn hints(&self) -> Vec<Hint> {
            vec![Hint::single_item(".raw.name", "Repository name").unwrap()]
        }

        fn to_namespaced_document(&self) -> NamespacedDocument {
            NamespacedDocument::new()
                .with_raw("name", "widgets")
                .with_raw("topics", vec!["cli", "rust"])
                .with_calculated("is_popular", true)
        }

        fn to_flat_view(&self) -> FlatData {
            flatten_document(&self.to_namespaced_document())
        }
    }

    #[test]
    fn test_flatten_value() {
        assert_eq!(flatten_value(&json!(null)), "");
        assert_eq!(flatten_value(&json!("x")), "x");
        assert_eq!(flatten_value(&json!(42)), "42");
        assert_eq!(flatten_value(&json!(false)), "false");
        assert_eq!(flatten_value(&json!(["a", "b", 3])), "a, b, 3");
        assert_eq!(flatten_value(&json!({"open": 2, "closed": 5})), "closed=5, open=2");
    }

    #[test]
    fn test_join_list() {
        assert_eq!(join_list(["a", "b"]), "a, b");
        assert_eq!(join_list(Vec::<String>::new()), "");
    }

    #[test]
    fn test_provider_defaults() {
        let repo = Repo;
        let flat = repo.to_flat_view();
        assert_eq!(flat.get("topics"), Some("cli, rust"));
        assert_eq!(flat.get("is_popular"), Some("true"));
        assert_eq!(flat.keys().next(), Some("name"));

        assert_eq!(repo.to_json()["raw"]["name"], "widgets");

        let examples = repo.jq_examples(Path::new("out.json.xz"));
        assert_eq!(examples, vec!["xz -dc 'out.json.xz' | jq '.raw.name'  # Repository name"]);
    }
}
