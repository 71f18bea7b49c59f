//! Query hints into result artifacts.
//!
//! A hint names one path into a result document together with what the path
//! yields. Consumers use hints to pull data out of an artifact with `jq`
//! instead of loading the whole document.
//!
//! The `scope` of a hint decides how the path is rewritten when several
//! single-item documents are merged into one parent document (see
//! [`crate::merge`]).

use crate::errors::HintError;
use crate::types::Namespace;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Shell pipeline that decompresses an artifact to stdout.
pub const DECOMPRESS_COMMAND: &str = "xz -dc";

/// Structured query tool the examples pipe into.
pub const QUERY_TOOL: &str = "jq";

/// How a hint relates to a merged parent document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HintScope {
    /// Written against one item document; needs the collection prefix after a merge.
    SingleItem,

    /// Already addresses the merged collection.
    AllItems,

    /// Addresses parent-level fields; valid unchanged.
    ParentLevel,
}

impl std::fmt::Display for HintScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SingleItem => write!(f, "single_item"),
            Self::AllItems => write!(f, "all_items"),
            Self::ParentLevel => write!(f, "parent_level"),
        }
    }
}

/// One queryable path into a result document.
///
/// Deserialization runs the same checks as [`Hint::new`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "HintRepr")]
pub struct Hint {
    query: String,
    description: String,
    scope: HintScope,
}

impl Hint {
    /// Create a validated hint.
    ///
    /// Every query starts with `.`; single-item queries must be rooted at
    /// `.raw` or `.calculated`.
    pub fn new(
        query: impl Into<String>,
        description: impl Into<String>,
        scope: HintScope,
    ) -> Result<Self, HintError> {
        let query = query.into();
        let query_trimmed = query.trim();
        if query_trimmed.is_empty() {
            return Err(HintError::EmptyQuery);
        }
        if !query_trimmed.starts_with('.') {
            return Err(HintError::MissingLeadingDot(query));
        }
        if scope == HintScope::SingleItem && namespace_of_query(query_trimmed).is_none() {
            return Err(HintError::UnrootedQuery(query));
        }

        Ok(Self {
            query: query_trimmed.to_string(),
            description: description.into(),
            scope,
        })
    }

    /// Create a single-item hint.
    pub fn single_item(
        query: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, HintError> {
        Self::new(query, description, HintScope::SingleItem)
    }

    /// Create an all-items hint.
    pub fn all_items(
        query: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, HintError> {
        Self::new(query, description, HintScope::AllItems)
    }

    /// Create a parent-level hint.
    pub fn parent_level(
        query: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, HintError> {
        Self::new(query, description, HintScope::ParentLevel)
    }

    // Rewritten hints are produced by the merge engine and skip the
    // namespace-root check.
    pub(crate) fn rewritten(query: String, description: String, scope: HintScope) -> Self {
        Self {
            query,
            description,
            scope,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn scope(&self) -> HintScope {
        self.scope
    }

    /// Namespace the query is rooted at, if any.
    pub fn namespace(&self) -> Option<Namespace> {
        namespace_of_query(&self.query)
    }

    /// Runnable example against `artifact_path`.
    ///
    /// Both the path and the query are single-quoted for the shell.
    pub fn jq_example(&self, artifact_path: &Path) -> String {
        format!(
            "{} '{}' | {} '{}'  # {}",
            DECOMPRESS_COMMAND,
            shell_single_quote_escape(&artifact_path.display().to_string()),
            QUERY_TOOL,
            shell_single_quote_escape(&self.query),
            self.description
        )
    }
}

#[derive(Deserialize)]
struct HintRepr {
    query: String,
    description: String,
    scope: HintScope,
}

impl TryFrom<HintRepr> for Hint {
    type Error = HintError;

    fn try_from(repr: HintRepr) -> Result<Self, HintError> {
        Hint::new(repr.query, repr.description, repr.scope)
    }
}

/// Runnable `jq` invocations for every hint, in order.
///
/// Pure formatting: the artifact is never opened.
pub fn generate_jq_examples<'a>(
    hints: impl IntoIterator<Item = &'a Hint>,
    artifact_path: &Path,
) -> Vec<String> {
    hints
        .into_iter()
        .map(|hint| hint.jq_example(artifact_path))
        .collect()
}

fn namespace_of_query(query: &str) -> Option<Namespace> {
    Namespace::ALL.into_iter().find(|ns| {
        query
            .strip_prefix(ns.root())
            .map(|rest| {
                rest.is_empty()
                    || rest.starts_with('.')
                    || rest.starts_with('[')
                    || rest.starts_with(' ')
                    || rest.starts_with('|')
            })
            .unwrap_or(false)
    })
}

// Close the quote, emit an escaped quote, reopen.
fn shell_single_quote_escape(text: &str) -> String {
    text.replace('\'', r"'\''")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_hint_validation() {
        assert!(Hint::single_item(".raw.name", "Repository name").is_ok());
        assert!(Hint::single_item(".calculated", "All derived values").is_ok());
        assert!(Hint::single_item(".raw[\"full name\"]", "Quoted key").is_ok());

        assert_eq!(
            Hint::single_item("", "empty").unwrap_err(),
            HintError::EmptyQuery
        );
        assert!(matches!(
            Hint::single_item("raw.name", "no dot"),
            Err(HintError::MissingLeadingDot(_))
        ));
        assert!(matches!(
            Hint::single_item(".rawish.name", "wrong root"),
            Err(HintError::UnrootedQuery(_))
        ));
        assert!(matches!(
            Hint::single_item(".summary.total", "parent field"),
            Err(HintError::UnrootedQuery(_))
        ));
        assert!(Hint::parent_level(".summary.total", "Total").is_ok());
    }

    #[test]
    fn test_hint_namespace() {
        let hint = Hint::single_item(".calculated.age_days", "Age").unwrap();
        assert_eq!(hint.namespace(), Some(Namespace::Calculated));
        assert_eq!(hint.scope(), HintScope::SingleItem);

        let parent = Hint::parent_level(".summary", "Summary").unwrap();
        assert_eq!(parent.namespace(), None);
    }

    #[test]
    fn test_jq_examples() {
        let hints = vec![
            Hint::single_item(".raw.name", "Repository name").unwrap(),
            Hint::single_item(".raw.labels | map(select(. == 'bug'))", "Bug labels").unwrap(),
        ];
        let path = PathBuf::from("var/results/summary_2026-10-16_09-30-00.json.xz");
        let examples = generate_jq_examples(&hints, &path);

        assert_eq!(examples.len(), 2);
        assert_eq!(
            examples[0],
            "xz -dc 'var/results/summary_2026-10-16_09-30-00.json.xz' | jq '.raw.name'  # Repository name"
        );
        assert!(examples[1].contains(r"select(. == '\''bug'\'')"));
        assert!(examples[1].ends_with("# Bug labels"));
    }

    #[test]
    fn test_jq_example_quotes_path() {
        let hint = Hint::single_item(".raw.name", "Name").unwrap();
        let path = PathBuf::from("/Users/me/My Projects/var/results/s_2026-10-16_00-00-00.json.xz");
        assert_eq!(
            hint.jq_example(&path),
            "xz -dc '/Users/me/My Projects/var/results/s_2026-10-16_00-00-00.json.xz' | jq '.raw.name'  # Name"
        );

        let path = PathBuf::from("/tmp/bob's/s.json.xz");
        assert!(hint.jq_example(&path).starts_with(r"xz -dc '/tmp/bob'\''s/s.json.xz' |"));
    }

    #[test]
    fn test_hint_serialization() {
        let hint = Hint::parent_level(".summary.total", "Total items").unwrap();
        let json = serde_json::to_value(&hint).unwrap();
        assert_eq!(json["scope"], "parent_level");
        assert_eq!(HintScope::AllItems.to_string(), "all_items");

        let back: Hint = serde_json::from_value(json).unwrap();
        assert_eq!(back, hint);
    }

    #[test]
    fn test_hint_deserialization_validates() {
        let unrooted = r#"{"query":".summary.total","description":"x","scope":"single_item"}"#;
        assert!(serde_json::from_str::<Hint>(unrooted).is_err());

        let no_dot = r#"{"query":"raw.name","description":"x","scope":"all_items"}"#;
        assert!(serde_json::from_str::<Hint>(no_dot).is_err());

        let empty = r#"{"query":"  ","description":"x","scope":"parent_level"}"#;
        assert!(serde_json::from_str::<Hint>(empty).is_err());

        let merged = r#"{"query":".items[].raw.name","description":"x","scope":"all_items"}"#;
        let hint: Hint = serde_json::from_str(merged).unwrap();
        assert_eq!(hint.scope(), HintScope::AllItems);
    }
}
