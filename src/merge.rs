//! Merging per-item results into one parent document.
//!
//! A multi-item command writes one namespaced document per item, then merges
//! them under a collection field of a parent document:
//!
//! ```text
//! { "summary": {...}, "items": [ {"raw": ..., "calculated": ...}, ... ] }
//! ```
//!
//! Hints collected from the item providers are rewritten to stay valid
//! against the merged document:
//!
//! | scope          | rewrite                                   |
//! |----------------|-------------------------------------------|
//! | `parent_level` | unchanged                                 |
//! | `all_items`    | unchanged                                 |
//! | `single_item`  | `.raw.x` → `.items[].raw.x`, now `all_items` |
//!
//! Rewriting is textual. Data values are never inspected.

use crate::errors::MergeError;
use crate::hints::{Hint, HintScope};
use crate::types::{JsonMap, NamespacedDocument};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Default collection field of merged documents.
pub const DEFAULT_COLLECTION: &str = "items";

/// Where item documents live in a merged parent document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeConvention {
    pub collection: String,
}

impl Default for MergeConvention {
    fn default() -> Self {
        Self::new(DEFAULT_COLLECTION)
    }
}

impl MergeConvention {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
        }
    }

    /// Path expression iterating the collection (e.g. `.items[]`).
    pub fn accessor(&self) -> String {
        format!(".{}[]", self.collection)
    }

    /// Rewrite one query written against a single item.
    pub fn rewrite_query(&self, query: &str) -> String {
        let rest = query.strip_prefix('.').unwrap_or(query);
        if rest.is_empty() {
            self.accessor()
        } else if rest.starts_with('[') {
            format!("{}{}", self.accessor(), rest)
        } else {
            format!("{}.{}", self.accessor(), rest)
        }
    }
}

/// Rewrite a hint for the merged document.
pub fn rewrite_hint(hint: &Hint, convention: &MergeConvention) -> Hint {
    match hint.scope() {
        HintScope::ParentLevel | HintScope::AllItems => hint.clone(),
        HintScope::SingleItem => Hint::rewritten(
            convention.rewrite_query(hint.query()),
            hint.description().to_string(),
            HintScope::AllItems,
        ),
    }
}

/// Rewrite the hints of many item providers into one hint set.
///
/// Duplicate queries collapse to the first occurrence, order preserved.
pub fn merge_hints(
    hints: impl IntoIterator<Item = Hint>,
    convention: &MergeConvention,
) -> Vec<Hint> {
    let mut seen = HashSet::new();
    hints
        .into_iter()
        .map(|hint| rewrite_hint(&hint, convention))
        .filter(|hint| seen.insert(hint.query().to_string()))
        .collect()
}

/// Build the merged parent document.
pub fn merge_documents(
    parent_fields: JsonMap,
    items: impl IntoIterator<Item = NamespacedDocument>,
    convention: &MergeConvention,
) -> Result<serde_json::Value, MergeError> {
    if parent_fields.contains_key(&convention.collection) {
        return Err(MergeError::CollectionKeyTaken(convention.collection.clone()));
    }

    let items: Vec<serde_json::Value> = items.into_iter().map(|doc| doc.to_value()).collect();
    let mut merged = parent_fields;
    merged.insert(
        convention.collection.clone(),
        serde_json::Value::Array(items),
    );
    Ok(serde_json::Value::Object(merged))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_item_rewrite() {
        let convention = MergeConvention::default();
        let hint = Hint::single_item(".raw.name", "Name").unwrap();
        let rewritten = rewrite_hint(&hint, &convention);

        assert_eq!(rewritten.query(), ".items[].raw.name");
        assert_eq!(rewritten.scope(), HintScope::AllItems);
        assert_eq!(rewritten.description(), "Name");
    }

    #[test]
    fn test_parent_and_all_items_unchanged() {
        let convention = MergeConvention::default();
        let parent = Hint::parent_level(".summary.total", "Total").unwrap();
        let all = Hint::all_items(".items | length", "Count").unwrap();

        assert_eq!(rewrite_hint(&parent, &convention), parent);
        assert_eq!(rewrite_hint(&all, &convention), all);
    }

    #[test]
    fn test_rewrite_is_idempotent_across_merges() {
        let convention = MergeConvention::default();
        let hint = Hint::single_item(".calculated.age_days", "Age").unwrap();
        let once = rewrite_hint(&hint, &convention);
        let twice = rewrite_hint(&once, &convention);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_rewrite_query_shapes() {
        let convention = MergeConvention::new("repos");
        assert_eq!(convention.accessor(), ".repos[]");
        assert_eq!(convention.rewrite_query("."), ".repos[]");
        assert_eq!(convention.rewrite_query(".raw"), ".repos[].raw");
        assert_eq!(
            convention.rewrite_query(".raw.labels | length"),
            ".repos[].raw.labels | length"
        );
        assert_eq!(convention.rewrite_query(".[0]"), ".repos[][0]");
    }

    #[test]
    fn test_merge_hints_dedupes() {
        let convention = MergeConvention::default();
        let per_item = vec![
            Hint::single_item(".raw.name", "Name").unwrap(),
            Hint::single_item(".raw.name", "Name (second item)").unwrap(),
            Hint::parent_level(".summary.total", "Total").unwrap(),
            Hint::single_item(".calculated.age_days", "Age").unwrap(),
        ];
        let merged = merge_hints(per_item, &convention);
        let queries: Vec<_> = merged.iter().map(|h| h.query()).collect();

        assert_eq!(
            queries,
            vec![".items[].raw.name", ".summary.total", ".items[].calculated.age_days"]
        );
        assert_eq!(merged[0].description(), "Name");
    }

    #[test]
    fn test_merge_documents() {
        let convention = MergeConvention::default();
        let mut parent = JsonMap::new();
        parent.insert("summary".into(), json!({"total": 2}));

        let items = vec![
            NamespacedDocument::new().with_raw("name", "a"),
            NamespacedDocument::new().with_raw("name", "b"),
        ];
        let merged = merge_documents(parent, items, &convention).unwrap();

        assert_eq!(merged["summary"]["total"], 2);
        assert_eq!(merged["items"][1]["raw"]["name"], "b");
        assert_eq!(merged["items"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_merge_documents_rejects_taken_key() {
        let mut parent = JsonMap::new();
        parent.insert("items".into(), json!([]));
        let err = merge_documents(parent, vec![], &MergeConvention::default()).unwrap_err();
        assert_eq!(err, MergeError::CollectionKeyTaken("items".into()));
    }
}
