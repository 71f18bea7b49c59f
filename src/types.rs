//! Shared types used across all providers.

use crate::errors::DocumentError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// JSON object used inside each namespace.
pub type JsonMap = serde_json::Map<String, serde_json::Value>;

/// Provenance namespace of a value in a result document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Namespace {
    /// Taken verbatim from the upstream data source
    Raw,
    /// Derived by the provider
    Calculated,
}

impl Namespace {
    /// Both namespaces, in document order.
    pub const ALL: [Namespace; 2] = [Namespace::Raw, Namespace::Calculated];

    /// Top-level key in the document.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Calculated => "calculated",
        }
    }

    /// Query root addressing this namespace (e.g. `.raw`).
    pub fn root(&self) -> &'static str {
        match self {
            Self::Raw => ".raw",
            Self::Calculated => ".calculated",
        }
    }

    /// The other namespace.
    pub fn other(&self) -> Namespace {
        match self {
            Self::Raw => Self::Calculated,
            Self::Calculated => Self::Raw,
        }
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Lossless, provenance-tagged view of one provider's data.
///
/// The two namespaces never share a top-level key, so a consumer can always
/// tell where a value came from. Deserialization rejects documents that
/// break this.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DocumentRepr")]
pub struct NamespacedDocument {
    raw: JsonMap,
    calculated: JsonMap,
}

#[derive(Deserialize)]
struct DocumentRepr {
    #[serde(default)]
    raw: JsonMap,
    #[serde(default)]
    calculated: JsonMap,
}

impl TryFrom<DocumentRepr> for NamespacedDocument {
    type Error = DocumentError;

    fn try_from(repr: DocumentRepr) -> Result<Self, DocumentError> {
        let document = Self {
            raw: repr.raw,
            calculated: repr.calculated,
        };
        document.validate()?;
        Ok(document)
    }
}

impl NamespacedDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, rejecting keys already used by the other namespace.
    ///
    /// Re-inserting into the same namespace overwrites.
    pub fn insert(
        &mut self,
        namespace: Namespace,
        key: impl Into<String>,
        value: serde_json::Value,
    ) -> Result<(), DocumentError> {
        let key = key.into();
        if self.map(namespace.other()).contains_key(&key) {
            return Err(DocumentError::KeyCollision {
                key,
                existing: namespace.other().key().to_string(),
            });
        }
        self.map_mut(namespace).insert(key, value);
        Ok(())
    }

    /// Add a raw value (builder). Colliding keys are dropped with a warning.
    pub fn with_raw(self, key: impl Into<String>, value: impl Serialize) -> Self {
        self.with(Namespace::Raw, key, value)
    }

    /// Add a calculated value (builder). Colliding keys are dropped with a warning.
    pub fn with_calculated(self, key: impl Into<String>, value: impl Serialize) -> Self {
        self.with(Namespace::Calculated, key, value)
    }

    fn with(mut self, namespace: Namespace, key: impl Into<String>, value: impl Serialize) -> Self {
        let key = key.into();
        match serde_json::to_value(value) {
            Ok(v) => {
                if let Err(e) = self.insert(namespace, key, v) {
                    log::warn!("Dropping {} value: {}", namespace, e);
                }
            }
            Err(e) => log::warn!("Dropping {} value '{}': {}", namespace, key, e),
        }
        self
    }

    /// Look up a top-level value.
    pub fn get(&self, namespace: Namespace, key: &str) -> Option<&serde_json::Value> {
        self.map(namespace).get(key)
    }

    pub fn raw(&self) -> &JsonMap {
        &self.raw
    }

    pub fn calculated(&self) -> &JsonMap {
        &self.calculated
    }

    /// Which namespace holds `key`, if any.
    pub fn namespace_of(&self, key: &str) -> Option<Namespace> {
        Namespace::ALL
            .into_iter()
            .find(|ns| self.map(*ns).contains_key(key))
    }

    /// Re-check the namespace split (for deserialized documents).
    pub fn validate(&self) -> Result<(), DocumentError> {
        match self.raw.keys().find(|k| self.calculated.contains_key(*k)) {
            Some(key) => Err(DocumentError::KeyCollision {
                key: key.clone(),
                existing: Namespace::Raw.key().to_string(),
            }),
            None => Ok(()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty() && self.calculated.is_empty()
    }

    /// JSON form `{"raw": {...}, "calculated": {...}}`.
    pub fn to_value(&self) -> serde_json::Value {
        let mut doc = JsonMap::new();
        doc.insert(
            Namespace::Raw.key().to_string(),
            serde_json::Value::Object(self.raw.clone()),
        );
        doc.insert(
            Namespace::Calculated.key().to_string(),
            serde_json::Value::Object(self.calculated.clone()),
        );
        serde_json::Value::Object(doc)
    }

    fn map(&self, namespace: Namespace) -> &JsonMap {
        match namespace {
            Namespace::Raw => &self.raw,
            Namespace::Calculated => &self.calculated,
        }
    }

    fn map_mut(&mut self, namespace: Namespace) -> &mut JsonMap {
        match namespace {
            Namespace::Raw => &mut self.raw,
            Namespace::Calculated => &mut self.calculated,
        }
    }
}

/// Ordered string-to-string map for the flat text view.
///
/// Keeps insertion order; writing an existing key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlatData(IndexMap<String, String>);

impl FlatData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite. Returns the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    /// Builder form of `insert`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FlatData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut data = FlatData::new();
        data.extend(iter);
        data
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for FlatData {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl IntoIterator for FlatData {
    type Item = (String, String);
    type IntoIter = indexmap::map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
