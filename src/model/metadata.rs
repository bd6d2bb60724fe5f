//! Document metadata.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserialize;

/// Keys every metadata extraction produces, in output order.
pub const STANDARD_KEYS: [&str; 6] = ["title", "author", "subject", "keywords", "created", "modified"];

/// Properties read from a document's properties object
/// (PDF info dictionary or OOXML core-properties part).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, serde::Serialize)]
pub struct DocumentProperties {
    /// Document title
    pub title: Option<String>,

    /// Document author (OOXML `dc:creator`)
    pub author: Option<String>,

    /// Document subject
    pub subject: Option<String>,

    /// Keywords
    pub keywords: Option<String>,

    /// Creation date, RFC 3339 when parseable
    pub created: Option<String>,

    /// Last modification date, RFC 3339 when parseable
    pub modified: Option<String>,
}

impl DocumentProperties {
    /// Convert to the standard six-key mapping.
    pub fn to_metadata(&self) -> Metadata {
        let mut metadata = Metadata::new();
        metadata.insert("title", self.title.clone());
        metadata.insert("author", self.author.clone());
        metadata.insert("subject", self.subject.clone());
        metadata.insert("keywords", self.keywords.clone());
        metadata.insert("created", self.created.clone());
        metadata.insert("modified", self.modified.clone());
        metadata
    }

    /// Check whether every property is unset.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Ordered mapping of metadata keys to optional values.
///
/// Insertion order is preserved so sinks write keys in a stable order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    entries: Vec<(String, Option<String>)>,
}

impl Metadata {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard keys, all null.
    pub fn standard() -> Self {
        DocumentProperties::default().to_metadata()
    }

    /// Insert or replace a key, keeping its original position on replace.
    pub fn insert(&mut self, key: impl Into<String>, value: Option<String>) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Look up a key. `None` means absent, `Some(None)` means present but null.
    pub fn get(&self, key: &str) -> Option<Option<&str>> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_deref())
    }

    /// Iterate over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if there are no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render as `key: value` lines, with null values written as `None`.
    pub fn to_lines(&self) -> String {
        self.iter()
            .map(|(k, v)| format!("{}: {}\n", k, v.unwrap_or("None")))
            .collect()
    }
}

impl<K: Into<String>> FromIterator<(K, Option<String>)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (K, Option<String>)>>(iter: I) -> Self {
        let mut metadata = Metadata::new();
        for (k, v) in iter {
            metadata.insert(k, v);
        }
        metadata
    }
}

impl Serialize for Metadata {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}
