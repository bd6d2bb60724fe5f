//! Uniform extraction results.

use super::{ImageBlob, Metadata, Table};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The five kinds of content every format can yield.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Text,
    Links,
    Images,
    Tables,
    Metadata,
}

impl ContentKind {
    /// Every kind, in the order sinks process them.
    pub const ALL: [ContentKind; 5] = [
        ContentKind::Text,
        ContentKind::Links,
        ContentKind::Images,
        ContentKind::Tables,
        ContentKind::Metadata,
    ];

    /// Name used for directories and on the command line.
    pub fn name(self) -> &'static str {
        match self {
            ContentKind::Text => "text",
            ContentKind::Links => "links",
            ContentKind::Images => "images",
            ContentKind::Tables => "tables",
            ContentKind::Metadata => "metadata",
        }
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ContentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        ContentKind::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!(
                    "unknown content kind '{}' (expected one of: text, links, images, tables, metadata)",
                    s
                )
            })
    }
}

/// One content kind's extraction result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Extraction {
    /// Full text, possibly empty.
    Text(String),
    /// URIs in document order, duplicates kept.
    Links(Vec<String>),
    /// Encoded images in sequence order.
    Images(Vec<ImageBlob>),
    /// Tables in document order.
    Tables(Vec<Table>),
    /// The standard metadata mapping.
    Metadata(Metadata),
}

impl Extraction {
    /// Which kind this result carries.
    pub fn kind(&self) -> ContentKind {
        match self {
            Extraction::Text(_) => ContentKind::Text,
            Extraction::Links(_) => ContentKind::Links,
            Extraction::Images(_) => ContentKind::Images,
            Extraction::Tables(_) => ContentKind::Tables,
            Extraction::Metadata(_) => ContentKind::Metadata,
        }
    }

    /// Number of items (characters for text, keys for metadata).
    pub fn len(&self) -> usize {
        match self {
            Extraction::Text(text) => text.chars().count(),
            Extraction::Links(links) => links.len(),
            Extraction::Images(images) => images.len(),
            Extraction::Tables(tables) => tables.len(),
            Extraction::Metadata(metadata) => metadata.len(),
        }
    }

    /// Check whether the result carries nothing.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
