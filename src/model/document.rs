//! Loaded documents and their format-specific content.

use super::{DocumentProperties, ImageBlob, Table};
use crate::detect::Format;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// A loaded document.
///
/// Owns everything parsed out of the source file and holds no open resources.
/// The format is derived from the native content, so the two can never disagree.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentHandle {
    source_path: PathBuf,
    native: NativeContent,
    warnings: Vec<String>,
}

impl DocumentHandle {
    /// Wrap parsed content.
    pub fn new(source_path: impl Into<PathBuf>, native: NativeContent) -> Self {
        Self {
            source_path: source_path.into(),
            native,
            warnings: Vec::new(),
        }
    }

    /// Attach load-time warnings.
    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }

    /// Source format.
    pub fn format(&self) -> Format {
        match self.native {
            NativeContent::Pdf(_) => Format::Pdf,
            NativeContent::Word(_) => Format::Word,
            NativeContent::Slides(_) => Format::Slides,
        }
    }

    /// Path the document was loaded from.
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// Format-specific content.
    pub fn native(&self) -> &NativeContent {
        &self.native
    }

    /// Non-fatal problems hit while loading.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

/// Parsed content, one variant per format.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "format", rename_all = "lowercase")]
pub enum NativeContent {
    Pdf(PdfContent),
    Word(WordDocument),
    Slides(Presentation),
}

/// A PDF's text plus per-page structured content.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PdfContent {
    /// Text layer, or OCR output when the text layer was empty
    pub text: String,

    /// Whether `text` came from OCR
    pub ocr_applied: bool,

    /// Pages in document order
    pub pages: Vec<PdfPage>,

    /// Info dictionary, if the trailer has one
    pub properties: Option<DocumentProperties>,
}

/// Structured content of a single PDF page.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PdfPage {
    /// Page number (1-indexed)
    pub number: u32,

    /// URI link annotations, in annotation order
    pub links: Vec<String>,

    /// Image XObjects, in resource order
    pub images: Vec<ImageBlob>,

    /// Tables detected from positioned text
    pub tables: Vec<Table>,
}

impl PdfPage {
    /// Create an empty page.
    pub fn new(number: u32) -> Self {
        Self {
            number,
            ..Default::default()
        }
    }
}

/// A word-processor document.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WordDocument {
    /// Top-level body blocks in document order
    pub blocks: Vec<WordBlock>,

    /// Relationships of the main document part, in file order
    pub relationships: Vec<Relationship>,

    /// Bytes of every related media part, keyed by relationship id
    #[serde(skip)]
    pub media: Vec<(String, Vec<u8>)>,

    /// Core properties, if the package has them
    pub properties: Option<DocumentProperties>,
}

impl WordDocument {
    /// Paragraph texts in document order.
    pub fn paragraphs(&self) -> impl Iterator<Item = &str> {
        self.blocks.iter().filter_map(|b| match b {
            WordBlock::Paragraph(text) => Some(text.as_str()),
            WordBlock::Table(_) => None,
        })
    }

    /// Tables in document order.
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.blocks.iter().filter_map(|b| match b {
            WordBlock::Table(table) => Some(table),
            WordBlock::Paragraph(_) => None,
        })
    }

    /// Media bytes for a relationship id.
    pub fn media_for(&self, rel_id: &str) -> Option<&[u8]> {
        self.media
            .iter()
            .find(|(id, _)| id == rel_id)
            .map(|(_, data)| data.as_slice())
    }
}

/// A top-level body block.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WordBlock {
    Paragraph(String),
    Table(Table),
}

/// An OPC package relationship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relationship {
    /// Relationship id (`rId7`)
    pub id: String,

    /// Full relationship type URI
    pub rel_type: String,

    /// Target as written (URL for external targets)
    pub target: String,

    /// Whether the target lives outside the package
    pub external: bool,
}

impl Relationship {
    /// Last path segment of the relationship type.
    pub fn kind(&self) -> &str {
        self.rel_type.rsplit('/').next().unwrap_or(&self.rel_type)
    }

    /// Check if this is a hyperlink relationship.
    pub fn is_hyperlink(&self) -> bool {
        self.kind() == "hyperlink"
    }

    /// Check if this is an image relationship.
    pub fn is_image(&self) -> bool {
        self.kind() == "image"
    }
}

/// A slide deck.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Presentation {
    /// Slides in presentation order
    pub slides: Vec<Slide>,

    /// Core properties, if the package has them
    pub properties: Option<DocumentProperties>,
}

/// A single slide.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Slide {
    /// Slide number (1-indexed)
    pub number: u32,

    /// Shapes in z-order, with groups flattened
    pub shapes: Vec<Shape>,
}

/// A shape on a slide.
#[derive(Debug, Clone, Serialize)]
pub struct Shape {
    /// Shape name from its non-visual properties
    pub name: String,

    /// What the shape holds
    pub kind: ShapeKind,
}

/// Shape payloads.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    /// A shape with a text frame.
    Text(Vec<TextParagraph>),
    /// A picture and its image bytes.
    Picture(ImageBlob),
    /// A graphic frame holding a table.
    Table(Table),
    /// Anything else (connectors, charts, media).
    Other,
}

impl Shape {
    /// Text of the shape's text frame, paragraphs joined by newlines.
    pub fn text(&self) -> Option<String> {
        match &self.kind {
            ShapeKind::Text(paragraphs) => Some(
                paragraphs
                    .iter()
                    .map(TextParagraph::text)
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
            _ => None,
        }
    }
}

/// A paragraph in a slide text frame.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TextParagraph {
    pub runs: Vec<TextRun>,
}

impl TextParagraph {
    /// Concatenated run text.
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

/// A run of text, optionally hyperlinked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TextRun {
    pub text: String,

    /// Resolved hyperlink address
    pub hyperlink: Option<String>,
}

impl TextRun {
    /// Create a plain run.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            hyperlink: None,
        }
    }

    /// Create a hyperlinked run.
    pub fn linked(text: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            hyperlink: Some(address.into()),
        }
    }
}
