//! Format-agnostic extraction over a loaded [`DocumentHandle`].
//!
//! Every operation reads the handle and nothing else, so repeated calls return
//! equal results.

mod pdf;
mod slides;
mod word;

use crate::model::{
    ContentKind, DocumentHandle, Extraction, ImageBlob, Metadata, NativeContent, Table,
};

/// Uniform content operations over one document.
#[derive(Debug, Clone, Copy)]
pub struct ContentExtractor<'a> {
    handle: &'a DocumentHandle,
}

impl<'a> ContentExtractor<'a> {
    /// Create an extractor for a loaded document.
    pub fn new(handle: &'a DocumentHandle) -> Self {
        Self { handle }
    }

    /// The document being extracted from.
    pub fn handle(&self) -> &'a DocumentHandle {
        self.handle
    }

    /// Full text.
    ///
    /// PDFs return the text layer (or OCR output) as loaded; word-processor
    /// documents join paragraphs with newlines; slide decks join the text of
    /// every non-blank text shape with newlines.
    pub fn extract_text(&self) -> String {
        match self.handle.native() {
            NativeContent::Pdf(content) => pdf::text(content),
            NativeContent::Word(doc) => word::text(doc),
            NativeContent::Slides(deck) => slides::text(deck),
        }
    }

    /// Hyperlink addresses, duplicates kept.
    pub fn extract_links(&self) -> Vec<String> {
        match self.handle.native() {
            NativeContent::Pdf(content) => pdf::links(content),
            NativeContent::Word(doc) => word::links(doc),
            NativeContent::Slides(deck) => slides::links(deck),
        }
    }

    /// Embedded images in document order.
    pub fn extract_images(&self) -> Vec<ImageBlob> {
        match self.handle.native() {
            NativeContent::Pdf(content) => pdf::images(content),
            NativeContent::Word(doc) => word::images(doc),
            NativeContent::Slides(deck) => slides::images(deck),
        }
    }

    /// Tables as cell grids.
    pub fn extract_tables(&self) -> Vec<Table> {
        match self.handle.native() {
            NativeContent::Pdf(content) => pdf::tables(content),
            NativeContent::Word(doc) => word::tables(doc),
            NativeContent::Slides(deck) => slides::tables(deck),
        }
    }

    /// The standard six metadata keys. Keys are never omitted; missing values
    /// are null.
    pub fn extract_metadata(&self) -> Metadata {
        match self.handle.native() {
            NativeContent::Pdf(content) => pdf::metadata(content),
            NativeContent::Word(doc) => word::metadata(doc),
            NativeContent::Slides(deck) => slides::metadata(deck),
        }
    }

    /// Extract one content kind.
    pub fn extract(&self, kind: ContentKind) -> Extraction {
        match kind {
            ContentKind::Text => Extraction::Text(self.extract_text()),
            ContentKind::Links => Extraction::Links(self.extract_links()),
            ContentKind::Images => Extraction::Images(self.extract_images()),
            ContentKind::Tables => Extraction::Tables(self.extract_tables()),
            ContentKind::Metadata => Extraction::Metadata(self.extract_metadata()),
        }
    }

    /// Extract every content kind, in [`ContentKind::ALL`] order.
    pub fn extract_all(&self) -> Vec<Extraction> {
        ContentKind::ALL.iter().map(|&kind| self.extract(kind)).collect()
    }

    /// Non-fatal problems recorded while loading.
    pub fn warnings(&self) -> &'a [String] {
        self.handle.warnings()
    }
}
