//! # undoc
//!
//! Extract text, links, images, tables and metadata from PDF, DOCX and PPTX
//! documents, and persist them to a directory tree or an SQLite database.
//!
//! ## Quick Start
//!
//! ```no_run
//! use undoc::{load, ContentExtractor, FilesystemSink, SqliteSink, ContentKind};
//!
//! fn main() -> undoc::Result<()> {
//!     let handle = load("report.pdf")?;
//!     let extractor = ContentExtractor::new(&handle);
//!     println!("{}", extractor.extract_text());
//!
//!     let mut files = FilesystemSink::new("output_data")?;
//!     undoc::persist(&mut files, &extractor, &ContentKind::ALL);
//!
//!     let mut db = SqliteSink::open("extracted_data.db")?;
//!     undoc::persist(&mut db, &extractor, &ContentKind::ALL);
//!     db.close()?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Three formats**: PDF (via `lopdf`), DOCX and PPTX (OPC packages read
//!   with `zip` and `quick-xml`)
//! - **OCR fallback**: PDFs with an empty text layer are rasterized and
//!   recognized page by page (`pdftoppm` + `tesseract` by default, pluggable)
//! - **Uniform results**: every format yields the same five content kinds
//! - **Two sinks**: a file tree (text, CSV, re-encoded images) and SQLite
//! - **Batch processing**: optional parallel fan-out with Rayon

pub mod detect;
pub mod error;
pub mod extract;
pub mod model;
pub mod pipeline;
pub mod sink;
pub mod source;

// Re-export commonly used types
pub use detect::{check_magic, format_for_path, validate_path, Format};
pub use error::{Error, Result};
pub use extract::ContentExtractor;
pub use model::{
    ContentKind, DocumentHandle, DocumentProperties, Extraction, ImageBlob, Metadata,
    NativeContent, Table,
};
pub use pipeline::{process_batch, process_file, BatchOptions, FileReport};
pub use sink::{
    deserialize_table, persist, serialize_table, FilesystemSink, PersistReport, Sink, SqliteSink,
    WriteReport,
};
pub use source::{
    load, load_as, load_as_with_options, load_with_options, ErrorMode, LoadOptions, OcrEngine,
    OcrPipeline, PageRasterizer,
};

use std::path::Path;

/// Extract the full text of a document.
///
/// # Example
///
/// ```no_run
/// let text = undoc::extract_text("slides.pptx").unwrap();
/// println!("{}", text);
/// ```
pub fn extract_text<P: AsRef<Path>>(path: P) -> Result<String> {
    let handle = load(path)?;
    Ok(ContentExtractor::new(&handle).extract_text())
}

/// Extract one content kind from a document.
pub fn extract<P: AsRef<Path>>(path: P, kind: ContentKind) -> Result<Extraction> {
    let handle = load(path)?;
    Ok(ContentExtractor::new(&handle).extract(kind))
}

/// Serialize every content kind of a loaded document as JSON.
///
/// Images appear as size and MIME type summaries, not bytes.
pub fn to_json(handle: &DocumentHandle, pretty: bool) -> Result<String> {
    let extractor = ContentExtractor::new(handle);
    let value = serde_json::json!({
        "path": handle.source_path(),
        "format": handle.format(),
        "warnings": handle.warnings(),
        "content": extractor.extract_all(),
    });
    let json = if pretty {
        serde_json::to_string_pretty(&value)?
    } else {
        serde_json::to_string(&value)?
    };
    Ok(json)
}
