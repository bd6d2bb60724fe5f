//! Document model types.
//!
//! Loaded documents keep their format-specific structure in a closed
//! [`NativeContent`] variant; extraction turns that structure into the
//! format-agnostic [`Extraction`] shapes that sinks consume.

mod document;
mod extraction;
mod metadata;
mod resource;
mod table;

pub use document::{
    DocumentHandle, NativeContent, PdfContent, PdfPage, Presentation, Relationship, Shape,
    ShapeKind, Slide, TextParagraph, TextRun, WordBlock, WordDocument,
};
pub use extraction::{ContentKind, Extraction};
pub use metadata::{DocumentProperties, Metadata, STANDARD_KEYS};
pub use resource::ImageBlob;
pub use table::Table;
