//! Office Open XML containers: word-processor documents and slide decks.

mod docx;
mod package;
mod pptx;

pub use docx::parse_body;
pub use package::{parse_core_properties, parse_relationships, resolve_target, Package};
pub use pptx::{parse_slide, parse_slide_list};

use std::path::Path;

use crate::error::Result;
use crate::model::{DocumentHandle, NativeContent};

/// Load a validated `.docx` path.
pub(crate) fn load_word(path: &Path) -> Result<DocumentHandle> {
    let mut package = Package::open(path)?;
    let mut warnings = Vec::new();
    let document = docx::read(&mut package, &mut warnings)?;
    log::debug!(
        "{}: {} blocks, {} relationships",
        path.display(),
        document.blocks.len(),
        document.relationships.len()
    );
    Ok(DocumentHandle::new(path, NativeContent::Word(document)).with_warnings(warnings))
}

/// Load a validated `.pptx` path.
pub(crate) fn load_slides(path: &Path) -> Result<DocumentHandle> {
    let mut package = Package::open(path)?;
    let mut warnings = Vec::new();
    let presentation = pptx::read(&mut package, &mut warnings)?;
    log::debug!("{}: {} slides", path.display(), presentation.slides.len());
    Ok(DocumentHandle::new(path, NativeContent::Slides(presentation)).with_warnings(warnings))
}
