//! Source adapters: validate a file and load it into a [`DocumentHandle`].
//!
//! Validation never touches the parsers. A path with the wrong extension fails
//! with [`Error::InvalidFormat`](crate::Error::InvalidFormat), a missing file
//! with [`Error::FileNotFound`](crate::Error::FileNotFound); only then is the
//! header checked and the container parsed.

pub mod ocr;
pub mod ooxml;
mod options;
pub mod pdf;

pub use ocr::{OcrEngine, OcrOutcome, OcrPipeline, PageRasterizer, Pdftoppm, TesseractCli};
pub use options::{ErrorMode, LoadOptions};

use std::path::Path;

use crate::detect::{self, Format};
use crate::error::Result;
use crate::model::DocumentHandle;

/// Load a document, inferring the format from its extension.
pub fn load<P: AsRef<Path>>(path: P) -> Result<DocumentHandle> {
    load_with_options(path, &LoadOptions::default())
}

/// Load a document that must be of the `expected` format.
pub fn load_as<P: AsRef<Path>>(path: P, expected: Format) -> Result<DocumentHandle> {
    load_as_with_options(path, expected, &LoadOptions::default())
}

/// Load a document with custom options, inferring the format from its extension.
pub fn load_with_options<P: AsRef<Path>>(path: P, options: &LoadOptions) -> Result<DocumentHandle> {
    let path = path.as_ref();
    let format = detect::format_for_path(path)?;
    parse(path, format, options)
}

/// Load a document of the `expected` format with custom options.
pub fn load_as_with_options<P: AsRef<Path>>(
    path: P,
    expected: Format,
    options: &LoadOptions,
) -> Result<DocumentHandle> {
    let path = path.as_ref();
    detect::validate_path(path, expected)?;
    parse(path, expected, options)
}

fn parse(path: &Path, format: Format, options: &LoadOptions) -> Result<DocumentHandle> {
    detect::check_magic(path, format)?;
    log::debug!("loading {} as {}", path.display(), format.display_name());

    let handle = match format {
        Format::Pdf => pdf::load(path, options)?,
        Format::Word => ooxml::load_word(path)?,
        Format::Slides => ooxml::load_slides(path)?,
    };

    for warning in handle.warnings() {
        log::debug!("{}: {}", path.display(), warning);
    }
    Ok(handle)
}
