//! Document format detection and validation.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Supported source formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Portable Document Format (`.pdf`)
    Pdf,
    /// Word-processor document (`.docx`)
    Word,
    /// Slide deck (`.pptx`)
    Slides,
}

impl Format {
    /// Every supported format.
    pub const ALL: [Format; 3] = [Format::Pdf, Format::Word, Format::Slides];

    /// Tag written into file names and `file_type` columns.
    pub fn tag(self) -> &'static str {
        match self {
            Format::Pdf => "pdf",
            Format::Word => "docx",
            Format::Slides => "ppt",
        }
    }

    /// Required file extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Format::Pdf => "pdf",
            Format::Word => "docx",
            Format::Slides => "pptx",
        }
    }

    /// Human-readable name used in error messages.
    pub fn display_name(self) -> &'static str {
        match self {
            Format::Pdf => "PDF",
            Format::Word => "DOCX",
            Format::Slides => "PPTX",
        }
    }

    /// Map a file extension (case-insensitive) to a format.
    pub fn from_extension(ext: &str) -> Option<Format> {
        Format::ALL
            .into_iter()
            .find(|f| f.extension().eq_ignore_ascii_case(ext))
    }

    /// Map a path to a format by its extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Format> {
        path.as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Format::from_extension)
    }

    /// Parse a `file_type` tag back into a format.
    pub fn from_tag(tag: &str) -> Option<Format> {
        Format::ALL.into_iter().find(|f| f.tag() == tag)
    }

    /// Magic bytes every file of this format starts with.
    fn magic(self) -> &'static [u8] {
        match self {
            Format::Pdf => PDF_MAGIC,
            Format::Word | Format::Slides => ZIP_MAGIC,
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// PDF magic bytes: %PDF-
const PDF_MAGIC: &[u8] = b"%PDF-";
/// ZIP local file header, the container for OOXML packages.
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Validate that `path` is an existing file with the extension `expected` requires.
///
/// The extension is checked first, then existence, so a wrong extension is reported
/// even when the file is also missing. Nothing is read from the file.
pub fn validate_path<P: AsRef<Path>>(path: P, expected: Format) -> Result<()> {
    let path = path.as_ref();
    if Format::from_path(path) != Some(expected) {
        return Err(Error::InvalidFormat {
            path: path.to_path_buf(),
            expected: expected.display_name().to_string(),
        });
    }
    if !path.is_file() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }
    Ok(())
}

/// Work out the format of `path` from its extension and validate it.
pub fn format_for_path<P: AsRef<Path>>(path: P) -> Result<Format> {
    let path = path.as_ref();
    let format = Format::from_path(path).ok_or_else(|| Error::InvalidFormat {
        path: path.to_path_buf(),
        expected: "PDF, DOCX or PPTX".to_string(),
    })?;
    validate_path(path, format)?;
    Ok(format)
}

/// Check that the leading bytes of a file match its format.
///
/// Returns `Error::LoadFailure` when the header is wrong.
pub fn check_magic<P: AsRef<Path>>(path: P, format: Format) -> Result<()> {
    let mut header = [0u8; 8];
    let mut file = File::open(path.as_ref())?;
    let read = file.read(&mut header)?;
    check_magic_bytes(&header[..read], format)
}

/// Byte-slice variant of [`check_magic`].
pub fn check_magic_bytes(data: &[u8], format: Format) -> Result<()> {
    if data.starts_with(format.magic()) {
        Ok(())
    } else {
        Err(Error::LoadFailure(format!(
            "not a valid {} file (bad header)",
            format.display_name()
        )))
    }
}
