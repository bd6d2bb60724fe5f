//! Error types for undoc library.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for undoc operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while loading, extracting or persisting documents.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The path does not carry the extension required for the format.
    #[error("Invalid format: {path} is not a {expected} file")]
    InvalidFormat {
        /// Offending path.
        path: PathBuf,
        /// Human-readable name of the expected format.
        expected: String,
    },

    /// The path does not exist or is not a regular file.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// The underlying parser (or OCR) could not produce a document.
    #[error("Failed to load document: {0}")]
    LoadFailure(String),

    /// A single item (image, table, page) failed; processing continued.
    #[error("Failed to extract {item}: {reason}")]
    ExtractionPartialFailure {
        /// Which item failed, e.g. `image 3`.
        item: String,
        /// Underlying cause.
        reason: String,
    },

    /// A sink could not persist a result.
    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),
}

impl Error {
    /// Shorthand for a per-item failure.
    pub fn partial(item: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Error::ExtractionPartialFailure {
            item: item.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error is fatal for the document it was raised on.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::ExtractionPartialFailure { .. })
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            _ => Error::LoadFailure(format!("PDF: {}", err)),
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => Error::LoadFailure(format!("container: {}", e)),
            _ => Error::LoadFailure(format!("container: {}", err)),
        }
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::LoadFailure(format!("XML: {}", err))
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::PersistenceFailure(format!("database: {}", err))
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::PersistenceFailure(format!("csv: {}", err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::PersistenceFailure(format!("json: {}", err))
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::partial("image", err)
    }
}
