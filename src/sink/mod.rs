//! Persistence of extraction results.
//!
//! A [`Sink`] takes one content kind at a time, tagged with the source format.
//! Writes append: running the same write twice leaves two versions (a
//! rewritten file, or a second set of rows). Call [`Sink::clear`] first for
//! replace semantics.

mod fs;
mod images;
mod sql;

pub use self::fs::FilesystemSink;
pub use self::images::{reencode, EncodedImage};
pub use self::sql::{deserialize_table, serialize_table, SqliteSink, DEFAULT_BUSY_TIMEOUT};

use std::fmt;

use serde::Serialize;

use crate::detect::Format;
use crate::error::{Error, Result};
use crate::extract::ContentExtractor;
use crate::model::{ContentKind, Extraction};

/// A destination for extraction results.
pub trait Sink {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Create the storage for `kind` if it does not exist yet. Idempotent.
    fn ensure_target(&mut self, kind: ContentKind) -> Result<()>;

    /// Persist one extraction for a document of `format`.
    ///
    /// Items that cannot be stored (an undecodable image, an unwritable table
    /// file) are skipped and listed in the report; failing to prepare the
    /// target or to store a single-body kind is an error.
    fn write(&mut self, format: Format, extraction: &Extraction) -> Result<WriteReport>;

    /// Remove everything previously written for `format`.
    fn clear(&mut self, format: Format) -> Result<()>;
}

/// An item a sink skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    /// 1-based position in the extraction sequence
    pub index: usize,

    /// Why the item was skipped
    pub reason: String,
}

impl ItemFailure {
    /// The failure as an [`Error::ExtractionPartialFailure`].
    pub fn to_error(&self, kind: ContentKind) -> Error {
        Error::partial(format!("{} {}", kind, self.index), &self.reason)
    }
}

/// Outcome of one [`Sink::write`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteReport {
    pub kind: ContentKind,

    /// Items stored (files, rows or text bodies)
    pub written: usize,

    /// Items skipped
    pub skipped: Vec<ItemFailure>,
}

impl WriteReport {
    pub(crate) fn new(kind: ContentKind) -> Self {
        Self {
            kind,
            written: 0,
            skipped: Vec::new(),
        }
    }

    pub(crate) fn skip(&mut self, index: usize, reason: impl fmt::Display) {
        self.skipped.push(ItemFailure {
            index,
            reason: reason.to_string(),
        });
    }

    /// Whether every item was stored.
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Outcome of [`persist`].
#[derive(Debug, Default)]
pub struct PersistReport {
    /// Reports of the kinds that were written
    pub written: Vec<WriteReport>,

    /// Kinds whose write failed outright
    pub failed: Vec<(ContentKind, Error)>,
}

impl PersistReport {
    /// Whether every kind was written with nothing skipped.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.written.iter().all(WriteReport::is_complete)
    }

    /// Total items skipped across kinds.
    pub fn skipped_count(&self) -> usize {
        self.written.iter().map(|r| r.skipped.len()).sum()
    }
}

/// Pull each of `kinds` from `extractor` and write it to `sink`.
///
/// A kind that fails is logged and recorded; the remaining kinds still run.
pub fn persist<S: Sink + ?Sized>(
    sink: &mut S,
    extractor: &ContentExtractor<'_>,
    kinds: &[ContentKind],
) -> PersistReport {
    let format = extractor.handle().format();
    let mut report = PersistReport::default();

    for &kind in kinds {
        let extraction = extractor.extract(kind);
        match sink.write(format, &extraction) {
            Ok(written) => {
                for failure in &written.skipped {
                    log::warn!("{} sink: {}", sink.name(), failure.to_error(kind));
                }
                log::debug!(
                    "{} sink: {} {} written for {}",
                    sink.name(),
                    written.written,
                    kind,
                    format
                );
                report.written.push(written);
            }
            Err(e) => {
                log::warn!("{} sink: failed to write {} for {}: {}", sink.name(), kind, format, e);
                report.failed.push((kind, e));
            }
        }
    }

    report
}
