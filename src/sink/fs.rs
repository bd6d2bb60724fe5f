//! Filesystem sink.
//!
//! Layout under the base directory:
//!
//! ```text
//! text/<tag>_text.txt
//! links/<tag>_links.txt
//! images/<tag>_image_<n>.<ext>
//! tables/table_<tag>_<n>.csv
//! metadata/<tag>_metadata.txt
//! ```
//!
//! `n` is 1-based and follows the extraction sequence, so a skipped image
//! or table leaves a gap in the numbering. Writing images or tables first
//! removes that format's numbered files from the previous run.

use std::fs;
use std::path::{Path, PathBuf};

use super::images::reencode;
use super::{Sink, WriteReport};
use crate::detect::Format;
use crate::error::{Error, Result};
use crate::model::{ContentKind, Extraction, ImageBlob, Metadata, Table};

/// Writes extraction results as files under a base directory.
#[derive(Debug, Clone)]
pub struct FilesystemSink {
    base: PathBuf,
}

fn persist_err(path: &Path, err: impl std::fmt::Display) -> Error {
    Error::PersistenceFailure(format!("{}: {}", path.display(), err))
}

impl FilesystemSink {
    /// Create the sink, creating `base` if needed. Kind directories are made on
    /// first use.
    pub fn new<P: AsRef<Path>>(base: P) -> Result<Self> {
        let base = base.as_ref().to_path_buf();
        fs::create_dir_all(&base).map_err(|e| persist_err(&base, e))?;
        Ok(Self { base })
    }

    /// Base directory.
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Directory for one content kind.
    pub fn kind_dir(&self, kind: ContentKind) -> PathBuf {
        self.base.join(kind.name())
    }

    /// Path of the single text, links or metadata file for `format`.
    pub fn document_file(&self, kind: ContentKind, format: Format) -> PathBuf {
        self.kind_dir(kind)
            .join(format!("{}_{}.txt", format.tag(), kind.name()))
    }

    /// Path of the `n`th table file for `format`.
    pub fn table_file(&self, format: Format, n: usize) -> PathBuf {
        self.kind_dir(ContentKind::Tables)
            .join(format!("table_{}_{}.csv", format.tag(), n))
    }

    /// Regular files in `dir` whose names start with one of `prefixes`.
    fn prefixed_files(dir: &Path, prefixes: &[&str]) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(dir).map_err(|e| persist_err(dir, e))? {
            let entry = entry.map_err(|e| persist_err(dir, e))?;
            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if is_file && prefixes.iter().any(|p| name.starts_with(p)) {
                files.push(entry.path());
            }
        }
        Ok(files)
    }

    /// Drop the previous run's numbered files so a shorter rerun leaves no
    /// stale items behind. Failures are logged; the write goes ahead.
    fn prune(&self, dir: &Path, prefix: &str) {
        let files = match Self::prefixed_files(dir, &[prefix]) {
            Ok(files) => files,
            Err(e) => {
                log::warn!("cannot list {}: {}", dir.display(), e);
                return;
            }
        };
        for path in files {
            if let Err(e) = fs::remove_file(&path) {
                log::warn!("cannot remove stale {}: {}", path.display(), e);
            }
        }
    }

    fn write_file(&self, path: &Path, contents: &[u8]) -> Result<()> {
        fs::write(path, contents).map_err(|e| persist_err(path, e))
    }

    fn write_text(&self, format: Format, text: &str) -> Result<usize> {
        let path = self.document_file(ContentKind::Text, format);
        self.write_file(&path, text.trim().as_bytes())?;
        Ok(1)
    }

    fn write_links(&self, format: Format, links: &[String]) -> Result<usize> {
        let path = self.document_file(ContentKind::Links, format);
        let body: String = links.iter().map(|link| format!("{}\n", link)).collect();
        self.write_file(&path, body.as_bytes())?;
        Ok(links.len())
    }

    fn write_images(&self, format: Format, images: &[ImageBlob], report: &mut WriteReport) {
        let dir = self.kind_dir(ContentKind::Images);
        self.prune(&dir, &format!("{}_image_", format.tag()));

        for (idx, blob) in images.iter().enumerate() {
            let n = idx + 1;
            let written = reencode(blob).and_then(|encoded| {
                let path = dir.join(format!("{}_image_{}.{}", format.tag(), n, encoded.extension()));
                self.write_file(&path, &encoded.data)?;
                log::debug!("saved image {} to {}", n, path.display());
                Ok(())
            });
            match written {
                Ok(()) => report.written += 1,
                Err(e) => {
                    log::warn!("skipping {} image {}: {}", format, n, e);
                    report.skip(n, e);
                }
            }
        }
    }

    fn write_table(&self, path: &Path, table: &Table) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_path(path)
            .map_err(|e| persist_err(path, e))?;
        for row in &table.rows {
            writer.write_record(row).map_err(|e| persist_err(path, e))?;
        }
        writer.flush().map_err(|e| persist_err(path, e))
    }

    fn write_tables(&self, format: Format, tables: &[Table], report: &mut WriteReport) {
        let dir = self.kind_dir(ContentKind::Tables);
        self.prune(&dir, &format!("table_{}_", format.tag()));

        for (idx, table) in tables.iter().enumerate() {
            let n = idx + 1;
            match self.write_table(&self.table_file(format, n), table) {
                Ok(()) => report.written += 1,
                Err(e) => {
                    log::warn!("skipping {} table {}: {}", format, n, e);
                    report.skip(n, e);
                }
            }
        }
    }

    fn write_metadata(&self, format: Format, metadata: &Metadata) -> Result<usize> {
        let path = self.document_file(ContentKind::Metadata, format);
        self.write_file(&path, metadata.to_lines().as_bytes())?;
        Ok(metadata.len())
    }
}

impl Sink for FilesystemSink {
    fn name(&self) -> &'static str {
        "filesystem"
    }

    fn ensure_target(&mut self, kind: ContentKind) -> Result<()> {
        let dir = self.kind_dir(kind);
        fs::create_dir_all(&dir).map_err(|e| persist_err(&dir, e))
    }

    fn write(&mut self, format: Format, extraction: &Extraction) -> Result<WriteReport> {
        let kind = extraction.kind();
        self.ensure_target(kind)?;

        let mut report = WriteReport::new(kind);
        match extraction {
            Extraction::Text(text) => report.written = self.write_text(format, text)?,
            Extraction::Links(links) => report.written = self.write_links(format, links)?,
            Extraction::Images(images) => self.write_images(format, images, &mut report),
            Extraction::Tables(tables) => self.write_tables(format, tables, &mut report),
            Extraction::Metadata(metadata) => report.written = self.write_metadata(format, metadata)?,
        }
        Ok(report)
    }

    fn clear(&mut self, format: Format) -> Result<()> {
        let prefix = format!("{}_", format.tag());
        let table_prefix = format!("table_{}_", format.tag());

        for kind in ContentKind::ALL {
            let dir = self.kind_dir(kind);
            if !dir.is_dir() {
                continue;
            }
            for path in Self::prefixed_files(&dir, &[prefix.as_str(), table_prefix.as_str()])? {
                fs::remove_file(&path).map_err(|e| persist_err(&path, e))?;
            }
        }
        Ok(())
    }
}
