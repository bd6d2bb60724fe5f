//! Load → extract → persist, for one file or many.

use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::detect::Format;
use crate::error::Result;
use crate::extract::ContentExtractor;
use crate::model::ContentKind;
use crate::sink::{persist, FilesystemSink, PersistReport, Sink, SqliteSink};
use crate::source::{self, LoadOptions};

/// Options for [`process_file`] and [`process_batch`].
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// How documents are loaded
    pub load: LoadOptions,

    /// Content kinds to persist, in order
    pub kinds: Vec<ContentKind>,

    /// Base directory for the filesystem sink
    pub output_dir: Option<PathBuf>,

    /// Database file for the SQLite sink
    pub database: Option<PathBuf>,

    /// Remove previous results for the document's format before writing
    pub clear: bool,

    /// Process files on the rayon pool
    pub parallel: bool,
}

impl BatchOptions {
    /// Create batch options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set load options.
    pub fn with_load_options(mut self, load: LoadOptions) -> Self {
        self.load = load;
        self
    }

    /// Persist only these kinds.
    pub fn with_kinds(mut self, kinds: impl Into<Vec<ContentKind>>) -> Self {
        self.kinds = kinds.into();
        self
    }

    /// Write files under `dir`.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Write rows into the database at `path`.
    pub fn with_database(mut self, path: impl Into<PathBuf>) -> Self {
        self.database = Some(path.into());
        self
    }

    /// Enable or disable clearing before writing.
    pub fn with_clear(mut self, clear: bool) -> Self {
        self.clear = clear;
        self
    }

    /// Enable or disable parallel processing.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            load: LoadOptions::default(),
            kinds: ContentKind::ALL.to_vec(),
            output_dir: None,
            database: None,
            clear: false,
            parallel: false,
        }
    }
}

/// What happened to one file.
#[derive(Debug)]
pub struct FileReport {
    pub path: PathBuf,
    pub format: Format,

    /// Load-time warnings
    pub warnings: Vec<String>,

    /// One entry per configured sink, by sink name
    pub sinks: Vec<(&'static str, PersistReport)>,
}

impl FileReport {
    /// Whether every sink wrote every kind with nothing skipped.
    pub fn is_complete(&self) -> bool {
        self.sinks.iter().all(|(_, report)| report.is_complete())
    }
}

fn run_sink<S: Sink>(
    sink: &mut S,
    extractor: &ContentExtractor<'_>,
    options: &BatchOptions,
) -> Result<PersistReport> {
    if options.clear {
        sink.clear(extractor.handle().format())?;
    }
    Ok(persist(sink, extractor, &options.kinds))
}

/// Load one file and persist it to every configured sink.
///
/// Load errors and sink construction errors are returned; per-kind write
/// failures are recorded in the report.
pub fn process_file<P: AsRef<Path>>(path: P, options: &BatchOptions) -> Result<FileReport> {
    let path = path.as_ref();
    let handle = source::load_with_options(path, &options.load)?;
    let extractor = ContentExtractor::new(&handle);
    let mut sinks = Vec::new();

    if let Some(db) = &options.database {
        let mut sink = SqliteSink::open(db)?;
        let report = run_sink(&mut sink, &extractor, options)?;
        let name = sink.name();
        sink.close()?;
        sinks.push((name, report));
    }

    if let Some(dir) = &options.output_dir {
        let mut sink = FilesystemSink::new(dir)?;
        let report = run_sink(&mut sink, &extractor, options)?;
        sinks.push((sink.name(), report));
    }

    log::info!("{}: processed as {}", path.display(), handle.format());
    Ok(FileReport {
        path: path.to_path_buf(),
        format: handle.format(),
        warnings: handle.warnings().to_vec(),
        sinks,
    })
}

/// Process many files. Results come back in input order; one file failing
/// does not stop the others.
pub fn process_batch<P>(paths: &[P], options: &BatchOptions) -> Vec<(PathBuf, Result<FileReport>)>
where
    P: AsRef<Path> + Sync,
{
    let run = |path: &P| {
        let path = path.as_ref();
        let result = process_file(path, options);
        if let Err(e) = &result {
            log::warn!("{}: {}", path.display(), e);
        }
        (path.to_path_buf(), result)
    };

    if options.parallel {
        paths.par_iter().map(run).collect()
    } else {
        paths.iter().map(run).collect()
    }
}
