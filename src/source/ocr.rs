//! OCR fallback for PDFs without a usable text layer.
//!
//! Pages are rasterized to images and each image is run through an OCR engine.
//! Both steps sit behind traits so the system tools can be swapped out; the
//! defaults shell out to Poppler's `pdftoppm` and the `tesseract` CLI.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;

use crate::error::{Error, Result};

/// Default OCR language.
pub const DEFAULT_LANGUAGE: &str = "eng";

/// Default rasterization resolution.
pub const DEFAULT_DPI: u32 = 300;

/// Turns a PDF into one encoded image per page, in page order.
pub trait PageRasterizer: Send + Sync {
    fn rasterize(&self, pdf: &Path, dpi: u32) -> Result<Vec<Vec<u8>>>;
}

/// Recognizes text in a single encoded page image.
pub trait OcrEngine: Send + Sync {
    fn recognize(&self, image: &[u8], language: &str) -> Result<String>;
}

/// Rasterize-then-recognize pipeline.
#[derive(Clone)]
pub struct OcrPipeline {
    rasterizer: Arc<dyn PageRasterizer>,
    engine: Arc<dyn OcrEngine>,
    language: String,
    dpi: u32,
}

/// Result of running OCR over a whole document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OcrOutcome {
    /// Page texts joined by newlines; failed pages contribute empty text
    pub text: String,

    /// Pages (1-indexed) whose OCR failed, with the reason
    pub failed_pages: Vec<(u32, String)>,
}

impl OcrPipeline {
    /// Build a pipeline from custom parts.
    pub fn new(rasterizer: impl PageRasterizer + 'static, engine: impl OcrEngine + 'static) -> Self {
        Self {
            rasterizer: Arc::new(rasterizer),
            engine: Arc::new(engine),
            language: DEFAULT_LANGUAGE.to_string(),
            dpi: DEFAULT_DPI,
        }
    }

    /// `pdftoppm` + `tesseract`, resolved on `PATH` when first used.
    pub fn system() -> Self {
        Self::new(Pdftoppm::default(), TesseractCli::default())
    }

    /// Set the OCR language (tesseract `-l` code, e.g. `eng+kor`).
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Set the rasterization resolution.
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn dpi(&self) -> u32 {
        self.dpi
    }

    /// OCR every page of `pdf`.
    ///
    /// A page whose recognition fails contributes empty text and is reported in
    /// [`OcrOutcome::failed_pages`]. Rasterizer failure, a document with no pages,
    /// or failure on every page is a `LoadFailure`.
    pub fn run(&self, pdf: &Path) -> Result<OcrOutcome> {
        let pages = self
            .rasterizer
            .rasterize(pdf, self.dpi)
            .map_err(|e| Error::LoadFailure(format!("OCR rasterization failed: {}", e)))?;

        if pages.is_empty() {
            return Err(Error::LoadFailure(
                "OCR rasterization produced no pages".to_string(),
            ));
        }

        let mut texts = Vec::with_capacity(pages.len());
        let mut failed_pages = Vec::new();

        for (idx, image) in pages.iter().enumerate() {
            let page_num = idx as u32 + 1;
            match self.engine.recognize(image, &self.language) {
                Ok(text) => {
                    log::debug!("OCR page {}: {} chars", page_num, text.len());
                    texts.push(text.trim_end_matches(['\n', '\x0c']).to_string());
                }
                Err(e) => {
                    log::warn!("OCR failed on page {}: {}", page_num, e);
                    failed_pages.push((page_num, e.to_string()));
                    texts.push(String::new());
                }
            }
        }

        if failed_pages.len() == pages.len() {
            return Err(Error::LoadFailure(format!(
                "OCR failed on all {} pages",
                pages.len()
            )));
        }

        Ok(OcrOutcome {
            text: texts.join("\n"),
            failed_pages,
        })
    }
}

impl fmt::Debug for OcrPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OcrPipeline")
            .field("language", &self.language)
            .field("dpi", &self.dpi)
            .finish_non_exhaustive()
    }
}

/// Find an executable, either as given or on `PATH`.
fn locate(binary: &Path) -> Result<PathBuf> {
    which::which(binary).map_err(|e| {
        Error::LoadFailure(format!("{} not available: {}", binary.display(), e))
    })
}

/// Rasterizes with Poppler's `pdftoppm`.
#[derive(Debug, Clone)]
pub struct Pdftoppm {
    binary: PathBuf,
}

impl Pdftoppm {
    /// Use a specific `pdftoppm` executable.
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for Pdftoppm {
    fn default() -> Self {
        Self::with_binary("pdftoppm")
    }
}

impl PageRasterizer for Pdftoppm {
    fn rasterize(&self, pdf: &Path, dpi: u32) -> Result<Vec<Vec<u8>>> {
        let binary = locate(&self.binary)?;
        let workdir = tempfile::tempdir()?;
        let prefix = workdir.path().join("page");

        let output = Command::new(binary)
            .arg("-r")
            .arg(dpi.to_string())
            .arg("-png")
            .arg(pdf)
            .arg(&prefix)
            .stdin(Stdio::null())
            .output()?;

        if !output.status.success() {
            return Err(Error::LoadFailure(format!(
                "pdftoppm exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        // pdftoppm names pages page-1.png or page-01.png depending on page count
        let mut pages: Vec<(u32, PathBuf)> = std::fs::read_dir(workdir.path())?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter_map(|path| page_index(&path).map(|n| (n, path)))
            .collect();
        pages.sort_by_key(|(n, _)| *n);

        log::debug!("pdftoppm rendered {} pages at {} dpi", pages.len(), dpi);

        pages
            .into_iter()
            .map(|(_, path)| std::fs::read(path).map_err(Error::from))
            .collect()
    }
}

/// Page number from a `page-<n>.png` file name.
fn page_index(path: &Path) -> Option<u32> {
    if path.extension()?.to_str()? != "png" {
        return None;
    }
    path.file_stem()?
        .to_str()?
        .strip_prefix("page-")?
        .parse()
        .ok()
}

/// Recognizes text with the `tesseract` command-line tool.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    binary: PathBuf,
}

impl TesseractCli {
    /// Use a specific `tesseract` executable.
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for TesseractCli {
    fn default() -> Self {
        Self::with_binary("tesseract")
    }
}

impl OcrEngine for TesseractCli {
    fn recognize(&self, image: &[u8], language: &str) -> Result<String> {
        let binary = locate(&self.binary)?;

        let mut child = Command::new(binary)
            .args(["stdin", "stdout", "-l", language])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(image)?;
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(Error::partial(
                "OCR page",
                format!(
                    "tesseract exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
