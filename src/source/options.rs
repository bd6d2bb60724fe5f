//! Loading options and configuration.

use super::ocr::OcrPipeline;

/// Options for loading documents.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Error handling mode for per-page PDF problems
    pub error_mode: ErrorMode,

    /// OCR fallback for PDFs with an empty text layer (`None` disables it)
    pub ocr: Option<OcrPipeline>,

    /// Whether to run table detection on PDF pages
    pub detect_tables: bool,
}

impl LoadOptions {
    /// Create new load options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Fail the whole load on any per-page error.
    pub fn strict(mut self) -> Self {
        self.error_mode = ErrorMode::Strict;
        self
    }

    /// Record per-page errors as warnings and continue.
    pub fn lenient(mut self) -> Self {
        self.error_mode = ErrorMode::Lenient;
        self
    }

    /// Use a custom OCR pipeline.
    pub fn with_ocr(mut self, pipeline: OcrPipeline) -> Self {
        self.ocr = Some(pipeline);
        self
    }

    /// Disable OCR fallback.
    pub fn without_ocr(mut self) -> Self {
        self.ocr = None;
        self
    }

    /// Set the OCR language, if OCR is enabled.
    pub fn with_ocr_language(mut self, language: impl Into<String>) -> Self {
        self.ocr = self.ocr.map(|p| p.with_language(language));
        self
    }

    /// Set the OCR rasterization resolution, if OCR is enabled.
    pub fn with_ocr_dpi(mut self, dpi: u32) -> Self {
        self.ocr = self.ocr.map(|p| p.with_dpi(dpi));
        self
    }

    /// Enable or disable PDF table detection.
    pub fn with_tables(mut self, detect: bool) -> Self {
        self.detect_tables = detect;
        self
    }
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            error_mode: ErrorMode::Lenient,
            ocr: Some(OcrPipeline::system()),
            detect_tables: true,
        }
    }
}

/// Error handling mode during loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Fail on any error
    Strict,
    /// Skip invalid content and continue
    #[default]
    Lenient,
}
