//! Loading and extraction against generated documents.

mod common;

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use common::{
    jpeg_bytes, write_docx, write_empty_docx, write_pdf, write_pdf_inherited, write_pptx, PdfImage,
    PdfPageSpec,
};
use tempfile::tempdir;
use undoc::error::Error;
use undoc::{
    load, load_as, load_with_options, ContentExtractor, ContentKind, Extraction, Format,
    LoadOptions, NativeContent, OcrEngine, OcrPipeline, PageRasterizer, Table,
};

fn no_ocr() -> LoadOptions {
    LoadOptions::new().without_ocr()
}

#[test]
fn test_pdf_text_links_and_metadata() {
    let dir = tempdir().unwrap();
    let path = write_pdf(
        &dir.path().join("report.pdf"),
        &[
            PdfPageSpec::text(&["Hello World"]).with_link("https://example.com/one"),
            PdfPageSpec::text(&["Second page"])
                .with_link("https://example.com/two")
                .with_link("https://example.com/one"),
        ],
        Some("Annual Report"),
    );

    let handle = load_with_options(&path, &no_ocr()).unwrap();
    assert_eq!(handle.format(), Format::Pdf);
    let extractor = ContentExtractor::new(&handle);

    let text = extractor.extract_text();
    assert!(text.contains("Hello World"), "text was {:?}", text);
    assert!(text.contains("Second page"));
    assert!(text.find("Hello").unwrap() < text.find("Second").unwrap());

    assert_eq!(
        extractor.extract_links(),
        [
            "https://example.com/one",
            "https://example.com/two",
            "https://example.com/one"
        ]
    );

    let metadata = extractor.extract_metadata();
    assert_eq!(metadata.get("title"), Some(Some("Annual Report")));
    assert_eq!(metadata.get("author"), Some(Some("Fixture Author")));
    assert_eq!(metadata.get("subject"), Some(None));
}

#[test]
fn test_pdf_without_annotations_or_images_is_empty() {
    let dir = tempdir().unwrap();
    let path = write_pdf(
        &dir.path().join("plain.pdf"),
        &[PdfPageSpec::text(&["Just text"])],
        None,
    );

    let handle = load_with_options(&path, &no_ocr()).unwrap();
    let extractor = ContentExtractor::new(&handle);
    assert!(extractor.extract_links().is_empty());
    assert!(extractor.extract_images().is_empty());
    assert!(extractor.extract_tables().is_empty());

    let metadata = extractor.extract_metadata();
    assert_eq!(metadata.len(), 6);
    assert!(metadata.iter().all(|(_, v)| v.is_none()));
}

#[test]
fn test_pdf_images_in_page_order() {
    let dir = tempdir().unwrap();
    let jpeg = jpeg_bytes();
    let path = write_pdf(
        &dir.path().join("figures.pdf"),
        &[
            PdfPageSpec::text(&["Figures"])
                .with_image(PdfImage::jpeg(jpeg.clone()))
                .with_image(PdfImage::flate(
                    "DeviceRGB",
                    2,
                    2,
                    &[255, 0, 0, 0, 255, 0, 0, 0, 255, 10, 20, 30],
                ))
                .with_image(PdfImage::flate("DeviceGray", 2, 1, &[0, 200])),
            PdfPageSpec::text(&["More figures"])
                .with_image(PdfImage::flate("DeviceCMYK", 1, 1, &[0, 0, 0, 0]))
                .with_image(PdfImage::flate_jpeg(jpeg.clone())),
        ],
        None,
    );

    let handle = load_with_options(&path, &no_ocr()).unwrap();
    assert!(handle.warnings().is_empty(), "warnings: {:?}", handle.warnings());
    let images = ContentExtractor::new(&handle).extract_images();
    assert_eq!(images.len(), 5);

    assert_eq!(images[0].data, jpeg);
    assert_eq!(images[0].mime_type.as_deref(), Some("image/jpeg"));
    assert_eq!(images[0].name.as_deref(), Some("Im1"));

    assert_eq!(images[1].mime_type.as_deref(), Some("image/png"));
    let rgb = image::load_from_memory(&images[1].data).unwrap().to_rgb8();
    assert_eq!(rgb.dimensions(), (2, 2));
    assert_eq!(rgb.get_pixel(1, 0).0, [0, 255, 0]);
    assert_eq!(rgb.get_pixel(1, 1).0, [10, 20, 30]);

    let gray = image::load_from_memory(&images[2].data).unwrap().to_luma8();
    assert_eq!(gray.dimensions(), (2, 1));
    assert_eq!(gray.get_pixel(1, 0).0, [200]);

    assert_eq!(images[3].mime_type.as_deref(), Some("image/png"));
    let white = image::load_from_memory(&images[3].data).unwrap().to_rgb8();
    assert_eq!(white.get_pixel(0, 0).0, [255, 255, 255]);

    assert_eq!(images[4].data, jpeg);
    assert_eq!(images[4].name.as_deref(), Some("Im2"));
}

#[test]
fn test_pdf_undecodable_image_skipped_with_warning() {
    let dir = tempdir().unwrap();
    let path = write_pdf(
        &dir.path().join("mixed.pdf"),
        &[PdfPageSpec::text(&["Scanned"])
            .with_image(PdfImage::unsupported())
            .with_image(PdfImage::flate("DeviceGray", 1, 1, &[90]))],
        None,
    );

    let handle = load_with_options(&path, &no_ocr()).unwrap();
    let images = ContentExtractor::new(&handle).extract_images();
    assert_eq!(images.len(), 1);
    assert_eq!(images[0].name.as_deref(), Some("Im2"));
    assert_eq!(images[0].mime_type.as_deref(), Some("image/png"));

    assert_eq!(handle.warnings().len(), 1);
    let warning = &handle.warnings()[0];
    assert!(warning.contains("page 1"), "warning was {:?}", warning);
    assert!(warning.contains("Im1"), "warning was {:?}", warning);
}

#[test]
fn test_pdf_images_from_inherited_resources() {
    let dir = tempdir().unwrap();
    let jpeg = jpeg_bytes();
    let path = write_pdf_inherited(
        &dir.path().join("inherited.pdf"),
        &[PdfPageSpec::text(&["Inherited"]).with_image(PdfImage::jpeg(jpeg.clone()))],
        None,
    );

    let handle = load_with_options(&path, &no_ocr()).unwrap();
    let extractor = ContentExtractor::new(&handle);
    assert!(extractor.extract_text().contains("Inherited"));
    let images = extractor.extract_images();
    assert_eq!(images.len(), 1);
    assert_eq!(images[0].data, jpeg);
    assert_eq!(images[0].name.as_deref(), Some("P1Im1"));
}

#[test]
fn test_pdf_tables_in_page_order() {
    let dir = tempdir().unwrap();
    let path = write_pdf(
        &dir.path().join("sales.pdf"),
        &[
            PdfPageSpec::blank().with_table(&[&["Region", "Sales"], &["North", "42"], &["South", "17"]]),
            PdfPageSpec::text(&["Commentary only"]),
            PdfPageSpec::blank().with_table(&[&["Item", "Qty"], &["Pens", "3"]]),
        ],
        None,
    );

    let handle = load_with_options(&path, &no_ocr()).unwrap();
    let tables = ContentExtractor::new(&handle).extract_tables();
    assert_eq!(tables.len(), 2);
    assert_eq!(
        tables[0],
        Table::from_rows([["Region", "Sales"], ["North", "42"], ["South", "17"]])
    );
    assert_eq!(tables[1], Table::from_rows([["Item", "Qty"], ["Pens", "3"]]));
}

#[test]
fn test_pdf_table_detection_can_be_disabled() {
    let dir = tempdir().unwrap();
    let path = write_pdf(
        &dir.path().join("sales.pdf"),
        &[PdfPageSpec::blank().with_table(&[&["Region", "Sales"], &["North", "42"]])],
        None,
    );

    let options = no_ocr().with_tables(false);
    let handle = load_with_options(&path, &options).unwrap();
    assert!(ContentExtractor::new(&handle).extract_tables().is_empty());
}

struct FakeRasterizer {
    pages: usize,
}

impl PageRasterizer for FakeRasterizer {
    fn rasterize(&self, _pdf: &Path, _dpi: u32) -> undoc::Result<Vec<Vec<u8>>> {
        Ok((1..=self.pages)
            .map(|n| format!("scanned page {}", n).into_bytes())
            .collect())
    }
}

/// Echoes the "image" back as its text; fails on images containing `fail_on`.
struct EchoEngine {
    calls: Arc<AtomicUsize>,
    fail_on: Option<&'static str>,
}

impl OcrEngine for EchoEngine {
    fn recognize(&self, image: &[u8], language: &str) -> undoc::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(language, "eng");
        let text = String::from_utf8_lossy(image).to_string();
        match self.fail_on {
            Some(needle) if text.contains(needle) => {
                Err(Error::LoadFailure("unreadable".to_string()))
            }
            _ => Ok(format!("{}\n\x0c", text)),
        }
    }
}

fn ocr_options(pages: usize, fail_on: Option<&'static str>) -> (LoadOptions, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let engine = EchoEngine {
        calls: Arc::clone(&calls),
        fail_on,
    };
    let options = LoadOptions::new().with_ocr(OcrPipeline::new(FakeRasterizer { pages }, engine));
    (options, calls)
}

#[test]
fn test_ocr_fallback_on_empty_text_layer() {
    let dir = tempdir().unwrap();
    let path = write_pdf(
        &dir.path().join("scan.pdf"),
        &[PdfPageSpec::blank(), PdfPageSpec::blank()],
        None,
    );

    let (options, calls) = ocr_options(2, None);
    let handle = load_with_options(&path, &options).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    let NativeContent::Pdf(content) = handle.native() else {
        panic!("expected pdf content");
    };
    assert!(content.ocr_applied);
    assert_eq!(
        ContentExtractor::new(&handle).extract_text(),
        "scanned page 1\nscanned page 2"
    );
}

#[test]
fn test_ocr_not_run_when_text_present() {
    let dir = tempdir().unwrap();
    let path = write_pdf(
        &dir.path().join("digital.pdf"),
        &[PdfPageSpec::text(&["Native text"])],
        None,
    );

    let (options, calls) = ocr_options(1, None);
    let handle = load_with_options(&path, &options).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(ContentExtractor::new(&handle)
        .extract_text()
        .contains("Native text"));
}

#[test]
fn test_ocr_page_failure_becomes_warning() {
    let dir = tempdir().unwrap();
    let path = write_pdf(
        &dir.path().join("scan.pdf"),
        &[PdfPageSpec::blank(), PdfPageSpec::blank()],
        None,
    );

    let (options, _) = ocr_options(2, Some("page 2"));
    let handle = load_with_options(&path, &options).unwrap();
    assert_eq!(ContentExtractor::new(&handle).extract_text(), "scanned page 1\n");
    assert!(handle
        .warnings()
        .iter()
        .any(|w| w.contains("page 2") && w.contains("OCR")));
}

#[test]
fn test_ocr_total_failure_is_load_failure() {
    let dir = tempdir().unwrap();
    let path = write_pdf(&dir.path().join("scan.pdf"), &[PdfPageSpec::blank()], None);

    let (options, _) = ocr_options(1, Some("scanned"));
    let result = load_with_options(&path, &options);
    assert!(matches!(result, Err(Error::LoadFailure(_))));
}

#[test]
fn test_empty_text_layer_without_ocr() {
    let dir = tempdir().unwrap();
    let path = write_pdf(&dir.path().join("scan.pdf"), &[PdfPageSpec::blank()], None);

    let handle = load_with_options(&path, &no_ocr()).unwrap();
    let NativeContent::Pdf(content) = handle.native() else {
        panic!("expected pdf content");
    };
    assert!(!content.ocr_applied);
    assert!(ContentExtractor::new(&handle).extract_text().trim().is_empty());
}

#[test]
fn test_docx_extraction() {
    let dir = tempdir().unwrap();
    let path = write_docx(&dir.path().join("report.docx"));

    let handle = load(&path).unwrap();
    assert_eq!(handle.format(), Format::Word);
    let extractor = ContentExtractor::new(&handle);

    assert_eq!(extractor.extract_text(), "Quarterly report\nSee the site\n");
    assert_eq!(extractor.extract_links(), ["https://example.com/report"]);

    let images = extractor.extract_images();
    assert_eq!(images.len(), 1);
    assert_eq!(images[0].mime_type.as_deref(), Some("image/png"));

    let tables = extractor.extract_tables();
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].rows, [["Region", "Sales"], ["North", "42"]]);

    let metadata = extractor.extract_metadata();
    assert_eq!(metadata.get("title"), Some(Some("Quarterly")));
    assert_eq!(metadata.get("author"), Some(Some("Ada")));
    assert!(metadata.get("created").unwrap().unwrap().starts_with("2024-03-01T09:30:00"));
}

#[test]
fn test_empty_docx_yields_empty_sequences() {
    let dir = tempdir().unwrap();
    let path = write_empty_docx(&dir.path().join("blank.docx"));

    let handle = load(&path).unwrap();
    let extractor = ContentExtractor::new(&handle);
    assert_eq!(extractor.extract_text(), "");
    assert!(extractor.extract_links().is_empty());
    assert!(extractor.extract_images().is_empty());
    assert!(extractor.extract_tables().is_empty());

    let metadata = extractor.extract_metadata();
    assert_eq!(metadata.len(), 6);
    assert!(metadata.iter().all(|(_, v)| v.is_none()));
}

#[test]
fn test_pptx_extraction() {
    let dir = tempdir().unwrap();
    let path = write_pptx(&dir.path().join("deck.pptx"));

    let handle = load(&path).unwrap();
    assert_eq!(handle.format(), Format::Slides);
    let extractor = ContentExtractor::new(&handle);

    assert_eq!(extractor.extract_text(), "Roadmap\nVisit our deck");
    assert_eq!(extractor.extract_links(), ["https://example.com/deck"]);

    let images = extractor.extract_images();
    assert_eq!(images.len(), 1);
    assert_eq!(images[0].data, common::png_bytes());

    let tables = extractor.extract_tables();
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].rows, [["Q1", "Q2"], ["10", "20"]]);

    assert_eq!(extractor.extract_metadata().get("title"), Some(Some("Roadmap")));
}

#[test]
fn test_extract_all_covers_every_kind() {
    let dir = tempdir().unwrap();
    let path = write_pptx(&dir.path().join("deck.pptx"));

    let handle = load(&path).unwrap();
    let all = ContentExtractor::new(&handle).extract_all();
    let kinds: Vec<ContentKind> = all.iter().map(Extraction::kind).collect();
    assert_eq!(kinds, ContentKind::ALL);
}

#[test]
fn test_extraction_is_repeatable() {
    let dir = tempdir().unwrap();
    let path = write_docx(&dir.path().join("report.docx"));

    let handle = load(&path).unwrap();
    let extractor = ContentExtractor::new(&handle);
    assert_eq!(extractor.extract_all(), extractor.extract_all());
}

#[test]
fn test_wrong_extension_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, "hello").unwrap();

    assert!(matches!(load(&path), Err(Error::InvalidFormat { .. })));

    let docx = write_docx(&dir.path().join("report.docx"));
    assert!(matches!(
        load_as(&docx, Format::Pdf),
        Err(Error::InvalidFormat { .. })
    ));
}

#[test]
fn test_missing_file() {
    let dir = tempdir().unwrap();
    let result = load(dir.path().join("absent.pptx"));
    assert!(matches!(result, Err(Error::FileNotFound(_))));
}

#[test]
fn test_corrupt_package_is_load_failure() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.docx");
    std::fs::write(&path, b"PK\x03\x04 definitely not a zip").unwrap();

    assert!(matches!(load(&path), Err(Error::LoadFailure(_))));
}
