//! PDF loading.
//!
//! Everything the extractor needs is read eagerly: the text layer (or OCR
//! output when it is empty), per-page link annotations, image XObjects,
//! detected tables and the info dictionary.

mod backend;
mod spans;
mod tables;

pub use backend::{decode_text_simple, ContentOp, LopdfBackend, PageId, PdfBackend, PdfValue};
pub use spans::{extract_page_spans, TextSpan};
pub use tables::{TableDetector, TableDetectorConfig};

use std::io::Read;
use std::path::Path;

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};
use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId};

use super::options::{ErrorMode, LoadOptions};
use crate::error::{Error, Result};
use crate::model::{DocumentHandle, DocumentProperties, ImageBlob, NativeContent, PdfContent, PdfPage};

/// Load a validated PDF path.
pub(crate) fn load(path: &Path, options: &LoadOptions) -> Result<DocumentHandle> {
    let backend = LopdfBackend::load_file(path)?;
    let mut warnings = Vec::new();
    let content = read_content(&backend, path, options, &mut warnings)?;
    Ok(DocumentHandle::new(path, NativeContent::Pdf(content)).with_warnings(warnings))
}

/// Read a loaded PDF into [`PdfContent`]. `path` is only used for OCR.
pub(crate) fn read_content(
    backend: &LopdfBackend,
    path: &Path,
    options: &LoadOptions,
    warnings: &mut Vec<String>,
) -> Result<PdfContent> {
    let doc = backend.raw_doc();
    let detector = TableDetector::new();
    let strict = options.error_mode == ErrorMode::Strict;

    let mut page_texts = Vec::new();
    let mut pages = Vec::new();

    for (page_num, page_id) in backend.pages() {
        match doc.extract_text(&[page_num]) {
            Ok(text) => page_texts.push(text),
            Err(e) if strict => {
                return Err(Error::LoadFailure(format!("page {} text: {}", page_num, e)))
            }
            Err(e) => {
                log::warn!("Failed to extract text from page {}: {}", page_num, e);
                warnings.push(format!("page {}: text layer unreadable: {}", page_num, e));
                page_texts.push(String::new());
            }
        }

        let mut page = PdfPage::new(page_num);
        page.links = page_links(doc, page_id);
        page.images = page_images(doc, page_id, page_num, warnings);

        if options.detect_tables {
            match extract_page_spans(backend, page_id) {
                Ok(spans) => page.tables = detector.detect(&spans),
                Err(e) if strict => {
                    return Err(Error::LoadFailure(format!("page {} tables: {}", page_num, e)))
                }
                Err(e) => {
                    log::warn!("Failed to detect tables on page {}: {}", page_num, e);
                    warnings.push(format!("page {}: table detection failed: {}", page_num, e));
                }
            }
        }

        pages.push(page);
    }

    let mut text = page_texts.join("\n");
    let mut ocr_applied = false;

    if text.trim().is_empty() {
        match &options.ocr {
            Some(ocr) => {
                log::info!("{}: empty text layer, falling back to OCR", path.display());
                let outcome = ocr.run(path)?;
                for (page, reason) in outcome.failed_pages {
                    warnings.push(format!("page {}: OCR failed: {}", page, reason));
                }
                text = outcome.text;
                ocr_applied = true;
            }
            None => log::info!("{}: empty text layer and OCR disabled", path.display()),
        }
    }

    Ok(PdfContent {
        text,
        ocr_applied,
        pages,
        properties: info_properties(doc),
    })
}

/// Follow a reference, or return the object itself.
fn resolve<'a>(doc: &'a LopdfDocument, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

fn resolve_dict<'a>(doc: &'a LopdfDocument, obj: &'a Object) -> Option<&'a Dictionary> {
    match resolve(doc, obj)? {
        Object::Dictionary(d) => Some(d),
        Object::Stream(s) => Some(&s.dict),
        _ => None,
    }
}

/// URI link annotations on a page, in annotation order.
fn page_links(doc: &LopdfDocument, page_id: ObjectId) -> Vec<String> {
    let Some(annots) = doc
        .get_dictionary(page_id)
        .ok()
        .and_then(|page| page.get(b"Annots").ok())
        .and_then(|a| resolve(doc, a))
        .and_then(|a| a.as_array().ok())
    else {
        return Vec::new();
    };

    annots
        .iter()
        .filter_map(|a| resolve_dict(doc, a))
        .filter_map(|annot| {
            let action = resolve_dict(doc, annot.get(b"A").ok()?)?;
            if action.get(b"S").ok()?.as_name().ok()? != b"URI" {
                return None;
            }
            match resolve(doc, action.get(b"URI").ok()?)? {
                Object::String(bytes, _) => Some(decode_text_simple(bytes)),
                _ => None,
            }
        })
        .collect()
}

/// Deepest page-tree levels searched for inherited resources.
const MAX_TREE_DEPTH: usize = 32;

/// The page's resource dictionary, inherited from the nearest ancestor in the
/// page tree when the page has none of its own.
fn page_resources(doc: &LopdfDocument, page_id: ObjectId) -> Option<&Dictionary> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Some(resources) = node.get(b"Resources").ok().and_then(|r| resolve_dict(doc, r)) {
            return Some(resources);
        }
        node = node.get(b"Parent").ok().and_then(|p| resolve_dict(doc, p))?;
    }
    None
}

/// Image XObjects referenced from a page's resources.
fn page_images(
    doc: &LopdfDocument,
    page_id: ObjectId,
    page_num: u32,
    warnings: &mut Vec<String>,
) -> Vec<ImageBlob> {
    let Some(xobjects) = page_resources(doc, page_id)
        .and_then(|res| res.get(b"XObject").ok())
        .and_then(|x| resolve_dict(doc, x))
    else {
        return Vec::new();
    };

    let mut images = Vec::new();
    for (name, obj) in xobjects.iter() {
        let Some(Object::Stream(stream)) = resolve(doc, obj) else {
            continue;
        };
        let is_image = stream
            .dict
            .get(b"Subtype")
            .and_then(|s| s.as_name())
            .map(|s| s == b"Image")
            .unwrap_or(false);
        if !is_image {
            continue;
        }

        let name = String::from_utf8_lossy(name).to_string();
        match encode_image(doc, stream) {
            Ok(data) => images.push(ImageBlob::new(data).with_name(name)),
            Err(e) => {
                log::warn!("Page {}: skipping image {}: {}", page_num, name, e);
                warnings.push(format!("page {}: image {}: {}", page_num, name, e));
            }
        }
    }
    images
}

/// Stream filter names, whether given as a name or an array.
fn filters(doc: &LopdfDocument, dict: &Dictionary) -> Vec<String> {
    let Some(filter) = dict.get(b"Filter").ok().and_then(|f| resolve(doc, f)) else {
        return Vec::new();
    };
    match filter {
        Object::Name(n) => vec![String::from_utf8_lossy(n).to_string()],
        Object::Array(arr) => arr
            .iter()
            .filter_map(|o| o.as_name().ok())
            .map(|n| String::from_utf8_lossy(n).to_string())
            .collect(),
        _ => Vec::new(),
    }
}

/// Encoded bytes for an image XObject.
///
/// Filters are undone in order. A trailing DCT or JPX filter is kept, so JPEG
/// and JPEG 2000 data pass through as stored. 8-bit raw samples in a device
/// colour space become PNG. Anything else is returned decoded but otherwise
/// raw; sinks skip it when it fails to decode.
fn encode_image(doc: &LopdfDocument, stream: &lopdf::Stream) -> Result<Vec<u8>> {
    let mut filters = filters(doc, &stream.dict);
    let passthrough = matches!(filters.last().map(String::as_str), Some("DCTDecode" | "JPXDecode"));
    if passthrough {
        filters.pop();
    }

    let mut data = stream.content.clone();
    for filter in &filters {
        data = decode_filter(filter, &data)?;
    }
    if passthrough {
        return Ok(data);
    }
    let samples = data;

    let int = |key: &[u8]| {
        stream
            .dict
            .get(key)
            .ok()
            .and_then(|v| v.as_i64().ok())
            .and_then(|v| u32::try_from(v).ok())
    };
    let (Some(width), Some(height)) = (int(b"Width"), int(b"Height")) else {
        return Ok(samples);
    };
    if int(b"BitsPerComponent") != Some(8) {
        return Ok(samples);
    }

    let color_space = stream
        .dict
        .get(b"ColorSpace")
        .ok()
        .and_then(|c| resolve(doc, c))
        .and_then(|c| match c {
            Object::Name(n) => Some(n.clone()),
            Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()).map(<[u8]>::to_vec),
            _ => None,
        })
        .unwrap_or_else(|| b"DeviceRGB".to_vec());

    let img = match color_space.as_slice() {
        b"DeviceRGB" | b"CalRGB" => {
            image::RgbImage::from_raw(width, height, samples.clone()).map(image::DynamicImage::ImageRgb8)
        }
        b"DeviceGray" | b"CalGray" => {
            image::GrayImage::from_raw(width, height, samples.clone()).map(image::DynamicImage::ImageLuma8)
        }
        b"DeviceCMYK" => image::RgbImage::from_raw(width, height, cmyk_to_rgb(&samples))
            .map(image::DynamicImage::ImageRgb8),
        _ => None,
    };

    let Some(img) = img else {
        return Ok(samples);
    };

    let mut png = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
        .map_err(|e| Error::partial("image", e))?;
    Ok(png)
}

/// Undo one stream filter.
fn decode_filter(filter: &str, data: &[u8]) -> Result<Vec<u8>> {
    match filter {
        "FlateDecode" | "Fl" => {
            let mut out = Vec::new();
            flate2::read::ZlibDecoder::new(data)
                .read_to_end(&mut out)
                .map_err(|e| Error::partial("image", e))?;
            Ok(out)
        }
        other => Err(Error::partial("image", format!("unsupported filter {}", other))),
    }
}

fn cmyk_to_rgb(cmyk: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(cmyk.len() / 4 * 3);
    for px in cmyk.chunks_exact(4) {
        let k = 255 - u16::from(px[3]);
        for &channel in &px[..3] {
            rgb.push(((255 - u16::from(channel)) * k / 255) as u8);
        }
    }
    rgb
}

/// Properties from the trailer's Info dictionary.
fn info_properties(doc: &LopdfDocument) -> Option<DocumentProperties> {
    let info = resolve_dict(doc, doc.trailer.get(b"Info").ok()?)?;

    let date = |key: &[u8]| {
        get_string_from_dict(info, key).map(|raw| match parse_pdf_date(&raw) {
            Some(dt) => dt.to_rfc3339(),
            None => raw,
        })
    };

    Some(DocumentProperties {
        title: get_string_from_dict(info, b"Title"),
        author: get_string_from_dict(info, b"Author"),
        subject: get_string_from_dict(info, b"Subject"),
        keywords: get_string_from_dict(info, b"Keywords"),
        created: date(b"CreationDate"),
        modified: date(b"ModDate"),
    })
}

/// Text value of a dictionary entry.
fn get_string_from_dict(dict: &Dictionary, key: &[u8]) -> Option<String> {
    match dict.get(key).ok()? {
        Object::String(bytes, _) => Some(decode_text_simple(bytes)),
        Object::Name(bytes) => Some(String::from_utf8_lossy(bytes).to_string()),
        _ => None,
    }
}

/// Parse a PDF date string (`D:YYYYMMDDHHmmSSOHH'mm'`).
///
/// Everything after the year is optional. A missing offset means UTC.
pub fn parse_pdf_date(s: &str) -> Option<DateTime<FixedOffset>> {
    let s = s.trim().strip_prefix("D:").unwrap_or(s.trim());
    if s.len() < 4 {
        return None;
    }

    let field = |range: std::ops::Range<usize>, default: u32| -> Option<u32> {
        match s.get(range) {
            Some(v) if v.chars().all(|c| c.is_ascii_digit()) => v.parse().ok(),
            Some(_) => None,
            None => Some(default),
        }
    };

    let year: i32 = s.get(0..4)?.parse().ok()?;
    let month = field(4..6, 1)?;
    let day = field(6..8, 1)?;
    let hour = field(8..10, 0)?;
    let minute = field(10..12, 0)?;
    let second = field(12..14, 0)?;

    let offset_secs = match s.get(14..15) {
        None | Some("Z") => 0,
        Some(sign @ ("+" | "-")) => {
            let digits: String = s[15..].chars().filter(char::is_ascii_digit).collect();
            let hours: i32 = digits.get(0..2)?.parse().ok()?;
            let minutes: i32 = digits.get(2..4).and_then(|m| m.parse().ok()).unwrap_or(0);
            let secs = hours * 3600 + minutes * 60;
            if sign == "-" {
                -secs
            } else {
                secs
            }
        }
        Some(_) => return None,
    };

    let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)?;
    FixedOffset::east_opt(offset_secs)?
        .from_local_datetime(&naive)
        .single()
}
