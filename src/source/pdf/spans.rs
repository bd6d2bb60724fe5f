//! Positioned text extraction.
//!
//! Walks a page's content stream tracking the text matrix so every shown
//! string comes out with its baseline position and font size. Table detection
//! works on these spans.

use super::backend::{ContentOp, PageId, PdfBackend, PdfValue};
use crate::error::Result;

/// A text span with position and style information.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    /// The text content
    pub text: String,
    /// X position (left edge)
    pub x: f32,
    /// Y position (baseline)
    pub y: f32,
    /// Estimated width of the text
    pub width: f32,
    /// Font size in points
    pub font_size: f32,
    /// Font name (e.g., "Helvetica-Bold")
    pub font_name: String,
}

impl TextSpan {
    /// Create a new text span, estimating its width from the font size.
    pub fn new(text: String, x: f32, y: f32, font_size: f32, font_name: String) -> Self {
        let width = text.chars().count() as f32 * font_size * 0.5;
        Self {
            text,
            x,
            y,
            width,
            font_size,
            font_name,
        }
    }

    /// Right edge.
    pub fn right(&self) -> f32 {
        self.x + self.width
    }
}

/// Text matrix for tracking position in content stream.
#[derive(Debug, Clone)]
struct TextMatrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
    leading: f32,
}

impl Default for TextMatrix {
    fn default() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
            leading: 0.0,
        }
    }
}

impl TextMatrix {
    fn set(&mut self, m: [f32; 6]) {
        let [a, b, c, d, e, f] = m;
        self.a = a;
        self.b = b;
        self.c = c;
        self.d = d;
        self.e = e;
        self.f = f;
    }

    fn translate(&mut self, tx: f32, ty: f32) {
        self.e += tx * self.a + ty * self.c;
        self.f += tx * self.b + ty * self.d;
    }

    fn next_line(&mut self) {
        let leading = if self.leading > 0.0 { self.leading } else { 12.0 };
        self.translate(0.0, -leading);
    }

    fn position(&self) -> (f32, f32) {
        (self.e, self.f)
    }

    fn scale(&self) -> f32 {
        (self.a * self.a + self.c * self.c).sqrt()
    }
}

/// Space-adjustment threshold for `TJ` arrays, in thousandths of an em.
const TJ_SPACE_THRESHOLD: f32 = 200.0;

/// Extract positioned spans from one page.
pub fn extract_page_spans<B: PdfBackend>(backend: &B, page: PageId) -> Result<Vec<TextSpan>> {
    let content = backend.page_content(page)?;
    let ops = backend.decode_content(&content)?;
    Ok(spans_from_ops(&ops, |font, bytes| backend.decode_text(page, font, bytes), |font| {
        backend.font_name(page, font)
    }))
}

/// Interpret text operators. `decode` turns string bytes into text for the
/// current font resource; `font_name` resolves a resource to its base font.
fn spans_from_ops<D, F>(ops: &[ContentOp], decode: D, font_name: F) -> Vec<TextSpan>
where
    D: Fn(&[u8], &[u8]) -> String,
    F: Fn(&[u8]) -> Option<String>,
{
    let mut spans = Vec::new();
    let mut font_resource: Vec<u8> = Vec::new();
    let mut current_font = String::new();
    let mut font_size: f32 = 12.0;
    let mut matrix = TextMatrix::default();
    let mut line_start = TextMatrix::default();
    let mut in_text = false;

    let mut emit = |text: String, at: &TextMatrix, size: f32, font: &str| {
        if !text.trim().is_empty() {
            let (x, y) = at.position();
            spans.push(TextSpan::new(text, x, y, size * at.scale(), font.to_string()));
        }
    };

    for op in ops {
        match op.operator.as_str() {
            "BT" => {
                in_text = true;
                matrix = TextMatrix {
                    leading: matrix.leading,
                    ..TextMatrix::default()
                };
                line_start = matrix.clone();
            }
            "ET" => in_text = false,
            "Tf" => {
                if let Some(PdfValue::Name(name)) = op.operands.first() {
                    font_resource = name.clone();
                    current_font = font_name(name)
                        .unwrap_or_else(|| String::from_utf8_lossy(name).to_string());
                }
                font_size = op.number(1, 12.0);
            }
            "TL" => matrix.leading = op.number(0, 0.0),
            "Td" => {
                line_start.translate(op.number(0, 0.0), op.number(1, 0.0));
                line_start.leading = matrix.leading;
                matrix = line_start.clone();
            }
            "TD" => {
                let ty = op.number(1, 0.0);
                line_start.translate(op.number(0, 0.0), ty);
                line_start.leading = -ty;
                matrix = line_start.clone();
            }
            "Tm" => {
                let m = [
                    op.number(0, 1.0),
                    op.number(1, 0.0),
                    op.number(2, 0.0),
                    op.number(3, 1.0),
                    op.number(4, 0.0),
                    op.number(5, 0.0),
                ];
                matrix.set(m);
                line_start = matrix.clone();
            }
            "T*" => {
                line_start.leading = matrix.leading;
                line_start.next_line();
                matrix = line_start.clone();
            }
            "Tj" if in_text => {
                if let Some(PdfValue::Str(bytes)) = op.operands.first() {
                    emit(decode(&font_resource, bytes), &matrix, font_size, &current_font);
                }
            }
            "TJ" if in_text => {
                if let Some(PdfValue::Array(items)) = op.operands.first() {
                    let text = join_tj_array(items, |bytes| decode(&font_resource, bytes));
                    emit(text, &matrix, font_size, &current_font);
                }
            }
            "'" | "\"" => {
                line_start.leading = matrix.leading;
                line_start.next_line();
                matrix = line_start.clone();
                let idx = if op.operator == "\"" { 2 } else { 0 };
                if in_text {
                    if let Some(PdfValue::Str(bytes)) = op.operands.get(idx) {
                        emit(decode(&font_resource, bytes), &matrix, font_size, &current_font);
                    }
                }
            }
            _ => {}
        }
    }

    spans
}

/// Concatenate a `TJ` array, turning large negative kerning into spaces.
fn join_tj_array<D: Fn(&[u8]) -> String>(items: &[PdfValue], decode: D) -> String {
    let mut combined = String::new();
    for item in items {
        match item {
            PdfValue::Str(bytes) => combined.push_str(&decode(bytes)),
            other => {
                let adjustment = -other.as_number().unwrap_or(0.0);
                if adjustment > TJ_SPACE_THRESHOLD
                    && !combined.is_empty()
                    && !combined.ends_with(' ')
                    && !combined.chars().last().is_some_and(is_spaceless_script_char)
                {
                    combined.push(' ');
                }
            }
        }
    }
    combined
}

/// Scripts that don't separate words with spaces (Chinese, Japanese).
/// Hangul is excluded; Korean uses word spaces.
fn is_spaceless_script_char(c: char) -> bool {
    matches!(c as u32,
        0x4E00..=0x9FFF
        | 0x3400..=0x4DBF
        | 0x20000..=0x2EBEF
        | 0x3040..=0x309F
        | 0x30A0..=0x30FF
        | 0x3000..=0x303F)
}
