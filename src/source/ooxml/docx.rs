//! Word-processor documents (`.docx`).

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::package::{attr, resolve_target, Package};
use crate::error::Result;
use crate::model::{Table, WordBlock, WordDocument};

/// Read the main document part, its relationships, media and core properties.
pub(crate) fn read(package: &mut Package, warnings: &mut Vec<String>) -> Result<WordDocument> {
    let main = package.main_part("word/document.xml")?;
    let xml = package.read_xml(&main)?;
    let blocks = parse_body(&xml)?;
    let relationships = package.relationships(&main)?;

    let mut media = Vec::new();
    for rel in relationships.iter().filter(|r| r.is_image() && !r.external) {
        let part = resolve_target(&main, &rel.target);
        match package.read_part(&part) {
            Ok(data) => media.push((rel.id.clone(), data)),
            Err(e) => {
                log::warn!("{}: image {} unreadable: {}", rel.id, part, e);
                warnings.push(format!("image {} ({}): {}", rel.id, part, e));
            }
        }
    }

    Ok(WordDocument {
        blocks,
        relationships,
        media,
        properties: package.core_properties()?,
    })
}

/// How a table cell takes part in a vertical merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VMerge {
    None,
    Restart,
    Continue,
}

#[derive(Debug)]
struct CellState {
    paragraphs: Vec<String>,
    span: usize,
    vmerge: VMerge,
}

/// Body walker state.
///
/// `table_depth` counts open `w:tbl` elements; only depth 0 (body) and depth 1
/// (cells of a top-level table) contribute text. Text boxes are skipped, which
/// also skips their duplicated VML fallback.
#[derive(Debug, Default)]
struct BodyParser {
    blocks: Vec<WordBlock>,
    table_depth: usize,
    skip_depth: usize,
    paragraph: Option<String>,
    in_run: bool,
    in_text: bool,
    rows: Vec<Vec<String>>,
    row: Option<Vec<String>>,
    cell: Option<CellState>,
}

impl BodyParser {
    fn collecting(&self) -> bool {
        self.skip_depth == 0 && self.table_depth <= 1 && self.paragraph.is_some()
    }

    fn start(&mut self, e: &BytesStart, empty: bool) {
        let name = e.local_name();
        let name = name.as_ref();

        if self.skip_depth > 0 {
            if !empty && name == b"txbxContent" {
                self.skip_depth += 1;
            }
            return;
        }

        match name {
            b"txbxContent" if !empty => self.skip_depth = 1,
            b"tbl" if !empty => {
                self.table_depth += 1;
                if self.table_depth == 1 {
                    self.rows.clear();
                }
            }
            b"tr" if self.table_depth == 1 && !empty => self.row = Some(Vec::new()),
            b"tc" if self.table_depth == 1 && !empty => {
                self.cell = Some(CellState {
                    paragraphs: Vec::new(),
                    span: 1,
                    vmerge: VMerge::None,
                })
            }
            b"gridSpan" if self.table_depth == 1 => {
                if let Some(cell) = self.cell.as_mut() {
                    cell.span = attr(e, b"val")
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(1usize)
                        .max(1);
                }
            }
            b"vMerge" if self.table_depth == 1 => {
                if let Some(cell) = self.cell.as_mut() {
                    cell.vmerge = match attr(e, b"val").as_deref() {
                        Some("restart") => VMerge::Restart,
                        _ => VMerge::Continue,
                    };
                }
            }
            b"p" if self.table_depth <= 1 => {
                if self.paragraph.is_none() && (self.table_depth == 0 || self.cell.is_some()) {
                    self.paragraph = Some(String::new());
                }
                if empty {
                    self.end_paragraph();
                }
            }
            b"r" if !empty => self.in_run = true,
            b"t" if !empty && self.in_run => self.in_text = true,
            b"tab" if self.in_run => self.push_text("\t"),
            b"br" | b"cr" if self.in_run => self.push_text("\n"),
            _ => {}
        }
    }

    fn end(&mut self, name: &[u8]) {
        if self.skip_depth > 0 {
            if name == b"txbxContent" {
                self.skip_depth -= 1;
            }
            return;
        }

        match name {
            b"t" => self.in_text = false,
            b"r" => self.in_run = false,
            b"p" if self.table_depth <= 1 => self.end_paragraph(),
            b"tc" if self.table_depth == 1 => self.end_cell(),
            b"tr" if self.table_depth == 1 => {
                if let Some(row) = self.row.take() {
                    self.rows.push(row);
                }
            }
            b"tbl" => {
                self.table_depth = self.table_depth.saturating_sub(1);
                if self.table_depth == 0 {
                    let rows = std::mem::take(&mut self.rows);
                    self.blocks.push(WordBlock::Table(Table { rows }));
                }
            }
            _ => {}
        }
    }

    fn push_text(&mut self, text: &str) {
        if self.collecting() {
            if let Some(p) = self.paragraph.as_mut() {
                p.push_str(text);
            }
        }
    }

    fn end_paragraph(&mut self) {
        let Some(text) = self.paragraph.take() else {
            return;
        };
        match self.cell.as_mut() {
            Some(cell) if self.table_depth == 1 => cell.paragraphs.push(text),
            _ if self.table_depth == 0 => self.blocks.push(WordBlock::Paragraph(text)),
            _ => {}
        }
    }

    /// Close a cell, repeating it across its grid span. A vertical-merge
    /// continuation takes the text of the cell above it.
    fn end_cell(&mut self) {
        let (Some(cell), Some(row)) = (self.cell.take(), self.row.as_mut()) else {
            return;
        };
        let column = row.len();
        let text = match cell.vmerge {
            VMerge::Continue => self
                .rows
                .last()
                .and_then(|above| above.get(column))
                .cloned()
                .unwrap_or_else(|| cell.paragraphs.join("\n")),
            VMerge::None | VMerge::Restart => cell.paragraphs.join("\n"),
        };
        for _ in 0..cell.span {
            row.push(text.clone());
        }
    }
}

/// Parse `word/document.xml` into top-level paragraphs and tables.
pub fn parse_body(xml: &str) -> Result<Vec<WordBlock>> {
    let mut reader = Reader::from_str(xml);
    let mut parser = BodyParser::default();

    loop {
        match reader.read_event()? {
            Event::Start(e) => parser.start(&e, false),
            Event::Empty(e) => parser.start(&e, true),
            Event::End(e) => parser.end(e.local_name().as_ref()),
            Event::Text(t) if parser.in_text => {
                let text = t.unescape()?;
                parser.push_text(&text);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(parser.blocks)
}
