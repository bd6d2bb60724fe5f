//! Slide decks (`.pptx`).

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::package::{attr, rel_attr, resolve_target, Package};
use crate::error::{Error, Result};
use crate::model::{ImageBlob, Presentation, Relationship, Shape, ShapeKind, Slide, Table, TextParagraph, TextRun};

/// Read every slide in presentation order, plus core properties.
pub(crate) fn read(package: &mut Package, warnings: &mut Vec<String>) -> Result<Presentation> {
    let main = package.main_part("ppt/presentation.xml")?;
    let xml = package.read_xml(&main)?;
    let slide_ids = parse_slide_list(&xml)?;
    let rels = package.relationships(&main)?;

    let mut slides = Vec::with_capacity(slide_ids.len());
    for (idx, rel_id) in slide_ids.iter().enumerate() {
        let number = idx as u32 + 1;
        let rel = rels
            .iter()
            .find(|r| &r.id == rel_id)
            .ok_or_else(|| Error::LoadFailure(format!("slide {}: no relationship {}", number, rel_id)))?;
        let part = resolve_target(&main, &rel.target);
        let slide_xml = package.read_xml(&part)?;
        let slide_rels = package.relationships(&part)?;

        let shapes = parse_slide(&slide_xml, &slide_rels, |image_rel| {
            if image_rel.external {
                log::debug!("slide {}: linked image {} not embedded", number, image_rel.target);
                return None;
            }
            let media = resolve_target(&part, &image_rel.target);
            match package.read_part(&media) {
                Ok(data) => Some(ImageBlob::new(data).with_name(media)),
                Err(e) => {
                    log::warn!("slide {}: image {} unreadable: {}", number, media, e);
                    warnings.push(format!("slide {}: image {}: {}", number, media, e));
                    None
                }
            }
        })?;

        log::debug!("slide {}: {} shapes", number, shapes.len());
        slides.push(Slide { number, shapes });
    }

    Ok(Presentation {
        slides,
        properties: package.core_properties()?,
    })
}

/// Relationship ids of `p:sldIdLst`, in presentation order.
pub fn parse_slide_list(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut ids = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sldId" => {
                if let Some(id) = rel_attr(&e, b"id") {
                    ids.push(id);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(ids)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShapeTag {
    Sp,
    Pic,
    GraphicFrame,
    Connector,
}

impl ShapeTag {
    fn from_local(name: &[u8]) -> Option<Self> {
        match name {
            b"sp" => Some(ShapeTag::Sp),
            b"pic" => Some(ShapeTag::Pic),
            b"graphicFrame" => Some(ShapeTag::GraphicFrame),
            b"cxnSp" => Some(ShapeTag::Connector),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct ShapeBuilder {
    tag: ShapeTag,
    name: Option<String>,
    paragraphs: Option<Vec<TextParagraph>>,
    image: Option<ImageBlob>,
    table: Option<Table>,
}

impl ShapeBuilder {
    fn new(tag: ShapeTag) -> Self {
        Self {
            tag,
            name: None,
            paragraphs: None,
            image: None,
            table: None,
        }
    }

    fn finish(self) -> Shape {
        let kind = match self.tag {
            ShapeTag::Sp => self.paragraphs.map(ShapeKind::Text),
            ShapeTag::Pic => self.image.map(ShapeKind::Picture),
            ShapeTag::GraphicFrame => self.table.map(ShapeKind::Table),
            ShapeTag::Connector => None,
        };
        Shape {
            name: self.name.unwrap_or_default(),
            kind: kind.unwrap_or(ShapeKind::Other),
        }
    }
}

/// Shape-tree walker.
///
/// Shapes never nest except through `p:grpSp`, which is transparent here, so
/// one open shape at a time is enough. `mc:Fallback` branches are skipped so
/// alternate content is not counted twice.
struct SlideParser<'a, F> {
    rels: &'a [Relationship],
    load_image: F,
    shapes: Vec<Shape>,
    shape: Option<ShapeBuilder>,
    skip_depth: usize,
    paragraph: Option<TextParagraph>,
    run: Option<TextRun>,
    in_text: bool,
    row: Option<Vec<String>>,
    cell: Option<Vec<String>>,
}

impl<'a, F> SlideParser<'a, F>
where
    F: FnMut(&Relationship) -> Option<ImageBlob>,
{
    fn target(&self, rel_id: &str) -> Option<&'a Relationship> {
        self.rels.iter().find(|r| r.id == rel_id)
    }

    fn start(&mut self, e: &BytesStart, empty: bool) {
        let local = e.local_name();
        let name = local.as_ref();

        if self.skip_depth > 0 {
            if !empty && name == b"Fallback" {
                self.skip_depth += 1;
            }
            return;
        }
        if name == b"Fallback" {
            if !empty {
                self.skip_depth = 1;
            }
            return;
        }

        if let Some(tag) = ShapeTag::from_local(name) {
            if !empty && self.shape.is_none() {
                self.shape = Some(ShapeBuilder::new(tag));
            }
            return;
        }

        let Some(shape) = self.shape.as_mut() else {
            return;
        };

        match name {
            b"cNvPr" if shape.name.is_none() => shape.name = Some(attr(e, b"name").unwrap_or_default()),
            b"txBody" if shape.tag == ShapeTag::Sp && self.cell.is_none() => {
                shape.paragraphs.get_or_insert_with(Vec::new);
            }
            b"blip" if shape.tag == ShapeTag::Pic && shape.image.is_none() => {
                if let Some(rel) = rel_attr(e, b"embed").and_then(|id| self.target(&id)) {
                    let image = (self.load_image)(rel);
                    if let Some(shape) = self.shape.as_mut() {
                        shape.image = image;
                    }
                }
            }
            b"tbl" if shape.tag == ShapeTag::GraphicFrame => shape.table = Some(Table::new()),
            b"tr" if shape.table.is_some() && !empty => self.row = Some(Vec::new()),
            b"tc" if self.row.is_some() => {
                self.cell = Some(Vec::new());
                if empty {
                    self.end_cell();
                }
            }
            b"p" => {
                self.paragraph = Some(TextParagraph::default());
                if empty {
                    self.end_paragraph();
                }
            }
            b"r" | b"fld" if self.paragraph.is_some() && !empty => self.run = Some(TextRun::default()),
            b"t" if self.run.is_some() && !empty => self.in_text = true,
            b"br" => {
                if let Some(paragraph) = self.paragraph.as_mut() {
                    paragraph.runs.push(TextRun::plain("\n"));
                }
            }
            b"hlinkClick" => {
                let address = rel_attr(e, b"id")
                    .filter(|id| !id.is_empty())
                    .and_then(|id| self.target(&id))
                    .map(|rel| rel.target.clone());
                if let (Some(run), Some(address)) = (self.run.as_mut(), address) {
                    run.hyperlink = Some(address);
                }
            }
            _ => {}
        }
    }

    fn end(&mut self, name: &[u8]) {
        if self.skip_depth > 0 {
            if name == b"Fallback" {
                self.skip_depth -= 1;
            }
            return;
        }

        match name {
            b"t" => self.in_text = false,
            b"r" | b"fld" => {
                if let (Some(run), Some(paragraph)) = (self.run.take(), self.paragraph.as_mut()) {
                    paragraph.runs.push(run);
                }
            }
            b"p" => self.end_paragraph(),
            b"tc" => self.end_cell(),
            b"tr" => {
                if let (Some(row), Some(table)) = (
                    self.row.take(),
                    self.shape.as_mut().and_then(|s| s.table.as_mut()),
                ) {
                    table.add_row(row);
                }
            }
            _ => {
                if let Some(tag) = ShapeTag::from_local(name) {
                    if self.shape.as_ref().is_some_and(|s| s.tag == tag) {
                        if let Some(shape) = self.shape.take() {
                            self.shapes.push(shape.finish());
                        }
                    }
                }
            }
        }
    }

    fn push_text(&mut self, text: &str) {
        if let Some(run) = self.run.as_mut() {
            run.text.push_str(text);
        }
    }

    fn end_paragraph(&mut self) {
        let Some(paragraph) = self.paragraph.take() else {
            return;
        };
        if let Some(cell) = self.cell.as_mut() {
            cell.push(paragraph.text());
        } else if let Some(paragraphs) = self.shape.as_mut().and_then(|s| s.paragraphs.as_mut()) {
            paragraphs.push(paragraph);
        }
    }

    fn end_cell(&mut self) {
        if let (Some(cell), Some(row)) = (self.cell.take(), self.row.as_mut()) {
            row.push(cell.join("\n"));
        }
    }
}

/// Parse one slide's shape tree.
///
/// `load_image` is called with the relationship of every embedded picture and
/// returns its blob, or `None` when the image cannot be read.
pub fn parse_slide<F>(xml: &str, rels: &[Relationship], load_image: F) -> Result<Vec<Shape>>
where
    F: FnMut(&Relationship) -> Option<ImageBlob>,
{
    let mut reader = Reader::from_str(xml);
    let mut parser = SlideParser {
        rels,
        load_image,
        shapes: Vec::new(),
        shape: None,
        skip_depth: 0,
        paragraph: None,
        run: None,
        in_text: false,
        row: None,
        cell: None,
    };

    loop {
        match reader.read_event()? {
            Event::Start(e) => parser.start(&e, false),
            Event::Empty(e) => parser.start(&e, true),
            Event::End(e) => parser.end(e.local_name().as_ref()),
            Event::Text(t) if parser.in_text && parser.skip_depth == 0 => {
                let text = t.unescape()?;
                parser.push_text(&text);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(parser.shapes)
}
