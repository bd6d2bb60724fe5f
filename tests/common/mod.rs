//! Fixture builders shared by the integration tests.
//!
//! Documents are generated on the fly: PDFs with lopdf, DOCX and PPTX as
//! hand-assembled OPC zip packages.

#![allow(dead_code)]

use std::fs::File;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream, StringFormat};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const PKG_REL: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

/// A small PNG.
pub fn png_bytes() -> Vec<u8> {
    let img = image::RgbImage::from_fn(3, 2, |x, y| image::Rgb([x as u8 * 80, y as u8 * 120, 40]));
    let mut out = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
        .unwrap();
    out
}

/// A small baseline JPEG.
pub fn jpeg_bytes() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(4, 4, image::Rgb([200, 30, 30]));
    let mut out = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Jpeg)
        .unwrap();
    out
}

/// zlib-compressed bytes, as a FlateDecode stream stores them.
pub fn zlib(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(bytes).unwrap();
    encoder.finish().unwrap()
}

/// An image XObject for a PDF fixture.
pub struct PdfImage {
    pub width: i64,
    pub height: i64,
    pub color_space: &'static str,
    pub filters: Vec<&'static str>,
    pub data: Vec<u8>,
}

impl PdfImage {
    /// JPEG data stored with `/DCTDecode`.
    pub fn jpeg(data: Vec<u8>) -> Self {
        Self {
            width: 4,
            height: 4,
            color_space: "DeviceRGB",
            filters: vec!["DCTDecode"],
            data,
        }
    }

    /// JPEG data wrapped in a further `/FlateDecode` layer.
    pub fn flate_jpeg(data: Vec<u8>) -> Self {
        Self {
            filters: vec!["FlateDecode", "DCTDecode"],
            data: zlib(&data),
            ..Self::jpeg(Vec::new())
        }
    }

    /// 8-bit samples stored with `/FlateDecode`.
    pub fn flate(color_space: &'static str, width: i64, height: i64, samples: &[u8]) -> Self {
        Self {
            width,
            height,
            color_space,
            filters: vec!["FlateDecode"],
            data: zlib(samples),
        }
    }

    /// Samples behind a filter the loader does not implement.
    pub fn unsupported() -> Self {
        Self {
            width: 1,
            height: 1,
            color_space: "DeviceGray",
            filters: vec!["RunLengthDecode"],
            data: vec![0, 7, 128],
        }
    }

    fn to_stream(&self) -> Stream {
        let filter: Object = match self.filters.as_slice() {
            [single] => Object::Name(single.as_bytes().to_vec()),
            many => Object::Array(many.iter().map(|f| Object::Name(f.as_bytes().to_vec())).collect()),
        };
        let dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => self.width,
            "Height" => self.height,
            "ColorSpace" => self.color_space,
            "BitsPerComponent" => 8,
            "Filter" => filter,
        };
        Stream::new(dict, self.data.clone()).with_compression(false)
    }
}

/// Page content for a PDF fixture.
pub struct PdfPageSpec {
    pub lines: Vec<String>,
    pub links: Vec<String>,
    /// Text placed one `BT`/`ET` block per cell at (x, y)
    pub cells: Vec<(i64, i64, String)>,
    pub images: Vec<PdfImage>,
}

impl PdfPageSpec {
    pub fn text(lines: &[&str]) -> Self {
        Self {
            lines: lines.iter().map(|s| s.to_string()).collect(),
            links: Vec::new(),
            cells: Vec::new(),
            images: Vec::new(),
        }
    }

    pub fn blank() -> Self {
        Self::text(&[])
    }

    pub fn with_link(mut self, uri: &str) -> Self {
        self.links.push(uri.to_string());
        self
    }

    /// Lay `rows` out as a grid: columns 228pt apart from x=72, rows 20pt
    /// apart from y=700.
    pub fn with_table(mut self, rows: &[&[&str]]) -> Self {
        for (r, row) in rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                let x = 72 + 228 * c as i64;
                let y = 700 - 20 * r as i64;
                self.cells.push((x, y, cell.to_string()));
            }
        }
        self
    }

    pub fn with_image(mut self, image: PdfImage) -> Self {
        self.images.push(image);
        self
    }
}

/// Write a PDF with one page per spec and an optional `/Title`.
///
/// Each page carries its own `/Resources`.
pub fn write_pdf(path: &Path, pages: &[PdfPageSpec], title: Option<&str>) -> PathBuf {
    build_pdf(path, pages, title, false)
}

/// Like [`write_pdf`], but the pages have no `/Resources` of their own: one
/// shared dictionary holding the font and every page's images sits on the
/// `/Pages` node and is inherited.
pub fn write_pdf_inherited(path: &Path, pages: &[PdfPageSpec], title: Option<&str>) -> PathBuf {
    build_pdf(path, pages, title, true)
}

fn page_operations(spec: &PdfPageSpec, image_names: &[String]) -> Vec<Operation> {
    let mut operations = Vec::new();
    if !spec.lines.is_empty() {
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new("Tf", vec!["F1".into(), 12.into()]));
        operations.push(Operation::new("Td", vec![72.into(), 720.into()]));
        for (i, line) in spec.lines.iter().enumerate() {
            if i > 0 {
                operations.push(Operation::new("Td", vec![0.into(), (-16).into()]));
            }
            operations.push(Operation::new("Tj", vec![Object::string_literal(line.as_str())]));
        }
        operations.push(Operation::new("ET", vec![]));
    }
    for (x, y, text) in &spec.cells {
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new("Tf", vec!["F1".into(), 12.into()]));
        operations.push(Operation::new("Td", vec![(*x).into(), (*y).into()]));
        operations.push(Operation::new("Tj", vec![Object::string_literal(text.as_str())]));
        operations.push(Operation::new("ET", vec![]));
    }
    for (i, name) in image_names.iter().enumerate() {
        let y = 100 + 60 * i as i64;
        operations.push(Operation::new("q", vec![]));
        operations.push(Operation::new(
            "cm",
            vec![40.into(), 0.into(), 0.into(), 40.into(), 400.into(), y.into()],
        ));
        operations.push(Operation::new("Do", vec![Object::Name(name.as_bytes().to_vec())]));
        operations.push(Operation::new("Q", vec![]));
    }
    operations
}

fn build_pdf(path: &Path, pages: &[PdfPageSpec], title: Option<&str>, inherit: bool) -> PathBuf {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });

    let mut shared_xobjects = Dictionary::new();
    let mut kids = Vec::new();
    for (page_index, spec) in pages.iter().enumerate() {
        let mut xobjects = Dictionary::new();
        let mut image_names = Vec::new();
        for (i, image) in spec.images.iter().enumerate() {
            let name = if inherit {
                format!("P{}Im{}", page_index + 1, i + 1)
            } else {
                format!("Im{}", i + 1)
            };
            let image_id = doc.add_object(image.to_stream());
            xobjects.set(name.as_bytes().to_vec(), image_id);
            image_names.push(name);
        }

        let content = Content {
            operations: page_operations(spec, &image_names),
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));

        let annots: Vec<Object> = spec
            .links
            .iter()
            .map(|uri| {
                doc.add_object(dictionary! {
                    "Type" => "Annot",
                    "Subtype" => "Link",
                    "Rect" => vec![0.into(), 0.into(), 10.into(), 10.into()],
                    "A" => dictionary! {
                        "S" => "URI",
                        "URI" => Object::String(uri.as_bytes().to_vec(), StringFormat::Literal),
                    },
                })
                .into()
            })
            .collect();

        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        };
        if inherit {
            for (name, id) in xobjects.iter() {
                shared_xobjects.set(name.clone(), id.clone());
            }
        } else {
            let resources_id = doc.add_object(dictionary! {
                "Font" => dictionary! { "F1" => font_id },
                "XObject" => xobjects,
            });
            page.set("Resources", resources_id);
        }
        if !annots.is_empty() {
            page.set("Annots", annots);
        }
        kids.push(Object::from(doc.add_object(page)));
    }

    let count = kids.len() as i64;
    let mut pages_node = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
    };
    if inherit {
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
            "XObject" => shared_xobjects,
        });
        pages_node.set("Resources", resources_id);
    }
    doc.objects.insert(pages_id, Object::Dictionary(pages_node));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    if let Some(title) = title {
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::String(title.as_bytes().to_vec(), StringFormat::Literal),
            "Author" => Object::String(b"Fixture Author".to_vec(), StringFormat::Literal),
        });
        doc.trailer.set("Info", info_id);
    }

    doc.save(path).unwrap();
    path.to_path_buf()
}

/// Write a zip package from `(part name, bytes)` pairs.
pub fn write_zip(path: &Path, parts: &[(&str, Vec<u8>)]) -> PathBuf {
    let mut zip = ZipWriter::new(File::create(path).unwrap());
    let options = SimpleFileOptions::default();
    for (name, data) in parts {
        zip.start_file(*name, options).unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap();
    path.to_path_buf()
}

fn content_types(main: &str, content_type: &str) -> Vec<u8> {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Default Extension="png" ContentType="image/png"/>
  <Override PartName="/{}" ContentType="{}"/>
</Types>"#,
        main, content_type
    )
    .into_bytes()
}

fn root_rels(main: &str) -> Vec<u8> {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="{pkg}">
  <Relationship Id="rId1" Type="{rel}/officeDocument" Target="{main}"/>
  <Relationship Id="rId2" Type="{pkg}/metadata/core-properties" Target="docProps/core.xml"/>
</Relationships>"#,
        pkg = PKG_REL,
        rel = REL,
        main = main
    )
    .into_bytes()
}

fn core_xml(title: &str, creator: &str) -> Vec<u8> {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <dc:title>{}</dc:title>
  <dc:creator>{}</dc:creator>
  <dcterms:created xsi:type="dcterms:W3CDTF">2024-03-01T09:30:00Z</dcterms:created>
</cp:coreProperties>"#,
        title, creator
    )
    .into_bytes()
}

/// A DOCX with two paragraphs (the second linked), one 2x2 table and one
/// embedded PNG.
pub fn write_docx(path: &Path) -> PathBuf {
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="{rel}" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main">
  <w:body>
    <w:p><w:r><w:t>Quarterly report</w:t></w:r></w:p>
    <w:p><w:r><w:t xml:space="preserve">See </w:t></w:r><w:hyperlink r:id="rId2"><w:r><w:t>the site</w:t></w:r></w:hyperlink></w:p>
    <w:tbl>
      <w:tr><w:tc><w:p><w:r><w:t>Region</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>Sales</w:t></w:r></w:p></w:tc></w:tr>
      <w:tr><w:tc><w:p><w:r><w:t>North</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>42</w:t></w:r></w:p></w:tc></w:tr>
    </w:tbl>
    <w:p><w:r><w:drawing><a:blip r:embed="rId3"/></w:drawing></w:r></w:p>
  </w:body>
</w:document>"#,
        rel = REL
    );
    let rels = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="{pkg}">
  <Relationship Id="rId1" Type="{rel}/styles" Target="styles.xml"/>
  <Relationship Id="rId2" Type="{rel}/hyperlink" Target="https://example.com/report" TargetMode="External"/>
  <Relationship Id="rId3" Type="{rel}/image" Target="media/image1.png"/>
</Relationships>"#,
        pkg = PKG_REL,
        rel = REL
    );

    write_zip(
        path,
        &[
            (
                "[Content_Types].xml",
                content_types(
                    "word/document.xml",
                    "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml",
                ),
            ),
            ("_rels/.rels", root_rels("word/document.xml")),
            ("word/document.xml", document.into_bytes()),
            ("word/_rels/document.xml.rels", rels.into_bytes()),
            ("word/media/image1.png", png_bytes()),
            ("docProps/core.xml", core_xml("Quarterly", "Ada")),
        ],
    )
}

/// A DOCX whose body is empty and which has no core properties.
pub fn write_empty_docx(path: &Path) -> PathBuf {
    let document = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body/></w:document>"#;
    write_zip(
        path,
        &[
            ("_rels/.rels", root_rels("word/document.xml")),
            ("word/document.xml", document.as_bytes().to_vec()),
        ],
    )
}

fn slide_xml(body: &str) -> Vec<u8> {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="{rel}" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">
  <p:cSld><p:spTree>{body}</p:spTree></p:cSld>
</p:sld>"#,
        rel = REL,
        body = body
    )
    .into_bytes()
}

fn text_shape(id: u32, name: &str, paragraphs: &str) -> String {
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="{name}"/></p:nvSpPr><p:txBody>{paragraphs}</p:txBody></p:sp>"#,
        id = id,
        name = name,
        paragraphs = paragraphs
    )
}

/// A two-slide PPTX.
///
/// Slide 1: a title, a picture and a 2x2 table. Slide 2: one text box whose
/// second run links to `https://example.com/deck`.
pub fn write_pptx(path: &Path) -> PathBuf {
    let presentation = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation xmlns:r="{rel}" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">
  <p:sldIdLst><p:sldId id="256" r:id="rId2"/><p:sldId id="257" r:id="rId3"/></p:sldIdLst>
</p:presentation>"#,
        rel = REL
    );
    let presentation_rels = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="{pkg}">
  <Relationship Id="rId1" Type="{rel}/slideMaster" Target="slideMasters/slideMaster1.xml"/>
  <Relationship Id="rId2" Type="{rel}/slide" Target="slides/slide1.xml"/>
  <Relationship Id="rId3" Type="{rel}/slide" Target="slides/slide2.xml"/>
</Relationships>"#,
        pkg = PKG_REL,
        rel = REL
    );

    let title = text_shape(2, "Title 1", "<a:p><a:r><a:t>Roadmap</a:t></a:r></a:p>");
    let picture = r#"<p:pic><p:nvPicPr><p:cNvPr id="3" name="Picture 2"/></p:nvPicPr><p:blipFill><a:blip r:embed="rId2"/></p:blipFill></p:pic>"#;
    let table = r#"<p:graphicFrame><p:nvGraphicFramePr><p:cNvPr id="4" name="Table 3"/></p:nvGraphicFramePr><a:graphic><a:graphicData><a:tbl>
      <a:tr><a:tc><a:txBody><a:p><a:r><a:t>Q1</a:t></a:r></a:p></a:txBody></a:tc><a:tc><a:txBody><a:p><a:r><a:t>Q2</a:t></a:r></a:p></a:txBody></a:tc></a:tr>
      <a:tr><a:tc><a:txBody><a:p><a:r><a:t>10</a:t></a:r></a:p></a:txBody></a:tc><a:tc><a:txBody><a:p><a:r><a:t>20</a:t></a:r></a:p></a:txBody></a:tc></a:tr>
    </a:tbl></a:graphicData></a:graphic></p:graphicFrame>"#;
    let slide1 = slide_xml(&format!("{}{}{}", title, picture, table));
    let slide1_rels = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="{pkg}">
  <Relationship Id="rId1" Type="{rel}/slideLayout" Target="../slideLayouts/slideLayout1.xml"/>
  <Relationship Id="rId2" Type="{rel}/image" Target="../media/image1.png"/>
</Relationships>"#,
        pkg = PKG_REL,
        rel = REL
    );

    let linked = text_shape(
        2,
        "TextBox 1",
        r#"<a:p><a:r><a:t xml:space="preserve">Visit </a:t></a:r><a:r><a:rPr><a:hlinkClick r:id="rId2"/></a:rPr><a:t>our deck</a:t></a:r></a:p>"#,
    );
    let slide2 = slide_xml(&linked);
    let slide2_rels = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="{pkg}">
  <Relationship Id="rId1" Type="{rel}/slideLayout" Target="../slideLayouts/slideLayout1.xml"/>
  <Relationship Id="rId2" Type="{rel}/hyperlink" Target="https://example.com/deck" TargetMode="External"/>
</Relationships>"#,
        pkg = PKG_REL,
        rel = REL
    );

    write_zip(
        path,
        &[
            (
                "[Content_Types].xml",
                content_types(
                    "ppt/presentation.xml",
                    "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml",
                ),
            ),
            ("_rels/.rels", root_rels("ppt/presentation.xml")),
            ("ppt/presentation.xml", presentation.into_bytes()),
            ("ppt/_rels/presentation.xml.rels", presentation_rels.into_bytes()),
            ("ppt/slides/slide1.xml", slide1),
            ("ppt/slides/_rels/slide1.xml.rels", slide1_rels.into_bytes()),
            ("ppt/slides/slide2.xml", slide2),
            ("ppt/slides/_rels/slide2.xml.rels", slide2_rels.into_bytes()),
            ("ppt/media/image1.png", png_bytes()),
            ("docProps/core.xml", core_xml("Roadmap", "Grace")),
        ],
    )
}
