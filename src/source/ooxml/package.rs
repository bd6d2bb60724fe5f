//! OPC package access: parts, relationships and core properties.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use zip::ZipArchive;

use crate::error::{Error, Result};
use crate::model::{DocumentProperties, Relationship};

const REL_OFFICE_DOCUMENT: &str = "officeDocument";
const REL_CORE_PROPERTIES: &str = "core-properties";

/// An opened OOXML container.
pub struct Package {
    archive: ZipArchive<File>,
}

impl Package {
    /// Open a package from disk.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let archive = ZipArchive::new(file)?;
        Ok(Self { archive })
    }

    /// Check whether a part exists.
    pub fn has_part(&self, name: &str) -> bool {
        let name = name.trim_start_matches('/');
        self.archive.file_names().any(|n| n == name)
    }

    /// Raw bytes of a part.
    pub fn read_part(&mut self, name: &str) -> Result<Vec<u8>> {
        let name = name.trim_start_matches('/');
        let mut entry = self.archive.by_name(name).map_err(|e| match e {
            zip::result::ZipError::FileNotFound => {
                Error::LoadFailure(format!("missing part: {}", name))
            }
            other => Error::from(other),
        })?;
        let mut data = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut data)?;
        Ok(data)
    }

    /// A part decoded as UTF-8 text.
    pub fn read_xml(&mut self, name: &str) -> Result<String> {
        let data = self.read_part(name)?;
        let text = String::from_utf8(data)
            .map_err(|e| Error::LoadFailure(format!("{}: not UTF-8: {}", name, e)))?;
        Ok(text.trim_start_matches('\u{feff}').to_string())
    }

    /// Relationships of a part (`""` for the package itself), in file order.
    ///
    /// A part without a relationships part has none.
    pub fn relationships(&mut self, part: &str) -> Result<Vec<Relationship>> {
        let rels_name = rels_part_name(part);
        if !self.has_part(&rels_name) {
            return Ok(Vec::new());
        }
        let xml = self.read_xml(&rels_name)?;
        parse_relationships(&xml)
    }

    /// Name of the main document part.
    pub fn main_part(&mut self, fallback: &str) -> Result<String> {
        let rels = self.relationships("")?;
        let main = rels
            .iter()
            .find(|r| r.kind() == REL_OFFICE_DOCUMENT)
            .map(|r| resolve_target("", &r.target))
            .unwrap_or_else(|| fallback.to_string());

        if !self.has_part(&main) {
            return Err(Error::LoadFailure(format!("missing main part: {}", main)));
        }
        Ok(main)
    }

    /// Core properties, if the package carries them.
    pub fn core_properties(&mut self) -> Result<Option<DocumentProperties>> {
        let rels = self.relationships("")?;
        let name = rels
            .iter()
            .find(|r| r.kind() == REL_CORE_PROPERTIES)
            .map(|r| resolve_target("", &r.target))
            .unwrap_or_else(|| "docProps/core.xml".to_string());

        if !self.has_part(&name) {
            return Ok(None);
        }
        let xml = self.read_xml(&name)?;
        parse_core_properties(&xml).map(Some)
    }
}

/// `word/document.xml` → `word/_rels/document.xml.rels`.
fn rels_part_name(part: &str) -> String {
    let part = part.trim_start_matches('/');
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

/// Resolve a relationship target against the part that owns it.
///
/// Absolute targets (`/ppt/media/a.png`) are taken from the package root.
pub fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return normalize(absolute);
    }
    let base = source_part
        .trim_start_matches('/')
        .rsplit_once('/')
        .map(|(dir, _)| dir)
        .unwrap_or("");
    if base.is_empty() {
        normalize(target)
    } else {
        normalize(&format!("{}/{}", base, target))
    }
}

fn normalize(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}

/// Value of the attribute with the given local name.
pub(crate) fn attr(e: &BytesStart, local: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == local)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// Value of a namespaced relationship-id attribute such as `r:id` or
/// `r:embed`. Unprefixed attributes with the same local name are ignored.
pub(crate) fn rel_attr(e: &BytesStart, local: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.prefix().is_some() && a.key.local_name().as_ref() == local)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// Parse a `.rels` part.
pub fn parse_relationships(xml: &str) -> Result<Vec<Relationship>> {
    let mut reader = Reader::from_str(xml);
    let mut rels = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                let (Some(id), Some(rel_type)) = (attr(&e, b"Id"), attr(&e, b"Type")) else {
                    log::debug!("skipping relationship without Id or Type");
                    continue;
                };
                rels.push(Relationship {
                    id,
                    rel_type,
                    target: attr(&e, b"Target").unwrap_or_default(),
                    external: attr(&e, b"TargetMode").is_some_and(|m| m == "External"),
                });
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(rels)
}

/// Parse `docProps/core.xml`. Empty values count as unset.
pub fn parse_core_properties(xml: &str) -> Result<DocumentProperties> {
    let mut reader = Reader::from_str(xml);
    let mut props = DocumentProperties::default();
    let mut current: Option<Vec<u8>> = None;
    let mut buffer = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                current = Some(e.local_name().as_ref().to_vec());
                buffer.clear();
            }
            Event::Text(t) => {
                if current.is_some() {
                    buffer.push_str(&t.unescape()?);
                }
            }
            Event::End(_) => {
                if let Some(name) = current.take() {
                    let value = buffer.trim();
                    let value = (!value.is_empty()).then(|| value.to_string());
                    match name.as_slice() {
                        b"title" => props.title = value,
                        b"creator" => props.author = value,
                        b"subject" => props.subject = value,
                        b"keywords" => props.keywords = value,
                        b"created" => props.created = value.map(|v| normalize_w3c_date(&v)),
                        b"modified" => props.modified = value.map(|v| normalize_w3c_date(&v)),
                        _ => {}
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(props)
}

/// W3CDTF dates to RFC 3339; unparseable values pass through.
fn normalize_w3c_date(raw: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|_| raw.to_string())
}
