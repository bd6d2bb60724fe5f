//! Embedded image blobs.

use serde::{Deserialize, Serialize, Serializer};

/// An encoded image pulled out of a document.
///
/// The bytes are kept exactly as the container stored them; sinks decode and
/// re-encode on write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageBlob {
    /// Raw binary data; serialized as its length only
    #[serde(rename = "size", serialize_with = "serialize_len", skip_deserializing)]
    pub data: Vec<u8>,

    /// MIME type sniffed from the leading bytes, if recognized
    pub mime_type: Option<String>,

    /// Where the image came from (part name or XObject name)
    pub name: Option<String>,
}

fn serialize_len<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(data.len() as u64)
}

impl ImageBlob {
    /// Wrap encoded bytes, sniffing the MIME type.
    pub fn new(data: Vec<u8>) -> Self {
        let mime_type = Self::detect_mime_type(&data).map(str::to_string);
        Self {
            data,
            mime_type,
            name: None,
        }
    }

    /// Set the source name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Get the size of the image data in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Get the file extension based on MIME type.
    pub fn extension(&self) -> &str {
        match self.mime_type.as_deref() {
            Some("image/jpeg") => "jpg",
            Some("image/png") => "png",
            Some("image/gif") => "gif",
            Some("image/tiff") => "tiff",
            Some("image/bmp") => "bmp",
            Some("image/webp") => "webp",
            Some("image/jp2") => "jp2",
            Some("image/x-emf") => "emf",
            Some("image/x-wmf") => "wmf",
            _ => "raw",
        }
    }

    /// Detect MIME type from data magic bytes.
    pub fn detect_mime_type(data: &[u8]) -> Option<&'static str> {
        if data.len() < 8 {
            return None;
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some("image/jpeg");
        }

        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some("image/png");
        }

        if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            return Some("image/gif");
        }

        if data.starts_with(&[0x49, 0x49, 0x2A, 0x00])
            || data.starts_with(&[0x4D, 0x4D, 0x00, 0x2A])
        {
            return Some("image/tiff");
        }

        if data.starts_with(b"BM") {
            return Some("image/bmp");
        }

        if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some("image/webp");
        }

        // JPEG 2000: 00 00 00 0C 6A 50 20 20
        if data.starts_with(&[0x00, 0x00, 0x00, 0x0C, 0x6A, 0x50, 0x20, 0x20]) {
            return Some("image/jp2");
        }

        // Office pictures often embed Windows metafiles
        if data.starts_with(&[0x01, 0x00, 0x00, 0x00]) && data.len() >= 44 && &data[40..44] == b" EMF"
        {
            return Some("image/x-emf");
        }
        if data.starts_with(&[0xD7, 0xCD, 0xC6, 0x9A]) {
            return Some("image/x-wmf");
        }

        None
    }
}
