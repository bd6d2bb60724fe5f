//! Decode-and-re-encode step shared by both sinks.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat};

use crate::error::Result;
use crate::model::ImageBlob;

/// An image after a decode/encode round through the `image` crate.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub data: Vec<u8>,

    /// Format inferred from the original bytes, and used for re-encoding
    pub format: ImageFormat,
}

impl EncodedImage {
    /// File extension for the inferred format.
    pub fn extension(&self) -> &'static str {
        match self.format {
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Png => "png",
            ImageFormat::Gif => "gif",
            ImageFormat::Bmp => "bmp",
            ImageFormat::Tiff => "tiff",
            other => other.extensions_str().first().copied().unwrap_or("bin"),
        }
    }
}

/// Infer the format of `blob` from its bytes, decode it and encode it again
/// in the same format.
///
/// Fails with `ExtractionPartialFailure` when the bytes are not a decodable
/// image, which includes the raw sample data some PDFs carry.
pub fn reencode(blob: &ImageBlob) -> Result<EncodedImage> {
    let format = image::guess_format(&blob.data)?;
    let decoded = image::load_from_memory_with_format(&blob.data, format)?;

    // JPEG has no alpha channel
    let decoded = match format {
        ImageFormat::Jpeg if decoded.color().has_alpha() => DynamicImage::ImageRgb8(decoded.to_rgb8()),
        _ => decoded,
    };

    let mut out = Cursor::new(Vec::new());
    decoded.write_to(&mut out, format)?;
    Ok(EncodedImage {
        data: out.into_inner(),
        format,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::Error;
    use image::{Rgb, RgbImage};

    /// A small encoded test image.
    pub(crate) fn sample(format: ImageFormat) -> Vec<u8> {
        let img = RgbImage::from_fn(4, 3, |x, y| Rgb([(x * 60) as u8, (y * 80) as u8, 128]));
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img).write_to(&mut out, format).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_png_roundtrip() {
        let encoded = reencode(&ImageBlob::new(sample(ImageFormat::Png))).unwrap();
        assert_eq!(encoded.format, ImageFormat::Png);
        assert_eq!(encoded.extension(), "png");
        let back = image::load_from_memory(&encoded.data).unwrap();
        assert_eq!((back.width(), back.height()), (4, 3));
    }

    #[test]
    fn test_jpeg_keeps_format() {
        let encoded = reencode(&ImageBlob::new(sample(ImageFormat::Jpeg))).unwrap();
        assert_eq!(encoded.format, ImageFormat::Jpeg);
        assert_eq!(encoded.extension(), "jpeg");
    }

    #[test]
    fn test_undecodable_bytes_are_partial_failure() {
        let blob = ImageBlob::new(vec![0x10; 64]);
        let err = reencode(&blob).unwrap_err();
        assert!(matches!(err, Error::ExtractionPartialFailure { .. }));
        assert!(!err.is_fatal());
    }
}
