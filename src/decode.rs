//! Image decode capability
//!
//! The pipeline only retrieves bytes and sniffs extensions; turning bytes
//! into pixels is delegated to an `ImageDecoder`.

use image::DynamicImage;

/// Decodes raw entry bytes into a displayable image
pub trait ImageDecoder {
    type Image;

    /// `None` when the bytes are not a decodable image
    fn decode(&self, bytes: &[u8]) -> Option<Self::Image>;
}

/// Decoder backed by the `image` crate (format sniffed from content)
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterDecoder;

impl ImageDecoder for RasterDecoder {
    type Image = DynamicImage;

    fn decode(&self, bytes: &[u8]) -> Option<DynamicImage> {
        match image::load_from_memory(bytes) {
            Ok(img) if img.width() > 0 && img.height() > 0 => Some(img),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!("Image decode failed: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{jpeg_bytes, png_bytes};

    #[test]
    fn test_decodes_png_and_jpeg() {
        let png = RasterDecoder.decode(&png_bytes(3, 2)).unwrap();
        assert_eq!((png.width(), png.height()), (3, 2));
        assert!(RasterDecoder.decode(&jpeg_bytes(8, 8)).is_some());
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(RasterDecoder.decode(b"").is_none());
        assert!(RasterDecoder.decode(b"definitely not an image").is_none());
        let png = png_bytes(4, 4);
        assert!(RasterDecoder.decode(&png[..png.len() / 2]).is_none());
    }
}
