//! Member photo normalization.
//!
//! Photos are stored inline on the entry as a JPEG data URL, so uploads are
//! shrunk to a bounded size before they are embedded.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;

use crate::error::CoreError;

/// Longest edge of a stored photo, in pixels.
pub const MAX_PHOTO_EDGE: u32 = 400;

/// JPEG quality used for stored photos.
pub const JPEG_QUALITY: u8 = 80;

const DATA_URL_PREFIX: &str = "data:image/jpeg;base64,";

/// Target size for a `width` x `height` image bounded by `max_edge`.
///
/// Landscape and portrait images are scaled so the longer edge equals
/// `max_edge`; an oversized square becomes `max_edge` x `max_edge`; anything
/// already within bounds is left alone.
pub fn fit_dimensions(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
    let scale = |short: u32, long: u32| -> u32 {
        let scaled = u64::from(short) * u64::from(max_edge) / u64::from(long.max(1));
        u32::try_from(scaled).unwrap_or(max_edge).max(1)
    };

    if width > height && width > max_edge {
        (max_edge, scale(height, width))
    } else if height > width && height > max_edge {
        (scale(width, height), max_edge)
    } else if width > max_edge {
        (max_edge, max_edge)
    } else {
        (width, height)
    }
}

/// Decode `bytes`, shrink to [`MAX_PHOTO_EDGE`] and return a JPEG data URL.
pub fn normalize_photo(bytes: &[u8]) -> Result<String, CoreError> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| CoreError::Validation(format!("Unsupported image: {e}")))?;

    let (width, height) = fit_dimensions(decoded.width(), decoded.height(), MAX_PHOTO_EDGE);
    let resized = if (width, height) == (decoded.width(), decoded.height()) {
        decoded
    } else {
        decoded.resize_exact(width, height, FilterType::Triangle)
    };

    // JPEG has no alpha channel.
    let rgb = DynamicImage::ImageRgb8(resized.to_rgb8());

    let mut encoded = Cursor::new(Vec::new());
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut encoded, JPEG_QUALITY))
        .map_err(|e| CoreError::Internal(format!("JPEG encoding failed: {e}")))?;

    Ok(format!("{DATA_URL_PREFIX}{}", STANDARD.encode(encoded.into_inner())))
}

/// Decode a data URL produced by [`normalize_photo`] back to JPEG bytes.
pub fn decode_data_url(url: &str) -> Result<Vec<u8>, CoreError> {
    let payload = url
        .strip_prefix(DATA_URL_PREFIX)
        .ok_or_else(|| CoreError::Validation("Not a JPEG data URL".into()))?;
    STANDARD
        .decode(payload)
        .map_err(|e| CoreError::Validation(format!("Invalid base64 payload: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use image::{ImageFormat, RgbaImage};

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(RgbaImage::new(width, height))
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn landscape_scales_to_max_width() {
        assert_eq!(fit_dimensions(800, 600, 400), (400, 300));
    }

    #[test]
    fn portrait_scales_to_max_height() {
        assert_eq!(fit_dimensions(500, 1000, 400), (200, 400));
    }

    #[test]
    fn oversized_square_becomes_max_square() {
        assert_eq!(fit_dimensions(1200, 1200, 400), (400, 400));
    }

    #[test]
    fn small_images_untouched() {
        assert_eq!(fit_dimensions(120, 80, 400), (120, 80));
        assert_eq!(fit_dimensions(400, 400, 400), (400, 400));
    }

    #[test]
    fn extreme_aspect_keeps_one_pixel() {
        assert_eq!(fit_dimensions(4000, 1, 400), (400, 1));
    }

    #[test]
    fn normalize_produces_bounded_jpeg_data_url() {
        let url = normalize_photo(&png(800, 200)).unwrap();
        assert!(url.starts_with("data:image/jpeg;base64,"));

        let jpeg = decode_data_url(&url).unwrap();
        let back = image::load_from_memory(&jpeg).unwrap();
        assert_eq!((back.width(), back.height()), (400, 100));
    }

    #[test]
    fn garbage_is_rejected() {
        assert_matches!(normalize_photo(b"not an image"), Err(CoreError::Validation(_)));
        assert_matches!(decode_data_url("data:text/plain,hi"), Err(CoreError::Validation(_)));
    }
}
