//! Image normalization
//!
//! Turns uploaded bytes into the canonical pixel buffer every extractor
//! consumes: RGB, fixed canvas size, aspect ratio preserved (letterboxed on
//! black), lightly denoised.

use crate::error::{DetectError, DetectResult};
use brandsight_common::config::ImageConfig;
use image::imageops::FilterType;
use image::{GrayImage, RgbImage};
use tracing::debug;

/// Canonical RGB pixel buffer
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    rgb: RgbImage,
}

impl PixelBuffer {
    /// Wrap an RGB image as-is (no resizing)
    pub fn from_rgb(rgb: RgbImage) -> Self {
        Self { rgb }
    }

    pub fn width(&self) -> u32 {
        self.rgb.width()
    }

    pub fn height(&self) -> u32 {
        self.rgb.height()
    }

    pub fn rgb(&self) -> &RgbImage {
        &self.rgb
    }

    /// Luma conversion used by barcode, edge and layout analysis
    pub fn to_gray(&self) -> GrayImage {
        image::imageops::grayscale(&self.rgb)
    }
}

/// Decodes and normalizes uploaded image bytes
#[derive(Debug, Clone)]
pub struct ImageNormalizer {
    config: ImageConfig,
}

impl ImageNormalizer {
    pub fn new(config: ImageConfig) -> Self {
        Self { config }
    }

    /// Decode `bytes` into a fixed-size pixel buffer
    ///
    /// # Errors
    /// `InvalidInput` when the payload is empty, larger than the configured
    /// ceiling, or not a decodable image.
    pub fn normalize(&self, bytes: &[u8]) -> DetectResult<PixelBuffer> {
        if bytes.is_empty() {
            return Err(DetectError::InvalidInput("Empty image payload".to_string()));
        }
        if bytes.len() > self.config.max_file_size_bytes {
            return Err(DetectError::InvalidInput(format!(
                "File size too large: {} bytes (maximum {} bytes)",
                bytes.len(),
                self.config.max_file_size_bytes
            )));
        }

        let decoded = image::load_from_memory(bytes)
            .map_err(|e| DetectError::InvalidInput(format!("Cannot decode image: {}", e)))?;
        let rgb = decoded.to_rgb8();
        debug!(
            width = rgb.width(),
            height = rgb.height(),
            "Image decoded, normalizing"
        );

        let canvas = letterbox(&rgb, self.config.target_width, self.config.target_height);
        let processed = if self.config.denoise_sigma > 0.0 {
            imageproc::filter::gaussian_blur_f32(&canvas, self.config.denoise_sigma)
        } else {
            canvas
        };

        Ok(PixelBuffer::from_rgb(processed))
    }
}

/// Fit `rgb` inside `width × height` and center it on a black canvas
fn letterbox(rgb: &RgbImage, width: u32, height: u32) -> RgbImage {
    let scale = f64::min(
        width as f64 / rgb.width() as f64,
        height as f64 / rgb.height() as f64,
    );
    let new_width = ((rgb.width() as f64 * scale) as u32).clamp(1, width);
    let new_height = ((rgb.height() as f64 * scale) as u32).clamp(1, height);

    let resized = image::imageops::resize(rgb, new_width, new_height, FilterType::Triangle);

    let mut canvas = RgbImage::new(width, height);
    let x_offset = (width - new_width) / 2;
    let y_offset = (height - new_height) / 2;
    image::imageops::overlay(&mut canvas, &resized, x_offset as i64, y_offset as i64);
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb};
    use std::io::Cursor;

    fn png_bytes(image: &RgbImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn normalizer() -> ImageNormalizer {
        ImageNormalizer::new(ImageConfig {
            denoise_sigma: 0.0,
            ..ImageConfig::default()
        })
    }

    #[test]
    fn test_normalize_produces_target_canvas() {
        let source = RgbImage::from_pixel(200, 100, Rgb([255, 255, 255]));
        let buffer = normalizer().normalize(&png_bytes(&source)).unwrap();

        assert_eq!((buffer.width(), buffer.height()), (640, 480));
        // 2:1 source fits the width; top band is letterbox black
        assert_eq!(buffer.rgb().get_pixel(320, 10), &Rgb([0, 0, 0]));
        assert_eq!(buffer.rgb().get_pixel(320, 240), &Rgb([255, 255, 255]));
    }

    #[test]
    fn test_oversized_payload_rejected() {
        let normalizer = ImageNormalizer::new(ImageConfig {
            max_file_size_bytes: 16,
            ..ImageConfig::default()
        });
        let err = normalizer.normalize(&[0u8; 17]).unwrap_err();
        assert!(matches!(err, DetectError::InvalidInput(_)));
    }

    #[test]
    fn test_undecodable_payload_rejected() {
        let err = normalizer().normalize(b"definitely not an image").unwrap_err();
        assert!(matches!(err, DetectError::InvalidInput(_)));

        let err = normalizer().normalize(&[]).unwrap_err();
        assert!(matches!(err, DetectError::InvalidInput(_)));
    }
}
