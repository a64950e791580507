//! Synthetic image uploads

use brandsight_detect::ImageUpload;
use image::{ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

/// PNG bytes of a colorful gradient
pub fn gradient_png(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x * y) % 256) as u8])
    });
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

/// Valid PNG upload
pub fn png_upload(filename: &str) -> ImageUpload {
    upload_with_type(filename, Some("image/png"), gradient_png(160, 120))
}

pub fn upload_with_type(filename: &str, content_type: Option<&str>, bytes: Vec<u8>) -> ImageUpload {
    ImageUpload::new(filename, content_type.map(str::to_string), bytes)
}
