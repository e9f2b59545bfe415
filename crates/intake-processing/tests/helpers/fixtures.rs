//! Test fixtures: encoded images.

use std::io::Cursor;

use image::{ImageFormat, Rgb, RgbImage};

/// Solid-colour PNG of the given dimensions
pub fn create_test_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([30, 120, 200]));
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .expect("Failed to encode PNG fixture");
    buffer
}
