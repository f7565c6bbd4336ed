use image::{Rgb, RgbImage};
use std::path::Path;

pub const LEAF_GREEN: Rgb<u8> = Rgb([0, 255, 0]);
pub const LEAF_BROWN: Rgb<u8> = Rgb([200, 150, 50]);

/// Uniform image of one color.
pub fn solid_image(width: u32, height: u32, color: Rgb<u8>) -> RgbImage {
    RgbImage::from_pixel(width, height, color)
}

/// The first `band_rows` rows are `band`, the rest `base`.
pub fn banded_image(width: u32, height: u32, band_rows: u32, band: Rgb<u8>, base: Rgb<u8>) -> RgbImage {
    RgbImage::from_fn(width, height, |_, y| if y < band_rows { band } else { base })
}

/// Generates a sample leaf photo for trying the analyzer.
///
/// A 320x240 image with:
/// - Dark soil background
/// - Green elliptical leaf
/// - Brown blotch on the right half of the leaf
pub fn generate_leaf_sample(path: &Path) -> Result<(), image::ImageError> {
    let width = 320;
    let height = 240;

    let soil = Rgb([40, 30, 25]);
    let (cx, cy) = (width as f32 / 2.0, height as f32 / 2.0);
    let (rx, ry) = (130.0f32, 80.0f32);
    let (bx, by, br) = (cx + 50.0, cy - 10.0, 38.0f32);

    let img = RgbImage::from_fn(width, height, |x, y| {
        let dx = x as f32 - cx;
        let dy = y as f32 - cy;
        if (dx / rx).powi(2) + (dy / ry).powi(2) > 1.0 {
            return soil;
        }
        let (ddx, ddy) = (x as f32 - bx, y as f32 - by);
        if ddx * ddx + ddy * ddy <= br * br {
            LEAF_BROWN
        } else {
            Rgb([40, 150, 50])
        }
    });

    img.save(path)
}
