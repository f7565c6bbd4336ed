//! Draws the condition/ratio text onto the annotated copy.
//!
//! Only pixels covered by a glyph are written; everything else in the canvas
//! is left byte-for-byte as it came in.

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use rusttype::{Font, Scale, point};
use std::path::Path;

use super::glyphs::{self, GLYPH_ADVANCE, GLYPH_HEIGHT};

/// Typeface used for the overlay.
#[derive(Clone)]
pub enum OverlayFace {
    /// Built-in 5x7 face, each cell drawn as a `scale` x `scale` square.
    Bitmap { scale: u32 },
    /// TrueType font rasterised at `size` pixels.
    TrueType { font: Font<'static>, size: f32 },
}

impl std::fmt::Debug for OverlayFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverlayFace::Bitmap { scale } => f.debug_struct("Bitmap").field("scale", scale).finish(),
            OverlayFace::TrueType { size, .. } => f.debug_struct("TrueType").field("size", size).finish(),
        }
    }
}

/// A font file that could not be used.
#[derive(Debug, thiserror::Error)]
pub enum FontError {
    #[error("failed to read font {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} is not a usable TrueType font")]
    Invalid(String),
}

impl OverlayFace {
    pub fn load_truetype(path: &Path, size: f32) -> Result<Self, FontError> {
        let bytes = std::fs::read(path).map_err(|source| FontError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let font = Font::try_from_vec(bytes).ok_or_else(|| FontError::Invalid(path.display().to_string()))?;
        Ok(OverlayFace::TrueType { font, size })
    }
}

/// Writes `text` with its baseline starting at `anchor`.
pub fn draw_label(canvas: &mut RgbImage, face: &OverlayFace, anchor: (i32, i32), color: Rgb<u8>, text: &str) {
    match face {
        OverlayFace::Bitmap { scale } => draw_bitmap_text(canvas, *scale, anchor, color, text),
        OverlayFace::TrueType { font, size } => draw_truetype_text(canvas, font, *size, anchor, color, text),
    }
}

fn draw_bitmap_text(canvas: &mut RgbImage, scale: u32, anchor: (i32, i32), color: Rgb<u8>, text: &str) {
    let cell = i32::try_from(scale).unwrap_or(i32::MAX);
    let top = anchor.1.saturating_sub((GLYPH_HEIGHT as i32).saturating_mul(cell));
    let advance = (GLYPH_ADVANCE as i32).saturating_mul(cell);
    let right_edge = i32::try_from(canvas.width()).unwrap_or(i32::MAX);

    let mut origin_x = anchor.0;
    for c in text.chars() {
        if origin_x >= right_edge {
            break;
        }
        for (col, row) in glyphs::cells(glyphs::glyph(c)) {
            let x = origin_x.saturating_add((col as i32).saturating_mul(cell));
            let y = top.saturating_add((row as i32).saturating_mul(cell));
            draw_filled_rect_mut(canvas, Rect::at(x, y).of_size(scale, scale), color);
        }
        origin_x = origin_x.saturating_add(advance);
    }
}

fn draw_truetype_text(canvas: &mut RgbImage, font: &Font<'static>, size: f32, anchor: (i32, i32), color: Rgb<u8>, text: &str) {
    let (width, height) = (canvas.width() as i32, canvas.height() as i32);
    let start = point(anchor.0 as f32, anchor.1 as f32);

    for glyph in font.layout(text, Scale::uniform(size), start) {
        let Some(bb) = glyph.pixel_bounding_box() else {
            continue;
        };
        glyph.draw(|gx, gy, coverage| {
            let x = bb.min.x + gx as i32;
            let y = bb.min.y + gy as i32;
            if coverage <= 0.0 || x < 0 || y < 0 || x >= width || y >= height {
                return;
            }
            let px = canvas.get_pixel_mut(x as u32, y as u32);
            let a = coverage.min(1.0);
            for ch in 0..3 {
                let blended = px[ch] as f32 * (1.0 - a) + color[ch] as f32 * a;
                px[ch] = blended.round().clamp(0.0, 255.0) as u8;
            }
        });
    }
}
