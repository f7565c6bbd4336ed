//! RGB to 8-bit HSV conversion and the symptomatic color mask.
//!
//! Channels are quantized the way common 8-bit vision pipelines do it: hue on
//! `[0, 180)` (two degrees per step), saturation and value on `[0, 255]`. The
//! arithmetic is fixed-point with 12 fractional bits, so band edges compare
//! exactly and every platform gets the same mask.

use image::{Rgb, RgbImage};

use crate::config::{ClassificationConfig, HUE_MAX};

const SHIFT: u32 = 12;
const HALF: i32 = 1 << (SHIFT - 1);

/// `round((255 << 12) / v)`; never lands on a .5 tie for `v` in `1..=255`.
#[inline]
fn saturation_scale(v: i32) -> i32 {
    if v == 0 {
        return 0;
    }
    let num = 255 << SHIFT;
    (2 * num + v) / (2 * v)
}

/// `round((180 << 12) / (6 * diff))`; also tie-free on `1..=255`.
#[inline]
fn hue_scale(diff: i32) -> i32 {
    if diff == 0 {
        return 0;
    }
    let num = (HUE_MAX as i32) << SHIFT;
    (2 * num + 6 * diff) / (12 * diff)
}

/// One pixel in 8-bit HSV.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HsvPixel {
    pub hue: u8,
    pub saturation: u8,
    pub value: u8,
}

impl HsvPixel {
    pub fn from_rgb(px: Rgb<u8>) -> Self {
        let [r, g, b] = px.0.map(i32::from);
        let v = r.max(g).max(b);
        let diff = v - r.min(g).min(b);

        let s = (diff * saturation_scale(v) + HALF) >> SHIFT;

        let h = if v == r {
            g - b
        } else if v == g {
            b - r + 2 * diff
        } else {
            r - g + 4 * diff
        };
        let mut h = (h * hue_scale(diff) + HALF) >> SHIFT;
        if h < 0 {
            h += HUE_MAX as i32;
        }

        Self {
            hue: h as u8,
            saturation: s as u8,
            value: v as u8,
        }
    }

    /// Hue in degrees, for display.
    pub fn hue_degrees(&self) -> f32 {
        f32::from(self.hue) * 2.0
    }

    pub fn is_symptomatic(&self, config: &ClassificationConfig) -> bool {
        config.hue_range.contains(self.hue)
            && config.saturation_range.contains(self.saturation)
            && config.value_range.contains(self.value)
    }
}

/// Per-pixel flags marking symptomatic coloration, row-major.
#[derive(Debug, Clone)]
pub struct ColorMask {
    width: u32,
    height: u32,
    bits: Vec<bool>,
}

impl ColorMask {
    pub fn build(image: &RgbImage, config: &ClassificationConfig) -> Self {
        let bits = image
            .pixels()
            .map(|&px| HsvPixel::from_rgb(px).is_symptomatic(config))
            .collect();
        Self {
            width: image.width(),
            height: image.height(),
            bits,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn count(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Percentage of flagged pixels. Multiplies before dividing so whole
    /// percentages come out exact.
    pub fn coverage_ratio(&self) -> f64 {
        if self.bits.is_empty() {
            return 0.0;
        }
        (self.count() as f64 * 100.0) / self.bits.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hsv(r: u8, g: u8, b: u8) -> (u8, u8, u8) {
        let p = HsvPixel::from_rgb(Rgb([r, g, b]));
        (p.hue, p.saturation, p.value)
    }

    #[test]
    fn converts_primaries() {
        assert_eq!(hsv(255, 0, 0), (0, 255, 255));
        assert_eq!(hsv(0, 255, 0), (60, 255, 255));
        assert_eq!(hsv(0, 0, 255), (120, 255, 255));
        assert_eq!(hsv(255, 255, 255), (0, 0, 255));
        assert_eq!(hsv(0, 0, 0), (0, 0, 0));
    }

    #[test]
    fn negative_hue_wraps() {
        // Magenta-red, just short of 360 degrees.
        assert_eq!(hsv(255, 0, 10).0, 179);
    }

    #[test]
    fn brown_is_in_default_band() {
        let brown = HsvPixel::from_rgb(Rgb([200, 150, 50]));
        assert_eq!((brown.hue, brown.saturation, brown.value), (20, 191, 200));
        assert_eq!(brown.hue_degrees(), 40.0);
        assert!(brown.is_symptomatic(&ClassificationConfig::default()));
    }

    #[test]
    fn swapped_channels_leave_the_band() {
        // Same bytes read as BGR would land around 200 degrees.
        let swapped = HsvPixel::from_rgb(Rgb([50, 150, 200]));
        assert_eq!(swapped.hue, 100);
        assert!(!swapped.is_symptomatic(&ClassificationConfig::default()));
    }

    #[test]
    fn quantizes_band_edges() {
        assert_eq!(hsv(255, 81, 0).0, 10);
        assert_eq!(hsv(255, 80, 0).0, 9);
        assert_eq!(hsv(209, 255, 0).0, 35);
        assert_eq!(hsv(208, 255, 0).0, 36);
        assert_eq!(hsv(255, 200, 155).1, 100);
        assert_eq!(hsv(255, 201, 156).1, 99);
    }

    #[test]
    fn gray_and_black_are_filtered() {
        let config = ClassificationConfig::default();
        assert!(!HsvPixel::from_rgb(Rgb([128, 128, 128])).is_symptomatic(&config));
        assert!(!HsvPixel::from_rgb(Rgb([10, 8, 2])).is_symptomatic(&config));
    }

    #[test]
    fn mask_counts_flagged_pixels() {
        let mut img = RgbImage::from_pixel(4, 5, Rgb([0, 255, 0]));
        img.put_pixel(1, 2, Rgb([200, 150, 50]));
        let mask = ColorMask::build(&img, &ClassificationConfig::default());
        assert_eq!(mask.dimensions(), (4, 5));
        assert_eq!(mask.len(), 20);
        assert_eq!(mask.count(), 1);
        assert_eq!(mask.coverage_ratio(), 5.0);
    }
}
