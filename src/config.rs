//! Tunable parameters for leaf classification and annotation.
//!
//! Everything the analyzer needs is passed in explicitly; there is no global
//! state. A [`LeafDoctorConfig`] can be built in code or loaded from JSON:
//!
//! ```no_run
//! use leaf_doctor::LeafDoctorConfig;
//! use std::path::Path;
//!
//! let config = LeafDoctorConfig::from_json_file(Path::new("leaf.json"))?;
//! config.validate()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Largest 8-bit hue; one unit is two degrees.
pub const HUE_MAX: u8 = 180;

const HUE_LOWER: u8 = 10;
const HUE_UPPER: u8 = 35;
const SATURATION_LOWER: u8 = 100;
const VALUE_LOWER: u8 = 20;
const STRESS_THRESHOLD_PCT: f64 = 15.0;

const ANCHOR: (i32, i32) = (30, 50);
const GLYPH_SCALE: u32 = 3;
pub const MAX_GLYPH_SCALE: u32 = 1024;
const FONT_SIZE_PX: f32 = 32.0;
const COLOR_STRESSED: [u8; 3] = [255, 0, 0];
const COLOR_HEALTHY: [u8; 3] = [0, 255, 0];

/// Errors raised while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} range is inverted: lower {lower} > upper {upper}")]
    InvertedRange { name: &'static str, lower: u8, upper: u8 },

    #[error("hue bound {0} is above 180")]
    HueOutOfRange(u8),

    #[error("threshold must be finite, got {0}")]
    NonFiniteThreshold(f64),

    #[error("glyph scale must be between 1 and 1024, got {0}")]
    GlyphScale(u32),

    #[error("font size must be positive and finite, got {0}")]
    BadFontSize(f32),

    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Inclusive `[lower, upper]` bounds on one 8-bit HSV channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandRange {
    pub lower: u8,
    pub upper: u8,
}

impl BandRange {
    pub const fn new(lower: u8, upper: u8) -> Self {
        Self { lower, upper }
    }

    #[inline]
    pub fn contains(&self, v: u8) -> bool {
        v >= self.lower && v <= self.upper
    }

    fn validate(&self, name: &'static str) -> Result<(), ConfigError> {
        if self.lower > self.upper {
            return Err(ConfigError::InvertedRange {
                name,
                lower: self.lower,
                upper: self.upper,
            });
        }
        Ok(())
    }
}

/// Symptomatic color band and decision threshold.
///
/// Channels use the common 8-bit HSV layout: hue on `[0, 180]` in two-degree
/// steps, saturation and value on `[0, 255]`. The defaults select
/// brown/yellow foliage and ignore near-gray and near-black pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationConfig {
    pub hue_range: BandRange,
    pub saturation_range: BandRange,
    pub value_range: BandRange,
    /// Coverage percentage above which a leaf is classified as stressed.
    pub threshold: f64,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            hue_range: BandRange::new(HUE_LOWER, HUE_UPPER),
            saturation_range: BandRange::new(SATURATION_LOWER, u8::MAX),
            value_range: BandRange::new(VALUE_LOWER, u8::MAX),
            threshold: STRESS_THRESHOLD_PCT,
        }
    }
}

impl ClassificationConfig {
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.hue_range.validate("hue")?;
        if self.hue_range.upper > HUE_MAX {
            return Err(ConfigError::HueOutOfRange(self.hue_range.upper));
        }
        self.saturation_range.validate("saturation")?;
        self.value_range.validate("value")?;
        if !self.threshold.is_finite() {
            return Err(ConfigError::NonFiniteThreshold(self.threshold));
        }
        Ok(())
    }
}

/// How the condition/ratio overlay is drawn onto the annotated copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationStyle {
    /// Left end of the text baseline, in pixels.
    pub anchor: (i32, i32),
    /// Pixels per cell of the built-in bitmap face.
    pub glyph_scale: u32,
    pub stressed_color: [u8; 3],
    pub healthy_color: [u8; 3],
    /// TrueType font to use instead of the built-in face.
    pub font_path: Option<PathBuf>,
    /// Pixel height used with `font_path`.
    pub font_size: f32,
}

impl Default for AnnotationStyle {
    fn default() -> Self {
        Self {
            anchor: ANCHOR,
            glyph_scale: GLYPH_SCALE,
            stressed_color: COLOR_STRESSED,
            healthy_color: COLOR_HEALTHY,
            font_path: None,
            font_size: FONT_SIZE_PX,
        }
    }
}

impl AnnotationStyle {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_GLYPH_SCALE).contains(&self.glyph_scale) {
            return Err(ConfigError::GlyphScale(self.glyph_scale));
        }
        if !self.font_size.is_finite() || self.font_size <= 0.0 {
            return Err(ConfigError::BadFontSize(self.font_size));
        }
        Ok(())
    }
}

/// Complete analyzer configuration, as stored in a JSON file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeafDoctorConfig {
    pub classification: ClassificationConfig,
    pub annotation: AnnotationStyle,
}

impl LeafDoctorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.classification.validate()?;
        self.annotation.validate()
    }

    /// Load configuration from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn to_json_file(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source: std::io::Error| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        let json = serde_json::to_string_pretty(self).map_err(|e| write_err(e.into()))?;
        std::fs::write(path, json).map_err(write_err)
    }
}
