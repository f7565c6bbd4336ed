//! Classifies a leaf photo by how much of it is brown/yellow, and annotates a copy.

use image::{DynamicImage, ImageError, ImageFormat, Rgb, RgbImage};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use crate::config::{AnnotationStyle, ClassificationConfig, ConfigError, LeafDoctorConfig};
use crate::diagnosis::{Condition, DiagnosisRecord, FixedPlantIdentifier, PlantIdentifier};

use super::hsv::ColorMask;
use super::overlay::{self, FontError, OverlayFace};

const RESULT_PREFIX: &str = "result_";

/// Errors that end an analysis call. No partial result accompanies any of them.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("could not decode image: {0}")]
    Decode(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not write annotated image {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: ImageError,
    },

    #[error("overlay font: {0}")]
    Font(#[from] FontError),
}

/// Diagnosis plus the annotated copy of the input.
#[derive(Debug, Clone)]
pub struct LeafAnalysis {
    pub record: DiagnosisRecord,
    pub annotated: RgbImage,
}

/// Reusable analyzer holding validated settings.
///
/// Immutable after construction, so one instance can serve concurrent calls;
/// every call works on its own buffers.
pub struct LeafAnalyzer {
    classification: ClassificationConfig,
    annotation: AnnotationStyle,
    face: OverlayFace,
    identifier: Box<dyn PlantIdentifier>,
}

impl std::fmt::Debug for LeafAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeafAnalyzer")
            .field("classification", &self.classification)
            .field("annotation", &self.annotation)
            .field("face", &self.face)
            .finish_non_exhaustive()
    }
}

impl Default for LeafAnalyzer {
    fn default() -> Self {
        let annotation = AnnotationStyle::default();
        Self {
            classification: ClassificationConfig::default(),
            face: OverlayFace::Bitmap {
                scale: annotation.glyph_scale,
            },
            annotation,
            identifier: Box::new(FixedPlantIdentifier),
        }
    }
}

impl LeafAnalyzer {
    /// Validates `config` and loads the overlay font if one is configured.
    pub fn new(config: LeafDoctorConfig) -> Result<Self, AnalysisError> {
        config.validate()?;
        let LeafDoctorConfig {
            classification,
            annotation,
        } = config;
        let face = match &annotation.font_path {
            Some(path) => OverlayFace::load_truetype(path, annotation.font_size)?,
            None => OverlayFace::Bitmap {
                scale: annotation.glyph_scale,
            },
        };
        Ok(Self {
            classification,
            annotation,
            face,
            identifier: Box::new(FixedPlantIdentifier),
        })
    }

    pub fn with_identifier(mut self, identifier: impl PlantIdentifier + 'static) -> Self {
        self.identifier = Box::new(identifier);
        self
    }

    pub fn classification(&self) -> &ClassificationConfig {
        &self.classification
    }

    /// Analyzes a decoded image. The input is only read.
    pub fn analyze(&self, source: &DynamicImage, note: Option<&str>) -> Result<LeafAnalysis, AnalysisError> {
        let rgb = to_color_raster(source)?;
        let mask = ColorMask::build(&rgb, &self.classification);
        let ratio = mask.coverage_ratio();

        let profile = self.identifier.identify(&rgb);
        let record = DiagnosisRecord::new(profile, ratio, self.classification.threshold).with_note(note);
        let (width, height) = mask.dimensions();
        log::debug!(
            "{width}x{height}: {} of {} pixels symptomatic ({ratio:.3}%), {:?}",
            mask.count(),
            mask.len(),
            record.condition
        );

        let mut annotated = rgb;
        let color = Rgb(match record.condition {
            Condition::Stressed => self.annotation.stressed_color,
            Condition::Healthy => self.annotation.healthy_color,
        });
        overlay::draw_label(
            &mut annotated,
            &self.face,
            self.annotation.anchor,
            color,
            &record.overlay_text(),
        );

        Ok(LeafAnalysis { record, annotated })
    }

    /// Decodes an encoded image (PNG, JPEG, ...) from memory and analyzes it.
    pub fn analyze_bytes(&self, bytes: &[u8], note: Option<&str>) -> Result<LeafAnalysis, AnalysisError> {
        let image = image::load_from_memory(bytes).map_err(|e| AnalysisError::Decode(e.to_string()))?;
        self.analyze(&image, note)
    }

    /// Reads `input`, analyzes it, and writes the annotated copy to
    /// `output_dir/result_<file name>`. The record carries that path.
    pub fn analyze_path(
        &self,
        input: &Path,
        output_dir: &Path,
        note: Option<&str>,
    ) -> Result<LeafAnalysis, AnalysisError> {
        let image = open_image(input)?;
        let mut analysis = self.analyze(&image, note)?;

        let out_path = result_path(input, output_dir)?;
        std::fs::create_dir_all(output_dir).map_err(|source| AnalysisError::Io {
            path: output_dir.to_path_buf(),
            source,
        })?;
        write_atomically(&analysis.annotated, &out_path)?;
        log::info!(
            "{} -> {} ({}, {:.1}%)",
            input.display(),
            out_path.display(),
            analysis.record.disease,
            analysis.record.coverage_ratio
        );

        analysis.record.annotated_image_path = Some(out_path);
        Ok(analysis)
    }
}

/// One-shot analysis with default annotation and the placeholder plant profile.
pub fn analyze(source: &DynamicImage, config: &ClassificationConfig) -> Result<LeafAnalysis, AnalysisError> {
    let analyzer = LeafAnalyzer::new(LeafDoctorConfig {
        classification: config.clone(),
        annotation: AnnotationStyle::default(),
    })?;
    analyzer.analyze(source, None)
}

/// Output location for the annotated copy of `input`.
pub fn result_path(input: &Path, output_dir: &Path) -> Result<PathBuf, AnalysisError> {
    let name = input.file_name().and_then(OsStr::to_str).ok_or_else(|| AnalysisError::Io {
        path: input.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "input has no usable file name"),
    })?;
    Ok(output_dir.join(format!("{RESULT_PREFIX}{name}")))
}

/// Encodes into a hidden sibling file and renames it over `out_path`, so a
/// failed write never leaves a truncated result behind.
fn write_atomically(image: &RgbImage, out_path: &Path) -> Result<(), AnalysisError> {
    let encode_err = |source| AnalysisError::Encode {
        path: out_path.to_path_buf(),
        source,
    };
    let format = ImageFormat::from_path(out_path).map_err(encode_err)?;

    let name = out_path.file_name().and_then(OsStr::to_str).unwrap_or("result");
    let partial = out_path.with_file_name(format!(".{name}.partial"));
    if let Err(source) = image.save_with_format(&partial, format) {
        let _ = std::fs::remove_file(&partial);
        return Err(encode_err(source));
    }
    std::fs::rename(&partial, out_path).map_err(|source| {
        let _ = std::fs::remove_file(&partial);
        AnalysisError::Io {
            path: out_path.to_path_buf(),
            source,
        }
    })
}

fn open_image(path: &Path) -> Result<DynamicImage, AnalysisError> {
    let reader = image::ImageReader::open(path).map_err(|source| AnalysisError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = reader.with_guessed_format().map_err(|source| AnalysisError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    reader
        .decode()
        .map_err(|e| AnalysisError::Decode(format!("{}: {e}", path.display())))
}

fn to_color_raster(source: &DynamicImage) -> Result<RgbImage, AnalysisError> {
    if source.width() == 0 || source.height() == 0 {
        return Err(AnalysisError::Decode(format!(
            "image is empty ({}x{})",
            source.width(),
            source.height()
        )));
    }
    Ok(source.to_rgb8())
}
