use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const PLACEHOLDER_PLANT_NAME: &str = "Tomato";
pub const PLACEHOLDER_PLANT_AGE: &str = "2 months";

/// Outcome of comparing the coverage ratio against the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    Healthy,
    Stressed,
}

impl Condition {
    /// Strictly greater than: a ratio equal to the threshold is healthy.
    pub fn classify(coverage_ratio: f64, threshold: f64) -> Self {
        if coverage_ratio > threshold {
            Condition::Stressed
        } else {
            Condition::Healthy
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Condition::Healthy => "Healthy Leaf",
            Condition::Stressed => "Leaf is diseased",
        }
    }

    pub fn cause(self) -> &'static str {
        match self {
            Condition::Healthy => "No issues",
            Condition::Stressed => "Possible heat stress or lack of water",
        }
    }

    pub fn treatment(self) -> &'static str {
        match self {
            Condition::Healthy => "Normal care",
            Condition::Stressed => "Provide water, shade, and check pesticides",
        }
    }

    pub fn recovery_likelihood(self) -> &'static str {
        match self {
            Condition::Healthy => "95%",
            Condition::Stressed => "70%",
        }
    }
}

/// Plant identity attached to a diagnosis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlantProfile {
    pub name: String,
    pub age: String,
}

/// Supplies the plant name and age for a diagnosis.
///
/// Nothing here estimates species or age from pixels; implementors receive the
/// decoded image so a real estimator can be slotted in later.
pub trait PlantIdentifier: Send + Sync {
    fn identify(&self, image: &RgbImage) -> PlantProfile;
}

/// Returns the same placeholder profile for every image.
#[derive(Debug, Clone, Default)]
pub struct FixedPlantIdentifier;

impl PlantIdentifier for FixedPlantIdentifier {
    fn identify(&self, _image: &RgbImage) -> PlantProfile {
        PlantProfile {
            name: PLACEHOLDER_PLANT_NAME.to_string(),
            age: PLACEHOLDER_PLANT_AGE.to_string(),
        }
    }
}

/// Structured result of one analysis call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisRecord {
    pub plant_name: String,
    pub plant_age: String,
    pub condition: Condition,
    pub disease: String,
    pub cause: String,
    pub treatment: String,
    /// Percentage of pixels inside the symptomatic band, on `[0, 100]`.
    pub coverage_ratio: f64,
    pub recovery_likelihood: String,
    pub user_note: Option<String>,
    pub annotated_image_path: Option<PathBuf>,
}

impl DiagnosisRecord {
    pub fn new(profile: PlantProfile, coverage_ratio: f64, threshold: f64) -> Self {
        let condition = Condition::classify(coverage_ratio, threshold);
        Self {
            plant_name: profile.name,
            plant_age: profile.age,
            condition,
            disease: condition.label().to_string(),
            cause: condition.cause().to_string(),
            treatment: condition.treatment().to_string(),
            coverage_ratio,
            recovery_likelihood: condition.recovery_likelihood().to_string(),
            user_note: None,
            annotated_image_path: None,
        }
    }

    pub fn with_note(mut self, note: Option<&str>) -> Self {
        self.user_note = note.map(str::to_owned);
        self
    }

    /// Text drawn onto the annotated image, e.g. `Healthy Leaf (3.2%)`.
    pub fn overlay_text(&self) -> String {
        format!("{} ({:.1}%)", self.disease, self.coverage_ratio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> PlantProfile {
        FixedPlantIdentifier.identify(&RgbImage::new(1, 1))
    }

    #[test]
    fn equal_to_threshold_is_healthy() {
        assert_eq!(Condition::classify(15.0, 15.0), Condition::Healthy);
        assert_eq!(Condition::classify(15.000001, 15.0), Condition::Stressed);
    }

    #[test]
    fn text_fields_follow_condition() {
        let stressed = DiagnosisRecord::new(profile(), 42.0, 15.0);
        assert_eq!(stressed.condition, Condition::Stressed);
        assert_eq!(stressed.cause, "Possible heat stress or lack of water");
        assert_eq!(stressed.treatment, "Provide water, shade, and check pesticides");
        assert_eq!(stressed.recovery_likelihood, "70%");

        let healthy = DiagnosisRecord::new(profile(), 2.5, 15.0);
        assert_eq!(healthy.condition, Condition::Healthy);
        assert_eq!(healthy.cause, "No issues");
        assert_eq!(healthy.treatment, "Normal care");
        assert_eq!(healthy.recovery_likelihood, "95%");
    }

    #[test]
    fn overlay_text_uses_one_decimal() {
        let record = DiagnosisRecord::new(profile(), 20.04, 15.0);
        assert_eq!(record.overlay_text(), "Leaf is diseased (20.0%)");
    }

    #[test]
    fn placeholder_profile() {
        let p = profile();
        assert_eq!(p.name, "Tomato");
        assert_eq!(p.age, "2 months");
    }
}
