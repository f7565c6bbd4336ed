pub mod config;
pub mod diagnosis;
pub mod leaf;
pub mod synthetic;

pub use config::{AnnotationStyle, BandRange, ClassificationConfig, ConfigError, LeafDoctorConfig};
pub use diagnosis::{Condition, DiagnosisRecord, FixedPlantIdentifier, PlantIdentifier, PlantProfile};
pub use leaf::{AnalysisError, FontError, LeafAnalysis, LeafAnalyzer, analyze};
