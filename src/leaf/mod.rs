pub mod analyzer;
pub use analyzer::{AnalysisError, LeafAnalysis, LeafAnalyzer, analyze};
pub mod glyphs;
pub mod hsv;
pub use hsv::{ColorMask, HsvPixel};
pub mod overlay;
pub use overlay::{FontError, OverlayFace};
