//! Data models for brandsight-detect
//!
//! Values surfaced to callers: predictions, batch reports, model metadata.

pub mod batch;
pub mod model_info;
pub mod prediction;

pub use batch::{BatchItem, BatchReport, ImageUpload};
pub use model_info::{DetectorStatus, ModelInfo};
pub use prediction::{BrandInfo, DetectedFeatures, PredictionResult};
