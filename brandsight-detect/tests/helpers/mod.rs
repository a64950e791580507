//! Test Helper Utilities
//!
//! Shared utilities for testing brandsight-detect

#![allow(dead_code)]

pub mod engines;
pub mod images;

// Re-export commonly used items
pub use engines::{FailingOcr, StubDecoder, StubOcr};
pub use images::{gradient_png, png_upload, upload_with_type};

use brandsight_common::DetectorConfig;
use brandsight_detect::Detector;
use std::sync::Arc;

/// Configuration with a small corpus and forest for quick training
pub fn fast_config() -> DetectorConfig {
    let mut config = DetectorConfig::default();
    config.training.n_estimators = 20;
    config.training.samples_per_alias = 5;
    config.training.samples_per_control_brand = 10;
    config.training.ambiguous_samples = 20;
    config
}

/// Detector over stub engines, not yet initialized
pub fn stub_detector(ocr: Arc<StubOcr>, decoder: Arc<StubDecoder>) -> Detector {
    Detector::with_engines(fast_config(), ocr, decoder).unwrap()
}

/// Detector over stub engines, trained and Ready
pub async fn ready_detector(ocr: Arc<StubOcr>, decoder: Arc<StubDecoder>) -> Detector {
    let detector = stub_detector(ocr, decoder);
    detector.initialize().await.unwrap();
    detector
}
