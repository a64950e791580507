//! Batch request and report types

use super::{BrandInfo, DetectedFeatures, PredictionResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One uploaded image with its declared metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub filename: String,
    /// Declared MIME type (`image/*` required)
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(
        filename: impl Into<String>,
        content_type: Option<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type,
            bytes: bytes.into(),
        }
    }

    pub fn is_image(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("image/"))
    }
}

/// Per-item batch entry: either a prediction or that item's error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItem {
    pub index: usize,
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_affiliated: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detected_features: Option<DetectedFeatures>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand_info: Option<BrandInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchItem {
    pub fn success(index: usize, filename: impl Into<String>, result: PredictionResult) -> Self {
        Self {
            index,
            filename: filename.into(),
            is_affiliated: Some(result.is_affiliated),
            confidence: Some(result.confidence),
            detected_features: Some(result.detected_features),
            brand_info: result.brand_info,
            error: None,
        }
    }

    pub fn failure(index: usize, filename: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            index,
            filename: filename.into(),
            is_affiliated: None,
            confidence: None,
            detected_features: None,
            brand_info: None,
            error: Some(error.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Whole-batch report, items in request order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub results: Vec<BatchItem>,
    pub total_processed: usize,
    pub timestamp: DateTime<Utc>,
}

impl BatchReport {
    pub fn new(results: Vec<BatchItem>) -> Self {
        Self {
            total_processed: results.len(),
            results,
            timestamp: Utc::now(),
        }
    }
}
