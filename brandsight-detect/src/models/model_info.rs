//! Detector lifecycle status and model description

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Detector lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorStatus {
    Uninitialized,
    Initializing,
    Ready,
    Failed,
}

impl fmt::Display for DetectorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectorStatus::Uninitialized => write!(f, "uninitialized"),
            DetectorStatus::Initializing => write!(f, "initializing"),
            DetectorStatus::Ready => write!(f, "ready"),
            DetectorStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Model description; model fields are only present when Ready
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub status: DetectorStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n_estimators: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
    pub brand_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub holdout_accuracy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trained_at: Option<DateTime<Utc>>,
}

impl ModelInfo {
    /// Description of a detector without a model
    pub fn unavailable(status: DetectorStatus, brand_count: usize) -> Self {
        Self {
            status,
            model_type: None,
            n_estimators: None,
            max_depth: None,
            feature_count: None,
            feature_names: None,
            brand_count,
            holdout_accuracy: None,
            trained_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_serializes_status_and_brand_count_only() {
        let info = ModelInfo::unavailable(DetectorStatus::Initializing, 10);
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"status": "initializing", "brand_count": 10})
        );
    }
}
