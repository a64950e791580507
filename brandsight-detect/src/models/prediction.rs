//! Prediction results
//!
//! Immutable, serializable values handed to the transport layer.

use brandsight_common::{BrandRecord, EvidenceVector, Feature, RiskLevel};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The five discrete evidence fields, echoed back to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DetectedFeatures {
    pub barcode_729: bool,
    pub made_in_israel_text: bool,
    pub hebrew_text: bool,
    pub israeli_brand: bool,
    pub kosher_certification: bool,
}

impl DetectedFeatures {
    pub fn from_evidence(evidence: &EvidenceVector) -> Self {
        Self {
            barcode_729: evidence.flag(Feature::Barcode729),
            made_in_israel_text: evidence.flag(Feature::MadeInIsraelText),
            hebrew_text: evidence.flag(Feature::HebrewText),
            israeli_brand: evidence.flag(Feature::IsraeliBrand),
            kosher_certification: evidence.flag(Feature::KosherCertification),
        }
    }
}

/// Catalog enrichment for a detected brand alias
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandInfo {
    /// Alias as detected
    pub name: String,
    /// Owning brand key
    pub brand: String,
    pub category: String,
    pub risk_level: RiskLevel,
}

impl BrandInfo {
    pub fn new(alias: &str, record: &BrandRecord) -> Self {
        Self {
            name: alias.to_string(),
            brand: record.key().to_string(),
            category: record.category().to_string(),
            risk_level: record.risk_level(),
        }
    }
}

/// Outcome of one prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub is_affiliated: bool,
    /// Max class probability (0.0-1.0)
    pub confidence: f64,
    pub detected_features: DetectedFeatures,
    pub brand_info: Option<BrandInfo>,
    /// Wall-clock time of the scoring call
    pub processing_time_ms: f64,
    pub timestamp: DateTime<Utc>,
}
