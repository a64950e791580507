//! Core types and trait definitions for brandsight-detect
//!
//! Defines the seams of the two-stage extraction pipeline:
//! - **Collaborators:** `TextRecognizer` (OCR engine), `BarcodeDecoder`
//! - **Signals:** `SignalExtractor` producing an `EvidenceFragment`
//! - **Outcomes:** `ExtractorOutcome`, either the fragment or the documented
//!   default fragment plus the degradation reason

use crate::imaging::PixelBuffer;
use brandsight_common::{EvidenceVector, Feature};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ============================================================================
// Collaborator contracts
// ============================================================================

/// Axis-aligned box in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// One OCR detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextDetection {
    pub bbox: BoundingBox,
    pub text: String,
    /// Engine confidence (0.0-1.0)
    pub confidence: f64,
}

impl TextDetection {
    pub fn new(text: impl Into<String>, confidence: f64) -> Self {
        Self {
            bbox: BoundingBox::default(),
            text: text.into(),
            confidence,
        }
    }
}

/// One decoded barcode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedBarcode {
    pub payload: String,
}

/// OCR engine contract
///
/// Each call returns a finite list of detections for the given buffer.
pub trait TextRecognizer: Send + Sync {
    fn detect_text(&self, image: &PixelBuffer) -> Result<Vec<TextDetection>, ExtractionError>;
}

/// Barcode decoder contract
///
/// An image without barcodes yields an empty list, not an error.
pub trait BarcodeDecoder: Send + Sync {
    fn decode(&self, image: &PixelBuffer) -> Result<Vec<DecodedBarcode>, ExtractionError>;
}

// ============================================================================
// Signals
// ============================================================================

/// Identity of a signal extractor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalSource {
    Barcode,
    Text,
    BrandMatch,
    Visual,
}

impl SignalSource {
    pub const ALL: [SignalSource; 4] = [
        SignalSource::Barcode,
        SignalSource::Text,
        SignalSource::BrandMatch,
        SignalSource::Visual,
    ];

    /// Features this signal is the authoritative producer of
    pub fn owned_features(self) -> &'static [Feature] {
        match self {
            SignalSource::Barcode => &[Feature::Barcode729],
            SignalSource::Text => &[
                Feature::MadeInIsraelText,
                Feature::HebrewText,
                Feature::KosherCertification,
                Feature::TextConfidence,
            ],
            SignalSource::BrandMatch => &[Feature::IsraeliBrand, Feature::BrandConfidence],
            SignalSource::Visual => &[
                Feature::LogoConfidence,
                Feature::PackageAnalysis,
                Feature::ColorAnalysis,
            ],
        }
    }

    /// Owning signal of a feature
    pub fn owner_of(feature: Feature) -> SignalSource {
        SignalSource::ALL
            .into_iter()
            .find(|s| s.owned_features().contains(&feature))
            .unwrap_or(SignalSource::Visual)
    }

    pub fn name(self) -> &'static str {
        match self {
            SignalSource::Barcode => "barcode",
            SignalSource::Text => "text",
            SignalSource::BrandMatch => "brand_match",
            SignalSource::Visual => "visual",
        }
    }
}

impl fmt::Display for SignalSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Barcode side observation (not part of the evidence schema)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BarcodeObservation {
    /// Any barcode (decoded or OCR digit run) was found
    pub detected: bool,
    /// Payload that carried the country prefix, if any
    pub payload: Option<String>,
    /// Decode confidence (0.0-1.0)
    pub confidence: f64,
}

/// Partial evidence produced by one extractor
#[derive(Debug, Clone, PartialEq)]
pub struct EvidenceFragment {
    pub source: SignalSource,
    /// Fields produced by this extractor
    pub evidence: EvidenceVector,
    /// Fragment-level confidence, used to arbitrate shared fields
    pub confidence: f64,
    /// Lower-cased OCR text blob (text signal)
    pub text_blob: Option<String>,
    /// Matched brand alias (brand-match signal)
    pub detected_brand: Option<String>,
    /// Barcode observation (barcode signal)
    pub barcode: Option<BarcodeObservation>,
}

impl EvidenceFragment {
    /// Empty fragment for a source
    pub fn new(source: SignalSource) -> Self {
        Self {
            source,
            evidence: EvidenceVector::new(),
            confidence: 0.0,
            text_blob: None,
            detected_brand: None,
            barcode: None,
        }
    }

    /// Documented default: every owned field false / 0.0
    pub fn default_for(source: SignalSource) -> Self {
        let mut fragment = Self::new(source);
        for feature in source.owned_features() {
            if feature.is_flag() {
                fragment.evidence.set(*feature, false);
            } else {
                fragment.evidence.set(*feature, 0.0);
            }
        }
        fragment
    }

    pub fn with_flag(mut self, feature: Feature, value: bool) -> Self {
        self.evidence.set(feature, value);
        self
    }

    pub fn with_score(mut self, feature: Feature, value: f64) -> Self {
        self.evidence.set(feature, value.clamp(0.0, 1.0));
        self
    }
}

/// Input handed to a signal extractor
#[derive(Debug, Clone, Copy)]
pub struct SignalInput<'a> {
    pub image: &'a PixelBuffer,
    /// Text blob recovered by the text signal (stage 2 only)
    pub text: Option<&'a str>,
}

/// Signal extractor trait
///
/// Extractors are synchronous and CPU-bound; the pipeline runs them on the
/// blocking pool. Returning `Err` is always recoverable: the pipeline
/// substitutes `EvidenceFragment::default_for(self.source())`.
pub trait SignalExtractor: Send + Sync {
    fn source(&self) -> SignalSource;

    fn extract(&self, input: &SignalInput<'_>) -> Result<EvidenceFragment, ExtractionError>;
}

/// Extractor-local failure
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// I/O error (temporary files, subprocess pipes)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// External engine (OCR binary, decoder) failed
    #[error("Engine error: {0}")]
    Engine(String),

    /// Engine output could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// Image processing failed
    #[error("Image error: {0}")]
    Image(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result of running one extractor through the pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractorOutcome {
    Extracted(EvidenceFragment),
    Degraded {
        fragment: EvidenceFragment,
        reason: String,
    },
}

impl ExtractorOutcome {
    /// Degraded outcome carrying the documented default fragment
    pub fn degraded(source: SignalSource, reason: impl Into<String>) -> Self {
        ExtractorOutcome::Degraded {
            fragment: EvidenceFragment::default_for(source),
            reason: reason.into(),
        }
    }

    pub fn fragment(&self) -> &EvidenceFragment {
        match self {
            ExtractorOutcome::Extracted(fragment) => fragment,
            ExtractorOutcome::Degraded { fragment, .. } => fragment,
        }
    }

    pub fn into_fragment(self) -> EvidenceFragment {
        match self {
            ExtractorOutcome::Extracted(fragment) => fragment,
            ExtractorOutcome::Degraded { fragment, .. } => fragment,
        }
    }

    pub fn source(&self) -> SignalSource {
        self.fragment().source
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, ExtractorOutcome::Degraded { .. })
    }
}
