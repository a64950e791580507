//! Evidence schema
//!
//! Defines the fixed set of named evidence fields produced by the signal
//! extractors and consumed by the classifier.
//!
//! # Architecture
//! - `Feature` is the statically declared schema; `Feature::ALL` is the
//!   canonical order
//! - `EvidenceVector` holds at most one value per feature; flags coerce to
//!   {0.0, 1.0} and absent fields read as 0.0 when vectorized
//! - Vectorization always goes through an explicit `&[Feature]` order, so a
//!   model's frozen order is never confused with insertion order

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Named evidence field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Feature {
    /// Barcode with the 729 country prefix
    #[serde(rename = "barcode_729")]
    Barcode729,
    /// "Made in ..." phrase family matched in OCR text
    #[serde(rename = "made_in_israel_text")]
    MadeInIsraelText,
    /// Region-script characters present in OCR text
    #[serde(rename = "hebrew_text")]
    HebrewText,
    /// Known affiliated brand alias found in OCR text
    #[serde(rename = "israeli_brand")]
    IsraeliBrand,
    /// Certification marking (textual or symbolic)
    #[serde(rename = "kosher_certification")]
    KosherCertification,
    /// Confidence of the brand alias match
    #[serde(rename = "brand_confidence")]
    BrandConfidence,
    /// Mean confidence of retained OCR tokens
    #[serde(rename = "text_confidence")]
    TextConfidence,
    /// Logo-likelihood heuristic
    #[serde(rename = "logo_confidence")]
    LogoConfidence,
    /// Package layout heuristic
    #[serde(rename = "package_analysis")]
    PackageAnalysis,
    /// Color diversity heuristic
    #[serde(rename = "color_analysis")]
    ColorAnalysis,
}

impl Feature {
    /// Number of features in the schema
    pub const COUNT: usize = 10;

    /// Canonical feature order
    pub const ALL: [Feature; Feature::COUNT] = [
        Feature::Barcode729,
        Feature::MadeInIsraelText,
        Feature::HebrewText,
        Feature::IsraeliBrand,
        Feature::KosherCertification,
        Feature::BrandConfidence,
        Feature::TextConfidence,
        Feature::LogoConfidence,
        Feature::PackageAnalysis,
        Feature::ColorAnalysis,
    ];

    /// Discrete (boolean) features, echoed back in prediction summaries
    pub const FLAGS: [Feature; 5] = [
        Feature::Barcode729,
        Feature::MadeInIsraelText,
        Feature::HebrewText,
        Feature::IsraeliBrand,
        Feature::KosherCertification,
    ];

    /// Wire name of the feature
    pub fn name(self) -> &'static str {
        match self {
            Feature::Barcode729 => "barcode_729",
            Feature::MadeInIsraelText => "made_in_israel_text",
            Feature::HebrewText => "hebrew_text",
            Feature::IsraeliBrand => "israeli_brand",
            Feature::KosherCertification => "kosher_certification",
            Feature::BrandConfidence => "brand_confidence",
            Feature::TextConfidence => "text_confidence",
            Feature::LogoConfidence => "logo_confidence",
            Feature::PackageAnalysis => "package_analysis",
            Feature::ColorAnalysis => "color_analysis",
        }
    }

    /// True for boolean features
    pub fn is_flag(self) -> bool {
        Feature::FLAGS.contains(&self)
    }

    fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Feature {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Feature::ALL
            .iter()
            .copied()
            .find(|f| f.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| Error::InvalidInput(format!("Unknown evidence field: {}", s)))
    }
}

/// A single evidence value as supplied by a caller
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EvidenceValue {
    Flag(bool),
    Score(f64),
}

impl EvidenceValue {
    /// Numeric form: flags coerce to {0.0, 1.0}
    pub fn as_f64(self) -> f64 {
        match self {
            EvidenceValue::Flag(true) => 1.0,
            EvidenceValue::Flag(false) => 0.0,
            EvidenceValue::Score(v) => v,
        }
    }
}

impl From<bool> for EvidenceValue {
    fn from(value: bool) -> Self {
        EvidenceValue::Flag(value)
    }
}

impl From<f64> for EvidenceValue {
    fn from(value: f64) -> Self {
        EvidenceValue::Score(value)
    }
}

/// Evidence vector keyed by `Feature`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, EvidenceValue>",
    into = "BTreeMap<String, f64>"
)]
pub struct EvidenceVector {
    values: [Option<f64>; Feature::COUNT],
}

impl EvidenceVector {
    /// Empty vector (every field absent)
    pub fn new() -> Self {
        Self::default()
    }

    /// Vector with every field present and zero
    pub fn zeros() -> Self {
        Self {
            values: [Some(0.0); Feature::COUNT],
        }
    }

    /// Build from `(name, value)` pairs in any order
    ///
    /// Unknown names and non-finite values are rejected. A later pair for the
    /// same feature replaces an earlier one.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<EvidenceValue>,
    {
        let mut vector = Self::new();
        for (name, value) in pairs {
            let feature: Feature = name.as_ref().parse()?;
            let value = value.into().as_f64();
            if !value.is_finite() {
                return Err(Error::InvalidInput(format!(
                    "Evidence field {} is not finite: {}",
                    feature, value
                )));
            }
            vector.values[feature.slot()] = Some(value);
        }
        Ok(vector)
    }

    /// Present value of a feature
    pub fn get(&self, feature: Feature) -> Option<f64> {
        self.values[feature.slot()]
    }

    /// Value of a feature, 0.0 when absent
    pub fn value(&self, feature: Feature) -> f64 {
        self.get(feature).unwrap_or(0.0)
    }

    /// Boolean reading of a feature (absent reads as false)
    pub fn flag(&self, feature: Feature) -> bool {
        self.value(feature) >= 0.5
    }

    pub fn set(&mut self, feature: Feature, value: impl Into<EvidenceValue>) {
        self.values[feature.slot()] = Some(value.into().as_f64());
    }

    /// Number of present fields
    pub fn len(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Present fields in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (Feature, f64)> + '_ {
        Feature::ALL
            .iter()
            .filter_map(move |f| self.get(*f).map(|v| (*f, v)))
    }

    /// Dense row in the given order; absent fields become 0.0
    pub fn to_row(&self, order: &[Feature]) -> Vec<f64> {
        order.iter().map(|f| self.value(*f)).collect()
    }
}

impl TryFrom<BTreeMap<String, EvidenceValue>> for EvidenceVector {
    type Error = Error;

    fn try_from(map: BTreeMap<String, EvidenceValue>) -> Result<Self> {
        EvidenceVector::from_pairs(map)
    }
}

impl From<EvidenceVector> for BTreeMap<String, f64> {
    fn from(vector: EvidenceVector) -> Self {
        vector
            .iter()
            .map(|(f, v)| (f.name().to_string(), v))
            .collect()
    }
}
