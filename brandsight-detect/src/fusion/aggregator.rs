// Feature Aggregator - Owner-First Merge
//
// Merges extractor fragments into one evidence vector keyed by Feature.
// Conflict rule: the owning signal's value wins; between non-owners the
// fragment with higher confidence wins. Absent features stay absent.

use crate::types::{BarcodeObservation, ExtractorOutcome, SignalSource};
use brandsight_common::{EvidenceVector, Feature};
use serde::Serialize;
use tracing::debug;

/// Merged evidence plus the side observations of the extractors
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedEvidence {
    pub vector: EvidenceVector,
    /// Lower-cased OCR text blob ("" when nothing was read)
    pub text_blob: String,
    /// Matched brand alias
    pub detected_brand: Option<String>,
    pub barcode: Option<BarcodeObservation>,
    /// Signals that fell back to their default fragment
    pub degraded_sources: Vec<SignalSource>,
}

/// Current holder of a feature during the merge
#[derive(Clone, Copy)]
struct Claim {
    value: f64,
    source: SignalSource,
    confidence: f64,
}

/// Merge extractor outcomes, in any order, into one evidence vector
pub fn aggregate(outcomes: Vec<ExtractorOutcome>) -> AggregatedEvidence {
    let mut claims: [Option<Claim>; Feature::COUNT] = [None; Feature::COUNT];
    let mut text_blob = None;
    let mut detected_brand = None;
    let mut barcode = None;
    let mut degraded_sources = Vec::new();

    for outcome in outcomes {
        if outcome.is_degraded() {
            degraded_sources.push(outcome.source());
        }
        let fragment = outcome.into_fragment();

        for (feature, value) in fragment.evidence.iter() {
            let slot = feature_slot(feature);
            let incoming = Claim {
                value,
                source: fragment.source,
                confidence: fragment.confidence,
            };

            claims[slot] = match claims[slot] {
                None => Some(incoming),
                Some(current) => {
                    let winner = resolve(feature, current, incoming);
                    debug!(
                        feature = %feature,
                        kept = %winner.source,
                        current = %current.source,
                        incoming = %incoming.source,
                        "Conflicting evidence resolved"
                    );
                    Some(winner)
                }
            };
        }

        if text_blob.is_none() {
            text_blob = fragment.text_blob;
        }
        if detected_brand.is_none() {
            detected_brand = fragment.detected_brand;
        }
        if barcode.is_none() {
            barcode = fragment.barcode;
        }
    }

    let mut vector = EvidenceVector::new();
    for feature in Feature::ALL {
        if let Some(claim) = claims[feature_slot(feature)] {
            vector.set(feature, claim.value);
        }
    }

    AggregatedEvidence {
        vector,
        text_blob: text_blob.unwrap_or_default(),
        detected_brand,
        barcode,
        degraded_sources,
    }
}

fn resolve(feature: Feature, current: Claim, incoming: Claim) -> Claim {
    let owner = SignalSource::owner_of(feature);
    if current.source == owner {
        current
    } else if incoming.source == owner {
        incoming
    } else if incoming.confidence > current.confidence {
        incoming
    } else {
        current
    }
}

fn feature_slot(feature: Feature) -> usize {
    Feature::ALL
        .iter()
        .position(|f| *f == feature)
        .unwrap_or_default()
}
