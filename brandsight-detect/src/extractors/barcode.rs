// Barcode Signal - Country-Prefix Detection
//
// Decoder first; when nothing decodes, OCR digit runs are scanned for the same
// prefix at reduced confidence. Absence of any barcode is a valid result.

use crate::types::{
    BarcodeDecoder, BarcodeObservation, EvidenceFragment, ExtractionError, SignalExtractor,
    SignalInput, SignalSource, TextRecognizer,
};
use brandsight_common::config::BarcodeConfig;
use brandsight_common::Feature;
use std::sync::Arc;
use tracing::debug;

/// Confidence when a barcode decodes without the prefix
pub const DECODED_CONFIDENCE: f64 = 0.9;
/// Confidence when a decoded barcode carries the prefix
pub const PREFIX_MATCH_CONFIDENCE: f64 = 1.0;
/// Confidence when the prefix is only found in an OCR digit run
pub const OCR_FALLBACK_CONFIDENCE: f64 = 0.7;

pub struct BarcodeSignal {
    decoder: Arc<dyn BarcodeDecoder>,
    ocr: Arc<dyn TextRecognizer>,
    prefix: String,
    min_fallback_digits: usize,
}

impl BarcodeSignal {
    pub fn new(
        decoder: Arc<dyn BarcodeDecoder>,
        ocr: Arc<dyn TextRecognizer>,
        config: &BarcodeConfig,
    ) -> Self {
        Self {
            decoder,
            ocr,
            prefix: config.country_prefix.clone(),
            min_fallback_digits: config.min_fallback_digits,
        }
    }

    /// Numeric payload starting with the configured prefix
    fn has_prefix(&self, payload: &str) -> bool {
        !payload.is_empty()
            && payload.chars().all(|c| c.is_ascii_digit())
            && payload.starts_with(&self.prefix)
    }

    /// Digit run recovered by OCR ("729 1234-5678" → "72912345678")
    fn fallback_candidate(&self, text: &str) -> Option<String> {
        let compact: String = text.chars().filter(|c| *c != ' ' && *c != '-').collect();
        (compact.len() >= self.min_fallback_digits && self.has_prefix(&compact)).then_some(compact)
    }
}

impl SignalExtractor for BarcodeSignal {
    fn source(&self) -> SignalSource {
        SignalSource::Barcode
    }

    fn extract(&self, input: &SignalInput<'_>) -> Result<EvidenceFragment, ExtractionError> {
        let barcodes = self.decoder.decode(input.image)?;
        let mut observation = BarcodeObservation::default();

        if !barcodes.is_empty() {
            observation.detected = true;
            observation.confidence = DECODED_CONFIDENCE;

            for barcode in &barcodes {
                let payload = barcode.payload.trim();
                debug!(payload, "Detected barcode");
                if self.has_prefix(payload) {
                    observation.payload = Some(payload.to_string());
                    observation.confidence = PREFIX_MATCH_CONFIDENCE;
                    break;
                }
            }
        } else {
            // No decode: look for barcode-like digit runs in OCR output
            for detection in self.ocr.detect_text(input.image)? {
                if let Some(digits) = self.fallback_candidate(&detection.text) {
                    debug!(digits = %digits, "Prefix found in OCR digit run");
                    observation.detected = true;
                    observation.payload = Some(digits);
                    observation.confidence = OCR_FALLBACK_CONFIDENCE;
                    break;
                }
            }
        }

        let mut fragment = EvidenceFragment::new(SignalSource::Barcode)
            .with_flag(Feature::Barcode729, observation.payload.is_some());
        fragment.confidence = observation.confidence;
        fragment.barcode = Some(observation);
        Ok(fragment)
    }
}
