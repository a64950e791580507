// Text Signal - OCR Pattern Families
//
// OCR → confidence filter → lower-cased text blob, then three independent
// pattern families, each setting one flag.

use crate::types::{
    EvidenceFragment, ExtractionError, SignalExtractor, SignalInput, SignalSource,
    TextRecognizer,
};
use brandsight_common::config::OcrConfig;
use brandsight_common::Feature;
use regex::{Regex, RegexSet, RegexSetBuilder};
use std::sync::Arc;
use tracing::debug;

/// "Manufactured in region" phrase family (case-insensitive)
pub const MADE_IN_PATTERNS: &[&str] = &[
    r"made\s+in\s+israel",
    r"product\s+of\s+israel",
    r"manufactured\s+in\s+israel",
    r"produced\s+in\s+israel",
    r"israel",
    r"israeli\s+product",
];

/// Region script character range (case-sensitive)
pub const REGION_SCRIPT_PATTERN: &str = r"[\x{0590}-\x{05FF}]+";

/// Certification markings, textual and symbolic (case-insensitive)
pub const CERTIFICATION_PATTERNS: &[&str] = &[
    r"kosher",
    r"halal",
    r"badatz",
    r"ou\s*kosher",
    r"kof-k",
    r"star-k",
    r"ok\s*kosher",
    r"kashrus",
    r"pareve",
    r"dairy",
    r"meat",
    r"ⓤ",
    r"ⓚ",
];

/// Compiled pattern families
#[derive(Debug, Clone)]
pub struct TextPatterns {
    made_in: RegexSet,
    region_script: Regex,
    certification: RegexSet,
}

/// Flags raised by the pattern families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PatternFlags {
    pub made_in: bool,
    pub region_script: bool,
    pub certification: bool,
}

impl TextPatterns {
    pub fn compile() -> Result<Self, regex::Error> {
        Ok(Self {
            made_in: RegexSetBuilder::new(MADE_IN_PATTERNS)
                .case_insensitive(true)
                .build()?,
            region_script: Regex::new(REGION_SCRIPT_PATTERN)?,
            certification: RegexSetBuilder::new(CERTIFICATION_PATTERNS)
                .case_insensitive(true)
                .build()?,
        })
    }

    pub fn scan(&self, text: &str) -> PatternFlags {
        PatternFlags {
            made_in: self.made_in.is_match(text),
            region_script: self.region_script.is_match(text),
            certification: self.certification.is_match(text),
        }
    }
}

pub struct TextSignal {
    ocr: Arc<dyn TextRecognizer>,
    patterns: TextPatterns,
    min_token_confidence: f64,
}

impl TextSignal {
    pub fn new(ocr: Arc<dyn TextRecognizer>, config: &OcrConfig) -> Result<Self, regex::Error> {
        Ok(Self {
            ocr,
            patterns: TextPatterns::compile()?,
            min_token_confidence: config.min_token_confidence,
        })
    }
}

impl SignalExtractor for TextSignal {
    fn source(&self) -> SignalSource {
        SignalSource::Text
    }

    fn extract(&self, input: &SignalInput<'_>) -> Result<EvidenceFragment, ExtractionError> {
        let detections = self.ocr.detect_text(input.image)?;
        let total = detections.len();

        let kept: Vec<(String, f64)> = detections
            .into_iter()
            .filter(|d| d.confidence > self.min_token_confidence)
            .map(|d| (d.text.trim().to_lowercase(), d.confidence))
            .filter(|(text, _)| !text.is_empty())
            .collect();

        if kept.is_empty() {
            debug!(detections = total, "No OCR tokens above confidence threshold");
            return Ok(EvidenceFragment::default_for(SignalSource::Text));
        }

        let text_confidence = kept.iter().map(|(_, c)| c).sum::<f64>() / kept.len() as f64;
        let blob = kept
            .into_iter()
            .map(|(text, _)| text)
            .collect::<Vec<_>>()
            .join(" ");
        let flags = self.patterns.scan(&blob);

        debug!(
            detections = total,
            text_confidence,
            made_in = flags.made_in,
            region_script = flags.region_script,
            certification = flags.certification,
            "Text signal extracted"
        );

        let mut fragment = EvidenceFragment::new(SignalSource::Text)
            .with_flag(Feature::MadeInIsraelText, flags.made_in)
            .with_flag(Feature::HebrewText, flags.region_script)
            .with_flag(Feature::KosherCertification, flags.certification)
            .with_score(Feature::TextConfidence, text_confidence);
        fragment.confidence = text_confidence.clamp(0.0, 1.0);
        fragment.text_blob = Some(blob);
        Ok(fragment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::PixelBuffer;
    use crate::types::TextDetection;
    use image::RgbImage;

    struct FixedOcr(Vec<(&'static str, f64)>);

    impl TextRecognizer for FixedOcr {
        fn detect_text(&self, _image: &PixelBuffer) -> Result<Vec<TextDetection>, ExtractionError> {
            Ok(self
                .0
                .iter()
                .map(|(t, c)| TextDetection::new(*t, *c))
                .collect())
        }
    }

    fn run(tokens: Vec<(&'static str, f64)>) -> EvidenceFragment {
        let signal = TextSignal::new(Arc::new(FixedOcr(tokens)), &OcrConfig::default()).unwrap();
        let image = PixelBuffer::from_rgb(RgbImage::new(4, 4));
        signal
            .extract(&SignalInput {
                image: &image,
                text: None,
            })
            .unwrap()
    }

    #[test]
    fn test_made_in_phrase_and_confidence_filter() {
        let fragment = run(vec![("Made in ISRAEL", 0.9), ("smudge", 0.3)]);

        assert!(fragment.evidence.flag(Feature::MadeInIsraelText));
        assert!(!fragment.evidence.flag(Feature::HebrewText));
        assert!(!fragment.evidence.flag(Feature::KosherCertification));
        assert_eq!(fragment.evidence.value(Feature::TextConfidence), 0.9);
        assert_eq!(fragment.text_blob.as_deref(), Some("made in israel"));
    }

    #[test]
    fn test_text_confidence_is_mean_of_kept_tokens() {
        let fragment = run(vec![("dove", 0.8), ("soap", 0.6), ("x", 0.2)]);
        let confidence = fragment.evidence.value(Feature::TextConfidence);
        assert!((confidence - 0.7).abs() < 1e-9);
        assert_eq!(fragment.text_blob.as_deref(), Some("dove soap"));
    }

    #[test]
    fn test_region_script_detected() {
        let fragment = run(vec![("שלום", 0.85)]);
        assert!(fragment.evidence.flag(Feature::HebrewText));
        assert!(!fragment.evidence.flag(Feature::MadeInIsraelText));
    }

    #[test]
    fn test_certification_markers() {
        assert!(run(vec![("OU Kosher", 0.9)])
            .evidence
            .flag(Feature::KosherCertification));
        assert!(run(vec![("ⓤ", 0.9)])
            .evidence
            .flag(Feature::KosherCertification));
        assert!(!run(vec![("net weight 200g", 0.9)])
            .evidence
            .flag(Feature::KosherCertification));
    }

    #[test]
    fn test_families_are_independent() {
        let fragment = run(vec![("product of israel", 0.9), ("pareve", 0.9), ("כשר", 0.9)]);
        assert!(fragment.evidence.flag(Feature::MadeInIsraelText));
        assert!(fragment.evidence.flag(Feature::HebrewText));
        assert!(fragment.evidence.flag(Feature::KosherCertification));
    }

    #[test]
    fn test_no_detections_yields_defaults() {
        let fragment = run(vec![]);
        assert_eq!(fragment, EvidenceFragment::default_for(SignalSource::Text));
        assert_eq!(fragment.evidence.value(Feature::TextConfidence), 0.0);
    }
}
