// Brand Match Signal - Catalog Alias Lookup (stage 2)
//
// Consumes the text blob from the text signal. Aliases are tried in catalog
// declaration order; for each alias exact containment is tried before the
// word-wise match. First hit wins, with no longest-match refinement.

use crate::types::{EvidenceFragment, ExtractionError, SignalExtractor, SignalInput, SignalSource};
use brandsight_common::{BrandCatalog, Feature};
use tracing::debug;

/// Alias found verbatim in the blob
pub const EXACT_MATCH_CONFIDENCE: f64 = 0.9;
/// Every word of a multi-word alias found somewhere in the blob
pub const WORDWISE_MATCH_CONFIDENCE: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    WordWise,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BrandMatch {
    pub alias: String,
    pub brand_key: String,
    pub kind: MatchKind,
    pub confidence: f64,
}

/// First alias of `catalog` present in `text` (already lower-cased)
pub fn match_brand(catalog: &BrandCatalog, text: &str) -> Option<BrandMatch> {
    if text.trim().is_empty() {
        return None;
    }

    for (record, alias) in catalog.aliases() {
        let kind = if text.contains(alias) {
            MatchKind::Exact
        } else {
            let words: Vec<&str> = alias.split_whitespace().collect();
            if words.len() > 1 && words.iter().all(|w| text.contains(w)) {
                MatchKind::WordWise
            } else {
                continue;
            }
        };

        let confidence = match kind {
            MatchKind::Exact => EXACT_MATCH_CONFIDENCE,
            MatchKind::WordWise => WORDWISE_MATCH_CONFIDENCE,
        };
        return Some(BrandMatch {
            alias: alias.to_string(),
            brand_key: record.key().to_string(),
            kind,
            confidence,
        });
    }

    None
}

pub struct BrandMatchSignal {
    catalog: &'static BrandCatalog,
}

impl BrandMatchSignal {
    pub fn new(catalog: &'static BrandCatalog) -> Self {
        Self { catalog }
    }
}

impl SignalExtractor for BrandMatchSignal {
    fn source(&self) -> SignalSource {
        SignalSource::BrandMatch
    }

    fn extract(&self, input: &SignalInput<'_>) -> Result<EvidenceFragment, ExtractionError> {
        let text = input.text.unwrap_or_default();

        let Some(hit) = match_brand(self.catalog, text) else {
            return Ok(EvidenceFragment::default_for(SignalSource::BrandMatch));
        };

        debug!(
            alias = %hit.alias,
            brand = %hit.brand_key,
            kind = ?hit.kind,
            "Brand alias matched"
        );

        let mut fragment = EvidenceFragment::new(SignalSource::BrandMatch)
            .with_flag(Feature::IsraeliBrand, true)
            .with_score(Feature::BrandConfidence, hit.confidence);
        fragment.confidence = hit.confidence;
        fragment.detected_brand = Some(hit.alias);
        Ok(fragment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brandsight_common::{BrandRecord, RiskLevel};

    fn catalog() -> &'static BrandCatalog {
        BrandCatalog::builtin()
    }

    #[test]
    fn test_exact_alias_match() {
        let hit = match_brand(catalog(), "dove beauty bar 90g").unwrap();
        assert_eq!(hit.alias, "dove");
        assert_eq!(hit.brand_key, "unilever");
        assert_eq!(hit.kind, MatchKind::Exact);
        assert_eq!(hit.confidence, EXACT_MATCH_CONFIDENCE);
    }

    #[test]
    fn test_wordwise_multi_word_alias() {
        let hit = match_brand(catalog(), "head and shoulders shampoo").unwrap();
        assert_eq!(hit.alias, "head shoulders");
        assert_eq!(hit.kind, MatchKind::WordWise);
        assert_eq!(hit.confidence, WORDWISE_MATCH_CONFIDENCE);
    }

    #[test]
    fn test_declaration_order_breaks_ties() {
        let catalog = BrandCatalog::new(vec![
            BrandRecord::new("first", ["alpha beta"], "test", RiskLevel::Low),
            BrandRecord::new("second", ["alpha"], "test", RiskLevel::Low),
        ]);
        // Both aliases hit exactly; declaration order decides
        let hit = match_brand(&catalog, "alpha beta").unwrap();
        assert_eq!(hit.brand_key, "first");

        // Word-wise on an earlier alias beats exact on a later one
        let hit = match_brand(&catalog, "beta alpha").unwrap();
        assert_eq!(hit.brand_key, "first");
        assert_eq!(hit.kind, MatchKind::WordWise);
    }

    #[test]
    fn test_no_text_no_match() {
        assert!(match_brand(catalog(), "").is_none());
        assert!(match_brand(catalog(), "   ").is_none());
        assert!(match_brand(catalog(), "zzzz qqqq").is_none());
    }

    #[test]
    fn test_signal_without_match_is_default() {
        let signal = BrandMatchSignal::new(catalog());
        let image = crate::imaging::PixelBuffer::from_rgb(image::RgbImage::new(2, 2));
        let fragment = signal
            .extract(&SignalInput {
                image: &image,
                text: None,
            })
            .unwrap();
        assert_eq!(
            fragment,
            EvidenceFragment::default_for(SignalSource::BrandMatch)
        );
    }

    #[test]
    fn test_signal_reports_detected_brand() {
        let signal = BrandMatchSignal::new(catalog());
        let image = crate::imaging::PixelBuffer::from_rgb(image::RgbImage::new(2, 2));
        let fragment = signal
            .extract(&SignalInput {
                image: &image,
                text: Some("nescafe classic"),
            })
            .unwrap();
        assert!(fragment.evidence.flag(Feature::IsraeliBrand));
        assert_eq!(fragment.evidence.value(Feature::BrandConfidence), 0.9);
        assert_eq!(fragment.detected_brand.as_deref(), Some("nescafe"));
    }
}
