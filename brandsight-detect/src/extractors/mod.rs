//! Signal extractors
//!
//! Four independent extractors, each owning a disjoint slice of the evidence
//! schema (see `SignalSource::owned_features`).
//!
//! # Architecture
//! - **Stage 1:** barcode ∥ text ∥ visual, all reading the same pixel buffer
//! - **Stage 2:** brand match over the stage-1 text blob
//! - **Fusion:** fragments merged by `fusion::aggregate`
//!
//! # Extractors
//! 1. **barcode** - country-prefix barcode, OCR digit-run fallback
//! 2. **text** - OCR text blob and three pattern families
//! 3. **brand_match** - catalog alias lookup on the text blob
//! 4. **visual** - logo, package layout and color heuristics
//!
//! # Error Isolation
//! Extractors are CPU-bound and run on the blocking pool. A failed or
//! panicked extractor degrades to its default fragment and never fails the
//! prediction.

pub mod barcode;
pub mod brand_match;
pub mod text;
pub mod visual;

use crate::error::{DetectError, DetectResult};
use crate::fusion::{aggregate, AggregatedEvidence};
use crate::imaging::PixelBuffer;
use crate::types::{
    BarcodeDecoder, ExtractorOutcome, SignalExtractor, SignalInput, TextRecognizer,
};
use brandsight_common::{BrandCatalog, DetectorConfig};
use std::sync::Arc;
use tracing::{debug, warn};

pub use barcode::BarcodeSignal;
pub use brand_match::BrandMatchSignal;
pub use text::TextSignal;
pub use visual::VisualSignal;

/// Two-stage extraction pipeline
pub struct SignalPipeline {
    barcode: Arc<dyn SignalExtractor>,
    text: Arc<dyn SignalExtractor>,
    visual: Arc<dyn SignalExtractor>,
    brand: Arc<dyn SignalExtractor>,
}

impl SignalPipeline {
    /// Assemble a pipeline from arbitrary extractors
    pub fn new(
        barcode: Arc<dyn SignalExtractor>,
        text: Arc<dyn SignalExtractor>,
        visual: Arc<dyn SignalExtractor>,
        brand: Arc<dyn SignalExtractor>,
    ) -> Self {
        Self {
            barcode,
            text,
            visual,
            brand,
        }
    }

    /// Standard extractors over the given OCR engine and barcode decoder
    pub fn standard(
        config: &DetectorConfig,
        ocr: Arc<dyn TextRecognizer>,
        decoder: Arc<dyn BarcodeDecoder>,
        catalog: &'static BrandCatalog,
    ) -> DetectResult<Self> {
        let text = TextSignal::new(Arc::clone(&ocr), &config.ocr)
            .map_err(|e| DetectError::Internal(format!("Text patterns: {}", e)))?;

        Ok(Self::new(
            Arc::new(BarcodeSignal::new(decoder, ocr, &config.barcode)),
            Arc::new(text),
            Arc::new(VisualSignal::new()),
            Arc::new(BrandMatchSignal::new(catalog)),
        ))
    }

    /// Run both stages and merge the fragments
    ///
    /// Never fails: every extractor contributes either its fragment or its
    /// default fragment.
    pub async fn extract(&self, image: Arc<PixelBuffer>) -> AggregatedEvidence {
        let (barcode, text, visual) = tokio::join!(
            run_extractor(Arc::clone(&self.barcode), Arc::clone(&image), None),
            run_extractor(Arc::clone(&self.text), Arc::clone(&image), None),
            run_extractor(Arc::clone(&self.visual), Arc::clone(&image), None),
        );

        let blob = text.fragment().text_blob.clone();
        let brand = run_extractor(Arc::clone(&self.brand), image, blob).await;

        let evidence = aggregate(vec![barcode, text, visual, brand]);
        debug!(
            fields = evidence.vector.len(),
            degraded = evidence.degraded_sources.len(),
            "Evidence aggregated"
        );
        evidence
    }
}

/// Run one extractor on the blocking pool, degrading on error or panic
async fn run_extractor(
    extractor: Arc<dyn SignalExtractor>,
    image: Arc<PixelBuffer>,
    text: Option<String>,
) -> ExtractorOutcome {
    let source = extractor.source();

    let joined = tokio::task::spawn_blocking(move || {
        extractor.extract(&SignalInput {
            image: &image,
            text: text.as_deref(),
        })
    })
    .await;

    match joined {
        Ok(Ok(fragment)) => {
            debug!(extractor = %source, confidence = fragment.confidence, "Extraction successful");
            ExtractorOutcome::Extracted(fragment)
        }
        Ok(Err(e)) => {
            warn!(extractor = %source, error = %e, "Extraction failed, using defaults");
            ExtractorOutcome::degraded(source, e.to_string())
        }
        Err(e) => {
            warn!(extractor = %source, error = %e, "Extractor task aborted, using defaults");
            ExtractorOutcome::degraded(source, format!("Task join error: {}", e))
        }
    }
}

// ============================================================================
// Mock Extractors for Testing
// ============================================================================

#[cfg(test)]
pub mod mock {
    use super::*;
    use crate::types::{EvidenceFragment, ExtractionError, SignalSource};
    use brandsight_common::Feature;

    /// Extractor returning a fixed fragment, or failing
    pub struct MockExtractor {
        pub fragment: EvidenceFragment,
        pub should_fail: bool,
        pub should_panic: bool,
    }

    impl MockExtractor {
        pub fn new(fragment: EvidenceFragment) -> Self {
            Self {
                fragment,
                should_fail: false,
                should_panic: false,
            }
        }

        pub fn failing(source: SignalSource) -> Self {
            Self {
                fragment: EvidenceFragment::new(source),
                should_fail: true,
                should_panic: false,
            }
        }

        pub fn panicking(source: SignalSource) -> Self {
            Self {
                fragment: EvidenceFragment::new(source),
                should_fail: false,
                should_panic: true,
            }
        }
    }

    impl SignalExtractor for MockExtractor {
        fn source(&self) -> SignalSource {
            self.fragment.source
        }

        fn extract(&self, input: &SignalInput<'_>) -> Result<EvidenceFragment, ExtractionError> {
            if self.should_panic {
                panic!("Mock panic");
            }
            if self.should_fail {
                return Err(ExtractionError::Internal("Mock failure".to_string()));
            }
            let mut fragment = self.fragment.clone();
            // Echo stage-2 input so tests can see what was handed over
            if fragment.source == SignalSource::BrandMatch {
                fragment.detected_brand = input.text.map(str::to_string);
            }
            Ok(fragment)
        }
    }

    pub fn text_fragment(blob: &str) -> EvidenceFragment {
        let mut fragment = EvidenceFragment::new(SignalSource::Text)
            .with_flag(Feature::MadeInIsraelText, true)
            .with_score(Feature::TextConfidence, 0.9);
        fragment.confidence = 0.9;
        fragment.text_blob = Some(blob.to_string());
        fragment
    }
}
