//! Stub OCR and barcode engines with call counters

use brandsight_detect::types::{
    BarcodeDecoder, DecodedBarcode, ExtractionError, TextDetection, TextRecognizer,
};
use brandsight_detect::PixelBuffer;
use std::sync::atomic::{AtomicUsize, Ordering};

/// OCR returning a fixed word list
#[derive(Default)]
pub struct StubOcr {
    words: Vec<(String, f64)>,
    calls: AtomicUsize,
}

impl StubOcr {
    pub fn new(words: &[(&str, f64)]) -> Self {
        Self {
            words: words.iter().map(|(w, c)| (w.to_string(), *c)).collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TextRecognizer for StubOcr {
    fn detect_text(&self, _image: &PixelBuffer) -> Result<Vec<TextDetection>, ExtractionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .words
            .iter()
            .map(|(w, c)| TextDetection::new(w.clone(), *c))
            .collect())
    }
}

/// OCR whose engine always fails
pub struct FailingOcr;

impl TextRecognizer for FailingOcr {
    fn detect_text(&self, _image: &PixelBuffer) -> Result<Vec<TextDetection>, ExtractionError> {
        Err(ExtractionError::Engine("OCR engine crashed".to_string()))
    }
}

/// Decoder returning fixed payloads
#[derive(Default)]
pub struct StubDecoder {
    payloads: Vec<String>,
    calls: AtomicUsize,
}

impl StubDecoder {
    pub fn new(payloads: &[&str]) -> Self {
        Self {
            payloads: payloads.iter().map(|p| p.to_string()).collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl BarcodeDecoder for StubDecoder {
    fn decode(&self, _image: &PixelBuffer) -> Result<Vec<DecodedBarcode>, ExtractionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .payloads
            .iter()
            .map(|p| DecodedBarcode { payload: p.clone() })
            .collect())
    }
}
