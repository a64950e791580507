//! Barcode decoding with rxing
//!
//! Pure-Rust multi-format decoder (EAN-13, UPC, Code 128, QR, ...). Runs on
//! the luma plane of the normalized buffer.

use crate::imaging::PixelBuffer;
use crate::types::{BarcodeDecoder, DecodedBarcode, ExtractionError};
use tracing::debug;

#[derive(Debug, Clone, Copy, Default)]
pub struct RxingDecoder;

impl RxingDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl BarcodeDecoder for RxingDecoder {
    fn decode(&self, image: &PixelBuffer) -> Result<Vec<DecodedBarcode>, ExtractionError> {
        let gray = image.to_gray();
        let (width, height) = gray.dimensions();

        match rxing::helpers::detect_multiple_in_luma(gray.into_raw(), width, height) {
            Ok(results) => Ok(results
                .iter()
                .map(|r| DecodedBarcode {
                    payload: r.getText().to_string(),
                })
                .collect()),
            Err(e) => {
                // rxing reports "nothing found" as an error
                debug!(error = ?e, "No barcode decoded");
                Ok(Vec::new())
            }
        }
    }
}
