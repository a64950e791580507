//! Detection workflow
//!
//! The `Detector` orchestrates one prediction end to end:
//! 1. Ready gate (NotReady before any work)
//! 2. Upload validation and image normalization
//! 3. Two-stage signal extraction and aggregation
//! 4. Scoring against the trained model
//! 5. Brand enrichment from the catalog

pub mod detector;

pub use detector::Detector;
