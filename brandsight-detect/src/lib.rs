//! brandsight-detect library interface
//!
//! Multi-signal package affiliation detector: a photograph of a retail
//! package goes in, a decision with a confidence comes out.
//!
//! # Architecture
//! - **imaging:** upload bytes → canonical pixel buffer
//! - **extractors:** barcode, text, brand match and visual signals
//! - **fusion:** signal fragments → one evidence vector
//! - **training:** synthetic corpus, random forest, fit/score
//! - **workflow:** the `Detector` orchestrator and its lifecycle
//! - **services:** shipped OCR and barcode engines

pub mod error;
pub mod extractors;
pub mod fusion;
pub mod imaging;
pub mod models;
pub mod services;
pub mod training;
pub mod types;
pub mod workflow;

pub use crate::error::{DetectError, DetectResult};
pub use crate::extractors::SignalPipeline;
pub use crate::imaging::{ImageNormalizer, PixelBuffer};
pub use crate::models::{BatchReport, DetectorStatus, ImageUpload, ModelInfo, PredictionResult};
pub use crate::workflow::Detector;
