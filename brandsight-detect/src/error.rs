//! Error types for brandsight-detect
//!
//! Error taxonomy as seen by callers of the detector:
//! - `InvalidInput`: malformed, oversized or non-image upload (no retry)
//! - `NotReady`: prediction requested before training completed
//! - `TrainingFailure`: corpus generation or fit failed at startup (fatal)
//! - `BatchTooLarge`: batch exceeded the image cap, nothing was processed
//!
//! Extractor failures never appear here; they degrade inside the pipeline.

use thiserror::Error;

/// Detector error type
#[derive(Debug, Error)]
pub enum DetectError {
    /// Malformed, oversized or non-image input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Scoring requested while the detector is not Ready
    #[error("Detector not ready (status: {0})")]
    NotReady(String),

    /// Startup training failed; the detector will not serve predictions
    #[error("Training failed: {0}")]
    TrainingFailure(String),

    /// Batch exceeded the configured image cap
    #[error("Batch too large: {count} images (maximum {max})")]
    BatchTooLarge { count: usize, max: usize },

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// brandsight-common error
    #[error("Common error: {0}")]
    Common(#[from] brandsight_common::Error),
}

impl DetectError {
    /// Stable machine-readable code for transports
    pub fn code(&self) -> &'static str {
        match self {
            DetectError::InvalidInput(_) => "INVALID_INPUT",
            DetectError::NotReady(_) => "NOT_READY",
            DetectError::TrainingFailure(_) => "TRAINING_FAILURE",
            DetectError::BatchTooLarge { .. } => "BATCH_TOO_LARGE",
            DetectError::Internal(_) => "INTERNAL_ERROR",
            DetectError::Common(brandsight_common::Error::InvalidInput(_)) => "INVALID_INPUT",
            DetectError::Common(_) => "COMMON_ERROR",
        }
    }
}

/// Result type for detector operations
pub type DetectResult<T> = Result<T, DetectError>;
