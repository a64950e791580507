//! Classifier training and scoring
//!
//! `fit` turns a labelled corpus into an immutable `TrainedModel`; `score`
//! turns one evidence vector into a decision with a confidence.
//!
//! # Pipeline
//! 1. Stratified, seeded train/held-out split
//! 2. Standard scaler fitted on the train split only
//! 3. Classifier fitted on the scaled train rows
//! 4. Held-out accuracy logged (diagnostic, not a gate)
//!
//! The feature order used for training is frozen into the model. Scoring
//! vectorizes by `Feature`, so input order never matters and absent fields
//! read as 0.0.

pub mod corpus;
pub mod forest;
pub mod scaler;

pub use corpus::{CorpusGenerator, TrainingSample};
pub use forest::{Classifier, ClassifierSummary, ForestParams, RandomForest};
pub use scaler::StandardScaler;

use crate::error::DetectError;
use brandsight_common::config::TrainingConfig;
use brandsight_common::{EvidenceVector, Feature};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

/// Training errors
#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("Training corpus is empty")]
    EmptyCorpus,

    #[error("Training corpus contains a single class")]
    SingleClass,

    #[error("Held-out split left no training rows")]
    EmptyTrainSplit,

    #[error("Row width mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("Invalid training parameters: {0}")]
    InvalidParameters(String),
}

impl From<TrainingError> for DetectError {
    fn from(err: TrainingError) -> Self {
        DetectError::TrainingFailure(err.to_string())
    }
}

/// Fitted scaler + classifier with frozen feature order
///
/// Only `fit` constructs one; there is no way to score with an unfitted model.
#[derive(Debug)]
pub struct TrainedModel {
    scaler: StandardScaler,
    classifier: Box<dyn Classifier>,
    feature_order: Vec<Feature>,
    holdout_accuracy: Option<f64>,
    training_samples: usize,
    trained_at: DateTime<Utc>,
}

impl TrainedModel {
    pub fn feature_order(&self) -> &[Feature] {
        &self.feature_order
    }

    /// Accuracy on the held-out split (None when the split was empty)
    pub fn holdout_accuracy(&self) -> Option<f64> {
        self.holdout_accuracy
    }

    pub fn training_samples(&self) -> usize {
        self.training_samples
    }

    pub fn trained_at(&self) -> DateTime<Utc> {
        self.trained_at
    }

    pub fn summary(&self) -> ClassifierSummary {
        self.classifier.summary()
    }

    fn proba(&self, vector: &EvidenceVector) -> forest::Proba {
        let row: Vec<f64> = vector
            .to_row(&self.feature_order)
            .into_iter()
            .map(|v| if v.is_finite() { v } else { 0.0 })
            .collect();
        self.classifier.predict_proba(&self.scaler.transform(&row))
    }
}

/// Decision and its confidence
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Score {
    pub decision: bool,
    /// Max class probability, always within [0, 1]
    pub confidence: f64,
}

/// Fit the default random forest on `samples`
pub fn fit(samples: &[TrainingSample], config: &TrainingConfig) -> Result<TrainedModel, TrainingError> {
    fit_with(
        samples,
        config,
        Box::new(RandomForest::new(ForestParams::from(config))),
    )
}

/// Fit an arbitrary classifier on `samples`
pub fn fit_with(
    samples: &[TrainingSample],
    config: &TrainingConfig,
    mut classifier: Box<dyn Classifier>,
) -> Result<TrainedModel, TrainingError> {
    if samples.is_empty() {
        return Err(TrainingError::EmptyCorpus);
    }
    if samples.iter().all(|s| s.affiliated) || samples.iter().all(|s| !s.affiliated) {
        return Err(TrainingError::SingleClass);
    }
    if !(config.test_fraction > 0.0 && config.test_fraction < 1.0) {
        return Err(TrainingError::InvalidParameters(format!(
            "test_fraction out of range (0, 1): {}",
            config.test_fraction
        )));
    }

    let feature_order = Feature::ALL.to_vec();
    let (train, holdout) = stratified_split(samples, config.test_fraction, config.seed);
    if train.is_empty() {
        return Err(TrainingError::EmptyTrainSplit);
    }

    let train_rows: Vec<Vec<f64>> = train
        .iter()
        .map(|s| s.evidence.to_row(&feature_order))
        .collect();
    let train_labels: Vec<bool> = train.iter().map(|s| s.affiliated).collect();

    let scaler = StandardScaler::fit(&train_rows)?;
    classifier.fit(&scaler.transform_all(&train_rows), &train_labels)?;

    let mut model = TrainedModel {
        scaler,
        classifier,
        feature_order,
        holdout_accuracy: None,
        training_samples: train.len(),
        trained_at: Utc::now(),
    };

    if !holdout.is_empty() {
        let correct = holdout
            .iter()
            .filter(|s| score(&model, &s.evidence).decision == s.affiliated)
            .count();
        model.holdout_accuracy = Some(correct as f64 / holdout.len() as f64);
    }

    let summary = model.summary();
    info!(
        model_type = %summary.model_type,
        n_estimators = summary.n_estimators,
        train_samples = train.len(),
        holdout_samples = holdout.len(),
        holdout_accuracy = model.holdout_accuracy.unwrap_or(f64::NAN),
        "Classifier trained"
    );

    Ok(model)
}

/// Score one evidence vector
pub fn score(model: &TrainedModel, vector: &EvidenceVector) -> Score {
    let proba = model.proba(vector);
    let decision = proba[1] > proba[0];
    let confidence = proba[0].max(proba[1]);
    Score {
        decision,
        confidence: if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        },
    }
}

/// Seeded split keeping the class ratio in both parts
fn stratified_split(
    samples: &[TrainingSample],
    test_fraction: f64,
    seed: u64,
) -> (Vec<&TrainingSample>, Vec<&TrainingSample>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut holdout = Vec::new();

    for class in [false, true] {
        let mut members: Vec<&TrainingSample> =
            samples.iter().filter(|s| s.affiliated == class).collect();
        members.shuffle(&mut rng);

        let n_test = ((members.len() as f64 * test_fraction).round() as usize).min(members.len());
        let rest = members.split_off(n_test);
        holdout.extend(members);
        train.extend(rest);
    }

    (train, holdout)
}
