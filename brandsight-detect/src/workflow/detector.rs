//! Prediction orchestrator
//!
//! Owns the detector lifecycle and ties the stages together:
//! upload → normalize → extract (two stages) → aggregate → score → enrich.
//!
//! # Lifecycle
//! `Uninitialized → Initializing → Ready` on successful training,
//! `Initializing → Failed` on any training error. Ready and Failed are
//! terminal for the process. Every scoring entry point checks the Ready gate
//! before doing any work.

use crate::error::{DetectError, DetectResult};
use crate::extractors::SignalPipeline;
use crate::imaging::{ImageNormalizer, PixelBuffer};
use crate::models::{
    BatchItem, BatchReport, BrandInfo, DetectedFeatures, DetectorStatus, ImageUpload, ModelInfo,
    PredictionResult,
};
use crate::services::{RxingDecoder, TesseractCli};
use crate::training::{self, CorpusGenerator, TrainedModel};
use crate::types::{BarcodeDecoder, TextRecognizer};
use brandsight_common::{BrandCatalog, DetectorConfig, EvidenceVector};
use chrono::Utc;
use futures::future::join_all;
use std::sync::{Arc, RwLock, RwLockReadGuard};
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// Lifecycle state; the model only exists in `Ready`
enum Lifecycle {
    Uninitialized,
    Initializing,
    Ready(Arc<TrainedModel>),
    Failed(String),
}

impl Lifecycle {
    fn status(&self) -> DetectorStatus {
        match self {
            Lifecycle::Uninitialized => DetectorStatus::Uninitialized,
            Lifecycle::Initializing => DetectorStatus::Initializing,
            Lifecycle::Ready(_) => DetectorStatus::Ready,
            Lifecycle::Failed(_) => DetectorStatus::Failed,
        }
    }
}

/// Affiliation detector
pub struct Detector {
    config: DetectorConfig,
    catalog: &'static BrandCatalog,
    normalizer: ImageNormalizer,
    pipeline: SignalPipeline,
    state: RwLock<Lifecycle>,
    /// Serializes `initialize` callers
    init_lock: Mutex<()>,
}

impl Detector {
    /// Detector over an explicit pipeline and catalog
    pub fn new(
        config: DetectorConfig,
        pipeline: SignalPipeline,
        catalog: &'static BrandCatalog,
    ) -> Self {
        Self {
            normalizer: ImageNormalizer::new(config.image.clone()),
            config,
            catalog,
            pipeline,
            state: RwLock::new(Lifecycle::Uninitialized),
            init_lock: Mutex::new(()),
        }
    }

    /// Standard extractors over the given engines and the built-in catalog
    pub fn with_engines(
        config: DetectorConfig,
        ocr: Arc<dyn TextRecognizer>,
        decoder: Arc<dyn BarcodeDecoder>,
    ) -> DetectResult<Self> {
        let catalog = BrandCatalog::builtin();
        let pipeline = SignalPipeline::standard(&config, ocr, decoder, catalog)?;
        Ok(Self::new(config, pipeline, catalog))
    }

    /// Production detector: tesseract OCR and rxing barcode decoding
    pub fn standard(config: DetectorConfig) -> DetectResult<Self> {
        let ocr = TesseractCli::new(&config.ocr);
        if !ocr.is_available() {
            warn!(
                binary = %config.ocr.binary,
                "OCR binary not available, text signals will degrade"
            );
        }
        Self::with_engines(config, Arc::new(ocr), Arc::new(RxingDecoder::new()))
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Generate the corpus and train the model
    ///
    /// Concurrent callers are serialized; once Ready this is a no-op. A
    /// training failure is terminal: this and every later call return
    /// `TrainingFailure`.
    pub async fn initialize(&self) -> DetectResult<()> {
        let _guard = self.init_lock.lock().await;

        match &*self.read_state() {
            Lifecycle::Ready(_) => return Ok(()),
            Lifecycle::Failed(reason) => return Err(DetectError::TrainingFailure(reason.clone())),
            Lifecycle::Uninitialized | Lifecycle::Initializing => {}
        }

        *self.write_state() = Lifecycle::Initializing;
        info!(
            seed = self.config.training.seed,
            n_estimators = self.config.training.n_estimators,
            "Training detector model"
        );

        let catalog = self.catalog;
        let training_config = self.config.training.clone();
        let trained = tokio::task::spawn_blocking(move || {
            let corpus = CorpusGenerator::new(catalog, &training_config).generate();
            training::fit(&corpus, &training_config)
        })
        .await;

        let reason = match trained {
            Ok(Ok(model)) => {
                info!(
                    training_samples = model.training_samples(),
                    holdout_accuracy = model.holdout_accuracy().unwrap_or(f64::NAN),
                    "Detector ready"
                );
                *self.write_state() = Lifecycle::Ready(Arc::new(model));
                return Ok(());
            }
            Ok(Err(e)) => e.to_string(),
            Err(e) => format!("Training task aborted: {}", e),
        };

        error!(reason = %reason, "Detector training failed");
        *self.write_state() = Lifecycle::Failed(reason.clone());
        Err(DetectError::TrainingFailure(reason))
    }

    pub fn is_ready(&self) -> bool {
        matches!(&*self.read_state(), Lifecycle::Ready(_))
    }

    pub fn status(&self) -> DetectorStatus {
        self.read_state().status()
    }

    // ========================================================================
    // Scoring entry points
    // ========================================================================

    /// Predict from a normalized pixel buffer
    pub async fn predict(&self, image: PixelBuffer) -> DetectResult<PredictionResult> {
        let model = self.ready_model()?;
        let evidence = self.pipeline.extract(Arc::new(image)).await;
        if !evidence.degraded_sources.is_empty() {
            warn!(
                degraded = ?evidence.degraded_sources,
                "Prediction uses default evidence for degraded signals"
            );
        }
        Ok(self.decide(&model, &evidence.vector, evidence.detected_brand.as_deref()))
    }

    /// Validate, normalize and predict one upload
    pub async fn analyze(&self, upload: &ImageUpload) -> DetectResult<PredictionResult> {
        self.ready_model()?;

        if !upload.is_image() {
            return Err(DetectError::InvalidInput(format!(
                "{}: not an image (content type {})",
                upload.filename,
                upload.content_type.as_deref().unwrap_or("unknown")
            )));
        }

        let normalizer = self.normalizer.clone();
        let bytes = upload.bytes.clone();
        let image = tokio::task::spawn_blocking(move || normalizer.normalize(&bytes))
            .await
            .map_err(|e| DetectError::Internal(format!("Normalization task aborted: {}", e)))??;

        let result = self.predict(image).await?;
        info!(
            filename = %upload.filename,
            is_affiliated = result.is_affiliated,
            confidence = result.confidence,
            "Detection completed"
        );
        Ok(result)
    }

    /// Score a caller-supplied evidence vector
    ///
    /// `detected_brand` is the alias to enrich with, if any.
    pub fn score_evidence(
        &self,
        evidence: &EvidenceVector,
        detected_brand: Option<&str>,
    ) -> DetectResult<PredictionResult> {
        let model = self.ready_model()?;
        Ok(self.decide(&model, evidence, detected_brand))
    }

    /// Analyze up to `batch.max_images` uploads concurrently
    ///
    /// Oversized batches are rejected before any item is touched. Item
    /// failures become that item's `error` entry.
    pub async fn predict_batch(&self, uploads: &[ImageUpload]) -> DetectResult<BatchReport> {
        self.ready_model()?;

        let max = self.config.batch.max_images;
        if uploads.len() > max {
            return Err(DetectError::BatchTooLarge {
                count: uploads.len(),
                max,
            });
        }

        let items = uploads.iter().enumerate().map(|(index, upload)| async move {
            match self.analyze(upload).await {
                Ok(result) => BatchItem::success(index, &upload.filename, result),
                Err(e) => {
                    error!(
                        index,
                        filename = %upload.filename,
                        error = %e,
                        "Batch item failed"
                    );
                    BatchItem::failure(index, &upload.filename, e.to_string())
                }
            }
        });

        let report = BatchReport::new(join_all(items).await);
        info!(
            total = report.total_processed,
            failed = report.results.iter().filter(|i| i.is_error()).count(),
            "Batch completed"
        );
        Ok(report)
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    pub fn model_info(&self) -> ModelInfo {
        let state = self.read_state();
        let Lifecycle::Ready(model) = &*state else {
            return ModelInfo::unavailable(state.status(), self.catalog.len());
        };

        let summary = model.summary();
        ModelInfo {
            status: DetectorStatus::Ready,
            model_type: Some(summary.model_type),
            n_estimators: Some(summary.n_estimators),
            max_depth: Some(summary.max_depth),
            feature_count: Some(model.feature_order().len()),
            feature_names: Some(
                model
                    .feature_order()
                    .iter()
                    .map(|f| f.name().to_string())
                    .collect(),
            ),
            brand_count: self.catalog.len(),
            holdout_accuracy: model.holdout_accuracy(),
            trained_at: Some(model.trained_at()),
        }
    }

    pub fn brands_database(&self) -> &'static BrandCatalog {
        self.catalog
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn ready_model(&self) -> DetectResult<Arc<TrainedModel>> {
        match &*self.read_state() {
            Lifecycle::Ready(model) => Ok(Arc::clone(model)),
            other => Err(DetectError::NotReady(other.status().to_string())),
        }
    }

    fn decide(
        &self,
        model: &TrainedModel,
        evidence: &EvidenceVector,
        detected_brand: Option<&str>,
    ) -> PredictionResult {
        let started = Instant::now();
        let score = training::score(model, evidence);
        let processing_time_ms = started.elapsed().as_secs_f64() * 1000.0;

        let brand_info = detected_brand.and_then(|alias| {
            self.catalog
                .lookup_by_alias(alias)
                .map(|record| BrandInfo::new(alias, record))
        });

        PredictionResult {
            is_affiliated: score.decision,
            confidence: score.confidence,
            detected_features: DetectedFeatures::from_evidence(evidence),
            brand_info,
            processing_time_ms,
            timestamp: Utc::now(),
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, Lifecycle> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, Lifecycle> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}
