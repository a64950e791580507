//! Detector Lifecycle and Orchestration Tests
//!
//! Ready gate, training failure, batch limits, per-item isolation,
//! extractor degradation and brand enrichment.

mod helpers;

use brandsight_common::RiskLevel;
use brandsight_detect::{DetectError, Detector, DetectorStatus, ImageUpload};
use helpers::{
    fast_config, png_upload, ready_detector, stub_detector, upload_with_type, FailingOcr,
    StubDecoder, StubOcr,
};
use std::sync::Arc;

fn uploads(n: usize) -> Vec<ImageUpload> {
    (0..n).map(|i| png_upload(&format!("pack_{}.png", i))).collect()
}

// ============================================================================
// Lifecycle
// ============================================================================

#[tokio::test]
async fn test_not_ready_before_initialize() {
    let ocr = Arc::new(StubOcr::new(&[("dove", 0.9)]));
    let detector = stub_detector(Arc::clone(&ocr), Arc::new(StubDecoder::empty()));

    assert!(!detector.is_ready());
    assert_eq!(detector.status(), DetectorStatus::Uninitialized);

    let err = detector.analyze(&png_upload("a.png")).await.unwrap_err();
    assert!(matches!(err, DetectError::NotReady(_)));
    assert_eq!(err.code(), "NOT_READY");

    let err = detector.predict_batch(&uploads(2)).await.unwrap_err();
    assert!(matches!(err, DetectError::NotReady(_)));

    let err = detector
        .score_evidence(&brandsight_common::EvidenceVector::zeros(), None)
        .unwrap_err();
    assert!(matches!(err, DetectError::NotReady(_)));

    // Gate is checked before any extraction
    assert_eq!(ocr.calls(), 0);

    let info = detector.model_info();
    assert_eq!(info.status, DetectorStatus::Uninitialized);
    assert_eq!(info.brand_count, 10);
    assert!(info.feature_names.is_none());
}

#[tokio::test]
async fn test_initialize_is_idempotent() {
    let detector = ready_detector(Arc::new(StubOcr::empty()), Arc::new(StubDecoder::empty())).await;
    let trained_at = detector.model_info().trained_at;

    detector.initialize().await.unwrap();
    assert!(detector.is_ready());
    assert_eq!(detector.model_info().trained_at, trained_at);
}

#[tokio::test]
async fn test_training_failure_is_terminal() {
    let mut config = fast_config();
    config.training.samples_per_alias = 0;
    config.training.samples_per_control_brand = 0;
    config.training.ambiguous_samples = 0;
    let detector = Detector::with_engines(
        config,
        Arc::new(StubOcr::empty()),
        Arc::new(StubDecoder::empty()),
    )
    .unwrap();

    let err = detector.initialize().await.unwrap_err();
    assert!(matches!(err, DetectError::TrainingFailure(_)));
    assert_eq!(detector.status(), DetectorStatus::Failed);
    assert!(!detector.is_ready());

    // Failure sticks
    let err = detector.initialize().await.unwrap_err();
    assert!(matches!(err, DetectError::TrainingFailure(_)));

    let err = detector.analyze(&png_upload("a.png")).await.unwrap_err();
    assert!(matches!(err, DetectError::NotReady(_)));
    assert_eq!(detector.model_info().status, DetectorStatus::Failed);
}

#[tokio::test]
async fn test_model_info_when_ready() {
    let detector = ready_detector(Arc::new(StubOcr::empty()), Arc::new(StubDecoder::empty())).await;
    let info = detector.model_info();

    assert_eq!(info.status, DetectorStatus::Ready);
    assert_eq!(info.model_type.as_deref(), Some("RandomForestClassifier"));
    assert_eq!(info.n_estimators, Some(20));
    assert_eq!(info.max_depth, Some(10));
    assert_eq!(info.feature_count, Some(10));
    let names = info.feature_names.unwrap();
    assert_eq!(names.first().map(String::as_str), Some("barcode_729"));
    assert_eq!(names.last().map(String::as_str), Some("color_analysis"));
    assert!(info.holdout_accuracy.is_some());
    assert!(info.trained_at.is_some());
}

// ============================================================================
// Single predictions
// ============================================================================

#[tokio::test]
async fn test_analyze_enriches_detected_brand() {
    let ocr = Arc::new(StubOcr::new(&[
        ("Made", 0.93),
        ("in", 0.91),
        ("Israel", 0.88),
        ("Dove", 0.95),
        ("ⓤ", 0.8),
    ]));
    let decoder = Arc::new(StubDecoder::new(&["7290001234567"]));
    let detector = ready_detector(ocr, Arc::clone(&decoder)).await;

    let result = detector.analyze(&png_upload("dove.png")).await.unwrap();

    assert!(result.detected_features.barcode_729);
    assert!(result.detected_features.made_in_israel_text);
    assert!(result.detected_features.israeli_brand);
    assert!(result.detected_features.kosher_certification);
    assert!(!result.detected_features.hebrew_text);
    assert!((0.0..=1.0).contains(&result.confidence));

    let info = result.brand_info.unwrap();
    assert_eq!(info.name, "dove");
    assert_eq!(info.brand, "unilever");
    assert_eq!(info.risk_level, RiskLevel::High);
    assert_eq!(decoder.calls(), 1);
}

#[tokio::test]
async fn test_analyze_without_brand_has_no_enrichment() {
    let ocr = Arc::new(StubOcr::new(&[("notabrand", 0.9), ("biscuits", 0.9)]));
    let detector = ready_detector(ocr, Arc::new(StubDecoder::empty())).await;

    let result = detector.analyze(&png_upload("plain.png")).await.unwrap();
    assert!(result.brand_info.is_none());
    assert!(!result.detected_features.israeli_brand);
    assert!(!result.detected_features.barcode_729);
}

#[tokio::test]
async fn test_degraded_ocr_still_predicts() {
    let detector = Detector::with_engines(
        fast_config(),
        Arc::new(FailingOcr),
        Arc::new(StubDecoder::empty()),
    )
    .unwrap();
    detector.initialize().await.unwrap();

    let result = detector.analyze(&png_upload("blurry.png")).await.unwrap();
    assert!(!result.detected_features.made_in_israel_text);
    assert!(!result.detected_features.israeli_brand);
    assert!(result.brand_info.is_none());
    assert!((0.0..=1.0).contains(&result.confidence));
}

#[tokio::test]
async fn test_analyze_rejects_non_image_and_corrupt_payloads() {
    let detector = ready_detector(Arc::new(StubOcr::empty()), Arc::new(StubDecoder::empty())).await;

    let text = upload_with_type("notes.txt", Some("text/plain"), b"hello".to_vec());
    let err = detector.analyze(&text).await.unwrap_err();
    assert!(matches!(err, DetectError::InvalidInput(_)));

    let untyped = upload_with_type("mystery", None, b"hello".to_vec());
    assert!(matches!(
        detector.analyze(&untyped).await,
        Err(DetectError::InvalidInput(_))
    ));

    let corrupt = upload_with_type("broken.png", Some("image/png"), vec![0x89, 0x50, 0x4e, 0x47]);
    assert!(matches!(
        detector.analyze(&corrupt).await,
        Err(DetectError::InvalidInput(_))
    ));
}

// ============================================================================
// Batches
// ============================================================================

#[tokio::test]
async fn test_oversized_batch_rejected_before_any_work() {
    let ocr = Arc::new(StubOcr::new(&[("dove", 0.9)]));
    let decoder = Arc::new(StubDecoder::empty());
    let detector = ready_detector(Arc::clone(&ocr), Arc::clone(&decoder)).await;

    let err = detector.predict_batch(&uploads(11)).await.unwrap_err();
    assert!(matches!(
        err,
        DetectError::BatchTooLarge { count: 11, max: 10 }
    ));
    assert_eq!(ocr.calls(), 0);
    assert_eq!(decoder.calls(), 0);
}

#[tokio::test]
async fn test_batch_isolates_item_failures() {
    let detector = ready_detector(
        Arc::new(StubOcr::new(&[("nescafe", 0.9)])),
        Arc::new(StubDecoder::empty()),
    )
    .await;

    let batch = vec![
        png_upload("good.png"),
        upload_with_type("notes.txt", Some("text/plain"), b"hello".to_vec()),
        upload_with_type("broken.jpg", Some("image/jpeg"), vec![0xff, 0xd8, 0x00]),
        png_upload("also_good.png"),
    ];
    let report = detector.predict_batch(&batch).await.unwrap();

    assert_eq!(report.total_processed, 4);
    let indices: Vec<usize> = report.results.iter().map(|r| r.index).collect();
    assert_eq!(indices, vec![0, 1, 2, 3]);

    assert!(!report.results[0].is_error());
    assert_eq!(
        report.results[0].brand_info.as_ref().map(|b| b.brand.as_str()),
        Some("nestle")
    );
    assert!(report.results[1].is_error());
    assert_eq!(report.results[1].filename, "notes.txt");
    assert!(report.results[2].is_error());
    assert!(report.results[3].confidence.is_some());
}

#[tokio::test]
async fn test_full_batch_is_accepted() {
    let detector = ready_detector(Arc::new(StubOcr::empty()), Arc::new(StubDecoder::empty())).await;

    let report = detector.predict_batch(&uploads(10)).await.unwrap();
    assert_eq!(report.total_processed, 10);
    assert!(report.results.iter().all(|r| !r.is_error()));

    let empty = detector.predict_batch(&[]).await.unwrap();
    assert_eq!(empty.total_processed, 0);
}
