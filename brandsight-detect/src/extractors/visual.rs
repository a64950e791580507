// Visual Signal - Logo, Layout and Color Heuristics
//
// Three independent scores in [0, 1]:
// - logo: compact, roughly round edge contours
// - package: text-line-like blobs after horizontal closing
// - color: HSV histogram occupancy

use crate::imaging::PixelBuffer;
use crate::types::{EvidenceFragment, ExtractionError, SignalExtractor, SignalInput, SignalSource};
use brandsight_common::Feature;
use image::{GrayImage, Luma, RgbImage};
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::geometry::{arc_length, contour_area};
use imageproc::morphology::{grayscale_close, Mask};
use std::f64::consts::PI;
use tracing::debug;

// ============================================================================
// Thresholds
// ============================================================================

pub const CANNY_LOW: f32 = 50.0;
pub const CANNY_HIGH: f32 = 150.0;

/// Contour area window for logo candidates (exclusive)
pub const LOGO_MIN_AREA: f64 = 500.0;
pub const LOGO_MAX_AREA: f64 = 5000.0;
/// Circularity window for logo candidates (exclusive)
pub const LOGO_MIN_CIRCULARITY: f64 = 0.3;
pub const LOGO_MAX_CIRCULARITY: f64 = 1.2;
pub const LOGO_SCORE_PER_CONTOUR: f64 = 0.1;

/// Horizontal closing kernel (width × 1)
pub const CLOSING_KERNEL_WIDTH: u32 = 9;
/// Contour count that saturates the package score
pub const PACKAGE_SATURATION: f64 = 20.0;

pub const HUE_BINS: usize = 50;
pub const SATURATION_BINS: usize = 60;
pub const VALUE_BINS: usize = 60;

// ============================================================================
// Signal
// ============================================================================

#[derive(Debug, Default)]
pub struct VisualSignal;

impl VisualSignal {
    pub fn new() -> Self {
        Self
    }
}

impl SignalExtractor for VisualSignal {
    fn source(&self) -> SignalSource {
        SignalSource::Visual
    }

    fn extract(&self, input: &SignalInput<'_>) -> Result<EvidenceFragment, ExtractionError> {
        let image: &PixelBuffer = input.image;
        if image.width() == 0 || image.height() == 0 {
            return Err(ExtractionError::Image("Empty pixel buffer".to_string()));
        }

        let gray = image.to_gray();
        let logo = logo_score(&gray);
        let package = package_score(&gray);
        let color = color_score(image.rgb());

        debug!(logo, package, color, "Visual signal extracted");

        let mut fragment = EvidenceFragment::new(SignalSource::Visual)
            .with_score(Feature::LogoConfidence, logo)
            .with_score(Feature::PackageAnalysis, package)
            .with_score(Feature::ColorAnalysis, color);
        fragment.confidence = (logo + package + color) / 3.0;
        Ok(fragment)
    }
}

// ============================================================================
// Heuristics
// ============================================================================

/// Logo likelihood from edge contours
pub fn logo_score(gray: &GrayImage) -> f64 {
    let edges = imageproc::edges::canny(gray, CANNY_LOW, CANNY_HIGH);
    let qualifying = external_contours(&edges)
        .iter()
        .filter(|c| is_logo_candidate(&c.points))
        .count();
    (qualifying as f64 * LOGO_SCORE_PER_CONTOUR).min(1.0)
}

/// Package layout likelihood from line-like blobs
pub fn package_score(gray: &GrayImage) -> f64 {
    let level = imageproc::contrast::otsu_level(gray);
    let binary = GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        if gray.get_pixel(x, y)[0] > level {
            Luma([255])
        } else {
            Luma([0])
        }
    });
    let closed = grayscale_close(&binary, &closing_mask());
    let count = external_contours(&closed).len();
    (count as f64 / PACKAGE_SATURATION).min(1.0)
}

/// Color diversity from HSV histogram occupancy
pub fn color_score(rgb: &RgbImage) -> f64 {
    let total_bins = HUE_BINS * SATURATION_BINS * VALUE_BINS;
    let mut occupied = vec![false; total_bins];

    for pixel in rgb.pixels() {
        let (h, s, v) = rgb_to_hsv(pixel[0], pixel[1], pixel[2]);
        let h_bin = (h as usize * HUE_BINS / 180).min(HUE_BINS - 1);
        let s_bin = (s as usize * SATURATION_BINS / 256).min(SATURATION_BINS - 1);
        let v_bin = (v as usize * VALUE_BINS / 256).min(VALUE_BINS - 1);
        occupied[(h_bin * SATURATION_BINS + s_bin) * VALUE_BINS + v_bin] = true;
    }

    let filled = occupied.iter().filter(|b| **b).count();
    (filled as f64 / total_bins as f64 * 2.0).min(1.0)
}

fn is_logo_candidate(points: &[imageproc::point::Point<i32>]) -> bool {
    let area = contour_area(points);
    if area <= LOGO_MIN_AREA || area >= LOGO_MAX_AREA {
        return false;
    }
    let perimeter = arc_length(points, true);
    if perimeter <= 0.0 {
        return false;
    }
    let circularity = circularity(area, perimeter);
    circularity > LOGO_MIN_CIRCULARITY && circularity < LOGO_MAX_CIRCULARITY
}

fn external_contours(binary: &GrayImage) -> Vec<Contour<i32>> {
    find_contours::<i32>(binary)
        .into_iter()
        .filter(|c| c.parent.is_none() && c.border_type == BorderType::Outer)
        .collect()
}

/// 4πA/P²; 1.0 for a circle
pub fn circularity(area: f64, perimeter: f64) -> f64 {
    4.0 * PI * area / (perimeter * perimeter)
}

/// `CLOSING_KERNEL_WIDTH × 1` rectangle centred on its middle pixel
fn closing_mask() -> Mask {
    let kernel = GrayImage::from_pixel(CLOSING_KERNEL_WIDTH, 1, Luma([255]));
    Mask::from_image(&kernel, (CLOSING_KERNEL_WIDTH / 2) as u8, 0)
}

/// 8-bit HSV: H in [0, 180), S and V in [0, 256)
fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (u8, u8, u8) {
    let (r, g, b) = (r as f64, g as f64, b as f64);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let s = if max > 0.0 { delta / max * 255.0 } else { 0.0 };
    let h = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (g - b) / delta
    } else if max == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    let h = if h < 0.0 { h + 360.0 } else { h };

    (
        ((h / 2.0).round() as u32 % 180) as u8,
        s.round().min(255.0) as u8,
        max as u8,
    )
}
