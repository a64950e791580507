//! Tesseract OCR client
//!
//! Runs the `tesseract` command-line tool on a temporary PNG and parses its
//! TSV output into word-level detections.
//!
//! Usage: `tesseract <image.png> stdout -l eng+heb tsv`

use crate::imaging::PixelBuffer;
use crate::types::{BoundingBox, ExtractionError, TextDetection, TextRecognizer};
use brandsight_common::config::OcrConfig;
use image::ImageFormat;
use std::process::Command;
use tracing::debug;

/// TSV column count: level .. conf, text
const TSV_COLUMNS: usize = 12;

/// Tesseract command-line client
#[derive(Debug, Clone)]
pub struct TesseractCli {
    binary_path: String,
    languages: String,
}

impl TesseractCli {
    pub fn new(config: &OcrConfig) -> Self {
        Self {
            binary_path: config.binary.clone(),
            languages: config.languages.join("+"),
        }
    }

    /// Check if the binary can be launched
    pub fn is_available(&self) -> bool {
        Command::new(&self.binary_path)
            .arg("--version")
            .output()
            .is_ok()
    }

    fn run(&self, image: &PixelBuffer) -> Result<String, ExtractionError> {
        let temp_input =
            std::env::temp_dir().join(format!("brandsight_ocr_{}.png", uuid::Uuid::new_v4()));

        image
            .rgb()
            .save_with_format(&temp_input, ImageFormat::Png)
            .map_err(|e| ExtractionError::Image(e.to_string()))?;

        debug!(
            input_file = %temp_input.display(),
            languages = %self.languages,
            "Running tesseract"
        );

        let output = Command::new(&self.binary_path)
            .arg(&temp_input)
            .arg("stdout")
            .arg("-l")
            .arg(&self.languages)
            .arg("tsv")
            .output();

        let _ = std::fs::remove_file(&temp_input);

        let output = match output {
            Ok(output) => output,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ExtractionError::Engine(format!(
                    "OCR binary not found: {}",
                    self.binary_path
                )));
            }
            Err(e) => return Err(ExtractionError::Io(e)),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractionError::Engine(format!(
                "Exit code: {:?}, stderr: {}",
                output.status.code(),
                stderr.trim()
            )));
        }

        String::from_utf8(output.stdout).map_err(|e| ExtractionError::Parse(e.to_string()))
    }
}

impl TextRecognizer for TesseractCli {
    fn detect_text(&self, image: &PixelBuffer) -> Result<Vec<TextDetection>, ExtractionError> {
        let tsv = self.run(image)?;
        let detections = parse_tsv(&tsv)?;
        debug!(count = detections.len(), "Tesseract detections parsed");
        Ok(detections)
    }
}

/// Parse tesseract TSV output
///
/// Keeps rows with a non-negative confidence and non-empty text. Confidence is
/// rescaled from 0-100 to 0.0-1.0.
pub fn parse_tsv(tsv: &str) -> Result<Vec<TextDetection>, ExtractionError> {
    let mut detections = Vec::new();

    for (index, line) in tsv.lines().enumerate() {
        if index == 0 && line.starts_with("level") {
            continue;
        }
        if line.trim().is_empty() {
            continue;
        }

        let columns: Vec<&str> = line.split('\t').collect();
        if columns.len() < TSV_COLUMNS - 1 {
            return Err(ExtractionError::Parse(format!(
                "Line {}: expected {} columns, got {}",
                index + 1,
                TSV_COLUMNS,
                columns.len()
            )));
        }

        let text = columns.get(11).map(|t| t.trim()).unwrap_or_default();
        if text.is_empty() {
            continue;
        }

        let confidence: f64 = columns[10].trim().parse().map_err(|_| {
            ExtractionError::Parse(format!("Line {}: bad confidence {:?}", index + 1, columns[10]))
        })?;
        if confidence < 0.0 {
            continue;
        }

        let field = |i: usize| columns[i].trim().parse::<u32>().unwrap_or(0);
        detections.push(TextDetection {
            bbox: BoundingBox {
                x: field(6),
                y: field(7),
                width: field(8),
                height: field(9),
            },
            text: text.to_string(),
            confidence: (confidence / 100.0).clamp(0.0, 1.0),
        });
    }

    Ok(detections)
}
