//! Configuration loading and resolution
//!
//! Configuration file resolution follows this priority order:
//! 1. Command-line argument (highest priority)
//! 2. `BRANDSIGHT_CONFIG` environment variable
//! 3. `<config dir>/brandsight/config.toml`
//! 4. Compiled defaults (fallback)
//!
//! Every section and every key is optional; missing values take defaults.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "BRANDSIGHT_CONFIG";

/// Top-level detector configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub image: ImageConfig,
    pub ocr: OcrConfig,
    pub barcode: BarcodeConfig,
    pub training: TrainingConfig,
    pub batch: BatchConfig,
    pub logging: LoggingConfig,
}

/// Image normalization settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Upload size ceiling in bytes
    pub max_file_size_bytes: usize,
    /// Canvas width after normalization
    pub target_width: u32,
    /// Canvas height after normalization
    pub target_height: u32,
    /// Gaussian denoise sigma (0 disables)
    pub denoise_sigma: f32,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: 10 * 1024 * 1024,
            target_width: 640,
            target_height: 480,
            denoise_sigma: 0.8,
        }
    }
}

/// OCR engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Tesseract binary (name on PATH or absolute path)
    pub binary: String,
    /// Tesseract language packs, joined with '+'
    pub languages: Vec<String>,
    /// Detections at or below this confidence are dropped
    pub min_token_confidence: f64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            binary: "tesseract".to_string(),
            languages: vec!["eng".to_string(), "heb".to_string()],
            min_token_confidence: 0.5,
        }
    }
}

/// Barcode signal settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BarcodeConfig {
    /// GS1 country prefix that sets the barcode flag
    pub country_prefix: String,
    /// Minimum length of an OCR digit run considered a barcode
    pub min_fallback_digits: usize,
}

impl Default for BarcodeConfig {
    fn default() -> Self {
        Self {
            country_prefix: "729".to_string(),
            min_fallback_digits: 8,
        }
    }
}

/// Corpus generation and classifier training settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Seed for corpus generation, splitting and the forest
    pub seed: u64,
    /// Held-out fraction for the accuracy diagnostic
    pub test_fraction: f64,
    pub n_estimators: usize,
    pub max_depth: usize,
    /// Distinct rows a node needs before it may split
    pub min_samples_split: usize,
    /// Distinct rows every leaf keeps
    pub min_samples_leaf: usize,
    /// Positive samples emitted per brand alias
    pub samples_per_alias: usize,
    /// Negative samples emitted per control brand
    pub samples_per_control_brand: usize,
    /// Samples in the ambiguous stratum
    pub ambiguous_samples: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            test_fraction: 0.2,
            n_estimators: 100,
            max_depth: 10,
            min_samples_split: 20,
            min_samples_leaf: 10,
            samples_per_alias: 20,
            samples_per_control_brand: 25,
            ambiguous_samples: 100,
        }
    }
}

/// Batch request settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Maximum images per batch; larger batches are rejected whole
    pub max_images: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { max_images: 10 }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Where the active configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    CommandLine(PathBuf),
    Environment(PathBuf),
    UserFile(PathBuf),
    Defaults,
}

impl DetectorConfig {
    /// Load and validate configuration from a TOML file
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Read config {} failed: {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        debug!(path = %path.display(), "Configuration file parsed");
        Ok(config)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: DetectorConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve configuration using CLI → ENV → user file → defaults
    ///
    /// An explicitly named file (CLI or ENV) must exist; the user file is
    /// only used when present.
    pub fn resolve(cli_arg: Option<&Path>) -> Result<(Self, ConfigSource)> {
        // Priority 1: Command-line argument
        if let Some(path) = cli_arg {
            let config = Self::load_from_path(path)?;
            info!(path = %path.display(), "Configuration loaded from command line");
            return Ok((config, ConfigSource::CommandLine(path.to_path_buf())));
        }

        // Priority 2: Environment variable
        if let Ok(value) = std::env::var(CONFIG_ENV_VAR) {
            if !value.trim().is_empty() {
                let path = PathBuf::from(value);
                let config = Self::load_from_path(&path)?;
                info!(path = %path.display(), "Configuration loaded from {}", CONFIG_ENV_VAR);
                return Ok((config, ConfigSource::Environment(path)));
            }
        }

        // Priority 3: User config file
        if let Some(path) = user_config_path() {
            if path.exists() {
                let config = Self::load_from_path(&path)?;
                info!(path = %path.display(), "Configuration loaded from user config");
                return Ok((config, ConfigSource::UserFile(path)));
            }
        }

        // Priority 4: Compiled defaults
        info!("No configuration file found, using defaults");
        Ok((Self::default(), ConfigSource::Defaults))
    }

    /// Reject values that would make the detector misbehave
    pub fn validate(&self) -> Result<()> {
        if self.image.max_file_size_bytes == 0 {
            return Err(Error::Config("image.max_file_size_bytes must be > 0".to_string()));
        }
        if self.image.target_width == 0 || self.image.target_height == 0 {
            return Err(Error::Config("image target dimensions must be > 0".to_string()));
        }
        if !(0.0..=10.0).contains(&self.image.denoise_sigma) {
            return Err(Error::Config(format!(
                "image.denoise_sigma out of range [0, 10]: {}",
                self.image.denoise_sigma
            )));
        }
        if !(0.0..1.0).contains(&self.ocr.min_token_confidence) {
            return Err(Error::Config(format!(
                "ocr.min_token_confidence out of range [0, 1): {}",
                self.ocr.min_token_confidence
            )));
        }
        if self.barcode.country_prefix.is_empty()
            || !self.barcode.country_prefix.chars().all(|c| c.is_ascii_digit())
        {
            return Err(Error::Config(format!(
                "barcode.country_prefix must be digits: {:?}",
                self.barcode.country_prefix
            )));
        }
        if !(self.training.test_fraction > 0.0 && self.training.test_fraction < 1.0) {
            return Err(Error::Config(format!(
                "training.test_fraction out of range (0, 1): {}",
                self.training.test_fraction
            )));
        }
        if self.training.n_estimators == 0 || self.training.max_depth == 0 {
            return Err(Error::Config(
                "training.n_estimators and training.max_depth must be > 0".to_string(),
            ));
        }
        if self.training.min_samples_split < 2 || self.training.min_samples_leaf == 0 {
            return Err(Error::Config(
                "training.min_samples_split must be >= 2 and min_samples_leaf >= 1".to_string(),
            ));
        }
        if self.batch.max_images == 0 {
            return Err(Error::Config("batch.max_images must be > 0".to_string()));
        }
        Ok(())
    }
}

/// Per-user config file location for the platform
fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("brandsight").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = DetectorConfig::default();
        config.validate().unwrap();
        assert_eq!(config.image.max_file_size_bytes, 10 * 1024 * 1024);
        assert_eq!((config.image.target_width, config.image.target_height), (640, 480));
        assert_eq!(config.ocr.min_token_confidence, 0.5);
        assert_eq!(config.training.seed, 42);
        assert_eq!(config.training.n_estimators, 100);
        assert_eq!(config.training.min_samples_split, 20);
        assert_eq!(config.training.min_samples_leaf, 10);
        assert_eq!(config.batch.max_images, 10);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = DetectorConfig::from_toml_str(
            r#"
            [training]
            seed = 7
            n_estimators = 25

            [batch]
            max_images = 4
            "#,
        )
        .unwrap();

        assert_eq!(config.training.seed, 7);
        assert_eq!(config.training.n_estimators, 25);
        assert_eq!(config.training.max_depth, 10);
        assert_eq!(config.batch.max_images, 4);
        assert_eq!(config.ocr, OcrConfig::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = DetectorConfig::from_toml_str("[training]\ntest_fraction = 1.5\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = DetectorConfig::from_toml_str("[batch]\nmax_images = 0\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = DetectorConfig::from_toml_str("[barcode]\ncountry_prefix = \"7a9\"\n")
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let err = DetectorConfig::from_toml_str("[training\nseed = ").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_resolve_prefers_command_line() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[ocr]\nmin_token_confidence = 0.6").unwrap();

        let (config, source) = DetectorConfig::resolve(Some(file.path())).unwrap();
        assert_eq!(config.ocr.min_token_confidence, 0.6);
        assert_eq!(source, ConfigSource::CommandLine(file.path().to_path_buf()));
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let err = DetectorConfig::resolve(Some(Path::new("/nonexistent/brandsight.toml")))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
