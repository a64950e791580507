//! brandsight - package affiliation detector CLI
//!
//! Trains the detector at startup, then runs one command and prints its
//! result as pretty JSON on stdout. Logs go to stderr.
//!
//! Configuration: `--config` → `BRANDSIGHT_CONFIG` → user config file →
//! defaults. `RUST_LOG` overrides `logging.level`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use brandsight_common::evidence::EvidenceValue;
use brandsight_common::{DetectorConfig, EvidenceVector};
use brandsight_detect::{Detector, ImageUpload};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for brandsight
#[derive(Parser, Debug)]
#[command(name = "brandsight")]
#[command(about = "Multi-signal package affiliation detector")]
#[command(version)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the training seed
    #[arg(long, env = "BRANDSIGHT_SEED")]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze one package image
    Analyze {
        image: PathBuf,
    },
    /// Analyze several package images (at most batch.max_images)
    Batch {
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },
    /// Score an evidence vector given as name=value pairs
    Evaluate {
        #[arg(required = true, value_parser = parse_evidence_pair)]
        evidence: Vec<(String, EvidenceValue)>,

        /// Detected brand alias to enrich the result with
        #[arg(long)]
        brand: Option<String>,
    },
    /// Show the trained model description
    ModelInfo,
    /// Dump the brand catalog
    Brands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (mut config, source) = DetectorConfig::resolve(args.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(seed) = args.seed {
        config.training.seed = seed;
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "Starting brandsight");
    info!(source = ?source, seed = config.training.seed, "Configuration resolved");

    let detector = Detector::standard(config).context("Failed to build detector")?;

    if let Command::Brands = args.command {
        return print_json(detector.brands_database());
    }

    detector
        .initialize()
        .await
        .context("Detector training failed")?;

    match args.command {
        Command::Analyze { image } => {
            let upload = read_upload(&image)?;
            let result = detector
                .analyze(&upload)
                .await
                .with_context(|| format!("Failed to analyze {}", image.display()))?;
            print_json(&result)
        }
        Command::Batch { images } => {
            let uploads = images
                .iter()
                .map(|path| read_upload(path))
                .collect::<Result<Vec<_>>>()?;
            let report = detector.predict_batch(&uploads).await?;
            print_json(&report)
        }
        Command::Evaluate { evidence, brand } => {
            let vector = EvidenceVector::from_pairs(evidence).context("Invalid evidence")?;
            let result = detector.score_evidence(&vector, brand.as_deref())?;
            print_json(&result)
        }
        Command::ModelInfo => print_json(&detector.model_info()),
        Command::Brands => print_json(detector.brands_database()),
    }
}

/// Read a file and sniff its content type from magic bytes
fn read_upload(path: &Path) -> Result<ImageUpload> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let content_type = infer::get(&bytes).map(|kind| kind.mime_type().to_string());
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    Ok(ImageUpload::new(filename, content_type, bytes))
}

/// Parse `name=value`; value is `true`, `false` or a number
fn parse_evidence_pair(raw: &str) -> Result<(String, EvidenceValue), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got {:?}", raw))?;
    let value = match value.trim().to_ascii_lowercase().as_str() {
        "true" => EvidenceValue::Flag(true),
        "false" => EvidenceValue::Flag(false),
        number => EvidenceValue::Score(
            number
                .parse::<f64>()
                .map_err(|e| format!("{}: {}", name.trim(), e))?,
        ),
    };
    Ok((name.trim().to_string(), value))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}
