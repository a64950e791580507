//! # Brandsight Common Library
//!
//! Shared code for the brandsight detector and its tooling:
//! - Error types
//! - TOML configuration loading and resolution
//! - Evidence schema (feature names, canonical order, evidence vectors)
//! - Brand knowledge base

pub mod brands;
pub mod config;
pub mod error;
pub mod evidence;

pub use brands::{BrandCatalog, BrandRecord, RiskLevel};
pub use config::DetectorConfig;
pub use error::{Error, Result};
pub use evidence::{EvidenceVector, Feature};
