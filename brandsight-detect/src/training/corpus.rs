// Synthetic Corpus Generator
//
// Three strata, emitted in fixed order from one seeded RNG:
// 1. positive: one block per (brand, alias) of the catalog
// 2. negative: one block per control brand
// 3. ambiguous: mixed evidence with a noisy label
//
// Same seed and catalog ⇒ identical sample sequence.

use brandsight_common::config::TrainingConfig;
use brandsight_common::{BrandCatalog, EvidenceVector, Feature};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::ops::Range;
use tracing::debug;

/// Provenance of the ambiguous stratum
pub const AMBIGUOUS_PROVENANCE: &str = "unknown";

/// Unaffiliated brands used for the negative stratum
pub const CONTROL_BRANDS: [&str; 16] = [
    "indofood",
    "wings",
    "mayora",
    "garuda",
    "abc",
    "teh botol",
    "aqua",
    "indomie",
    "chitato",
    "tolak angin",
    "kopi kapal api",
    "ultra milk",
    "dancow",
    "good day",
    "silverqueen",
    "top coffee",
];

/// One labelled training example
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingSample {
    pub evidence: EvidenceVector,
    /// True for affiliated
    pub affiliated: bool,
    /// Brand the sample was generated for
    pub provenance: String,
}

/// Flag probabilities and score ranges of one stratum
struct Profile {
    barcode: f64,
    made_in: f64,
    hebrew: f64,
    brand: f64,
    kosher: f64,
    brand_confidence: Range<f64>,
    text_confidence: Range<f64>,
    logo: Range<f64>,
    package: Range<f64>,
    color: Range<f64>,
}

const POSITIVE: Profile = Profile {
    barcode: 0.7,
    made_in: 0.6,
    hebrew: 0.4,
    brand: 1.0,
    kosher: 0.7,
    brand_confidence: 0.7..1.0,
    text_confidence: 0.6..0.9,
    logo: 0.8..1.0,
    package: 0.6..0.9,
    color: 0.5..0.8,
};

const NEGATIVE: Profile = Profile {
    barcode: 0.0,
    made_in: 0.0,
    hebrew: 0.0,
    brand: 0.0,
    kosher: 0.1,
    brand_confidence: 0.6..0.9,
    text_confidence: 0.5..0.8,
    logo: 0.7..0.95,
    package: 0.5..0.8,
    color: 0.4..0.7,
};

const AMBIGUOUS: Profile = Profile {
    barcode: 0.2,
    made_in: 0.1,
    hebrew: 0.1,
    brand: 0.3,
    kosher: 0.4,
    brand_confidence: 0.3..0.7,
    text_confidence: 0.3..0.6,
    logo: 0.4..0.7,
    package: 0.3..0.7,
    color: 0.3..0.6,
};

/// Probability that an ambiguous sample is labelled affiliated
const AMBIGUOUS_POSITIVE_RATE: f64 = 0.4;

pub struct CorpusGenerator<'a> {
    catalog: &'a BrandCatalog,
    seed: u64,
    samples_per_alias: usize,
    samples_per_control_brand: usize,
    ambiguous_samples: usize,
}

impl<'a> CorpusGenerator<'a> {
    pub fn new(catalog: &'a BrandCatalog, config: &TrainingConfig) -> Self {
        Self {
            catalog,
            seed: config.seed,
            samples_per_alias: config.samples_per_alias,
            samples_per_control_brand: config.samples_per_control_brand,
            ambiguous_samples: config.ambiguous_samples,
        }
    }

    /// Number of samples `generate` will emit
    pub fn expected_len(&self) -> usize {
        self.catalog.alias_count() * self.samples_per_alias
            + CONTROL_BRANDS.len() * self.samples_per_control_brand
            + self.ambiguous_samples
    }

    pub fn generate(&self) -> Vec<TrainingSample> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut samples = Vec::with_capacity(self.expected_len());

        for (record, _alias) in self.catalog.aliases() {
            for _ in 0..self.samples_per_alias {
                samples.push(TrainingSample {
                    evidence: draw(&mut rng, &POSITIVE),
                    affiliated: true,
                    provenance: record.key().to_string(),
                });
            }
        }

        for brand in CONTROL_BRANDS {
            for _ in 0..self.samples_per_control_brand {
                samples.push(TrainingSample {
                    evidence: draw(&mut rng, &NEGATIVE),
                    affiliated: false,
                    provenance: brand.to_string(),
                });
            }
        }

        for _ in 0..self.ambiguous_samples {
            let evidence = draw(&mut rng, &AMBIGUOUS);
            samples.push(TrainingSample {
                evidence,
                affiliated: rng.gen_bool(AMBIGUOUS_POSITIVE_RATE),
                provenance: AMBIGUOUS_PROVENANCE.to_string(),
            });
        }

        debug!(
            samples = samples.len(),
            positives = samples.iter().filter(|s| s.affiliated).count(),
            seed = self.seed,
            "Synthetic corpus generated"
        );
        samples
    }
}

fn draw(rng: &mut StdRng, profile: &Profile) -> EvidenceVector {
    let mut evidence = EvidenceVector::new();
    evidence.set(Feature::Barcode729, bernoulli(rng, profile.barcode));
    evidence.set(Feature::MadeInIsraelText, bernoulli(rng, profile.made_in));
    evidence.set(Feature::HebrewText, bernoulli(rng, profile.hebrew));
    evidence.set(Feature::IsraeliBrand, bernoulli(rng, profile.brand));
    evidence.set(Feature::KosherCertification, bernoulli(rng, profile.kosher));
    evidence.set(
        Feature::BrandConfidence,
        rng.gen_range(profile.brand_confidence.clone()),
    );
    evidence.set(
        Feature::TextConfidence,
        rng.gen_range(profile.text_confidence.clone()),
    );
    evidence.set(Feature::LogoConfidence, rng.gen_range(profile.logo.clone()));
    evidence.set(Feature::PackageAnalysis, rng.gen_range(profile.package.clone()));
    evidence.set(Feature::ColorAnalysis, rng.gen_range(profile.color.clone()));
    evidence
}

/// Certain outcomes (0 / 1) do not consume randomness
fn bernoulli(rng: &mut StdRng, p: f64) -> bool {
    if p <= 0.0 {
        false
    } else if p >= 1.0 {
        true
    } else {
        rng.gen_bool(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator(config: &TrainingConfig) -> CorpusGenerator<'static> {
        CorpusGenerator::new(BrandCatalog::builtin(), config)
    }

    #[test]
    fn test_default_corpus_size() {
        let config = TrainingConfig::default();
        let corpus = generator(&config).generate();
        let aliases = BrandCatalog::builtin().alias_count();

        assert_eq!(corpus.len(), aliases * 20 + 16 * 25 + 100);
        assert_eq!(corpus.len(), generator(&config).expected_len());
    }

    #[test]
    fn test_same_seed_same_corpus() {
        let config = TrainingConfig::default();
        assert_eq!(generator(&config).generate(), generator(&config).generate());

        let other = TrainingConfig {
            seed: 7,
            ..TrainingConfig::default()
        };
        assert_ne!(generator(&config).generate(), generator(&other).generate());
    }

    #[test]
    fn test_strata_shapes() {
        let config = TrainingConfig::default();
        let corpus = generator(&config).generate();
        let positives = BrandCatalog::builtin().alias_count() * 20;

        for sample in &corpus[..positives] {
            assert!(sample.affiliated);
            assert!(sample.evidence.flag(Feature::IsraeliBrand));
            assert!((0.7..1.0).contains(&sample.evidence.value(Feature::BrandConfidence)));
            assert_eq!(sample.evidence.len(), Feature::COUNT);
        }

        for sample in &corpus[positives..positives + 400] {
            assert!(!sample.affiliated);
            assert!(!sample.evidence.flag(Feature::Barcode729));
            assert!(!sample.evidence.flag(Feature::MadeInIsraelText));
            assert!(!sample.evidence.flag(Feature::HebrewText));
            assert!(!sample.evidence.flag(Feature::IsraeliBrand));
            assert!(CONTROL_BRANDS.contains(&sample.provenance.as_str()));
        }

        for sample in &corpus[positives + 400..] {
            assert_eq!(sample.provenance, AMBIGUOUS_PROVENANCE);
            assert!((0.3..0.6).contains(&sample.evidence.value(Feature::ColorAnalysis)));
        }
    }

    #[test]
    fn test_positive_provenance_follows_catalog_order() {
        let config = TrainingConfig {
            samples_per_alias: 1,
            ..TrainingConfig::default()
        };
        let corpus = generator(&config).generate();
        let keys: Vec<&str> = BrandCatalog::builtin()
            .aliases()
            .map(|(record, _)| record.key())
            .collect();
        let provenance: Vec<&str> = corpus[..keys.len()]
            .iter()
            .map(|s| s.provenance.as_str())
            .collect();
        assert_eq!(provenance, keys);
    }
}
