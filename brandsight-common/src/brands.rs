//! Brand knowledge base
//!
//! Static catalog mapping brand keys and product aliases to category and risk
//! metadata. Built once on first access and never mutated afterwards; an
//! updated catalog requires a new process.
//!
//! Iteration order is the declaration order below. The brand-match signal
//! relies on it as its tie-break (first alias hit wins).

use once_cell::sync::Lazy;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Built-in catalog singleton
static BUILTIN: Lazy<BrandCatalog> = Lazy::new(|| BrandCatalog::new(builtin_records()));

/// Risk level tag of a brand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Medium => write!(f, "medium"),
            RiskLevel::High => write!(f, "high"),
        }
    }
}

/// One brand with its product aliases
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrandRecord {
    key: String,
    products: Vec<String>,
    category: String,
    risk_level: RiskLevel,
}

impl BrandRecord {
    /// Create a record; key and aliases are stored lower-cased
    pub fn new<I, S>(key: &str, products: I, category: &str, risk_level: RiskLevel) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            key: key.trim().to_lowercase(),
            products: products
                .into_iter()
                .map(|p| p.as_ref().trim().to_lowercase())
                .collect(),
            category: category.to_string(),
            risk_level,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Product aliases in declaration order
    pub fn products(&self) -> &[String] {
        &self.products
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn risk_level(&self) -> RiskLevel {
        self.risk_level
    }

    /// True when `text` (already normalized) is the brand key or one of its aliases
    fn matches(&self, normalized: &str) -> bool {
        self.key == normalized || self.products.iter().any(|p| p == normalized)
    }
}

/// Serialized value of a catalog entry
#[derive(Serialize)]
struct BrandEntry<'a> {
    products: &'a [String],
    category: &'a str,
    risk_level: RiskLevel,
}

/// Immutable brand catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrandCatalog {
    records: Vec<BrandRecord>,
}

impl BrandCatalog {
    /// Build a catalog from records (declaration order is kept)
    pub fn new(records: Vec<BrandRecord>) -> Self {
        Self { records }
    }

    /// Built-in catalog shared by the whole process
    pub fn builtin() -> &'static BrandCatalog {
        &BUILTIN
    }

    /// Record for a brand key (case-insensitive)
    pub fn get(&self, brand_key: &str) -> Option<&BrandRecord> {
        let wanted = brand_key.trim().to_lowercase();
        self.records.iter().find(|r| r.key == wanted)
    }

    /// Product aliases of a brand
    pub fn products_of(&self, brand_key: &str) -> Option<&[String]> {
        self.get(brand_key).map(|r| r.products())
    }

    /// Find the record owning an alias or brand key (case-insensitive)
    pub fn lookup_by_alias(&self, text: &str) -> Option<&BrandRecord> {
        let normalized = text.trim().to_lowercase();
        if normalized.is_empty() {
            return None;
        }
        self.records.iter().find(|r| r.matches(&normalized))
    }

    /// All records in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &BrandRecord> {
        self.records.iter()
    }

    /// Every (record, alias) pair in declaration order
    pub fn aliases(&self) -> impl Iterator<Item = (&BrandRecord, &str)> {
        self.records
            .iter()
            .flat_map(|r| r.products.iter().map(move |p| (r, p.as_str())))
    }

    /// Number of brands
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Total number of product aliases
    pub fn alias_count(&self) -> usize {
        self.records.iter().map(|r| r.products.len()).sum()
    }
}

impl Serialize for BrandCatalog {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.records.len()))?;
        for record in &self.records {
            map.serialize_entry(
                &record.key,
                &BrandEntry {
                    products: &record.products,
                    category: &record.category,
                    risk_level: record.risk_level,
                },
            )?;
        }
        map.end()
    }
}

fn builtin_records() -> Vec<BrandRecord> {
    vec![
        BrandRecord::new(
            "unilever",
            [
                "dove", "rexona", "lux", "vaseline", "ponds", "lifebuoy", "clear", "sunsilk",
                "tresemme", "rinso", "molto", "sunlight", "pepsodent", "close up", "blue band",
                "royco", "bango", "sariwangi",
            ],
            "consumer_goods",
            RiskLevel::High,
        ),
        BrandRecord::new(
            "nestle",
            [
                "nescafe", "milo", "kitkat", "maggi", "dancow", "nestum", "pure life",
                "carnation", "smarties", "aero", "crunch",
            ],
            "food_beverage",
            RiskLevel::High,
        ),
        BrandRecord::new(
            "procter_gamble",
            [
                "pampers", "pantene", "head shoulders", "rejoice", "oral-b", "gillette",
                "always", "downy", "ambi pur", "tide", "ariel",
            ],
            "personal_care",
            RiskLevel::High,
        ),
        BrandRecord::new(
            "coca_cola",
            ["coca cola", "sprite", "fanta", "minute maid", "aquarius", "ades"],
            "beverages",
            RiskLevel::High,
        ),
        BrandRecord::new(
            "pepsico",
            ["pepsi", "lays", "cheetos", "quaker", "gatorade", "tropicana"],
            "food_beverage",
            RiskLevel::High,
        ),
        BrandRecord::new(
            "loreal",
            [
                "l'oreal paris", "garnier", "maybelline", "nyx", "vichy", "la roche-posay",
                "kerastase", "matrix",
            ],
            "cosmetics",
            RiskLevel::High,
        ),
        BrandRecord::new(
            "estee_lauder",
            [
                "estee lauder", "mac", "clinique", "bobbi brown", "origins", "aveda",
                "too faced",
            ],
            "cosmetics",
            RiskLevel::High,
        ),
        BrandRecord::new(
            "kraft_heinz",
            ["heinz", "kraft", "abc", "salsa"],
            "food",
            RiskLevel::Medium,
        ),
        BrandRecord::new(
            "mcdonalds",
            ["mcdonalds", "mcd"],
            "fast_food",
            RiskLevel::High,
        ),
        BrandRecord::new("starbucks", ["starbucks"], "beverages", RiskLevel::Medium),
    ]
}
