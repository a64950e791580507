// Fusion Module - Evidence Aggregation
//
// Extractor fragments → one EvidenceVector plus side observations.

pub mod aggregator;

pub use aggregator::{aggregate, AggregatedEvidence};
