//! Weighted scoring, verdict thresholds and narrative tags

mod aggregator;
pub mod rules;
pub mod templates;

pub use aggregator::{component_scores, AggregationError, ScoreAggregator};
