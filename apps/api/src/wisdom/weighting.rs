//! Volume weighting for historical summaries.
//!
//! `weight = sqrt(average_volume / truth_count)`: a summary built from a burst
//! of entries is pulled below 1.0, a summary from a quiet window is lifted
//! above it, and a summary of exactly average volume keeps weight 1.0.
//!
//! `truth_count > 0` holds for every summary reaching this module: the
//! summarizer never persists an empty batch and row conversion rejects
//! non-positive counts.

use serde::Serialize;
use uuid::Uuid;

use crate::models::Summary;

/// A summary paired with its synthesis weight. Built per run, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedSummary {
    pub summary: Summary,
    pub weight: f64,
}

/// Compact per-summary weight report for job output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryWeight {
    pub summary_id: Uuid,
    pub truth_count: u32,
    pub weight: f64,
}

impl From<&WeightedSummary> for SummaryWeight {
    fn from(w: &WeightedSummary) -> Self {
        Self {
            summary_id: w.summary.id,
            truth_count: w.summary.truth_count,
            weight: w.weight,
        }
    }
}

/// Mean `truth_count` across `summaries`; None when empty.
pub fn average_volume(summaries: &[Summary]) -> Option<f64> {
    if summaries.is_empty() {
        return None;
    }
    let total: f64 = summaries.iter().map(|s| f64::from(s.truth_count)).sum();
    Some(total / summaries.len() as f64)
}

pub fn volume_weight(average_volume: f64, truth_count: u32) -> f64 {
    debug_assert!(truth_count > 0, "summaries always cover at least one entry");
    (average_volume / f64::from(truth_count)).sqrt()
}

/// Weighs every summary against the mean volume of the whole set. Order is preserved.
pub fn weigh(summaries: Vec<Summary>) -> Vec<WeightedSummary> {
    let Some(average) = average_volume(&summaries) else {
        return Vec::new();
    };
    summaries
        .into_iter()
        .map(|summary| {
            let weight = volume_weight(average, summary.truth_count);
            WeightedSummary { summary, weight }
        })
        .collect()
}
