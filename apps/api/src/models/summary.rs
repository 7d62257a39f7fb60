use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::store::StoreError;

#[derive(Debug, Clone, FromRow)]
pub struct SummaryRow {
    pub id: Uuid,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub last_processed_at: DateTime<Utc>,
    pub summary_json: Value,
    pub truth_count: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    #[serde(alias = "Positive")]
    Positive,
    #[serde(alias = "Negative")]
    Negative,
    #[serde(alias = "Neutral")]
    Neutral,
    #[serde(alias = "Mixed")]
    Mixed,
}

/// Structured thematic analysis of one batch of entries.
/// Every field is required; empty lists are accepted as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryPayload {
    pub themes: Vec<String>,
    pub emotional_tone: String,
    pub key_patterns: Vec<String>,
    pub dominant_concerns: Vec<String>,
    pub insights: Vec<String>,
    pub overall_sentiment: Sentiment,
}

/// A persisted aggregate over the half-open window `(previous cursor, period_end]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub id: Uuid,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub payload: SummaryPayload,
    /// Number of entries folded in. Always > 0.
    pub truth_count: u32,
    pub created_at: DateTime<Utc>,
}

/// Insert shape for a summary; the store assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSummary {
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub truth_count: u32,
    pub payload: SummaryPayload,
}

impl TryFrom<SummaryRow> for Summary {
    type Error = StoreError;

    fn try_from(row: SummaryRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let truth_count = u32::try_from(row.truth_count)
            .ok()
            .filter(|count| *count > 0)
            .ok_or_else(|| {
                StoreError::MalformedRow(format!(
                    "summary {id}: truth_count must be positive, got {}",
                    row.truth_count
                ))
            })?;

        if row.period_start > row.period_end {
            return Err(StoreError::MalformedRow(format!(
                "summary {id}: period_start {} is after period_end {}",
                row.period_start, row.period_end
            )));
        }

        let payload: SummaryPayload = serde_json::from_value(row.summary_json).map_err(|e| {
            StoreError::MalformedRow(format!("summary {id}: summary_json is invalid: {e}"))
        })?;

        Ok(Summary {
            id,
            period_start: row.period_start,
            period_end: row.period_end,
            payload,
            truth_count,
            created_at: row.created_at,
        })
    }
}
