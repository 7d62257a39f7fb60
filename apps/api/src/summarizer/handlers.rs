//! Axum route handlers for the Summarizer job and summary reads.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::AppError;
use crate::models::Summary;
use crate::state::AppState;
use crate::summarizer::SummarizeOutcome;

const DEFAULT_SUMMARY_LIST: u32 = 10;
const MAX_SUMMARY_LIST: u32 = 50;

#[derive(Debug, Serialize)]
pub struct SummarizeResponse {
    pub success: bool,
    pub message: String,
    #[serde(flatten)]
    pub outcome: SummarizeOutcome,
}

#[derive(Debug, Deserialize)]
pub struct SummaryListQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct SummaryListResponse {
    pub success: bool,
    pub count: usize,
    pub data: Vec<Summary>,
}

/// POST /api/v1/jobs/summarize
///
/// Runs one summarizer pass. Answers 409 if a pass is already in progress.
pub async fn handle_summarize(
    State(state): State<AppState>,
) -> Result<Json<SummarizeResponse>, AppError> {
    let _guard = state.locks.summarizer.try_lock().map_err(|_| {
        warn!("Summarizer trigger rejected: a run is already in progress");
        AppError::Conflict("a summarizer run is already in progress".to_string())
    })?;

    let outcome = state.summarizer.run().await?;
    let message = match outcome.processed_count {
        0 => "No new truths to process".to_string(),
        n => format!("Successfully analyzed and summarized {n} new truths"),
    };

    Ok(Json(SummarizeResponse {
        success: true,
        message,
        outcome,
    }))
}

/// GET /api/v1/summaries?limit=
pub async fn handle_list_summaries(
    State(state): State<AppState>,
    Query(params): Query<SummaryListQuery>,
) -> Result<Json<SummaryListResponse>, AppError> {
    let limit = params.limit.unwrap_or(DEFAULT_SUMMARY_LIST);
    if !(1..=MAX_SUMMARY_LIST).contains(&limit) {
        return Err(AppError::Validation(format!(
            "limit must be between 1 and {MAX_SUMMARY_LIST}"
        )));
    }

    let data = state.summaries.latest(limit).await?;
    Ok(Json(SummaryListResponse {
        success: true,
        count: data.len(),
        data,
    }))
}
