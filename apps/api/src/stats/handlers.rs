use axum::{extract::State, Json};
use chrono::Utc;
use serde::Serialize;

use crate::errors::AppError;
use crate::models::RawEntry;
use crate::state::AppState;
use crate::stats::{compute_dashboard_stats, DashboardStats};
use crate::store::EntryQuery;

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub success: bool,
    pub data: DashboardStats,
}

#[derive(Debug, Serialize)]
pub struct EntryListResponse {
    pub success: bool,
    pub count: usize,
    pub data: Vec<RawEntry>,
}

/// GET /api/v1/stats
pub async fn handle_stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, AppError> {
    let data = compute_dashboard_stats(state.truths.as_ref(), Utc::now()).await?;
    Ok(Json(StatsResponse {
        success: true,
        data,
    }))
}

/// GET /api/v1/truths
/// Every truth, newest first. Wisdom submissions are not listed here.
pub async fn handle_list_truths(
    State(state): State<AppState>,
) -> Result<Json<EntryListResponse>, AppError> {
    let data = state.truths.query(EntryQuery::all_newest_first()).await?;
    Ok(Json(EntryListResponse {
        success: true,
        count: data.len(),
        data,
    }))
}
