//! Axum route handler for the Wisdom Publisher job.

use axum::{extract::State, Json};
use serde::Serialize;
use tracing::{info, warn};

use crate::errors::{AppError, JobError};
use crate::state::AppState;
use crate::wisdom::PublishOutcome;

#[derive(Debug, Serialize)]
pub struct PublishWisdomResponse {
    pub success: bool,
    pub published: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(flatten)]
    pub outcome: Option<PublishOutcome>,
}

/// POST /api/v1/jobs/publish-wisdom
///
/// Generates and posts one wisdom statement. With nothing to work from yet
/// the run is a successful no-op with `published: false`.
pub async fn handle_publish_wisdom(
    State(state): State<AppState>,
) -> Result<Json<PublishWisdomResponse>, AppError> {
    let _guard = state.locks.wisdom.try_lock().map_err(|_| {
        warn!("Wisdom trigger rejected: a run is already in progress");
        AppError::Conflict("a wisdom publisher run is already in progress".to_string())
    })?;

    match state.wisdom.run().await {
        Ok(outcome) => Ok(Json(PublishWisdomResponse {
            success: true,
            published: true,
            reason: None,
            outcome: Some(outcome),
        })),
        Err(JobError::InsufficientData) => {
            info!("Wisdom publisher skipped: no summaries or entries available");
            Ok(Json(PublishWisdomResponse {
                success: true,
                published: false,
                reason: Some("No summaries or entries available yet".to_string()),
                outcome: None,
            }))
        }
        Err(e) => Err(e.into()),
    }
}
