use std::future::Future;
use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm_client::LlmError;
use crate::publishing::PublishError;
use crate::store::StoreError;

/// Failure taxonomy shared by the summarizer and wisdom publisher jobs.
#[derive(Debug, Error)]
pub enum JobError {
    /// A required capability is not configured. Fatal; retrying will not help.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A store or capability call failed or timed out. Nothing was committed
    /// by the failing step; safe to retry with backoff.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// The analysis capability answered with something that is not a valid
    /// summary payload. Retrying the same batch will likely reproduce it.
    #[error("Analysis error: {message}")]
    Analysis { message: String, excerpt: String },

    /// No summaries and no entries to work from.
    #[error("Insufficient data: no summaries or entries available")]
    InsufficientData,

    /// The posting capability rejected the message. Never retried in-run.
    #[error("Publish error: {0}")]
    Publish(String),
}

impl JobError {
    pub fn retryable(&self) -> bool {
        matches!(self, JobError::Upstream(_))
    }

    pub fn code(&self) -> &'static str {
        match self {
            JobError::Configuration(_) => "CONFIGURATION_ERROR",
            JobError::Upstream(_) => "UPSTREAM_ERROR",
            JobError::Analysis { .. } => "ANALYSIS_ERROR",
            JobError::InsufficientData => "INSUFFICIENT_DATA",
            JobError::Publish(_) => "PUBLISH_ERROR",
        }
    }
}

/// Runs one store or capability call under `limit`; expiry is an upstream failure.
pub async fn with_timeout<T, E>(
    step: &str,
    limit: Duration,
    call: impl Future<Output = Result<T, E>>,
) -> Result<T, JobError>
where
    JobError: From<E>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result.map_err(JobError::from),
        Err(_) => {
            tracing::warn!("{step} timed out after {}ms", limit.as_millis());
            Err(JobError::Upstream(format!(
                "{step} timed out after {}ms",
                limit.as_millis()
            )))
        }
    }
}

impl From<StoreError> for JobError {
    fn from(e: StoreError) -> Self {
        JobError::Upstream(e.to_string())
    }
}

impl From<LlmError> for JobError {
    fn from(e: LlmError) -> Self {
        if e.is_permanent() {
            JobError::Configuration(format!("model provider rejected the request: {e}"))
        } else {
            JobError::Upstream(e.to_string())
        }
    }
}

impl From<PublishError> for JobError {
    fn from(e: PublishError) -> Self {
        JobError::Publish(e.to_string())
    }
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Job(#[from] JobError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String, bool) {
        match self {
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone(), false)
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone(), true),
            AppError::Job(e) => {
                let status = match e {
                    JobError::Configuration(_) => StatusCode::SERVICE_UNAVAILABLE,
                    JobError::Upstream(_) | JobError::Publish(_) => StatusCode::BAD_GATEWAY,
                    JobError::Analysis { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                    // Handlers answer this as a no-op success; reaching here is a fallback.
                    JobError::InsufficientData => StatusCode::OK,
                };
                (status, e.code(), e.to_string(), e.retryable())
            }
            AppError::Store(e) => {
                tracing::error!("Store error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                    true,
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                    false,
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, retryable) = self.parts();

        let body = Json(json!({
            "success": false,
            "error": {
                "code": code,
                "message": message,
                "retryable": retryable
            }
        }));

        (status, body).into_response()
    }
}
