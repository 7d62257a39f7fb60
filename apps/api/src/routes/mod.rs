pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;
use crate::{stats, summarizer, wisdom};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Jobs
        .route(
            "/api/v1/jobs/summarize",
            post(summarizer::handlers::handle_summarize),
        )
        .route(
            "/api/v1/jobs/publish-wisdom",
            post(wisdom::handlers::handle_publish_wisdom),
        )
        // Reads
        .route(
            "/api/v1/summaries",
            get(summarizer::handlers::handle_list_summaries),
        )
        .route("/api/v1/truths", get(stats::handlers::handle_list_truths))
        .route("/api/v1/stats", get(stats::handlers::handle_stats))
        .with_state(state)
}
