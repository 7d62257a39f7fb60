mod config;
mod db;
mod errors;
mod llm_client;
mod models;
mod publishing;
mod routes;
mod state;
mod stats;
mod store;
mod summarizer;
#[cfg(test)]
mod testing;
mod wisdom;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, LlmConfig};
use crate::db::create_pool;
use crate::llm_client::{ChatClient, TextGenerator};
use crate::publishing::{Publisher, XClient};
use crate::routes::build_router;
use crate::state::{AppState, JobLocks};
use crate::store::{PgRawEntryStore, PgSummaryStore, RawEntryStore, SummaryStore};
use crate::summarizer::Summarizer;
use crate::wisdom::{WisdomPublisher, WisdomSettings};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing DATABASE_URL or malformed values)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Truth API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    let entries: Arc<dyn RawEntryStore> =
        Arc::new(PgRawEntryStore::new(db.clone(), config.include_wisdoms));
    let truths: Arc<dyn RawEntryStore> = Arc::new(PgRawEntryStore::truths_only(db.clone()));
    let summaries: Arc<dyn SummaryStore> = Arc::new(PgSummaryStore::new(db));
    info!(
        "Entry stream: truths{}",
        if config.include_wisdoms { " + wisdoms" } else { " only" }
    );

    // Initialize capabilities; a missing one disables only the job that needs it
    let analyzer = chat_client("analysis", config.analysis.as_ref())?;
    let generator = chat_client("generation", config.generation.as_ref())?;
    let poster: Option<Arc<dyn Publisher>> = match config.x_credentials.clone() {
        Some(credentials) => {
            info!("X posting client initialized");
            let client = XClient::new(credentials).context("failed to build X client")?;
            Some(Arc::new(client) as Arc<dyn Publisher>)
        }
        None => {
            warn!("X credentials not set; wisdom publishing is disabled");
            None
        }
    };

    let summarizer = Summarizer::new(
        entries.clone(),
        summaries.clone(),
        analyzer,
        config.step_timeout,
    );
    let wisdom = WisdomPublisher::new(
        summaries.clone(),
        entries.clone(),
        generator,
        poster,
        WisdomSettings {
            summary_window: config.summary_window,
            fresh_entries: config.fresh_entries,
            step_timeout: config.step_timeout,
        },
    );
    info!(
        "Wisdom publisher: {} summaries + {} fresh entries per run",
        config.summary_window, config.fresh_entries
    );

    // Build app state
    let state = AppState {
        truths,
        summaries,
        summarizer: Arc::new(summarizer),
        wisdom: Arc::new(wisdom),
        locks: Arc::new(JobLocks::default()),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn chat_client(role: &str, config: Option<&LlmConfig>) -> Result<Option<Arc<dyn TextGenerator>>> {
    let Some(config) = config else {
        warn!("No API key for the {role} model; jobs needing it will report a configuration error");
        return Ok(None);
    };
    let client = ChatClient::new(&config.base_url, &config.api_key, &config.model)
        .with_context(|| format!("failed to build {role} client"))?;
    info!("LLM {role} client initialized (model: {})", client.model());
    Ok(Some(Arc::new(client) as Arc<dyn TextGenerator>))
}
