use std::sync::Arc;

use tokio::sync::Mutex;

use crate::store::{RawEntryStore, SummaryStore};
use crate::summarizer::Summarizer;
use crate::wisdom::WisdomPublisher;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// `user_truths` only; backs the dashboard reads, never the jobs.
    pub truths: Arc<dyn RawEntryStore>,
    pub summaries: Arc<dyn SummaryStore>,
    pub summarizer: Arc<Summarizer>,
    pub wisdom: Arc<WisdomPublisher>,
    /// Single-writer guards: at most one run of each job per process.
    pub locks: Arc<JobLocks>,
}

#[derive(Default)]
pub struct JobLocks {
    pub summarizer: Mutex<()>,
    pub wisdom: Mutex<()>,
}
