//! Truth Summarizer — folds every entry newer than the cursor into one summary.
//!
//! Flow: read cursor → fetch entries after it → analyze → parse → conditional insert.
//!
//! The cursor is the `period_end` of the newest summary, so a completed run is
//! the only thing that advances it. A run that fails anywhere before the
//! insert leaves no trace and the next run retries the same batch.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::errors::{with_timeout, JobError};
use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;
use crate::llm_client::{strip_json_fences, Completion, TextGenerator};
use crate::models::{Cursor, NewSummary, RawEntry, Sentiment, SummaryPayload};
use crate::store::{EntryQuery, RawEntryStore, SummaryStore};
use crate::summarizer::prompts::{render_entries, ANALYSIS_PROMPT_TEMPLATE, ANALYSIS_SYSTEM};

pub mod handlers;
pub mod prompts;

const ANALYSIS_TEMPERATURE: f32 = 0.2;
const ANALYSIS_MAX_TOKENS: u32 = 1500;
const EXCERPT_CHARS: usize = 200;
const TONE_PREVIEW_CHARS: usize = 100;

#[derive(Debug, Clone, Serialize)]
pub struct Period {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisPreview {
    pub themes_count: usize,
    pub overall_sentiment: Sentiment,
    pub emotional_tone: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SummarizeOutcome {
    pub processed_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
    pub last_processed_at: Cursor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_preview: Option<AnalysisPreview>,
}

impl SummarizeOutcome {
    fn caught_up(cursor: Cursor) -> Self {
        Self {
            processed_count: 0,
            summary_id: None,
            period: None,
            last_processed_at: cursor,
            analysis_preview: None,
        }
    }
}

pub struct Summarizer {
    entries: Arc<dyn RawEntryStore>,
    summaries: Arc<dyn SummaryStore>,
    analyzer: Option<Arc<dyn TextGenerator>>,
    step_timeout: Duration,
}

impl Summarizer {
    pub fn new(
        entries: Arc<dyn RawEntryStore>,
        summaries: Arc<dyn SummaryStore>,
        analyzer: Option<Arc<dyn TextGenerator>>,
        step_timeout: Duration,
    ) -> Self {
        Self {
            entries,
            summaries,
            analyzer,
            step_timeout,
        }
    }

    pub async fn run(&self) -> Result<SummarizeOutcome, JobError> {
        let analyzer = self.analyzer.as_ref().ok_or_else(|| {
            JobError::Configuration(
                "text-analysis capability is not configured (set OPENAI_API_KEY)".to_string(),
            )
        })?;
        let timeout = self.step_timeout;

        // Step 1: Cursor from the newest summary
        let latest = with_timeout("summary cursor read", timeout, self.summaries.latest(1)).await?;
        let cursor = Cursor::from_latest(latest.first());
        info!("Truth summarizer starting from cursor {cursor}");

        // Step 2: Everything strictly after the cursor, oldest first
        let fetched = with_timeout(
            "entry fetch",
            timeout,
            self.entries.query(EntryQuery::after_cursor(cursor)),
        )
        .await?;
        let batch = collect_batch(cursor, fetched);

        // Step 3: Nothing new is a successful no-op
        let (period_start, period_end) = match (batch.first(), batch.last()) {
            (Some(first), Some(last)) => (first.created_at, last.created_at),
            _ => {
                info!("No new entries after {cursor}; all caught up");
                return Ok(SummarizeOutcome::caught_up(cursor));
            }
        };
        info!(
            "Found {} new entries to analyze ({} to {})",
            batch.len(),
            period_start,
            period_end
        );

        // Step 4: Analyze
        let prompt = build_analysis_prompt(&batch);
        let raw = with_timeout(
            "analysis",
            timeout,
            analyzer.generate(Completion {
                system: ANALYSIS_SYSTEM,
                prompt: &prompt,
                temperature: Some(ANALYSIS_TEMPERATURE),
                max_tokens: Some(ANALYSIS_MAX_TOKENS),
            }),
        )
        .await?;

        // Step 5: Parse, or fail without writing
        let payload = parse_analysis(&raw)?;

        // Step 6: Persist; period_end becomes the next cursor
        let processed_count = batch.len();
        let truth_count = u32::try_from(processed_count).map_err(|_| {
            JobError::Upstream(format!("batch of {processed_count} entries is too large"))
        })?;
        let new_summary = NewSummary {
            period_start,
            period_end,
            truth_count,
            payload,
        };
        let summary = with_timeout(
            "summary insert",
            timeout,
            self.summaries.insert(new_summary, cursor),
        )
        .await?;

        info!(
            "Summarized {} entries into summary {} (sentiment: {:?})",
            processed_count, summary.id, summary.payload.overall_sentiment
        );

        Ok(SummarizeOutcome {
            processed_count,
            summary_id: Some(summary.id),
            period: Some(Period {
                start: summary.period_start,
                end: summary.period_end,
            }),
            last_processed_at: Cursor::at(summary.period_end),
            analysis_preview: Some(preview(&summary.payload)),
        })
    }
}

/// Keeps only entries strictly after `cursor`, oldest first.
fn collect_batch(cursor: Cursor, fetched: Vec<RawEntry>) -> Vec<RawEntry> {
    let fetched_count = fetched.len();
    let mut batch: Vec<RawEntry> = fetched
        .into_iter()
        .filter(|e| cursor.admits(e.created_at))
        .collect();
    if batch.len() != fetched_count {
        warn!(
            "Entry store returned {} entries at or before cursor {cursor}; dropped",
            fetched_count - batch.len()
        );
    }
    batch.sort_by_key(|e| e.created_at);
    batch
}

fn build_analysis_prompt(batch: &[RawEntry]) -> String {
    ANALYSIS_PROMPT_TEMPLATE
        .replace("{count}", &batch.len().to_string())
        .replace("{json_only_instruction}", JSON_ONLY_INSTRUCTION)
        .replace("{entries}", &render_entries(batch))
}

/// Parses the analysis response, tolerating code fences around the JSON.
pub fn parse_analysis(raw: &str) -> Result<SummaryPayload, JobError> {
    let cleaned = strip_json_fences(raw);
    serde_json::from_str(cleaned).map_err(|e| {
        let excerpt: String = raw.chars().take(EXCERPT_CHARS).collect();
        error!("Analysis response did not parse as a summary: {e}; response starts: {excerpt:?}");
        JobError::Analysis {
            message: format!("analysis response is not a valid summary payload: {e}"),
            excerpt,
        }
    })
}

fn preview(payload: &SummaryPayload) -> AnalysisPreview {
    let mut emotional_tone: String = payload.emotional_tone.chars().take(TONE_PREVIEW_CHARS).collect();
    if payload.emotional_tone.chars().count() > TONE_PREVIEW_CHARS {
        emotional_tone.push_str("...");
    }
    AnalysisPreview {
        themes_count: payload.themes.len(),
        overall_sentiment: payload.overall_sentiment,
        emotional_tone,
    }
}
