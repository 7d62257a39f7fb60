//! In-memory capability fakes shared by the job and route tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use uuid::Uuid;

use crate::llm_client::{Completion, LlmError, TextGenerator};
use crate::models::{
    Cursor, EntryBody, NewSummary, RawEntry, Sentiment, Summary, SummaryPayload,
};
use crate::publishing::{PublishError, PublishReceipt, Publisher};
use crate::store::{EntryQuery, RawEntryStore, SortOrder, StoreError, SummaryStore};

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, 1, 0, 0, 0).unwrap()
}

pub fn truth_at(minutes: i64, answer: &str) -> RawEntry {
    RawEntry {
        id: Uuid::new_v4(),
        author: format!("user{minutes}"),
        body: EntryBody::Truth {
            first_question: "What are you holding on to?".to_string(),
            first_answer: answer.to_string(),
            second_question: "What would letting go feel like?".to_string(),
            second_answer: "Lighter, and a little scary".to_string(),
            generated_truth: "You carry more than you need to".to_string(),
        },
        created_at: base_time() + Duration::minutes(minutes),
    }
}

pub fn wisdom_at(minutes: i64, text: &str) -> RawEntry {
    RawEntry {
        id: Uuid::new_v4(),
        author: format!("sage{minutes}"),
        body: EntryBody::Wisdom {
            text: text.to_string(),
        },
        created_at: base_time() + Duration::minutes(minutes),
    }
}

pub fn payload(theme: &str) -> SummaryPayload {
    SummaryPayload {
        themes: vec![theme.to_string()],
        emotional_tone: format!("reflective about {theme}"),
        key_patterns: vec![format!("returning to {theme}")],
        dominant_concerns: vec!["time".to_string()],
        insights: vec![format!("{theme} matters more than it seems")],
        overall_sentiment: Sentiment::Mixed,
    }
}

pub fn payload_json(theme: &str) -> String {
    serde_json::to_string(&payload(theme)).unwrap()
}

pub fn summary_with_count(hours: i64, truth_count: u32, theme: &str) -> Summary {
    let end = base_time() + Duration::hours(hours);
    Summary {
        id: Uuid::new_v4(),
        period_start: end - Duration::minutes(30),
        period_end: end,
        payload: payload(theme),
        truth_count,
        created_at: end,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Stores
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeEntryStore {
    pub entries: Mutex<Vec<RawEntry>>,
    pub queries: Mutex<Vec<EntryQuery>>,
    pub fail: bool,
}

impl FakeEntryStore {
    pub fn with(entries: Vec<RawEntry>) -> Self {
        Self {
            entries: Mutex::new(entries),
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn push(&self, entry: RawEntry) {
        self.entries.lock().unwrap().push(entry);
    }
}

#[async_trait]
impl RawEntryStore for FakeEntryStore {
    async fn query(&self, query: EntryQuery) -> Result<Vec<RawEntry>, StoreError> {
        self.queries.lock().unwrap().push(query);
        if self.fail {
            return Err(StoreError::MalformedRow("injected failure".to_string()));
        }
        let mut matched: Vec<RawEntry> = self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| query.after.map_or(true, |after| e.created_at > after))
            .cloned()
            .collect();
        matched.sort_by_key(|e| e.created_at);
        if query.order == SortOrder::Desc {
            matched.reverse();
        }
        if let Some(limit) = query.limit {
            matched.truncate(limit as usize);
        }
        Ok(matched)
    }

    async fn count(
        &self,
        from: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<u64, StoreError> {
        if self.fail {
            return Err(StoreError::MalformedRow("injected failure".to_string()));
        }
        let count = self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| from.map_or(true, |f| e.created_at >= f))
            .filter(|e| until.map_or(true, |u| e.created_at < u))
            .count();
        Ok(count as u64)
    }
}

#[derive(Default)]
pub struct FakeSummaryStore {
    pub summaries: Mutex<Vec<Summary>>,
    pub insert_calls: AtomicUsize,
    pub fail_insert: bool,
    /// Committed by "another writer" right after the first `latest` read.
    pub rival: Mutex<Option<Summary>>,
}

impl FakeSummaryStore {
    pub fn with(summaries: Vec<Summary>) -> Self {
        Self {
            summaries: Mutex::new(summaries),
            ..Default::default()
        }
    }

    pub fn rejecting_inserts() -> Self {
        Self {
            fail_insert: true,
            ..Default::default()
        }
    }

    pub fn racing(rival: Summary) -> Self {
        Self {
            rival: Mutex::new(Some(rival)),
            ..Default::default()
        }
    }

    pub fn inserts(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }

    pub fn all(&self) -> Vec<Summary> {
        self.summaries.lock().unwrap().clone()
    }

    fn newest(summaries: &[Summary]) -> Option<&Summary> {
        summaries
            .iter()
            .max_by_key(|s| (s.created_at, s.period_end))
    }
}

#[async_trait]
impl SummaryStore for FakeSummaryStore {
    async fn latest(&self, limit: u32) -> Result<Vec<Summary>, StoreError> {
        let mut all = self.summaries.lock().unwrap().clone();
        all.sort_by_key(|s| std::cmp::Reverse((s.created_at, s.period_end)));
        all.truncate(limit as usize);
        if let Some(rival) = self.rival.lock().unwrap().take() {
            self.summaries.lock().unwrap().push(rival);
        }
        Ok(all)
    }

    async fn insert(&self, summary: NewSummary, expected: Cursor) -> Result<Summary, StoreError> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_insert {
            return Err(StoreError::MalformedRow("injected insert failure".to_string()));
        }
        let mut all = self.summaries.lock().unwrap();
        let newest = Self::newest(&all);
        let actual = Cursor::from_latest(newest);
        if actual != expected {
            return Err(StoreError::CursorMoved { expected, actual });
        }
        let created_at = newest
            .map(|s| s.created_at + Duration::seconds(1))
            .unwrap_or_else(base_time)
            .max(summary.period_end);
        let stored = Summary {
            id: Uuid::new_v4(),
            period_start: summary.period_start,
            period_end: summary.period_end,
            payload: summary.payload,
            truth_count: summary.truth_count,
            created_at,
        };
        all.push(stored.clone());
        Ok(stored)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Capabilities
// ────────────────────────────────────────────────────────────────────────────

/// Returns scripted responses in order and records every prompt it receives.
#[derive(Default)]
pub struct ScriptedGenerator {
    pub responses: Mutex<VecDeque<Result<String, LlmError>>>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn replying(responses: &[&str]) -> Self {
        Self {
            responses: Mutex::new(responses.iter().map(|r| Ok(r.to_string())).collect()),
            ..Default::default()
        }
    }

    pub fn failing(error: LlmError) -> Self {
        Self {
            responses: Mutex::new(VecDeque::from([Err(error)])),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn last_prompt(&self) -> String {
        self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, request: Completion<'_>) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(request.prompt.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(LlmError::EmptyContent))
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

#[derive(Default)]
pub struct RecordingPublisher {
    pub published: Mutex<Vec<String>>,
    pub reject_with: Option<String>,
    /// Records the post, then stalls this long before answering.
    pub stall: Option<std::time::Duration>,
}

impl RecordingPublisher {
    pub fn rejecting(message: &str) -> Self {
        Self {
            reject_with: Some(message.to_string()),
            ..Default::default()
        }
    }

    pub fn stalling(stall: std::time::Duration) -> Self {
        Self {
            stall: Some(stall),
            ..Default::default()
        }
    }

    pub fn posts(&self) -> Vec<String> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn publish(&self, text: &str) -> Result<PublishReceipt, PublishError> {
        self.published.lock().unwrap().push(text.to_string());
        if let Some(stall) = self.stall {
            tokio::time::sleep(stall).await;
        }
        match &self.reject_with {
            Some(message) => Err(PublishError::Rejected {
                status: 403,
                message: message.clone(),
            }),
            None => Ok(PublishReceipt {
                post_id: Some(format!("post-{}", self.published.lock().unwrap().len())),
            }),
        }
    }
}
