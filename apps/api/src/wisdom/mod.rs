//! Wisdom Publisher — synthesizes one short statement from recent summaries
//! and fresh entries, then posts it.
//!
//! Flow: latest K summaries + newest F entries → weigh → prompt → generate → publish.
//!
//! Stateless per run: every invocation re-reads the current top-K summaries.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{error, info};

use crate::errors::{with_timeout, JobError};
use crate::llm_client::{Completion, TextGenerator};
use crate::publishing::Publisher;
use crate::store::{EntryQuery, RawEntryStore, SummaryStore};
use crate::wisdom::prompts::{build_fresh_only_prompt, build_weighted_prompt, WISDOM_SYSTEM};
use crate::wisdom::weighting::{weigh, SummaryWeight};

pub mod handlers;
pub mod prompts;
pub mod weighting;

const GENERATION_TEMPERATURE: f32 = 0.7;

#[derive(Debug, Clone, Copy)]
pub struct WisdomSettings {
    /// K: how many recent summaries feed the synthesis.
    pub summary_window: u32,
    /// F: how many raw entries are quoted verbatim.
    pub fresh_entries: u32,
    pub step_timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptMode {
    Weighted,
    ColdStart,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublishOutcome {
    pub published_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_id: Option<String>,
    pub mode: PromptMode,
    pub summaries_used: usize,
    pub fresh_entries_used: usize,
    pub weights: Vec<SummaryWeight>,
}

pub struct WisdomPublisher {
    summaries: Arc<dyn SummaryStore>,
    entries: Arc<dyn RawEntryStore>,
    generator: Option<Arc<dyn TextGenerator>>,
    poster: Option<Arc<dyn Publisher>>,
    settings: WisdomSettings,
}

impl WisdomPublisher {
    pub fn new(
        summaries: Arc<dyn SummaryStore>,
        entries: Arc<dyn RawEntryStore>,
        generator: Option<Arc<dyn TextGenerator>>,
        poster: Option<Arc<dyn Publisher>>,
        settings: WisdomSettings,
    ) -> Self {
        Self {
            summaries,
            entries,
            generator,
            poster,
            settings,
        }
    }

    pub async fn run(&self) -> Result<PublishOutcome, JobError> {
        let generator = self.generator.as_ref().ok_or_else(|| {
            JobError::Configuration(
                "text-generation capability is not configured (set XAI_API_KEY)".to_string(),
            )
        })?;
        let poster = self.poster.as_ref().ok_or_else(|| {
            JobError::Configuration(
                "posting capability is not configured (set the X_* credentials)".to_string(),
            )
        })?;
        let timeout = self.settings.step_timeout;

        // Steps 1-2: Recent summaries and the freshest entries
        let summaries = with_timeout(
            "summary fetch",
            timeout,
            self.summaries.latest(self.settings.summary_window),
        )
        .await?;
        let fresh = with_timeout(
            "fresh entry fetch",
            timeout,
            self.entries
                .query(EntryQuery::newest(self.settings.fresh_entries)),
        )
        .await?;
        info!(
            "Wisdom publisher fetched {} summaries and {} fresh entries",
            summaries.len(),
            fresh.len()
        );

        // Step 3: Nothing to synthesize from
        if summaries.is_empty() && fresh.is_empty() {
            info!("No summaries or entries yet; nothing to publish");
            return Err(JobError::InsufficientData);
        }

        // Steps 4-6: Weighted prompt, or fresh-only on cold start
        let summaries_used = summaries.len();
        let (mode, prompt, weights) = if summaries.is_empty() {
            info!("No summaries yet; using fresh-entries-only prompt");
            (PromptMode::ColdStart, build_fresh_only_prompt(&fresh), Vec::new())
        } else {
            let weighted = weigh(summaries);
            for w in &weighted {
                info!(
                    "Summary {} weight {:.3} (volume {})",
                    w.summary.id, w.weight, w.summary.truth_count
                );
            }
            let weights = weighted.iter().map(SummaryWeight::from).collect();
            (
                PromptMode::Weighted,
                build_weighted_prompt(&weighted, &fresh),
                weights,
            )
        };

        // Step 7: One generation call
        let text = with_timeout(
            "wisdom generation",
            timeout,
            generator.generate(Completion {
                system: WISDOM_SYSTEM,
                prompt: &prompt,
                temperature: Some(GENERATION_TEMPERATURE),
                max_tokens: None,
            }),
        )
        .await?;
        let text = text.trim().to_string();
        info!("Generated wisdom ({} chars): {text}", text.chars().count());

        // Step 8: Publish verbatim; never retried within the run.
        // An expired publish may still have landed, so it is not retryable.
        let receipt = match tokio::time::timeout(timeout, poster.publish(&text)).await {
            Ok(result) => result.map_err(|e| {
                error!("Publishing wisdom failed: {e}");
                JobError::from(e)
            })?,
            Err(_) => {
                error!(
                    "Publishing wisdom timed out after {}ms; delivery unknown",
                    timeout.as_millis()
                );
                return Err(JobError::Publish(format!(
                    "publish timed out after {}ms; the post may have been delivered",
                    timeout.as_millis()
                )));
            }
        };

        Ok(PublishOutcome {
            published_text: text,
            post_id: receipt.post_id,
            mode,
            summaries_used,
            fresh_entries_used: fresh.len(),
            weights,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::testing::{
        summary_with_count, truth_at, wisdom_at, FakeEntryStore, FakeSummaryStore,
        RecordingPublisher, ScriptedGenerator,
    };

    const SETTINGS: WisdomSettings = WisdomSettings {
        summary_window: 5,
        fresh_entries: 3,
        step_timeout: Duration::from_secs(5),
    };

    struct Harness {
        entries: Arc<FakeEntryStore>,
        generator: Arc<ScriptedGenerator>,
        poster: Arc<RecordingPublisher>,
        job: WisdomPublisher,
    }

    fn harness(
        summaries: FakeSummaryStore,
        entries: FakeEntryStore,
        generator: ScriptedGenerator,
        poster: RecordingPublisher,
    ) -> Harness {
        let entries = Arc::new(entries);
        let generator = Arc::new(generator);
        let poster = Arc::new(poster);
        let job = WisdomPublisher::new(
            Arc::new(summaries),
            entries.clone(),
            Some(generator.clone()),
            Some(poster.clone()),
            SETTINGS,
        );
        Harness {
            entries,
            generator,
            poster,
            job,
        }
    }

    #[tokio::test]
    async fn test_no_data_is_insufficient_and_posts_nothing() {
        let h = harness(
            FakeSummaryStore::default(),
            FakeEntryStore::default(),
            ScriptedGenerator::replying(&["unused"]),
            RecordingPublisher::default(),
        );

        let err = h.job.run().await.unwrap_err();

        assert!(matches!(err, JobError::InsufficientData));
        assert!(h.poster.posts().is_empty());
        assert_eq!(h.generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_cold_start_uses_fresh_entries_and_posts_once() {
        let h = harness(
            FakeSummaryStore::default(),
            FakeEntryStore::with(vec![
                truth_at(1, "my mother's laugh"),
                wisdom_at(2, "Go slow"),
                truth_at(3, "the ocean"),
            ]),
            ScriptedGenerator::replying(&["What we love quietly shapes who we become."]),
            RecordingPublisher::default(),
        );

        let outcome = h.job.run().await.unwrap();

        assert_eq!(outcome.mode, PromptMode::ColdStart);
        assert_eq!(outcome.summaries_used, 0);
        assert_eq!(outcome.fresh_entries_used, 3);
        assert_eq!(
            h.poster.posts(),
            vec!["What we love quietly shapes who we become.".to_string()]
        );
        let prompt = h.generator.last_prompt();
        assert!(prompt.contains("Answer: my mother's laugh"));
        assert!(!prompt.contains("SUMMARY 1"));
    }

    #[tokio::test]
    async fn test_weighted_prompt_down_weights_burst() {
        let h = harness(
            FakeSummaryStore::with(vec![
                summary_with_count(5, 1000, "viral"),
                summary_with_count(4, 10, "quiet-a"),
                summary_with_count(3, 10, "quiet-b"),
                summary_with_count(2, 10, "quiet-c"),
                summary_with_count(1, 10, "quiet-d"),
            ]),
            FakeEntryStore::with(vec![truth_at(400, "today")]),
            ScriptedGenerator::replying(&["  Stillness is also a way forward.  "]),
            RecordingPublisher::default(),
        );

        let outcome = h.job.run().await.unwrap();

        assert_eq!(outcome.mode, PromptMode::Weighted);
        assert_eq!(outcome.summaries_used, 5);
        assert_eq!(outcome.fresh_entries_used, 1);
        assert_eq!(outcome.published_text, "Stillness is also a way forward.");
        assert_eq!(outcome.post_id.as_deref(), Some("post-1"));

        let viral = outcome.weights.iter().find(|w| w.truth_count == 1000).unwrap();
        assert!(outcome
            .weights
            .iter()
            .filter(|w| w.truth_count == 10)
            .all(|quiet| quiet.weight > viral.weight));

        let prompt = h.generator.last_prompt();
        assert!(prompt.contains("(weight 0.46, volume 1000)"));
        assert!(prompt.contains("(weight 4.56, volume 10)"));
        assert!(prompt.contains("Answer: today"));
    }

    #[tokio::test]
    async fn test_requests_top_k_summaries_and_f_fresh_entries() {
        let summaries: Vec<_> = (0..8).map(|h| summary_with_count(h, 3, "t")).collect();
        let h = harness(
            FakeSummaryStore::with(summaries),
            FakeEntryStore::with((0..6).map(|m| truth_at(m, "x")).collect()),
            ScriptedGenerator::replying(&["ok"]),
            RecordingPublisher::default(),
        );

        let outcome = h.job.run().await.unwrap();

        assert_eq!(outcome.summaries_used, 5);
        assert_eq!(outcome.fresh_entries_used, 3);
        assert_eq!(
            h.entries.queries.lock().unwrap()[0],
            EntryQuery::newest(3)
        );
    }

    #[tokio::test]
    async fn test_summaries_without_fresh_entries_still_publish() {
        let h = harness(
            FakeSummaryStore::with(vec![summary_with_count(1, 12, "rest")]),
            FakeEntryStore::default(),
            ScriptedGenerator::replying(&["Rest is not the opposite of progress."]),
            RecordingPublisher::default(),
        );

        let outcome = h.job.run().await.unwrap();

        assert_eq!(outcome.mode, PromptMode::Weighted);
        assert_eq!(outcome.fresh_entries_used, 0);
        assert_eq!(h.poster.posts().len(), 1);
    }

    #[tokio::test]
    async fn test_rejected_post_is_publish_error_without_retry() {
        let h = harness(
            FakeSummaryStore::with(vec![summary_with_count(1, 12, "rest")]),
            FakeEntryStore::default(),
            ScriptedGenerator::replying(&["Duplicate me.", "Duplicate me."]),
            RecordingPublisher::rejecting("duplicate content"),
        );

        let err = h.job.run().await.unwrap_err();

        assert!(matches!(err, JobError::Publish(msg) if msg.contains("duplicate content")));
        assert_eq!(h.poster.posts().len(), 1, "exactly one posting attempt");
        assert_eq!(h.generator.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_publish_timeout_is_not_retryable() {
        let h = harness(
            FakeSummaryStore::with(vec![summary_with_count(1, 12, "rest")]),
            FakeEntryStore::default(),
            ScriptedGenerator::replying(&["Patience outlasts urgency."]),
            RecordingPublisher::stalling(Duration::from_secs(60)),
        );

        let err = h.job.run().await.unwrap_err();

        assert!(matches!(&err, JobError::Publish(msg) if msg.contains("timed out")));
        assert!(!err.retryable());
        assert_eq!(h.poster.posts().len(), 1);
    }

    #[tokio::test]
    async fn test_generation_failure_skips_posting() {
        let h = harness(
            FakeSummaryStore::with(vec![summary_with_count(1, 12, "rest")]),
            FakeEntryStore::default(),
            ScriptedGenerator::failing(crate::llm_client::LlmError::EmptyContent),
            RecordingPublisher::default(),
        );

        let err = h.job.run().await.unwrap_err();

        assert!(matches!(err, JobError::Upstream(_)));
        assert!(h.poster.posts().is_empty());
    }

    #[tokio::test]
    async fn test_missing_capabilities_are_configuration_errors() {
        let job = WisdomPublisher::new(
            Arc::new(FakeSummaryStore::default()),
            Arc::new(FakeEntryStore::with(vec![truth_at(1, "x")])),
            Some(Arc::new(ScriptedGenerator::replying(&["x"]))),
            None,
            SETTINGS,
        );
        assert!(matches!(job.run().await, Err(JobError::Configuration(_))));

        let job = WisdomPublisher::new(
            Arc::new(FakeSummaryStore::default()),
            Arc::new(FakeEntryStore::with(vec![truth_at(1, "x")])),
            None,
            Some(Arc::new(RecordingPublisher::default())),
            SETTINGS,
        );
        assert!(matches!(job.run().await, Err(JobError::Configuration(_))));
    }
}
