use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::store::StoreError;

pub const KIND_TRUTH: &str = "truth";
pub const KIND_WISDOM: &str = "wisdom";

/// One submission row as read from the `user_truths` / `wisdoms` union.
/// Columns that do not apply to a row's `kind` are NULL.
#[derive(Debug, Clone, FromRow)]
pub struct RawEntryRow {
    pub id: Uuid,
    pub x_username: String,
    pub kind: String,
    pub first_question: Option<String>,
    pub first_answer: Option<String>,
    pub second_question: Option<String>,
    pub second_answer: Option<String>,
    pub generated_truth: Option<String>,
    pub wisdom_text: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntryBody {
    /// Two-question reflection with the short truth derived from the answers.
    Truth {
        first_question: String,
        first_answer: String,
        second_question: String,
        second_answer: String,
        generated_truth: String,
    },
    /// Freeform wisdom submission. Has no derived statement.
    Wisdom { text: String },
}

/// A user submission. Immutable once created; `created_at` is server-assigned
/// and serves as the summarization cursor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEntry {
    pub id: Uuid,
    pub author: String,
    #[serde(flatten)]
    pub body: EntryBody,
    pub created_at: DateTime<Utc>,
}

impl RawEntry {
    pub fn synthesized_statement(&self) -> Option<&str> {
        match &self.body {
            EntryBody::Truth {
                generated_truth, ..
            } if !generated_truth.trim().is_empty() => Some(generated_truth.as_str()),
            _ => None,
        }
    }

    /// The submission's own words, one field per line.
    pub fn raw_text(&self) -> String {
        match &self.body {
            EntryBody::Truth {
                first_question,
                first_answer,
                second_question,
                second_answer,
                generated_truth,
            } => {
                let mut text = format!(
                    "Question: {first_question}\nAnswer: {first_answer}\n\
                     Question: {second_question}\nAnswer: {second_answer}"
                );
                if !generated_truth.trim().is_empty() {
                    text.push_str(&format!("\nTruth: {generated_truth}"));
                }
                text
            }
            EntryBody::Wisdom { text } => format!("Wisdom: {text}"),
        }
    }
}

impl TryFrom<RawEntryRow> for RawEntry {
    type Error = StoreError;

    fn try_from(row: RawEntryRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let require = |field: &str, value: Option<String>| {
            value.ok_or_else(|| StoreError::MalformedRow(format!("entry {id}: {field} is NULL")))
        };

        let body = match row.kind.as_str() {
            KIND_TRUTH => EntryBody::Truth {
                first_question: require("first_question", row.first_question)?,
                first_answer: require("first_answer", row.first_answer)?,
                second_question: require("second_question", row.second_question)?,
                second_answer: require("second_answer", row.second_answer)?,
                generated_truth: row.generated_truth.unwrap_or_default(),
            },
            KIND_WISDOM => EntryBody::Wisdom {
                text: require("wisdom_text", row.wisdom_text)?,
            },
            other => {
                return Err(StoreError::MalformedRow(format!(
                    "entry {id}: unknown kind '{other}'"
                )))
            }
        };

        // A bare "@" handle leaves an empty author; the entry itself is still usable.
        let author = row.x_username.trim().trim_start_matches('@').to_string();

        Ok(RawEntry {
            id,
            author,
            body,
            created_at: row.created_at,
        })
    }
}
