//! Store capabilities consumed by the jobs.
//!
//! Jobs hold these as `Arc<dyn ...>` so the Postgres implementations can be
//! swapped for in-memory fakes in tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{Cursor, NewSummary, RawEntry, Summary};

pub mod postgres;

pub use postgres::{PgRawEntryStore, PgSummaryStore};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("malformed row: {0}")]
    MalformedRow(String),

    /// Another writer advanced the cursor between read and insert.
    #[error("cursor moved: expected {expected}, found {actual}")]
    CursorMoved { expected: Cursor, actual: Cursor },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Range query over raw entries. `after` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryQuery {
    pub after: Option<DateTime<Utc>>,
    pub order: SortOrder,
    pub limit: Option<u32>,
}

impl EntryQuery {
    /// Everything strictly after `cursor`, oldest first.
    pub fn after_cursor(cursor: Cursor) -> Self {
        Self {
            after: Some(cursor.timestamp()),
            order: SortOrder::Asc,
            limit: None,
        }
    }

    /// The `limit` newest entries, newest first.
    pub fn newest(limit: u32) -> Self {
        Self {
            after: None,
            order: SortOrder::Desc,
            limit: Some(limit),
        }
    }

    pub fn all_newest_first() -> Self {
        Self {
            after: None,
            order: SortOrder::Desc,
            limit: None,
        }
    }
}

#[async_trait]
pub trait RawEntryStore: Send + Sync {
    async fn query(&self, query: EntryQuery) -> Result<Vec<RawEntry>, StoreError>;

    /// Counts entries with `from <= created_at < until`; open bounds are unbounded.
    async fn count(
        &self,
        from: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<u64, StoreError>;
}

#[async_trait]
pub trait SummaryStore: Send + Sync {
    /// Up to `limit` summaries, newest `created_at` first.
    async fn latest(&self, limit: u32) -> Result<Vec<Summary>, StoreError>;

    /// Inserts `summary` only if the current cursor still equals `expected`.
    async fn insert(&self, summary: NewSummary, expected: Cursor) -> Result<Summary, StoreError>;
}
