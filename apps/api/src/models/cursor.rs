use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::summary::Summary;

/// Summarization watermark: every entry with `created_at <= cursor` has been
/// folded into a persisted summary. Derived from the latest summary, never
/// stored on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Cursor(DateTime<Utc>);

impl Cursor {
    /// Watermark before any summary exists (Unix epoch).
    pub const BEGINNING: Cursor = Cursor(DateTime::<Utc>::UNIX_EPOCH);

    pub fn at(timestamp: DateTime<Utc>) -> Self {
        Cursor(timestamp)
    }

    pub fn from_latest(latest: Option<&Summary>) -> Self {
        latest.map_or(Self::BEGINNING, |s| Cursor(s.period_end))
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.0
    }

    /// True if an entry created at `created_at` falls after the watermark.
    pub fn admits(&self, created_at: DateTime<Utc>) -> bool {
        created_at > self.0
    }
}

impl From<Option<DateTime<Utc>>> for Cursor {
    fn from(latest_end: Option<DateTime<Utc>>) -> Self {
        latest_end.map_or(Self::BEGINNING, Cursor)
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}
