//! Read-only dashboard aggregates over the raw entry stream.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::models::RawEntry;
use crate::store::{EntryQuery, RawEntryStore, StoreError};

pub mod handlers;

const RECENT_ENTRIES: u32 = 5;
const WEEKLY_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_truths: u64,
    /// Entries since 00:00 UTC of the current calendar day.
    pub today_truths: u64,
    /// Entries in the trailing seven 24-hour days.
    pub weekly_truths: u64,
    pub recent_truths: Vec<RawEntry>,
}

fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|midnight| midnight.and_utc())
        .unwrap_or(now)
}

pub async fn compute_dashboard_stats(
    entries: &dyn RawEntryStore,
    now: DateTime<Utc>,
) -> Result<DashboardStats, StoreError> {
    let today = start_of_day(now);
    let tomorrow = today + Duration::days(1);
    let week_ago = now - Duration::days(WEEKLY_WINDOW_DAYS);

    let (total_truths, today_truths, weekly_truths, recent_truths) = tokio::try_join!(
        entries.count(None, None),
        entries.count(Some(today), Some(tomorrow)),
        entries.count(Some(week_ago), None),
        entries.query(EntryQuery::newest(RECENT_ENTRIES)),
    )?;

    Ok(DashboardStats {
        total_truths,
        today_truths,
        weekly_truths,
        recent_truths,
    })
}
