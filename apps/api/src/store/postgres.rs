use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::{debug, info};

use crate::models::{Cursor, NewSummary, RawEntry, RawEntryRow, Summary, SummaryRow};
use crate::store::{EntryQuery, RawEntryStore, StoreError, SummaryStore};

const TRUTHS_SELECT: &str = r#"
    SELECT id, x_username, 'truth'::text AS kind,
           first_question, first_answer, second_question, second_answer,
           generated_truth, NULL::text AS wisdom_text, created_at
    FROM user_truths"#;

const WISDOMS_SELECT: &str = r#"
    SELECT id, x_username, 'wisdom'::text AS kind,
           NULL::text, NULL::text, NULL::text, NULL::text,
           NULL::text, wisdom_text, created_at
    FROM wisdoms"#;

const SUMMARY_COLUMNS: &str =
    "id, period_start, period_end, last_processed_at, summary_json, truth_count, created_at";

/// Advisory lock key serializing summary writers across processes.
const SUMMARY_WRITER_LOCK: i64 = 0x7472_7574_6873;

/// Reads submissions from `user_truths`, optionally unioned with `wisdoms`.
#[derive(Clone)]
pub struct PgRawEntryStore {
    pool: PgPool,
    include_wisdoms: bool,
}

impl PgRawEntryStore {
    pub fn new(pool: PgPool, include_wisdoms: bool) -> Self {
        Self {
            pool,
            include_wisdoms,
        }
    }

    /// Dashboard view: `user_truths` regardless of `INCLUDE_WISDOMS`.
    pub fn truths_only(pool: PgPool) -> Self {
        Self::new(pool, false)
    }

    fn source(&self) -> String {
        entry_source(self.include_wisdoms)
    }
}

fn entry_source(include_wisdoms: bool) -> String {
    if include_wisdoms {
        format!("({TRUTHS_SELECT} UNION ALL {WISDOMS_SELECT})")
    } else {
        format!("({TRUTHS_SELECT})")
    }
}

#[async_trait]
impl RawEntryStore for PgRawEntryStore {
    async fn query(&self, query: EntryQuery) -> Result<Vec<RawEntry>, StoreError> {
        let order = query.order.as_sql();
        // LIMIT NULL is LIMIT ALL in Postgres.
        let sql = format!(
            "SELECT * FROM {} AS entries \
             WHERE ($1::timestamptz IS NULL OR created_at > $1) \
             ORDER BY created_at {order}, id {order} \
             LIMIT $2",
            self.source()
        );

        let rows = sqlx::query_as::<_, RawEntryRow>(&sql)
            .bind(query.after)
            .bind(query.limit.map(i64::from))
            .fetch_all(&self.pool)
            .await?;

        debug!("Fetched {} raw entries for {:?}", rows.len(), query);
        rows.into_iter().map(RawEntry::try_from).collect()
    }

    async fn count(
        &self,
        from: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Result<u64, StoreError> {
        let sql = format!(
            "SELECT COUNT(*) FROM {} AS entries \
             WHERE ($1::timestamptz IS NULL OR created_at >= $1) \
               AND ($2::timestamptz IS NULL OR created_at < $2)",
            self.source()
        );

        let count: i64 = sqlx::query_scalar(&sql)
            .bind(from)
            .bind(until)
            .fetch_one(&self.pool)
            .await?;

        Ok(count.max(0) as u64)
    }
}

/// `truth_summaries` table. Append-only: rows are never updated or deleted here.
#[derive(Clone)]
pub struct PgSummaryStore {
    pool: PgPool,
}

impl PgSummaryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SummaryStore for PgSummaryStore {
    async fn latest(&self, limit: u32) -> Result<Vec<Summary>, StoreError> {
        let rows = sqlx::query_as::<_, SummaryRow>(&format!(
            "SELECT {SUMMARY_COLUMNS} FROM truth_summaries \
             ORDER BY created_at DESC, period_end DESC LIMIT $1"
        ))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Summary::try_from).collect()
    }

    async fn insert(&self, summary: NewSummary, expected: Cursor) -> Result<Summary, StoreError> {
        let truth_count = i32::try_from(summary.truth_count).map_err(|_| {
            StoreError::MalformedRow(format!(
                "truth_count {} does not fit the column",
                summary.truth_count
            ))
        })?;

        let mut tx = self.pool.begin().await?;

        // 1. Serialize writers; released at commit or rollback
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(SUMMARY_WRITER_LOCK)
            .execute(&mut *tx)
            .await?;

        // 2. Re-read the cursor under the lock
        let latest_end: Option<DateTime<Utc>> = sqlx::query_scalar(
            "SELECT period_end FROM truth_summaries \
             ORDER BY created_at DESC, period_end DESC LIMIT 1",
        )
        .fetch_optional(&mut *tx)
        .await?;
        let actual = Cursor::from(latest_end);
        if actual != expected {
            return Err(StoreError::CursorMoved { expected, actual });
        }

        // 3. Insert; last_processed_at mirrors period_end
        let row = sqlx::query_as::<_, SummaryRow>(&format!(
            "INSERT INTO truth_summaries \
                 (period_start, period_end, last_processed_at, summary_json, truth_count) \
             VALUES ($1, $2, $2, $3, $4) \
             RETURNING {SUMMARY_COLUMNS}"
        ))
        .bind(summary.period_start)
        .bind(summary.period_end)
        .bind(Json(&summary.payload))
        .bind(truth_count)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            "Inserted summary {} covering {} entries up to {}",
            row.id, row.truth_count, row.period_end
        );
        Summary::try_from(row)
    }
}
