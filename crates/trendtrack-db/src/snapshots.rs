//! Persistence for `daily_video_trends` snapshots.
//!
//! A snapshot is keyed by `(keyword, observed_date, collected_date)`. Writes
//! go through [`SnapshotStore::upsert`], which refuses to replace a stored row
//! with one carrying a smaller `item_count`, so re-running a collection for a
//! past day never regresses what was already observed.

use std::future::Future;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use trendtrack_core::DailyAggregate;

use crate::DbError;

/// Result of a guarded write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// The row was inserted or overwritten.
    Saved,
    /// A stored row with a strictly larger `item_count` was kept.
    Skipped,
}

/// Snapshot persistence used by the collector.
///
/// [`PgSnapshotStore`] backs production runs; [`crate::MemorySnapshotStore`]
/// backs dry runs and tests.
pub trait SnapshotStore {
    /// Most recent snapshot for `(keyword, observed_date)` collected strictly
    /// before `before`.
    fn get_previous(
        &self,
        keyword: &str,
        observed_date: NaiveDate,
        before: NaiveDate,
    ) -> impl Future<Output = Result<Option<DailyAggregate>, DbError>>;

    /// The snapshot stored under the exact key, if any.
    fn get_existing(
        &self,
        keyword: &str,
        observed_date: NaiveDate,
        collected_date: NaiveDate,
    ) -> impl Future<Output = Result<Option<DailyAggregate>, DbError>>;

    /// Inserts or overwrites `aggregate` unless the stored row for the same
    /// key has a strictly larger `item_count`.
    fn upsert(
        &self,
        aggregate: &DailyAggregate,
    ) -> impl Future<Output = Result<UpsertOutcome, DbError>>;
}

/// A row from the `daily_video_trends` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TrendSnapshotRow {
    pub id: i64,
    pub keyword: String,
    pub observed_date: NaiveDate,
    pub collected_date: NaiveDate,
    pub item_count: i64,
    pub total_views: i64,
    pub total_likes: i64,
    pub total_comments: i64,
    pub views_growth: i64,
    pub likes_growth: i64,
    pub comments_growth: i64,
    pub views_growth_rate: Decimal,
    pub likes_growth_rate: Decimal,
    pub comments_growth_rate: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TrendSnapshotRow> for DailyAggregate {
    fn from(row: TrendSnapshotRow) -> Self {
        Self {
            keyword: row.keyword,
            observed_date: row.observed_date,
            collected_date: row.collected_date,
            item_count: row.item_count,
            total_views: row.total_views,
            total_likes: row.total_likes,
            total_comments: row.total_comments,
            views_growth: row.views_growth,
            likes_growth: row.likes_growth,
            comments_growth: row.comments_growth,
            views_growth_rate: row.views_growth_rate,
            likes_growth_rate: row.likes_growth_rate,
            comments_growth_rate: row.comments_growth_rate,
        }
    }
}

pub(crate) const SNAPSHOT_COLUMNS: &str = "id, keyword, observed_date, collected_date, \
     item_count, total_views, total_likes, total_comments, \
     views_growth, likes_growth, comments_growth, \
     views_growth_rate, likes_growth_rate, comments_growth_rate, \
     created_at, updated_at";

/// Postgres-backed [`SnapshotStore`].
#[derive(Debug, Clone)]
pub struct PgSnapshotStore {
    pool: PgPool,
}

impl PgSnapshotStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl SnapshotStore for PgSnapshotStore {
    async fn get_previous(
        &self,
        keyword: &str,
        observed_date: NaiveDate,
        before: NaiveDate,
    ) -> Result<Option<DailyAggregate>, DbError> {
        let row = sqlx::query_as::<_, TrendSnapshotRow>(&format!(
            "SELECT {SNAPSHOT_COLUMNS} \
             FROM daily_video_trends \
             WHERE keyword = $1 AND observed_date = $2 AND collected_date < $3 \
             ORDER BY collected_date DESC \
             LIMIT 1"
        ))
        .bind(keyword)
        .bind(observed_date)
        .bind(before)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(DailyAggregate::from))
    }

    async fn get_existing(
        &self,
        keyword: &str,
        observed_date: NaiveDate,
        collected_date: NaiveDate,
    ) -> Result<Option<DailyAggregate>, DbError> {
        let row = sqlx::query_as::<_, TrendSnapshotRow>(&format!(
            "SELECT {SNAPSHOT_COLUMNS} \
             FROM daily_video_trends \
             WHERE keyword = $1 AND observed_date = $2 AND collected_date = $3"
        ))
        .bind(keyword)
        .bind(observed_date)
        .bind(collected_date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(DailyAggregate::from))
    }

    /// Single conditional write: the `DO UPDATE ... WHERE` clause leaves a
    /// stored row with a larger `item_count` untouched, reported as zero rows
    /// affected.
    async fn upsert(&self, aggregate: &DailyAggregate) -> Result<UpsertOutcome, DbError> {
        let rows_affected = sqlx::query(
            "INSERT INTO daily_video_trends \
                 (keyword, observed_date, collected_date, item_count, \
                  total_views, total_likes, total_comments, \
                  views_growth, likes_growth, comments_growth, \
                  views_growth_rate, likes_growth_rate, comments_growth_rate) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             ON CONFLICT (keyword, observed_date, collected_date) DO UPDATE SET \
                 item_count = EXCLUDED.item_count, \
                 total_views = EXCLUDED.total_views, \
                 total_likes = EXCLUDED.total_likes, \
                 total_comments = EXCLUDED.total_comments, \
                 views_growth = EXCLUDED.views_growth, \
                 likes_growth = EXCLUDED.likes_growth, \
                 comments_growth = EXCLUDED.comments_growth, \
                 views_growth_rate = EXCLUDED.views_growth_rate, \
                 likes_growth_rate = EXCLUDED.likes_growth_rate, \
                 comments_growth_rate = EXCLUDED.comments_growth_rate, \
                 updated_at = NOW() \
             WHERE daily_video_trends.item_count <= EXCLUDED.item_count",
        )
        .bind(&aggregate.keyword)
        .bind(aggregate.observed_date)
        .bind(aggregate.collected_date)
        .bind(aggregate.item_count)
        .bind(aggregate.total_views)
        .bind(aggregate.total_likes)
        .bind(aggregate.total_comments)
        .bind(aggregate.views_growth)
        .bind(aggregate.likes_growth)
        .bind(aggregate.comments_growth)
        .bind(aggregate.views_growth_rate)
        .bind(aggregate.likes_growth_rate)
        .bind(aggregate.comments_growth_rate)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(if rows_affected > 0 {
            UpsertOutcome::Saved
        } else {
            UpsertOutcome::Skipped
        })
    }
}
