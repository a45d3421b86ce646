//! Read-side queries over `daily_video_trends` for the `report` commands.

use chrono::NaiveDate;
use sqlx::PgPool;

use crate::snapshots::{TrendSnapshotRow, SNAPSHOT_COLUMNS};
use crate::DbError;

/// Every snapshot for `keyword`, ordered by `collected_date` then
/// `observed_date`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_snapshots_for_keyword(
    pool: &PgPool,
    keyword: &str,
) -> Result<Vec<TrendSnapshotRow>, DbError> {
    let rows = sqlx::query_as::<_, TrendSnapshotRow>(&format!(
        "SELECT {SNAPSHOT_COLUMNS} \
         FROM daily_video_trends \
         WHERE keyword = $1 \
         ORDER BY collected_date, observed_date"
    ))
    .bind(keyword)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// How one observed day's totals evolved across collection dates, oldest
/// collection first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_observed_date_timeline(
    pool: &PgPool,
    keyword: &str,
    observed_date: NaiveDate,
) -> Result<Vec<TrendSnapshotRow>, DbError> {
    let rows = sqlx::query_as::<_, TrendSnapshotRow>(&format!(
        "SELECT {SNAPSHOT_COLUMNS} \
         FROM daily_video_trends \
         WHERE keyword = $1 AND observed_date = $2 \
         ORDER BY collected_date"
    ))
    .bind(keyword)
    .bind(observed_date)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// The `limit` most recent snapshots for `keyword`, newest collection and
/// newest observed date first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_latest_snapshots(
    pool: &PgPool,
    keyword: &str,
    limit: i64,
) -> Result<Vec<TrendSnapshotRow>, DbError> {
    let rows = sqlx::query_as::<_, TrendSnapshotRow>(&format!(
        "SELECT {SNAPSHOT_COLUMNS} \
         FROM daily_video_trends \
         WHERE keyword = $1 \
         ORDER BY collected_date DESC, observed_date DESC \
         LIMIT $2"
    ))
    .bind(keyword)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
