//! Database operations for `collection_runs`.
//!
//! Status moves `queued -> running -> succeeded | failed | halted`. Each
//! transition is a guarded `UPDATE` that only matches the expected source
//! status.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `collection_runs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CollectionRunRow {
    pub id: i64,
    pub public_id: Uuid,
    /// `None` when the run covered every enabled keyword.
    pub keyword: Option<String>,
    pub trigger_source: String,
    pub status: String,
    pub range_start: NaiveDate,
    pub range_end: NaiveDate,
    pub collected_date: NaiveDate,
    pub days_requested: i32,
    pub days_completed: i32,
    pub rows_saved: i32,
    pub error_message: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Parameters for [`create_collection_run`].
#[derive(Debug, Clone)]
pub struct NewCollectionRun<'a> {
    pub keyword: Option<&'a str>,
    pub trigger_source: &'a str,
    pub range_start: NaiveDate,
    pub range_end: NaiveDate,
    pub collected_date: NaiveDate,
    pub days_requested: i32,
}

/// Progress recorded when a run finishes or halts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounts {
    pub days_completed: i32,
    pub rows_saved: i32,
}

const RUN_COLUMNS: &str = "id, public_id, keyword, trigger_source, status, \
     range_start, range_end, collected_date, \
     days_requested, days_completed, rows_saved, error_message, \
     started_at, completed_at, created_at";

/// Creates a new collection run in `queued` status.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_collection_run(
    pool: &PgPool,
    run: &NewCollectionRun<'_>,
) -> Result<CollectionRunRow, DbError> {
    let public_id = Uuid::new_v4();

    let row = sqlx::query_as::<_, CollectionRunRow>(&format!(
        "INSERT INTO collection_runs \
             (public_id, keyword, trigger_source, status, \
              range_start, range_end, collected_date, days_requested) \
         VALUES ($1, $2, $3, 'queued', $4, $5, $6, $7) \
         RETURNING {RUN_COLUMNS}"
    ))
    .bind(public_id)
    .bind(run.keyword)
    .bind(run.trigger_source)
    .bind(run.range_start)
    .bind(run.range_end)
    .bind(run.collected_date)
    .bind(run.days_requested)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Marks a run as `running` and sets `started_at = NOW()`.
///
/// # Errors
///
/// Returns [`DbError::InvalidCollectionRunTransition`] if the run is not
/// `queued`, or [`DbError::Sqlx`] if the update fails.
pub async fn start_collection_run(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE collection_runs \
         SET status = 'running', started_at = NOW() \
         WHERE id = $1 AND status = 'queued'",
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidCollectionRunTransition {
            id,
            expected_status: "queued",
        });
    }

    Ok(())
}

/// Marks a run as `succeeded` with its final counts.
///
/// # Errors
///
/// Returns [`DbError::InvalidCollectionRunTransition`] if the run is not
/// `running`, or [`DbError::Sqlx`] if the update fails.
pub async fn complete_collection_run(
    pool: &PgPool,
    id: i64,
    counts: RunCounts,
) -> Result<(), DbError> {
    finish_run(pool, id, "succeeded", counts, None).await
}

/// Marks a run as `halted` (quota or retry exhaustion) with the progress made
/// and the reason.
///
/// # Errors
///
/// Returns [`DbError::InvalidCollectionRunTransition`] if the run is not
/// `running`, or [`DbError::Sqlx`] if the update fails.
pub async fn halt_collection_run(
    pool: &PgPool,
    id: i64,
    counts: RunCounts,
    reason: &str,
) -> Result<(), DbError> {
    finish_run(pool, id, "halted", counts, Some(reason)).await
}

/// Marks a run as `failed` with `error_message`.
///
/// # Errors
///
/// Returns [`DbError::InvalidCollectionRunTransition`] if the run is not
/// `running`, or [`DbError::Sqlx`] if the update fails.
pub async fn fail_collection_run(
    pool: &PgPool,
    id: i64,
    error_message: &str,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE collection_runs \
         SET status = 'failed', completed_at = NOW(), error_message = $1 \
         WHERE id = $2 AND status = 'running'",
    )
    .bind(error_message)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidCollectionRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

async fn finish_run(
    pool: &PgPool,
    id: i64,
    status: &str,
    counts: RunCounts,
    error_message: Option<&str>,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE collection_runs \
         SET status = $1, completed_at = NOW(), \
             days_completed = $2, rows_saved = $3, error_message = $4 \
         WHERE id = $5 AND status = 'running'",
    )
    .bind(status)
    .bind(counts.days_completed)
    .bind(counts.rows_saved)
    .bind(error_message)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidCollectionRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Fetches a single run by its internal `id`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists with the given `id`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_collection_run(pool: &PgPool, id: i64) -> Result<CollectionRunRow, DbError> {
    let row = sqlx::query_as::<_, CollectionRunRow>(&format!(
        "SELECT {RUN_COLUMNS} FROM collection_runs WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Returns the most recent `limit` runs, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_collection_runs(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<CollectionRunRow>, DbError> {
    let rows = sqlx::query_as::<_, CollectionRunRow>(&format!(
        "SELECT {RUN_COLUMNS} \
         FROM collection_runs \
         ORDER BY created_at DESC, id DESC \
         LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
