use chrono::NaiveDate;
use trendtrack_core::{summarize_by_collection, DailyAggregate};

/// Show how one upload date's totals moved across collection dates.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub(crate) async fn run_timeline(
    pool: &sqlx::PgPool,
    keyword: &str,
    observed_date: NaiveDate,
) -> anyhow::Result<()> {
    let rows = trendtrack_db::get_observed_date_timeline(pool, keyword, observed_date).await?;
    if rows.is_empty() {
        println!("no snapshots for '{keyword}' uploaded on {observed_date}; run `collect` first");
        return Ok(());
    }

    println!("{keyword}, uploads on {observed_date}");
    println!(
        "{:<12}{:>8}{:>14}{:>12}{:>10}",
        "COLLECTED", "ITEMS", "VIEWS", "GROWTH", "RATE %"
    );
    for row in rows {
        println!(
            "{:<12}{:>8}{:>14}{:>12}{:>10}",
            row.collected_date.to_string(),
            row.item_count,
            row.total_views,
            row.views_growth,
            row.views_growth_rate
        );
    }
    Ok(())
}

/// Show the most recent snapshots for a keyword.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub(crate) async fn run_latest(
    pool: &sqlx::PgPool,
    keyword: &str,
    limit: i64,
) -> anyhow::Result<()> {
    let rows = trendtrack_db::list_latest_snapshots(pool, keyword, limit).await?;
    if rows.is_empty() {
        println!("no snapshots for '{keyword}'; run `collect` first");
        return Ok(());
    }

    println!(
        "{:<12}{:<12}{:>8}{:>14}{:>10}{:>10}{:>10}",
        "COLLECTED", "UPLOADED", "ITEMS", "VIEWS", "LIKES", "COMMENTS", "VIEWS %"
    );
    for row in rows.into_iter().map(DailyAggregate::from) {
        println!(
            "{:<12}{:<12}{:>8}{:>14}{:>10}{:>10}{:>10}",
            row.collected_date.to_string(),
            row.observed_date.to_string(),
            row.item_count,
            row.total_views,
            row.total_likes,
            row.total_comments,
            row.views_growth_rate
        );
    }
    Ok(())
}

/// Show totals per collection date with the change against the previous one.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub(crate) async fn run_summary(pool: &sqlx::PgPool, keyword: &str) -> anyhow::Result<()> {
    let rows: Vec<DailyAggregate> = trendtrack_db::list_snapshots_for_keyword(pool, keyword)
        .await?
        .into_iter()
        .map(DailyAggregate::from)
        .collect();
    if rows.is_empty() {
        println!("no snapshots for '{keyword}'; run `collect` first");
        return Ok(());
    }

    println!(
        "{:<12}{:>6}{:>8}{:>14}{:>12}{:>10}",
        "COLLECTED", "DAYS", "ITEMS", "VIEWS", "DELTA", "DELTA %"
    );
    for summary in summarize_by_collection(&rows) {
        println!(
            "{:<12}{:>6}{:>8}{:>14}{:>12}{:>10}",
            summary.collected_date.to_string(),
            summary.observed_days,
            summary.item_count,
            summary.total_views,
            fmt_opt(summary.views_delta),
            fmt_opt(summary.views_delta_rate)
        );
    }
    Ok(())
}

/// List recent collection runs.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub(crate) async fn run_collection_runs(pool: &sqlx::PgPool, limit: i64) -> anyhow::Result<()> {
    let runs = trendtrack_db::list_collection_runs(pool, limit).await?;
    if runs.is_empty() {
        println!("no collection runs recorded");
        return Ok(());
    }

    println!(
        "{:<8}{:<20}{:<11}{:<12}{:<12}{:>6}{:>6}  ERROR",
        "ID", "KEYWORD", "STATUS", "COLLECTED", "RANGE END", "DAYS", "ROWS"
    );
    for run in runs {
        println!(
            "{:<8}{:<20}{:<11}{:<12}{:<12}{:>6}{:>6}  {}",
            run.id,
            run.keyword.as_deref().unwrap_or("(all)"),
            run.status,
            run.collected_date.to_string(),
            run.range_end.to_string(),
            format!("{}/{}", run.days_completed, run.days_requested),
            run.rows_saved,
            run.error_message.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

fn fmt_opt<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

