//! Offline tests for trendtrack-db pool configuration and row types.
//! These tests do not require a live database connection.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use std::path::PathBuf;
use trendtrack_core::{AppConfig, DailyAggregate, Environment, StatsPolicy};
use trendtrack_db::{PoolConfig, TrendSnapshotRow};

fn app_config() -> AppConfig {
    AppConfig {
        database_url: Some("postgres://example".to_string()),
        env: Environment::Test,
        log_level: "info".to_string(),
        keywords_path: PathBuf::from("./config/keywords.yaml"),
        youtube_api_keys: vec!["k1".to_string()],
        youtube_base_url: "https://www.googleapis.com/youtube/v3/".to_string(),
        request_timeout_secs: 30,
        user_agent: "ua".to_string(),
        region_code: "KR".to_string(),
        relevance_language: "ko".to_string(),
        page_size: 50,
        max_pages: 20,
        max_split_depth: 3,
        stats_batch_size: 50,
        page_delay_ms: 0,
        day_delay_ms: 0,
        max_retries: 3,
        retry_backoff_ms: 1_000,
        stats_policy: StatsPolicy::BestEffort,
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
    }
}

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let pool_config = PoolConfig::from_app_config(&app_config());
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

#[test]
fn snapshot_row_converts_to_aggregate() {
    let observed = NaiveDate::from_ymd_opt(2026, 1, 19).unwrap();
    let collected = NaiveDate::from_ymd_opt(2026, 1, 21).unwrap();
    let row = TrendSnapshotRow {
        id: 7,
        keyword: "mukbang".to_string(),
        observed_date: observed,
        collected_date: collected,
        item_count: 140,
        total_views: 15_000,
        total_likes: 900,
        total_comments: 120,
        views_growth: 5_000,
        likes_growth: 100,
        comments_growth: -2,
        views_growth_rate: Decimal::new(5000, 2),
        likes_growth_rate: Decimal::new(1250, 2),
        comments_growth_rate: Decimal::new(-164, 2),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    let agg = DailyAggregate::from(row);
    assert_eq!(agg.keyword, "mukbang");
    assert_eq!(agg.observed_date, observed);
    assert_eq!(agg.collected_date, collected);
    assert_eq!(agg.item_count, 140);
    assert_eq!(agg.views_growth_rate, Decimal::new(50, 0));
    assert_eq!(agg.comments_growth, -2);
}
