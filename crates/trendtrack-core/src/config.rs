use std::str::FromStr;

use crate::app_config::{AppConfig, Environment, StatsPolicy};
use crate::ConfigError;

const MAX_API_PAGE_SIZE: u32 = 50;
const MAX_STATS_BATCH_SIZE: usize = 50;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_num = |var: &str, default: &str| -> Result<u64, ConfigError> {
        parse_value::<u64>(var, &or_default(var, default))
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        parse_value::<u32>(var, &or_default(var, default))
    };

    let database_url = lookup("DATABASE_URL").ok().filter(|v| !v.trim().is_empty());
    let env = parse_environment(&or_default("TRENDTRACK_ENV", "development"))?;
    let log_level = lookup("TRENDTRACK_LOG_LEVEL")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| env.default_log_filter().to_string());
    let keywords_path = PathBuf::from(or_default(
        "TRENDTRACK_KEYWORDS_PATH",
        "./config/keywords.yaml",
    ));

    let youtube_api_keys = numbered_api_keys(&lookup);
    let youtube_base_url = or_default(
        "YOUTUBE_API_BASE_URL",
        "https://www.googleapis.com/youtube/v3/",
    );
    let request_timeout_secs = parse_num("TRENDTRACK_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("TRENDTRACK_USER_AGENT", "trendtrack/0.1 (trend-collector)");
    let region_code = or_default("TRENDTRACK_REGION_CODE", "KR");
    let relevance_language = or_default("TRENDTRACK_RELEVANCE_LANGUAGE", "ko");

    let page_size = parse_u32("TRENDTRACK_PAGE_SIZE", "50")?;
    if page_size == 0 || page_size > MAX_API_PAGE_SIZE {
        return Err(ConfigError::InvalidEnvVar {
            var: "TRENDTRACK_PAGE_SIZE".to_string(),
            reason: format!("must be between 1 and {MAX_API_PAGE_SIZE}, got {page_size}"),
        });
    }

    let max_pages = parse_u32("TRENDTRACK_MAX_PAGES", "20")?;
    if max_pages == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "TRENDTRACK_MAX_PAGES".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    let max_split_depth = parse_u32("TRENDTRACK_MAX_SPLIT_DEPTH", "3")?;

    let stats_batch_size = parse_value::<usize>(
        "TRENDTRACK_STATS_BATCH_SIZE",
        &or_default("TRENDTRACK_STATS_BATCH_SIZE", "50"),
    )?;
    if stats_batch_size == 0 || stats_batch_size > MAX_STATS_BATCH_SIZE {
        return Err(ConfigError::InvalidEnvVar {
            var: "TRENDTRACK_STATS_BATCH_SIZE".to_string(),
            reason: format!(
                "must be between 1 and {MAX_STATS_BATCH_SIZE}, got {stats_batch_size}"
            ),
        });
    }

    let page_delay_ms = parse_num("TRENDTRACK_PAGE_DELAY_MS", "300")?;
    let day_delay_ms = parse_num("TRENDTRACK_DAY_DELAY_MS", "200")?;
    let max_retries = parse_u32("TRENDTRACK_MAX_RETRIES", "3")?;
    let retry_backoff_ms = parse_num("TRENDTRACK_RETRY_BACKOFF_MS", "1000")?;
    let stats_policy = parse_stats_policy(&or_default("TRENDTRACK_STATS_POLICY", "best_effort"))?;

    let db_max_connections = parse_u32("TRENDTRACK_DB_MAX_CONNECTIONS", "5")?;
    let db_min_connections = parse_u32("TRENDTRACK_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_num("TRENDTRACK_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        keywords_path,
        youtube_api_keys,
        youtube_base_url,
        request_timeout_secs,
        user_agent,
        region_code,
        relevance_language,
        page_size,
        max_pages,
        max_split_depth,
        stats_batch_size,
        page_delay_ms,
        day_delay_ms,
        max_retries,
        retry_backoff_ms,
        stats_policy,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
    })
}

/// Reads `YOUTUBE_API_KEY_1`, `YOUTUBE_API_KEY_2`, ... until the first index
/// that is unset or blank.
fn numbered_api_keys<F>(lookup: &F) -> Vec<String>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let mut keys = Vec::new();
    for index in 1.. {
        match lookup(&format!("YOUTUBE_API_KEY_{index}")) {
            Ok(key) if !key.trim().is_empty() => keys.push(key.trim().to_string()),
            _ => break,
        }
    }
    keys
}

fn parse_value<T>(var: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "TRENDTRACK_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

fn parse_stats_policy(s: &str) -> Result<StatsPolicy, ConfigError> {
    match s {
        "best_effort" => Ok(StatsPolicy::BestEffort),
        "strict" => Ok(StatsPolicy::Strict),
        other => Err(ConfigError::InvalidEnvVar {
            var: "TRENDTRACK_STATS_POLICY".to_string(),
            reason: format!("expected 'best_effort' or 'strict', got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
