use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl Environment {
    /// `EnvFilter` directive used when `TRENDTRACK_LOG_LEVEL` is unset.
    #[must_use]
    pub fn default_log_filter(&self) -> &'static str {
        match self {
            Environment::Development => "info,trendtrack_collector=debug,trendtrack_youtube=debug",
            Environment::Test => "warn",
            Environment::Production => "info",
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// How the aggregator treats ids the statistics endpoint did not resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsPolicy {
    /// Unresolved ids and failed batches are logged and left out of the sums.
    BestEffort,
    /// Any unresolved id fails the day.
    Strict,
}

impl std::fmt::Display for StatsPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatsPolicy::BestEffort => write!(f, "best_effort"),
            StatsPolicy::Strict => write!(f, "strict"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub env: Environment,
    pub log_level: String,
    pub keywords_path: PathBuf,
    pub youtube_api_keys: Vec<String>,
    pub youtube_base_url: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub region_code: String,
    pub relevance_language: String,
    pub page_size: u32,
    pub max_pages: u32,
    pub max_split_depth: u32,
    pub stats_batch_size: usize,
    pub page_delay_ms: u64,
    pub day_delay_ms: u64,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
    pub stats_policy: StatsPolicy,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("keywords_path", &self.keywords_path)
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "youtube_api_keys",
                &format!("[{} redacted]", self.youtube_api_keys.len()),
            )
            .field("youtube_base_url", &self.youtube_base_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("region_code", &self.region_code)
            .field("relevance_language", &self.relevance_language)
            .field("page_size", &self.page_size)
            .field("max_pages", &self.max_pages)
            .field("max_split_depth", &self.max_split_depth)
            .field("stats_batch_size", &self.stats_batch_size)
            .field("page_delay_ms", &self.page_delay_ms)
            .field("day_delay_ms", &self.day_delay_ms)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("stats_policy", &self.stats_policy)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .finish()
    }
}
