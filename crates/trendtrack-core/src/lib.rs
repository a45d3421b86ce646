//! Shared configuration and domain types for the trend collector.

mod app_config;
mod config;
pub mod keywords;
pub mod trends;
pub mod window;

use thiserror::Error;

pub use app_config::{AppConfig, Environment, StatsPolicy};
pub use config::{load_app_config, load_app_config_from_env};
pub use keywords::{load_keywords, KeywordConfig, KeywordsFile};
pub use trends::{apply_growth, summarize_by_collection, CollectionSummary, DailyAggregate};
pub use window::{day_window, TimeWindow};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read keywords file {path}: {source}")]
    KeywordsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse keywords file: {0}")]
    KeywordsFileParse(#[source] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Validation(String),
}
