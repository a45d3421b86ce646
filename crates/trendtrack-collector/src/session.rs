//! Credential-aware access to the metrics API.
//!
//! Every remote call made by the executor and aggregator goes through an
//! [`ApiSession`], which owns the [`CredentialPool`] for the run. On a
//! quota-exceeded response the active key is marked exhausted, the pool
//! rotates and the same request is re-issued with the next key. The loop is
//! bounded by the pool size.

use std::time::Duration;

use trendtrack_core::{AppConfig, StatsPolicy};
use trendtrack_youtube::{MetricsApi, SearchPage, SearchQuery, VideoStats, YoutubeError};

use crate::credentials::{Credential, CredentialPool};
use crate::error::CollectError;

/// Units the API bills per `search.list` call.
pub const SEARCH_QUOTA_COST: u64 = 100;
/// Units the API bills per `videos.list` call.
pub const STATS_QUOTA_COST: u64 = 1;

/// Tunables for one collection run.
#[derive(Debug, Clone)]
pub struct CollectorSettings {
    pub page_size: u32,
    pub max_pages: u32,
    pub max_split_depth: u32,
    pub stats_batch_size: usize,
    pub page_delay: Duration,
    pub day_delay: Duration,
    pub stats_policy: StatsPolicy,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            page_size: 50,
            max_pages: 20,
            max_split_depth: 3,
            stats_batch_size: 50,
            page_delay: Duration::from_millis(300),
            day_delay: Duration::from_millis(200),
            stats_policy: StatsPolicy::BestEffort,
        }
    }
}

impl CollectorSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            page_size: config.page_size,
            max_pages: config.max_pages,
            max_split_depth: config.max_split_depth,
            stats_batch_size: config.stats_batch_size,
            page_delay: Duration::from_millis(config.page_delay_ms),
            day_delay: Duration::from_millis(config.day_delay_ms),
            stats_policy: config.stats_policy,
        }
    }
}

/// Counts of remote calls issued. Calls refused with a quota error are
/// counted in `quota_rejections` only, since they are not billed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApiCallCounts {
    pub search_calls: u64,
    pub stats_calls: u64,
    pub quota_rejections: u64,
}

impl ApiCallCounts {
    #[must_use]
    pub fn quota_units(&self) -> u64 {
        self.search_calls * SEARCH_QUOTA_COST + self.stats_calls * STATS_QUOTA_COST
    }

    pub fn add(&mut self, other: ApiCallCounts) {
        self.search_calls += other.search_calls;
        self.stats_calls += other.stats_calls;
        self.quota_rejections += other.quota_rejections;
    }
}

pub struct ApiSession<'a, A> {
    api: &'a A,
    credentials: CredentialPool,
    calls: ApiCallCounts,
}

impl<'a, A: MetricsApi> ApiSession<'a, A> {
    #[must_use]
    pub fn new(api: &'a A, credentials: CredentialPool) -> Self {
        Self {
            api,
            credentials,
            calls: ApiCallCounts::default(),
        }
    }

    #[must_use]
    pub fn calls(&self) -> ApiCallCounts {
        self.calls
    }

    #[must_use]
    pub fn credentials(&self) -> &CredentialPool {
        &self.credentials
    }

    /// Zeroes the call counters. Credential exhaustion is kept.
    pub fn reset_calls(&mut self) {
        self.calls = ApiCallCounts::default();
    }

    /// Clears every exhaustion flag, e.g. once the daily quota has refilled.
    pub fn reset_credentials(&mut self) {
        self.credentials.reset();
    }

    /// One search page, rotating credentials on quota exhaustion.
    ///
    /// # Errors
    ///
    /// [`CollectError::QuotaExhausted`] once every key is spent,
    /// [`CollectError::RetriesExhausted`] or [`CollectError::Api`] otherwise.
    pub async fn search(&mut self, query: &SearchQuery) -> Result<SearchPage, CollectError> {
        if self.credentials.all_exhausted() {
            return Err(self.exhausted());
        }
        for _ in 0..self.credentials.len() {
            let credential = self.credentials.current().clone();
            match self.api.search(credential.key(), query).await {
                Ok(page) => {
                    self.calls.search_calls += 1;
                    return Ok(page);
                }
                Err(err) => {
                    if !err.is_quota_exceeded() {
                        self.calls.search_calls += 1;
                    }
                    self.recover(&credential, err)?;
                }
            }
        }
        Err(self.exhausted())
    }

    /// Statistics for one id batch, rotating credentials on quota exhaustion.
    ///
    /// # Errors
    ///
    /// Same as [`ApiSession::search`].
    pub async fn video_stats(&mut self, ids: &[String]) -> Result<Vec<VideoStats>, CollectError> {
        if self.credentials.all_exhausted() {
            return Err(self.exhausted());
        }
        for _ in 0..self.credentials.len() {
            let credential = self.credentials.current().clone();
            match self.api.video_stats(credential.key(), ids).await {
                Ok(stats) => {
                    self.calls.stats_calls += 1;
                    return Ok(stats);
                }
                Err(err) => {
                    if !err.is_quota_exceeded() {
                        self.calls.stats_calls += 1;
                    }
                    self.recover(&credential, err)?;
                }
            }
        }
        Err(self.exhausted())
    }

    /// `Ok(())` means a fresh credential is active and the call should be
    /// repeated.
    fn recover(&mut self, credential: &Credential, err: YoutubeError) -> Result<(), CollectError> {
        if !err.is_quota_exceeded() {
            return Err(CollectError::from(err));
        }

        self.calls.quota_rejections += 1;
        self.credentials.mark_exhausted(credential.id());
        if !self.credentials.rotate() {
            tracing::error!(
                credentials = self.credentials.len(),
                "every API credential has exhausted its quota"
            );
            return Err(self.exhausted());
        }

        tracing::warn!(
            exhausted = credential.id() + 1,
            next = self.credentials.current().id() + 1,
            total = self.credentials.len(),
            error = %err,
            "API credential quota exceeded, rotating"
        );
        Ok(())
    }

    fn exhausted(&self) -> CollectError {
        CollectError::QuotaExhausted {
            credentials: self.credentials.len(),
        }
    }
}
