use std::future::Future;

use crate::client::YoutubeClient;
use crate::error::YoutubeError;
use crate::types::{SearchPage, SearchQuery, VideoStats};

/// The two remote operations the collector depends on.
///
/// [`YoutubeClient`] is the production implementation; tests substitute
/// scripted fakes.
pub trait MetricsApi {
    /// One page of search results for `query`, authenticated with `api_key`.
    fn search(
        &self,
        api_key: &str,
        query: &SearchQuery,
    ) -> impl Future<Output = Result<SearchPage, YoutubeError>>;

    /// Counters for up to 50 ids, authenticated with `api_key`.
    fn video_stats(
        &self,
        api_key: &str,
        ids: &[String],
    ) -> impl Future<Output = Result<Vec<VideoStats>, YoutubeError>>;
}

impl MetricsApi for YoutubeClient {
    async fn search(&self, api_key: &str, query: &SearchQuery) -> Result<SearchPage, YoutubeError> {
        YoutubeClient::search(self, api_key, query).await
    }

    async fn video_stats(
        &self,
        api_key: &str,
        ids: &[String],
    ) -> Result<Vec<VideoStats>, YoutubeError> {
        YoutubeClient::video_stats(self, api_key, ids).await
    }
}
