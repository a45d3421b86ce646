use chrono::{DateTime, Utc};
use serde::Deserialize;
use trendtrack_core::TimeWindow;

/// One page request against the `search` endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub keyword: String,
    pub window: TimeWindow,
    /// `maxResults`, 1..=50.
    pub page_size: u32,
    pub page_token: Option<String>,
}

impl SearchQuery {
    #[must_use]
    pub fn first_page(keyword: &str, window: TimeWindow, page_size: u32) -> Self {
        Self {
            keyword: keyword.to_owned(),
            window,
            page_size,
            page_token: None,
        }
    }

    /// The same query advanced to `token`.
    #[must_use]
    pub fn with_page_token(&self, token: String) -> Self {
        Self {
            page_token: Some(token),
            ..self.clone()
        }
    }
}

/// A video returned by a search, with its publication instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub video_id: String,
    pub published_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPage {
    pub items: Vec<SearchHit>,
    pub next_page_token: Option<String>,
}

/// Public counters for one video. Hidden counters are reported as zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoStats {
    pub video_id: String,
    pub views: i64,
    pub likes: i64,
    pub comments: i64,
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Top-level `search` response. Items stay as raw JSON so a single malformed
/// entry can be dropped without failing the page.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SearchListResponse {
    #[serde(default)]
    pub next_page_token: Option<String>,
    #[serde(default)]
    pub items: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchItem {
    pub id: SearchItemId,
    pub snippet: SearchSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SearchItemId {
    pub video_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SearchSnippet {
    pub published_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VideoListResponse {
    #[serde(default)]
    pub items: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VideoItem {
    pub id: String,
    #[serde(default)]
    pub statistics: VideoStatistics,
}

/// Counters arrive as decimal strings and are absent when hidden.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VideoStatistics {
    pub view_count: Option<String>,
    pub like_count: Option<String>,
    pub comment_count: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub errors: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorDetail {
    #[serde(default)]
    pub reason: Option<String>,
}

impl From<SearchItem> for SearchHit {
    fn from(item: SearchItem) -> Self {
        Self {
            video_id: item.id.video_id,
            published_at: item.snippet.published_at,
        }
    }
}

impl TryFrom<VideoItem> for VideoStats {
    type Error = std::num::ParseIntError;

    fn try_from(item: VideoItem) -> Result<Self, Self::Error> {
        fn count(raw: Option<&str>) -> Result<i64, std::num::ParseIntError> {
            raw.map_or(Ok(0), str::parse)
        }

        Ok(Self {
            views: count(item.statistics.view_count.as_deref())?,
            likes: count(item.statistics.like_count.as_deref())?,
            comments: count(item.statistics.comment_count.as_deref())?,
            video_id: item.id,
        })
    }
}
