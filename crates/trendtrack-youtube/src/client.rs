//! HTTP client for the `YouTube` Data API v3.
//!
//! Wraps `reqwest` with API-key injection, error-body classification and
//! typed response parsing. The API key is passed per call so the caller can
//! rotate credentials without rebuilding the client.

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use trendtrack_core::AppConfig;

use crate::error::YoutubeError;
use crate::retry::retry_with_backoff;
use crate::types::{
    ErrorEnvelope, SearchHit, SearchItem, SearchListResponse, SearchPage, SearchQuery,
    VideoItem, VideoListResponse, VideoStats,
};

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3/";
const DEFAULT_USER_AGENT: &str = "trendtrack/0.1 (trend-collector)";

/// Error reasons that mean the key's daily quota is spent.
const QUOTA_REASONS: &[&str] = &["quotaExceeded", "dailyLimitExceeded"];

/// Client for the `search` and `videos` endpoints.
///
/// Use [`YoutubeClient::new`] for production or
/// [`YoutubeClient::with_base_url`] to point at a mock server in tests.
#[derive(Debug, Clone)]
pub struct YoutubeClient {
    client: Client,
    base_url: Url,
    region_code: Option<String>,
    relevance_language: Option<String>,
    max_retries: u32,
    retry_backoff_ms: u64,
}

impl YoutubeClient {
    /// Creates a client pointed at the production API.
    ///
    /// # Errors
    ///
    /// Returns [`YoutubeError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(timeout_secs: u64) -> Result<Self, YoutubeError> {
        Self::with_base_url(DEFAULT_BASE_URL, timeout_secs, DEFAULT_USER_AGENT)
    }

    /// Creates a client with a custom base URL and user agent.
    ///
    /// # Errors
    ///
    /// Returns [`YoutubeError::Http`] if the `reqwest::Client` cannot be
    /// constructed, or [`YoutubeError::InvalidBaseUrl`] if `base_url` does
    /// not parse.
    pub fn with_base_url(
        base_url: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, YoutubeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        // Exactly one trailing slash so `join("search")` appends a segment
        // instead of replacing `v3`.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let parsed = Url::parse(&normalised).map_err(|e| YoutubeError::InvalidBaseUrl {
            base_url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            base_url: parsed,
            region_code: None,
            relevance_language: None,
            max_retries: 3,
            retry_backoff_ms: 1_000,
        })
    }

    /// Builds a client from the loaded application config.
    ///
    /// # Errors
    ///
    /// Same as [`YoutubeClient::with_base_url`].
    pub fn from_config(config: &AppConfig) -> Result<Self, YoutubeError> {
        Ok(Self::with_base_url(
            &config.youtube_base_url,
            config.request_timeout_secs,
            &config.user_agent,
        )?
        .with_locale(&config.region_code, &config.relevance_language)
        .with_retry(config.max_retries, config.retry_backoff_ms))
    }

    /// Sets `regionCode` and `relevanceLanguage` on search requests. Blank
    /// values leave the parameter off.
    #[must_use]
    pub fn with_locale(mut self, region_code: &str, relevance_language: &str) -> Self {
        self.region_code = non_blank(region_code);
        self.relevance_language = non_blank(relevance_language);
        self
    }

    /// Sets the transient-failure retry budget and the fixed delay between
    /// attempts.
    #[must_use]
    pub fn with_retry(mut self, max_retries: u32, retry_backoff_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.retry_backoff_ms = retry_backoff_ms;
        self
    }

    /// Fetches one page of videos matching `query`, newest first.
    ///
    /// Items that fail to parse are logged and dropped; the rest of the page
    /// is kept.
    ///
    /// # Errors
    ///
    /// - [`YoutubeError::QuotaExceeded`] when the key's quota is spent.
    /// - [`YoutubeError::Api`] on any other non-2xx response, after transient
    ///   retries are used up.
    /// - [`YoutubeError::Http`] on network failure.
    /// - [`YoutubeError::Deserialize`] if the envelope is malformed.
    pub async fn search(
        &self,
        api_key: &str,
        query: &SearchQuery,
    ) -> Result<SearchPage, YoutubeError> {
        let url = self.search_url(api_key, query)?;
        let context = format!("search(q={}, window={})", query.keyword, query.window);

        let body = retry_with_backoff(self.max_retries, self.retry_backoff_ms, || {
            self.get_json(&url, &context)
        })
        .await?;

        let response: SearchListResponse =
            serde_json::from_value(body).map_err(|e| YoutubeError::Deserialize {
                context: context.clone(),
                source: e,
            })?;

        let items = response
            .items
            .into_iter()
            .filter_map(|raw| match serde_json::from_value::<SearchItem>(raw) {
                Ok(item) => Some(SearchHit::from(item)),
                Err(e) => {
                    tracing::warn!(context = %context, error = %e, "skipping malformed search item");
                    None
                }
            })
            .collect();

        Ok(SearchPage {
            items,
            next_page_token: response.next_page_token.filter(|t| !t.is_empty()),
        })
    }

    /// Fetches public counters for up to 50 video ids in one call.
    ///
    /// Ids the API does not return (deleted, private) are simply absent from
    /// the result. An empty `ids` slice makes no request.
    ///
    /// # Errors
    ///
    /// Same classes as [`YoutubeClient::search`].
    pub async fn video_stats(
        &self,
        api_key: &str,
        ids: &[String],
    ) -> Result<Vec<VideoStats>, YoutubeError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let url = self.videos_url(api_key, ids)?;
        let context = format!("videos(ids={})", ids.len());

        let body = retry_with_backoff(self.max_retries, self.retry_backoff_ms, || {
            self.get_json(&url, &context)
        })
        .await?;

        let response: VideoListResponse =
            serde_json::from_value(body).map_err(|e| YoutubeError::Deserialize {
                context: context.clone(),
                source: e,
            })?;

        let stats = response
            .items
            .into_iter()
            .filter_map(|raw| {
                let parsed = serde_json::from_value::<VideoItem>(raw)
                    .map_err(|e| e.to_string())
                    .and_then(|item| VideoStats::try_from(item).map_err(|e| e.to_string()));
                match parsed {
                    Ok(stats) => Some(stats),
                    Err(e) => {
                        tracing::warn!(context = %context, error = %e, "skipping malformed video item");
                        None
                    }
                }
            })
            .collect();

        Ok(stats)
    }

    fn search_url(&self, api_key: &str, query: &SearchQuery) -> Result<Url, YoutubeError> {
        let mut url = self.endpoint("search")?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("part", "id,snippet")
                .append_pair("type", "video")
                .append_pair("order", "date")
                .append_pair("q", &query.keyword)
                .append_pair("publishedAfter", &query.window.start_param())
                .append_pair("publishedBefore", &query.window.end_param())
                .append_pair("maxResults", &query.page_size.to_string());
            if let Some(token) = &query.page_token {
                pairs.append_pair("pageToken", token);
            }
            if let Some(region) = &self.region_code {
                pairs.append_pair("regionCode", region);
            }
            if let Some(lang) = &self.relevance_language {
                pairs.append_pair("relevanceLanguage", lang);
            }
            pairs.append_pair("key", api_key);
        }
        Ok(url)
    }

    fn videos_url(&self, api_key: &str, ids: &[String]) -> Result<Url, YoutubeError> {
        let mut url = self.endpoint("videos")?;
        url.query_pairs_mut()
            .append_pair("part", "statistics")
            .append_pair("id", &ids.join(","))
            .append_pair("maxResults", &ids.len().to_string())
            .append_pair("key", api_key);
        Ok(url)
    }

    fn endpoint(&self, path: &str) -> Result<Url, YoutubeError> {
        self.base_url
            .join(path)
            .map_err(|e| YoutubeError::InvalidBaseUrl {
                base_url: self.base_url.to_string(),
                reason: e.to_string(),
            })
    }

    /// Sends a GET and returns the parsed JSON body, classifying non-2xx
    /// responses from the API's error envelope.
    ///
    /// The request URL carries the API key and is never logged.
    async fn get_json(&self, url: &Url, context: &str) -> Result<serde_json::Value, YoutubeError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(classify_error(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| YoutubeError::Deserialize {
            context: context.to_owned(),
            source: e,
        })
    }
}

/// Maps a non-2xx response to [`YoutubeError::QuotaExceeded`] or
/// [`YoutubeError::Api`] using the first `errors[].reason` in the body.
pub(crate) fn classify_error(status: StatusCode, body: &str) -> YoutubeError {
    let parsed = serde_json::from_str::<ErrorEnvelope>(body).ok();
    let reason = parsed
        .as_ref()
        .and_then(|env| env.error.errors.iter().find_map(|d| d.reason.clone()));
    let message = parsed
        .map(|env| env.error.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_owned());

    match reason {
        Some(r) if QUOTA_REASONS.contains(&r.as_str()) => YoutubeError::QuotaExceeded { reason: r },
        reason => YoutubeError::Api {
            status: status.as_u16(),
            reason,
            message,
        },
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use trendtrack_core::TimeWindow;

    fn test_client(base_url: &str) -> YoutubeClient {
        YoutubeClient::with_base_url(base_url, 30, DEFAULT_USER_AGENT)
            .expect("client construction should not fail")
    }

    fn query() -> SearchQuery {
        let window = TimeWindow::new(
            Utc.with_ymd_and_hms(2026, 1, 19, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 1, 19, 23, 59, 59).unwrap(),
        )
        .unwrap();
        SearchQuery::first_page("mukbang", window, 50)
    }

    #[test]
    fn search_url_keeps_version_segment() {
        let client = test_client("https://www.googleapis.com/youtube/v3");
        let url = client.search_url("k1", &query()).unwrap();
        assert_eq!(url.path(), "/youtube/v3/search");
        let q = url.query().unwrap();
        assert!(q.contains("publishedAfter=2026-01-19T00%3A00%3A00Z"), "{q}");
        assert!(q.contains("publishedBefore=2026-01-19T23%3A59%3A59Z"), "{q}");
        assert!(q.contains("order=date"));
        assert!(q.ends_with("key=k1"));
        assert!(!q.contains("pageToken"));
        assert!(!q.contains("regionCode"));
    }

    #[test]
    fn search_url_includes_token_and_locale() {
        let client = test_client("https://example.test/v3/").with_locale("KR", "ko");
        let next = query().with_page_token("CDIQAA".to_owned());
        let url = client.search_url("k1", &next).unwrap();
        let q = url.query().unwrap();
        assert!(q.contains("pageToken=CDIQAA"));
        assert!(q.contains("regionCode=KR"));
        assert!(q.contains("relevanceLanguage=ko"));
    }

    #[test]
    fn blank_locale_is_omitted() {
        let client = test_client("https://example.test/").with_locale(" ", "");
        let url = client.search_url("k1", &query()).unwrap();
        assert!(!url.query().unwrap().contains("relevanceLanguage"));
    }

    #[test]
    fn videos_url_joins_ids() {
        let client = test_client("https://example.test/v3");
        let ids = vec!["a".to_owned(), "b".to_owned()];
        let url = client.videos_url("k1", &ids).unwrap();
        assert_eq!(url.path(), "/v3/videos");
        assert!(url.query().unwrap().contains("id=a%2Cb"));
    }

    #[test]
    fn classify_quota_exceeded() {
        let body = r#"{"error":{"code":403,"message":"quota","errors":[{"reason":"quotaExceeded"}]}}"#;
        let err = classify_error(StatusCode::FORBIDDEN, body);
        assert!(err.is_quota_exceeded());
    }

    #[test]
    fn classify_rate_limit_as_transient_api_error() {
        let body = r#"{"error":{"code":403,"message":"slow","errors":[{"reason":"rateLimitExceeded"}]}}"#;
        let err = classify_error(StatusCode::FORBIDDEN, body);
        assert!(!err.is_quota_exceeded());
        assert!(err.is_transient());
    }

    #[test]
    fn classify_unparseable_body_uses_status_text() {
        let err = classify_error(StatusCode::BAD_GATEWAY, "<html>");
        match err {
            YoutubeError::Api {
                status,
                reason,
                message,
            } => {
                assert_eq!(status, 502);
                assert!(reason.is_none());
                assert_eq!(message, "Bad Gateway");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = YoutubeClient::with_base_url("not a url", 30, DEFAULT_USER_AGENT).unwrap_err();
        assert!(matches!(err, YoutubeError::InvalidBaseUrl { .. }));
    }
}
