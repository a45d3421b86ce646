use thiserror::Error;

/// Errors returned by the `YouTube` Data API client.
#[derive(Debug, Error)]
pub enum YoutubeError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The credential's daily allowance is spent (`quotaExceeded` /
    /// `dailyLimitExceeded`).
    #[error("quota exceeded: {reason}")]
    QuotaExceeded { reason: String },

    /// Any other non-2xx response, with the first `reason` from the error body.
    #[error("YouTube API error {status} ({}): {message}", reason.as_deref().unwrap_or("unknown"))]
    Api {
        status: u16,
        reason: Option<String>,
        message: String,
    },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid base URL '{base_url}': {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },
}

impl YoutubeError {
    #[must_use]
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, YoutubeError::QuotaExceeded { .. })
    }

    /// `true` for failures worth retrying after a back-off delay.
    ///
    /// **Retriable:** timeouts, connection failures, 5xx responses and the
    /// per-second throttling reasons (`rateLimitExceeded`,
    /// `userRateLimitExceeded`, `backendError`).
    ///
    /// **Not retriable:** quota exhaustion (handled by credential rotation),
    /// other 4xx responses, malformed bodies, configuration errors.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            YoutubeError::Http(e) => {
                e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
            }
            YoutubeError::Api { status, reason, .. } => {
                *status >= 500
                    || *status == 429
                    || matches!(
                        reason.as_deref(),
                        Some("rateLimitExceeded" | "userRateLimitExceeded" | "backendError")
                    )
            }
            YoutubeError::QuotaExceeded { .. }
            | YoutubeError::Deserialize { .. }
            | YoutubeError::InvalidBaseUrl { .. } => false,
        }
    }
}
