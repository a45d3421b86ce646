use thiserror::Error;
use trendtrack_db::DbError;
use trendtrack_youtube::YoutubeError;

#[derive(Debug, Error)]
pub enum CollectError {
    #[error("no API credentials configured")]
    NoCredentials,

    /// Every credential in the pool hit its daily quota.
    #[error("all {credentials} API credentials exhausted their quota")]
    QuotaExhausted { credentials: usize },

    /// A transient failure outlived the retry budget.
    #[error("transient API failure after retries: {0}")]
    RetriesExhausted(#[source] YoutubeError),

    /// A non-transient, non-quota API failure.
    #[error("API request failed: {0}")]
    Api(#[source] YoutubeError),

    #[error("statistics unresolved for {missing} of {requested} items")]
    IncompleteStats { missing: usize, requested: usize },

    #[error("snapshot store error: {0}")]
    Store(#[from] DbError),

    /// The store failed mid-run; earlier days were already written.
    #[error("snapshot store failed after {days_completed} of {days_requested} days: {source}")]
    StoreFailed {
        days_completed: usize,
        days_requested: usize,
        #[source]
        source: DbError,
    },
}

impl CollectError {
    /// `true` for errors after which no further API work is possible in this
    /// run. The remaining days are reported for resumption.
    #[must_use]
    pub fn halts_run(&self) -> bool {
        matches!(
            self,
            CollectError::QuotaExhausted { .. } | CollectError::RetriesExhausted(_)
        )
    }
}

impl From<YoutubeError> for CollectError {
    fn from(err: YoutubeError) -> Self {
        if err.is_transient() {
            CollectError::RetriesExhausted(err)
        } else {
            CollectError::Api(err)
        }
    }
}
