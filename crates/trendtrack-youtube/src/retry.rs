//! Fixed back-off retry for transient `YouTube` API failures.
//!
//! Quota exhaustion is never retried here: the caller rotates to another
//! credential instead, and retrying the spent key would only burn time.

use std::future::Future;
use std::time::Duration;

use crate::error::YoutubeError;

/// Runs `operation` with up to `max_retries` additional attempts on
/// transient errors, sleeping `backoff_ms` between attempts.
///
/// Non-transient errors are returned immediately. When every retry fails the
/// last error is returned.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_ms: u64,
    mut operation: F,
) -> Result<T, YoutubeError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, YoutubeError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !err.is_transient() || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                tracing::warn!(
                    attempt,
                    max_retries,
                    backoff_ms,
                    error = %err,
                    "YouTube transient error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn unavailable() -> YoutubeError {
        YoutubeError::Api {
            status: 503,
            reason: Some("backendError".to_owned()),
            message: "try again".to_owned(),
        }
    }

    #[test]
    fn quota_exceeded_is_not_transient() {
        assert!(!YoutubeError::QuotaExceeded {
            reason: "quotaExceeded".to_owned()
        }
        .is_transient());
    }

    #[test]
    fn rate_limit_reason_is_transient() {
        let err = YoutubeError::Api {
            status: 403,
            reason: Some("rateLimitExceeded".to_owned()),
            message: "slow down".to_owned(),
        };
        assert!(err.is_transient());
    }

    #[test]
    fn bad_request_is_not_transient() {
        let err = YoutubeError::Api {
            status: 400,
            reason: Some("invalidParameter".to_owned()),
            message: "bad".to_owned(),
        };
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, YoutubeError>(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                let attempt = c.fetch_add(1, Ordering::SeqCst) + 1;
                if attempt < 3 {
                    Err(unavailable())
                } else {
                    Ok(99)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 99);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(2, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(unavailable())
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 3, "1 try + 2 retries");
        assert!(matches!(result, Err(YoutubeError::Api { status: 503, .. })));
    }

    #[tokio::test]
    async fn does_not_retry_quota_exceeded() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(YoutubeError::QuotaExceeded {
                    reason: "quotaExceeded".to_owned(),
                })
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(YoutubeError::QuotaExceeded { .. })));
    }
}
