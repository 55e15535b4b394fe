//! Bounded, sequential retry with exponential backoff.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one.
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// `base × 2^attempt`, no jitter. `attempt` is 0 for the first retry.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Same policy with `max_retries` lowered to at most `cap`.
    pub fn capped(self, cap: u32) -> Self {
        Self {
            max_retries: self.max_retries.min(cap),
            ..self
        }
    }
}

/// Runs `f` until it succeeds, fails with a non-retryable error, or the
/// policy is exhausted. The last error is returned unchanged.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, operation: &str, f: F) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    with_retry_when(policy, operation, AppError::is_retryable, f).await
}

/// [`with_retry`] with a caller-chosen test for which errors earn another attempt.
pub async fn with_retry_when<T, F, Fut, R>(
    policy: &RetryPolicy,
    operation: &str,
    retryable: R,
    mut f: F,
) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
    R: Fn(&AppError) -> bool,
{
    let mut attempt = 0;
    loop {
        match f().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt >= policy.max_retries || !retryable(&e) => return Err(e),
            Err(e) => {
                let delay = policy.delay_for(attempt);
                warn!(
                    operation,
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    "{e}; retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// Bounds `fut` by `limit`. Elapsing maps to [`AppError::Timeout`] tagged
/// with `operation`, which the retry loop treats like any other failure.
pub async fn with_timeout<T, Fut>(limit: Duration, operation: &str, fut: Fut) -> Result<T, AppError>
where
    Fut: Future<Output = Result<T, AppError>>,
{
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| AppError::Timeout {
            operation: operation.to_string(),
        })?
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    fn policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy::new(max_retries, Duration::from_millis(500))
    }

    #[test]
    fn test_delays_double() {
        let p = policy(3);
        assert_eq!(p.delay_for(0), Duration::from_millis(500));
        assert_eq!(p.delay_for(1), Duration::from_millis(1000));
        assert_eq!(p.delay_for(2), Duration::from_millis(2000));
    }

    #[test]
    fn test_capped() {
        assert_eq!(policy(2).capped(1).max_retries, 1);
        assert_eq!(policy(0).capped(1).max_retries, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_transient_failures() {
        let start = Instant::now();
        let mut calls = 0;
        let out = with_retry(&policy(2), "ai:analyze", || {
            calls += 1;
            let n = calls;
            async move {
                if n < 3 {
                    Err(AppError::Extraction(format!("attempt {n}")))
                } else {
                    Ok(n)
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(out, 3);
        // 500ms + 1000ms of backoff
        assert_eq!(start.elapsed().as_millis(), 1500);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_returns_last_error_unchanged() {
        let mut calls = 0;
        let err = with_retry(&policy(2), "ai:generate", || {
            calls += 1;
            let n = calls;
            async move { Err::<(), _>(AppError::Extraction(format!("attempt {n}"))) }
        })
        .await
        .unwrap_err();
        assert_eq!(calls, 3);
        assert_eq!(err.to_string(), "Content extraction failed: attempt 3");
    }

    #[tokio::test(start_paused = true)]
    async fn test_bad_request_is_not_retried() {
        let mut calls = 0;
        let err = with_retry(&policy(2), "build", || {
            calls += 1;
            async { Err::<(), _>(AppError::BadRequest("no input".into())) }
        })
        .await
        .unwrap_err();
        assert_eq!(calls, 1);
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_predicate_stops_on_timeout() {
        let mut calls = 0;
        let not_timeout = |e: &AppError| !matches!(e, AppError::Timeout { .. });
        let err = with_retry_when(&policy(2), "pdf:cv.pdf", not_timeout, || {
            calls += 1;
            async {
                Err::<(), _>(AppError::Timeout {
                    operation: "pdf:cv.pdf".into(),
                })
            }
        })
        .await
        .unwrap_err();
        assert_eq!(calls, 1);
        assert!(matches!(err, AppError::Timeout { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_tagged_with_operation() {
        let err = with_timeout(Duration::from_millis(10), "pdf:cv.pdf", async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<_, AppError>(())
        })
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "Operation failed (pdf:cv.pdf)");
    }
}
