//! Exponential backoff with jitter for remote calls.

use crate::error::{ClientError, ClientResult, Disposition};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Bounds applied to a `Retry-After` header, in seconds.
const RETRY_AFTER_MIN_SECS: u64 = 1;
const RETRY_AFTER_MAX_SECS: u64 = 30;

/// Retry policy configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt (0 = no retries).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each further retry.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Cap on the computed delay.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Upper bound of the random delay added to every backoff.
    #[serde(default = "default_jitter_ms")]
    pub jitter_ms: u64,
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    250
}

fn default_max_delay_ms() -> u64 {
    30_000
}

fn default_jitter_ms() -> u64 {
    200
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            jitter_ms: default_jitter_ms(),
        }
    }
}

impl RetryPolicy {
    /// Create a policy without jitter.
    #[must_use]
    pub fn new(max_retries: u32, base_delay_ms: u64) -> Self {
        Self {
            max_retries,
            base_delay_ms,
            jitter_ms: 0,
            ..Default::default()
        }
    }

    /// A policy that never retries.
    #[must_use]
    pub fn none() -> Self {
        Self::new(0, 0)
    }

    #[must_use]
    pub fn should_retry(&self, attempt: u32, error: &ClientError) -> bool {
        attempt < self.max_retries && error.disposition() == Disposition::Retryable
    }

    /// Delay before retry number `attempt + 1`.
    ///
    /// A `Retry-After` value wins over the computed backoff and is clamped to
    /// 1..=30 seconds.
    #[must_use]
    pub fn delay_for(&self, attempt: u32, error: &ClientError) -> Duration {
        if let ClientError::RateLimited {
            retry_after_secs: Some(secs),
        } = error
        {
            return Duration::from_secs((*secs).clamp(RETRY_AFTER_MIN_SECS, RETRY_AFTER_MAX_SECS));
        }
        let exponential = self
            .base_delay_ms
            .saturating_mul(2u64.saturating_pow(attempt))
            .min(self.max_delay_ms);
        let jitter = if self.jitter_ms > 0 {
            rand::thread_rng().gen_range(0..=self.jitter_ms)
        } else {
            0
        };
        Duration::from_millis(exponential.saturating_add(jitter))
    }

    /// Run `f` until it succeeds, fails fatally, or the retry budget is spent.
    pub async fn execute<F, Fut, T>(&self, operation_name: &str, mut f: F) -> ClientResult<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = ClientResult<T>>,
    {
        let mut attempt: u32 = 0;
        loop {
            match f().await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!(operation = operation_name, attempt = attempt + 1, "Call succeeded after retries");
                    }
                    return Ok(value);
                }
                Err(error) => {
                    if error.disposition() == Disposition::Fatal {
                        return Err(error);
                    }
                    if !self.should_retry(attempt, &error) {
                        warn!(
                            operation = operation_name,
                            attempts = attempt + 1,
                            error = %error,
                            "Max retries exceeded"
                        );
                        return Err(ClientError::MaxRetriesExceeded {
                            attempts: attempt + 1,
                            message: format!("{operation_name}: {error}"),
                        });
                    }

                    let delay = self.delay_for(attempt, &error);
                    debug!(
                        operation = operation_name,
                        attempt = attempt + 1,
                        max_retries = self.max_retries,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %error,
                        "Retrying after transient error"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn server_error() -> ClientError {
        ClientError::Api {
            status: 502,
            detail: "bad gateway".into(),
        }
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.base_delay_ms, 250);
        assert_eq!(policy.jitter_ms, 200);
    }

    #[test]
    fn test_delay_is_exponential_and_capped() {
        let policy = RetryPolicy {
            max_delay_ms: 1_500,
            ..RetryPolicy::new(5, 250)
        };
        let err = server_error();
        assert_eq!(policy.delay_for(0, &err), Duration::from_millis(250));
        assert_eq!(policy.delay_for(1, &err), Duration::from_millis(500));
        assert_eq!(policy.delay_for(2, &err), Duration::from_millis(1_000));
        assert_eq!(policy.delay_for(3, &err), Duration::from_millis(1_500));
    }

    #[test]
    fn test_jitter_stays_in_range() {
        let policy = RetryPolicy::default();
        for _ in 0..50 {
            let delay = policy.delay_for(0, &server_error()).as_millis();
            assert!((250..=450).contains(&delay), "{delay}");
        }
    }

    #[test]
    fn test_retry_after_is_clamped() {
        let policy = RetryPolicy::default();
        let zero = ClientError::RateLimited { retry_after_secs: Some(0) };
        let huge = ClientError::RateLimited { retry_after_secs: Some(600) };
        assert_eq!(policy.delay_for(0, &zero), Duration::from_secs(1));
        assert_eq!(policy.delay_for(0, &huge), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_execute_retries_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::new(3, 1);
        let counter = calls.clone();
        let result = policy
            .execute("flaky", || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(server_error())
                    } else {
                        Ok(7)
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_execute_gives_up() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::new(2, 1);
        let counter = calls.clone();
        let result: ClientResult<()> = policy
            .execute("down", || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(server_error())
                }
            })
            .await;
        assert!(matches!(result, Err(ClientError::MaxRetriesExceeded { attempts: 3, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_execute_does_not_retry_fatal() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::new(5, 1);
        let counter = calls.clone();
        let result: ClientResult<()> = policy
            .execute("bad request", || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(ClientError::Api {
                        status: 400,
                        detail: "nope".into(),
                    })
                }
            })
            .await;
        assert!(matches!(result, Err(ClientError::Api { status: 400, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
