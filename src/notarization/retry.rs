use crate::error::{TrustSealError, TrustSealResult};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Most sequential JSON-RPC calls one retried ledger operation makes
/// (`estimate_cost` asks for the gas estimate, then the gas price)
pub const MAX_RPC_CALLS_PER_ATTEMPT: u32 = 2;

/// Bounded retry with exponential backoff for ledger calls
///
/// Only transient failures (`NetworkUnavailable`) are retried. Each attempt runs
/// under `attempt_timeout`; an elapsed attempt counts as a network fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(2),
            attempt_timeout: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no backoff
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Size `attempt_timeout` so every RPC call in an attempt gets its full `rpc_timeout`
    pub fn with_rpc_timeout(self, rpc_timeout: Duration) -> Self {
        Self {
            attempt_timeout: rpc_timeout.saturating_mul(MAX_RPC_CALLS_PER_ATTEMPT),
            ..self
        }
    }

    /// Delay before retry number `retry` (1-based)
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }

    /// Run `operation` until it succeeds, fails permanently, or the budget is spent
    ///
    /// # Errors
    /// Non-transient errors are returned unchanged. Exhausting the budget on
    /// transient errors returns `LedgerUnreachable` with the attempt count.
    pub async fn run<T, F, Fut>(&self, label: &str, mut operation: F) -> TrustSealResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = TrustSealResult<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            let result = match tokio::time::timeout(self.attempt_timeout, operation()).await {
                Ok(result) => result,
                Err(_) => Err(TrustSealError::NetworkUnavailable(format!(
                    "{} timed out after {}ms",
                    label,
                    self.attempt_timeout.as_millis()
                ))),
            };

            let error = match result {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) => e,
            };

            if attempt >= max_attempts {
                return Err(TrustSealError::LedgerUnreachable {
                    attempts: attempt,
                    last_error: error.to_string(),
                });
            }

            let delay = self.backoff_for(attempt);
            warn!(
                operation = label,
                attempt = attempt,
                max_attempts = max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Ledger call failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(4),
            attempt_timeout: Duration::from_millis(200),
        }
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_for(1), Duration::from_millis(250));
        assert_eq!(policy.backoff_for(2), Duration::from_millis(500));
        assert_eq!(policy.backoff_for(3), Duration::from_millis(1000));
        assert_eq!(policy.backoff_for(4), Duration::from_secs(2));
        assert_eq!(policy.backoff_for(40), Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_attempt_fits_two_slow_rpc_calls() {
        let rpc_timeout = Duration::from_millis(100);
        let policy = RetryPolicy {
            max_attempts: 1,
            ..fast_policy(1)
        }
        .with_rpc_timeout(rpc_timeout);
        assert_eq!(policy.attempt_timeout, Duration::from_millis(200));

        // Two calls that each take most of their own timeout
        let result = policy
            .run("estimate", || async {
                tokio::time::sleep(Duration::from_millis(70)).await;
                tokio::time::sleep(Duration::from_millis(70)).await;
                Ok(1)
            })
            .await;
        assert_eq!(result.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_retries_transient_then_succeeds() {
        let calls = AtomicU32::new(0);
        let result = fast_policy(3)
            .run("estimate", || async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(TrustSealError::NetworkUnavailable("refused".to_string()))
                } else {
                    Ok(7)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_reports_attempts() {
        let calls = AtomicU32::new(0);
        let err = fast_policy(3)
            .run("estimate", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(TrustSealError::NetworkUnavailable("refused".to_string()))
            })
            .await
            .unwrap_err();

        match err {
            TrustSealError::LedgerUnreachable {
                attempts,
                last_error,
            } => {
                assert_eq!(attempts, 3);
                assert!(last_error.contains("refused"));
            }
            other => panic!("Expected LedgerUnreachable, got {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_not_retried() {
        let calls = AtomicU32::new(0);
        let err = fast_policy(3)
            .run("submit", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(TrustSealError::SubmissionRejected("nonce too low".to_string()))
            })
            .await
            .unwrap_err();

        assert!(matches!(err, TrustSealError::SubmissionRejected(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_slow_attempt_counts_as_network_fault() {
        let policy = RetryPolicy {
            attempt_timeout: Duration::from_millis(10),
            ..fast_policy(2)
        };
        let err = policy
            .run("estimate", || async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok(())
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            TrustSealError::LedgerUnreachable { attempts: 2, .. }
        ));
    }

    #[tokio::test]
    async fn test_zero_attempts_still_runs_once() {
        let calls = AtomicU32::new(0);
        let _ = fast_policy(0)
            .run("estimate", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
