//! One retry policy shared by resolution, geometry recovery and bridge
//! availability checks, so timing behavior is consistent and testable.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::BridgeError;

/// Bounded retry with exponential backoff and jitter. Never an unbounded
/// loop: `max_attempts` caps every user.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,

    /// Delay before the second attempt.
    pub base_delay_ms: u64,

    /// Multiplier applied per subsequent attempt.
    pub backoff_factor: f64,

    /// Uniform random jitter added to each delay.
    pub jitter_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 100,
            backoff_factor: 2.0,
            jitter_ms: 25,
        }
    }
}

impl RetryPolicy {
    /// Policy for a single attempt with no waiting.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay_ms: 0,
            backoff_factor: 1.0,
            jitter_ms: 0,
        }
    }

    /// Delay before attempt `attempt` (0-based; attempt 0 has no delay).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let backoff = self.base_delay_ms as f64 * self.backoff_factor.powi(attempt as i32 - 1);
        let jitter = if self.jitter_ms > 0 {
            rand::thread_rng().gen_range(0..=self.jitter_ms)
        } else {
            0
        };
        Duration::from_millis(backoff as u64 + jitter)
    }

    /// Run `op` until it succeeds, a non-retriable error occurs, or the
    /// attempt budget is spent. Returns the last error on exhaustion.
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T, BridgeError>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<T, BridgeError>> + Send,
    {
        let attempts = self.max_attempts.max(1);
        let mut last_err = None;

        for attempt in 0..attempts {
            let delay = self.delay_for(attempt);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            match op().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    debug!(
                        what,
                        attempt = attempt + 1,
                        attempts,
                        error = %err,
                        "attempt failed"
                    );
                    let stop = !err.retriable;
                    last_err = Some(err);
                    if stop {
                        break;
                    }
                }
            }
        }

        Err(last_err.unwrap_or_else(|| {
            BridgeError::new(crate::errors::BridgeErrorKind::Internal)
                .with_hint(format!("{}: no attempts executed", what))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::BridgeErrorKind;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn first_attempt_has_no_delay() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::ZERO);
    }

    #[test]
    fn backoff_grows_and_is_bounded_by_jitter() {
        let policy = RetryPolicy {
            max_attempts: 4,
            base_delay_ms: 100,
            backoff_factor: 2.0,
            jitter_ms: 10,
        };
        let d1 = policy.delay_for(1).as_millis() as u64;
        let d2 = policy.delay_for(2).as_millis() as u64;
        let d3 = policy.delay_for(3).as_millis() as u64;
        assert!((100..=110).contains(&d1), "d1={}", d1);
        assert!((200..=210).contains(&d2), "d2={}", d2);
        assert!((400..=410).contains(&d3), "d3={}", d3);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_until_success() {
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay_ms: 10,
            backoff_factor: 1.0,
            jitter_ms: 0,
        };
        let calls = AtomicU32::new(0);
        let result = policy
            .run("test-op", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(BridgeError::unavailable("not ready"))
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn non_retriable_errors_stop_immediately() {
        let policy = RetryPolicy::default();
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = policy
            .run("test-op", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(BridgeError::new(BridgeErrorKind::AlreadyAttached)) }
            })
            .await;
        assert_eq!(result.unwrap_err().kind, BridgeErrorKind::AlreadyAttached);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn attempt_budget_is_capped() {
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay_ms: 1,
            backoff_factor: 1.0,
            jitter_ms: 0,
        };
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = policy
            .run("test-op", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(BridgeError::unavailable("still not ready")) }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
