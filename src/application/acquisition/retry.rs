//! Exponential-backoff retry loop.
//!
//! State machine: `attempt n -> failure -> wait(delay(n)) -> attempt n+1`,
//! ending in success or, after `max_attempts`, terminal failure. The attempt
//! itself is a caller-supplied closure, so the loop is independent of any
//! HTTP library.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one. At least 1.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
        }
    }

    /// Wait after failed attempt `attempt` (1-based): `min(base * 2^(attempt-1), max)`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        2u32.checked_pow(exponent)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(4, Duration::from_secs(1), Duration::from_secs(8))
    }
}

/// Terminal failure after every attempt failed
#[derive(Debug, Clone, PartialEq)]
pub struct RetryExhausted<E> {
    pub attempts: u32,
    pub last_error: E,
}

/// Runs `attempt` until it succeeds or the policy is exhausted.
///
/// The closure receives the 1-based attempt number.
pub async fn retry_with_backoff<T, E, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut attempt: F,
) -> Result<T, RetryExhausted<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt_no = 1;

    loop {
        match attempt(attempt_no).await {
            Ok(value) => return Ok(value),
            Err(e) if attempt_no >= max_attempts => {
                return Err(RetryExhausted {
                    attempts: attempt_no,
                    last_error: e,
                });
            }
            Err(e) => {
                let delay = policy.delay_for_attempt(attempt_no);
                warn!(
                    "{}: attempt {}/{} failed: {}. Retrying in {:?}",
                    label, attempt_no, max_attempts, e, delay
                );
                tokio::time::sleep(delay).await;
                attempt_no += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn instant_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::ZERO, Duration::ZERO)
    }

    #[test]
    fn test_delay_doubles_until_ceiling() {
        let policy = RetryPolicy::new(10, Duration::from_millis(500), Duration::from_secs(3));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(500));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(1000));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(2000));
        assert_eq!(policy.delay_for_attempt(4), Duration::from_secs(3));
        assert_eq!(policy.delay_for_attempt(40), Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let calls = Cell::new(0u32);
        let result: Result<&str, RetryExhausted<String>> =
            retry_with_backoff(&instant_policy(3), "test", |n| {
                calls.set(calls.get() + 1);
                async move {
                    if n < 3 {
                        Err(format!("boom {}", n))
                    } else {
                        Ok("payload")
                    }
                }
            })
            .await;

        assert_eq!(result, Ok("payload"));
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_reports_attempts_and_last_error() {
        let result: Result<(), RetryExhausted<String>> =
            retry_with_backoff(&instant_policy(4), "test", |n| async move {
                Err(format!("failure #{}", n))
            })
            .await;

        assert_eq!(
            result,
            Err(RetryExhausted {
                attempts: 4,
                last_error: "failure #4".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_single_attempt_policy_does_not_retry() {
        let calls = Cell::new(0u32);
        let result: Result<(), RetryExhausted<&str>> =
            retry_with_backoff(&instant_policy(1), "test", |_| {
                calls.set(calls.get() + 1);
                async { Err("down") }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }
}
