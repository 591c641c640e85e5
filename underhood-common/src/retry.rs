//! Fixed-delay retry policy for calls that cross an I/O boundary.
//!
//! The policy only decides *when* to try again; the caller decides *what*
//! is worth retrying by passing an `is_transient` predicate. Terminal
//! errors are returned on the spot.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;

/// How often, and how far apart, a transient failure is retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one; `None` retries forever.
    pub max_attempts: Option<u32>,
    /// Pause between two attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: None,
            delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn unbounded(delay: Duration) -> Self {
        Self {
            max_attempts: None,
            delay,
        }
    }

    pub fn bounded(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: Some(max_attempts.max(1)),
            delay,
        }
    }

    /// Never retry; the first outcome is final.
    pub fn once() -> Self {
        Self::bounded(1, Duration::ZERO)
    }

    fn exhausted(&self, attempt: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempt >= max)
    }

    /// Run `op` until it succeeds, fails terminally, or the budget runs out.
    ///
    /// `what` names the operation in log events.
    pub async fn run<T, E, F, Fut, P>(&self, what: &str, is_transient: P, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
        E: Display,
    {
        let mut attempt = 0u32;
        loop {
            attempt = attempt.saturating_add(1);
            match op().await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::info!(what, attempt, "retry.recovered");
                    }
                    return Ok(value);
                }
                Err(err) if is_transient(&err) && !self.exhausted(attempt) => {
                    tracing::warn!(
                        what,
                        attempt,
                        max_attempts = ?self.max_attempts,
                        delay_ms = self.delay.as_millis() as u64,
                        error = %err,
                        "retry.transient_failure"
                    );
                    sleep(self.delay).await;
                }
                Err(err) => {
                    tracing::warn!(what, attempt, error = %err, "retry.giving_up");
                    return Err(err);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Debug, PartialEq)]
    enum Failure {
        Flaky,
        Fatal,
    }

    impl Display for Failure {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{self:?}")
        }
    }

    fn transient(e: &Failure) -> bool {
        *e == Failure::Flaky
    }

    #[tokio::test]
    async fn retries_transient_failures_until_success() {
        let calls = Cell::new(0);
        let policy = RetryPolicy::unbounded(Duration::ZERO);

        let out = policy
            .run("flaky", transient, || {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move { if n < 4 { Err(Failure::Flaky) } else { Ok(n) } }
            })
            .await;

        assert_eq!(out, Ok(4));
        assert_eq!(calls.get(), 4);
    }

    #[tokio::test]
    async fn terminal_failures_are_not_retried() {
        let calls = Cell::new(0);
        let out: Result<(), _> = RetryPolicy::unbounded(Duration::ZERO)
            .run("fatal", transient, || {
                calls.set(calls.get() + 1);
                async { Err(Failure::Fatal) }
            })
            .await;

        assert_eq!(out, Err(Failure::Fatal));
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn bounded_policy_stops_after_max_attempts() {
        let calls = Cell::new(0);
        let out: Result<(), _> = RetryPolicy::bounded(3, Duration::ZERO)
            .run("bounded", transient, || {
                calls.set(calls.get() + 1);
                async { Err(Failure::Flaky) }
            })
            .await;

        assert_eq!(out, Err(Failure::Flaky));
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn largest_bound_is_reached_without_overflow() {
        let policy = RetryPolicy::bounded(u32::MAX, Duration::ZERO);
        assert!(!policy.exhausted(u32::MAX - 1));
        assert!(policy.exhausted(u32::MAX));
        assert!(policy.exhausted(u32::MAX.saturating_add(1)));
        assert!(!RetryPolicy::unbounded(Duration::ZERO).exhausted(u32::MAX));
    }

    #[test]
    fn bounded_never_allows_zero_attempts() {
        assert_eq!(RetryPolicy::bounded(0, Duration::ZERO).max_attempts, Some(1));
        assert_eq!(RetryPolicy::once().max_attempts, Some(1));
    }
}
