//! Bounded retry with backoff.
//!
//! One utility serves both the per-key history fetch (linear backoff on
//! transient upstream failures) and the whole-refresh retry (fixed delay on
//! any failure).

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Delay schedule between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// `base × attempt`: 1×, 2×, 3×...
    Linear(Duration),
    /// The same delay every time.
    Fixed(Duration),
}

impl Backoff {
    /// Delay to wait after the given failed attempt (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        match self {
            Backoff::Linear(base) => base.saturating_mul(attempt),
            Backoff::Fixed(delay) => *delay,
        }
    }
}

/// How many times to retry and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total attempts are `max_retries + 1`.
    pub max_retries: u32,
    /// Delay schedule.
    pub backoff: Backoff,
}

impl RetryPolicy {
    /// Linear backoff starting at `base`.
    pub const fn linear(max_retries: u32, base: Duration) -> Self {
        Self {
            max_retries,
            backoff: Backoff::Linear(base),
        }
    }

    /// Fixed delay between attempts.
    pub const fn fixed(max_retries: u32, delay: Duration) -> Self {
        Self {
            max_retries,
            backoff: Backoff::Fixed(delay),
        }
    }

    /// Never retry.
    pub const fn none() -> Self {
        Self::fixed(0, Duration::ZERO)
    }

    /// Upper bound on attempts.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Sum of every delay when all retries are used.
    pub fn total_delay(&self) -> Duration {
        (1..=self.max_retries).map(|a| self.backoff.delay(a)).sum()
    }
}

/// Run `op` until it succeeds, fails with an error `is_transient` rejects,
/// or the retry budget is spent.
///
/// `op` receives the 1-based attempt number. The last error is returned on
/// failure.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use ecowatch::retry::{retry_with, RetryPolicy};
///
/// # tokio_test::block_on(async {
/// let policy = RetryPolicy::linear(3, Duration::from_millis(1));
/// let result: Result<u32, String> = retry_with("demo", &policy, |_| true, |attempt| async move {
///     if attempt < 3 { Err(format!("attempt {} failed", attempt)) } else { Ok(attempt) }
/// })
/// .await;
/// assert_eq!(result, Ok(3));
/// # });
/// ```
pub async fn retry_with<T, E, Op, Fut, P>(
    what: &str,
    policy: &RetryPolicy,
    is_transient: P,
    mut op: Op,
) -> Result<T, E>
where
    Op: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: Display,
{
    let mut attempt = 1;

    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) => {
                if !is_transient(&e) || attempt > policy.max_retries {
                    return Err(e);
                }

                let delay = policy.backoff.delay(attempt);
                warn!(
                    "{} failed ({}), retrying in {:?} ({}/{})",
                    what, e, delay, attempt, policy.max_retries
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
