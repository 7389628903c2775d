//! History fetching with bounded retry.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use ecowatch_types::{HistoryWindow, LatestValues, Sample};

use super::{FetchError, TelemetryClient};
use crate::retry::{retry_with, RetryPolicy};

/// Result of one history fetch.
///
/// Keeps "upstream had no data" apart from "the fetch failed"; both
/// aggregate to nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// The proxy answered, possibly with zero samples.
    Samples(Vec<Sample>),
    /// Retries were exhausted or the failure was final.
    Failed(FetchError),
}

impl FetchOutcome {
    /// The samples, or an empty list on failure.
    pub fn into_samples(self) -> Vec<Sample> {
        match self {
            FetchOutcome::Samples(samples) => samples,
            FetchOutcome::Failed(_) => Vec::new(),
        }
    }

    /// Check if the fetch failed.
    pub fn is_failed(&self) -> bool {
        matches!(self, FetchOutcome::Failed(_))
    }
}

/// Fetches raw samples for one key at a time, retrying transient failures
/// with linear backoff.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// use ecowatch::retry::RetryPolicy;
/// use ecowatch::source::{HistoryFetcher, ProxyClient};
///
/// let client = Arc::new(ProxyClient::new("http://localhost:3000").unwrap());
/// let fetcher = HistoryFetcher::new(client)
///     .with_policy(RetryPolicy::linear(5, Duration::from_millis(250)));
/// assert_eq!(fetcher.policy().max_retries, 5);
/// ```
#[derive(Debug, Clone)]
pub struct HistoryFetcher {
    client: Arc<dyn TelemetryClient>,
    policy: RetryPolicy,
}

impl HistoryFetcher {
    /// Three retries, waiting 500 ms, 1 s, then 1.5 s.
    pub const DEFAULT_POLICY: RetryPolicy = RetryPolicy::linear(3, Duration::from_millis(500));

    /// Create a fetcher with [`Self::DEFAULT_POLICY`].
    pub fn new(client: Arc<dyn TelemetryClient>) -> Self {
        Self {
            client,
            policy: Self::DEFAULT_POLICY,
        }
    }

    /// Replace the retry policy.
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Get the retry policy.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Samples for `key` in `window`; empty when the fetch ultimately fails.
    pub async fn fetch_history(&self, key: &str, window: HistoryWindow) -> Vec<Sample> {
        self.fetch_outcome(key, window).await.into_samples()
    }

    /// Like [`fetch_history`](Self::fetch_history), keeping the failure.
    pub async fn fetch_outcome(&self, key: &str, window: HistoryWindow) -> FetchOutcome {
        let what = format!("history fetch for {}", key);
        let result = retry_with(&what, &self.policy, FetchError::is_transient, |attempt| {
            debug!("Fetching history for {} (attempt {})", key, attempt);
            self.client.history(key, window)
        })
        .await;

        match result {
            Ok(samples) => {
                debug!("History for {}: {} samples", key, samples.len());
                FetchOutcome::Samples(samples)
            }
            Err(e) => {
                warn!("Giving up on history for {}: {}", key, e);
                FetchOutcome::Failed(e)
            }
        }
    }

    /// Current values, retried under the same policy.
    pub async fn fetch_latest(&self) -> Result<LatestValues, FetchError> {
        retry_with(
            "latest values fetch",
            &self.policy,
            FetchError::is_transient,
            |_| self.client.latest(),
        )
        .await
    }
}
