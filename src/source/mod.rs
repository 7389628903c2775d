//! Telemetry source abstraction for the dashboard.
//!
//! The dashboard never talks to ThingsBoard directly. It reads from the
//! ecowatch proxy through the [`TelemetryClient`] trait, which keeps the
//! fetcher and orchestrator testable against scripted in-memory clients.

mod error;
mod fetcher;
mod http;

#[cfg(test)]
pub(crate) mod scripted;

pub use error::{is_transient_message, FetchError, AUTH_FAILED_CODE, AUTH_FAILURE_MARKER};
pub use fetcher::{FetchOutcome, HistoryFetcher};
pub use http::ProxyClient;

use std::fmt::Debug;

use async_trait::async_trait;

use ecowatch_types::{HistoryWindow, LatestValues, Sample};

/// Read-only access to proxied telemetry.
///
/// One call is one request: implementations do not retry. Retrying is the
/// [`HistoryFetcher`]'s job.
#[async_trait]
pub trait TelemetryClient: Send + Sync + Debug {
    /// Raw samples for `key` inside `window`.
    async fn history(&self, key: &str, window: HistoryWindow) -> Result<Vec<Sample>, FetchError>;

    /// Current value of every key.
    async fn latest(&self) -> Result<LatestValues, FetchError>;

    /// Returns a human-readable description of the source.
    ///
    /// Used for display in the TUI status bar.
    fn description(&self) -> &str;
}
