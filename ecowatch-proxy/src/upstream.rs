//! The telemetry backend the proxy forwards to.

use async_trait::async_trait;

use ecowatch_adapters::thingsboard::ThingsBoardAdapter;
use ecowatch_adapters::AdapterError;
use ecowatch_types::{HistoryWindow, LatestValues, Sample};

/// Read-only telemetry backend behind the proxy routes.
///
/// Implemented for [`ThingsBoardAdapter`]; tests substitute their own.
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Latest value of every key.
    async fn latest(&self) -> Result<LatestValues, AdapterError>;

    /// Samples of one key inside a window.
    async fn history(&self, key: &str, window: HistoryWindow) -> Result<Vec<Sample>, AdapterError>;
}

#[async_trait]
impl Upstream for ThingsBoardAdapter {
    async fn latest(&self) -> Result<LatestValues, AdapterError> {
        ThingsBoardAdapter::latest(self).await
    }

    async fn history(&self, key: &str, window: HistoryWindow) -> Result<Vec<Sample>, AdapterError> {
        ThingsBoardAdapter::history(self, key, window).await
    }
}
