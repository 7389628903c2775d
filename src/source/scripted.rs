//! In-memory [`TelemetryClient`] replaying scripted replies.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use parking_lot::Mutex;

use ecowatch_types::{HistoryWindow, LatestValues, Sample};

use super::{FetchError, TelemetryClient};

type HistoryReply = Result<Vec<Sample>, FetchError>;
type LatestReply = Result<LatestValues, FetchError>;

/// Key whose history call panics, for exercising task failures.
pub(crate) const PANIC_KEY: &str = "panic";

/// Replays replies in order; the last reply of a script repeats forever.
/// Unscripted keys answer with an empty history.
#[derive(Debug, Default)]
pub(crate) struct ScriptedClient {
    history: Mutex<HashMap<String, VecDeque<HistoryReply>>>,
    latest: Mutex<VecDeque<LatestReply>>,
    calls: Mutex<HashMap<String, u32>>,
    latest_calls: Mutex<u32>,
}

impl ScriptedClient {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn script(self, key: &str, replies: Vec<HistoryReply>) -> Self {
        self.history.lock().insert(key.to_string(), replies.into());
        self
    }

    pub(crate) fn script_latest(self, replies: Vec<LatestReply>) -> Self {
        *self.latest.lock() = replies.into();
        self
    }

    pub(crate) fn calls(&self, key: &str) -> u32 {
        self.calls.lock().get(key).copied().unwrap_or(0)
    }

    pub(crate) fn latest_calls(&self) -> u32 {
        *self.latest_calls.lock()
    }
}

fn next_reply<T: Clone>(queue: &mut VecDeque<T>) -> Option<T> {
    if queue.len() > 1 {
        queue.pop_front()
    } else {
        queue.front().cloned()
    }
}

#[async_trait]
impl TelemetryClient for ScriptedClient {
    async fn history(&self, key: &str, _window: HistoryWindow) -> HistoryReply {
        *self.calls.lock().entry(key.to_string()).or_insert(0) += 1;
        if key == PANIC_KEY {
            panic!("scripted panic for {}", key);
        }

        let mut history = self.history.lock();
        match history.get_mut(key) {
            Some(queue) => next_reply(queue).unwrap_or_else(|| Ok(Vec::new())),
            None => Ok(Vec::new()),
        }
    }

    async fn latest(&self) -> LatestReply {
        *self.latest_calls.lock() += 1;
        let mut latest = self.latest.lock();
        next_reply(&mut *latest).unwrap_or_else(|| Ok(LatestValues::new()))
    }

    fn description(&self) -> &str {
        "scripted"
    }
}

/// A `500` reply carrying the proxy's authentication failure body.
pub(crate) fn auth_failure() -> FetchError {
    FetchError::Status {
        status: 500,
        message: Some("Failed to authenticate with ThingsBoard".to_string()),
        code: Some("auth_failed".to_string()),
    }
}

/// A plain `500` reply.
pub(crate) fn server_error() -> FetchError {
    FetchError::Status {
        status: 500,
        message: Some("upstream_error".to_string()),
        code: None,
    }
}

/// A `404` reply.
pub(crate) fn not_found() -> FetchError {
    FetchError::Status {
        status: 404,
        message: Some("Page not found".to_string()),
        code: None,
    }
}
