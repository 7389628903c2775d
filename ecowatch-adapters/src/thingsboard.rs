//! ThingsBoard adapter using the REST API.
//!
//! This adapter reads asset telemetry from ThingsBoard. Every request logs in
//! first (`POST /api/auth/login`) and sends the returned JWT in the
//! `X-Authorization` header; tokens are never cached.
//!
//! ## Data Collected
//!
//! - **Latest values**: the most recent sample of every key on the asset
//! - **History**: all samples of one key inside a time window
//!
//! ## Example
//!
//! ```rust,no_run
//! use ecowatch_adapters::thingsboard::ThingsBoardAdapter;
//! use ecowatch_adapters::HistoryWindow;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let adapter = ThingsBoardAdapter::builder()
//!         .endpoint("https://thingsboard.example.com")
//!         .credentials("tenant@example.com", "secret")
//!         .asset_id("784f394c-42b6-435a-983c-b7beff2784f9")
//!         .build()?;
//!
//!     let window = HistoryWindow::new(1_700_000_000_000, 1_731_000_000_000)?;
//!     let samples = adapter.history("co2evitado", window).await?;
//!
//!     for sample in &samples {
//!         println!("{:?} -> {:?}", sample.ts, sample.value);
//!     }
//!
//!     Ok(())
//! }
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use ecowatch_types::{HistoryWindow, LatestValues, Sample};

use crate::AdapterError;

/// Re-authentication attempts after the upstream rejects a token.
const MAX_AUTH_RETRIES: u32 = 3;

/// Upper bound on samples returned by one history query.
const HISTORY_LIMIT: u32 = 5000;

/// ThingsBoard adapter for reading asset telemetry.
#[derive(Debug, Clone)]
pub struct ThingsBoardAdapter {
    client: Client,
    endpoint: String,
    username: String,
    password: String,
    asset_id: String,
}

impl ThingsBoardAdapter {
    /// Create a new builder for configuring the adapter.
    pub fn builder() -> ThingsBoardAdapterBuilder {
        ThingsBoardAdapterBuilder::default()
    }

    /// The ThingsBoard base URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The asset whose telemetry is read.
    pub fn asset_id(&self) -> &str {
        &self.asset_id
    }

    /// Log in and return a fresh JWT.
    pub async fn login(&self) -> Result<String, AdapterError> {
        let url = format!("{}/api/auth/login", self.endpoint);

        let response = self
            .client
            .post(&url)
            .json(&LoginRequest {
                username: &self.username,
                password: &self.password,
            })
            .send()
            .await
            .map_err(|e| AdapterError::Auth(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AdapterError::Auth(format!(
                "ThingsBoard authentication error: {}",
                response.status().as_u16()
            )));
        }

        let login: LoginResponse = response
            .json()
            .await
            .map_err(|e| AdapterError::Auth(e.to_string()))?;

        debug!("ThingsBoard login succeeded for {}", self.username);
        Ok(login.token)
    }

    /// Fetch the latest value of every telemetry key on the asset.
    pub async fn latest(&self) -> Result<LatestValues, AdapterError> {
        self.get_authorized(&self.timeseries_path(), &[]).await
    }

    /// Fetch every sample of `key` inside `window`.
    ///
    /// A key with no data in the window yields an empty list.
    pub async fn history(&self, key: &str, window: HistoryWindow) -> Result<Vec<Sample>, AdapterError> {
        let query = [
            ("keys", key.to_string()),
            ("startTs", window.start_ts().to_string()),
            ("endTs", window.end_ts().to_string()),
            ("limit", HISTORY_LIMIT.to_string()),
        ];

        let mut data: BTreeMap<String, Vec<Sample>> =
            self.get_authorized(&self.timeseries_path(), &query).await?;

        Ok(data.remove(key).unwrap_or_default())
    }

    fn timeseries_path(&self) -> String {
        format!(
            "/api/plugins/telemetry/ASSET/{}/values/timeseries",
            self.asset_id
        )
    }

    // Logs in before every attempt and retries with a new token when the
    // upstream answers 401/403.
    async fn get_authorized<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, AdapterError> {
        let url = format!("{}{}", self.endpoint, path);
        let mut retries = 0;

        loop {
            let token = self.login().await?;

            let response = self
                .client
                .get(&url)
                .query(query)
                .header("X-Authorization", format!("Bearer {}", token))
                .send()
                .await?;

            let status = response.status();

            if is_token_rejected(status) && retries < MAX_AUTH_RETRIES {
                retries += 1;
                warn!(
                    "Token expired or invalid ({}), retrying with new authentication ({}/{})",
                    status.as_u16(),
                    retries,
                    MAX_AUTH_RETRIES
                );
                continue;
            }

            if !status.is_success() {
                return Err(AdapterError::Status {
                    status: status.as_u16(),
                });
            }

            return response
                .json()
                .await
                .map_err(|e| AdapterError::Parse(e.to_string()));
        }
    }
}

fn is_token_rejected(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
}

/// Builder for ThingsBoardAdapter.
#[derive(Debug, Default)]
pub struct ThingsBoardAdapterBuilder {
    endpoint: Option<String>,
    username: Option<String>,
    password: Option<String>,
    asset_id: Option<String>,
    timeout: Option<Duration>,
}

impl ThingsBoardAdapterBuilder {
    /// Set the ThingsBoard base URL (e.g., "http://localhost:8080").
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the username and password used to log in.
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Set the asset whose telemetry is read. Required.
    pub fn asset_id(mut self, asset_id: impl Into<String>) -> Self {
        self.asset_id = Some(asset_id.into());
        self
    }

    /// Set the request timeout (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the adapter.
    pub fn build(self) -> Result<ThingsBoardAdapter, AdapterError> {
        let asset_id = self
            .asset_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| AdapterError::Config("asset id is required".to_string()))?;

        let timeout = self.timeout.unwrap_or(Duration::from_secs(10));

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AdapterError::Http(e.to_string()))?;

        let endpoint = self
            .endpoint
            .unwrap_or_else(|| "http://localhost:8080".to_string());

        Ok(ThingsBoardAdapter {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            username: self
                .username
                .unwrap_or_else(|| "tenant@thingsboard.org".to_string()),
            password: self.password.unwrap_or_else(|| "tenant".to_string()),
            asset_id,
        })
    }
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
}
