//! HTTP client for the ecowatch proxy.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use ecowatch_types::{HistoryWindow, LatestValues, Sample};

use super::{FetchError, TelemetryClient};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Talks to `GET /api/gethistory` and `GET /api/getdata` on the proxy.
///
/// # Example
///
/// ```
/// use ecowatch::source::{ProxyClient, TelemetryClient};
///
/// let client = ProxyClient::new("http://localhost:3000/").unwrap();
/// assert_eq!(client.base_url(), "http://localhost:3000");
/// assert_eq!(client.description(), "proxy: http://localhost:3000");
/// ```
#[derive(Debug, Clone)]
pub struct ProxyClient {
    client: Client,
    base_url: String,
    description: String,
}

/// Error body the proxy sends with non-success responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    code: Option<String>,
}

impl ProxyClient {
    /// Create a client with the default timeout.
    pub fn new(base_url: &str) -> Result<Self, FetchError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Create a client with a custom request timeout.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.trim_end_matches('/').to_string();

        Ok(Self {
            client,
            description: format!("proxy: {}", base_url),
            base_url,
        })
    }

    /// Get the proxy base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, FetchError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {} {:?}", url, query);

        let response = self.client.get(&url).query(query).send().await?;
        let response = check_status(response).await?;

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| FetchError::Decode(e.to_string()))
    }
}

/// Turn a non-success response into [`FetchError::Status`], reading the
/// proxy's `{error, code}` body when there is one.
async fn check_status(response: Response) -> Result<Response, FetchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let (message, code) = match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => (body.error, body.code),
        Err(_) => {
            let trimmed = text.trim();
            ((!trimmed.is_empty()).then(|| trimmed.to_string()), None)
        }
    };

    Err(FetchError::Status {
        status: status.as_u16(),
        message,
        code,
    })
}

#[async_trait]
impl TelemetryClient for ProxyClient {
    async fn history(&self, key: &str, window: HistoryWindow) -> Result<Vec<Sample>, FetchError> {
        self.get_json(
            "/api/gethistory",
            &[
                ("key", key.to_string()),
                ("startTs", window.start_ts().to_string()),
                ("endTs", window.end_ts().to_string()),
            ],
        )
        .await
    }

    async fn latest(&self) -> Result<LatestValues, FetchError> {
        self.get_json("/api/getdata", &[]).await
    }

    fn description(&self) -> &str {
        &self.description
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use ecowatch_adapters::AdapterError;
    use ecowatch_proxy::Upstream;
    use tokio::net::TcpListener;

    #[derive(Debug)]
    struct FakeUpstream {
        fail_with: Option<fn() -> AdapterError>,
    }

    #[async_trait]
    impl Upstream for FakeUpstream {
        async fn latest(&self) -> Result<LatestValues, AdapterError> {
            if let Some(make) = self.fail_with {
                return Err(make());
            }
            let mut values = LatestValues::new();
            values.insert("tempEx".to_string(), vec![Sample::new(1_700_000_000_000, "21,5")]);
            Ok(values)
        }

        async fn history(
            &self,
            key: &str,
            window: HistoryWindow,
        ) -> Result<Vec<Sample>, AdapterError> {
            if let Some(make) = self.fail_with {
                return Err(make());
            }
            Ok(vec![Sample::new(window.start_ts(), format!("{}-value", key))])
        }
    }

    async fn spawn_proxy(upstream: FakeUpstream) -> ProxyClient {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(ecowatch_proxy::server::serve(listener, Arc::new(upstream)));
        ProxyClient::new(&format!("http://{}", addr)).unwrap()
    }

    #[tokio::test]
    async fn test_history_round_trip() {
        let client = spawn_proxy(FakeUpstream { fail_with: None }).await;
        let window = HistoryWindow::new(100, 200).unwrap();

        let samples = client.history("co2evitado", window).await.unwrap();
        assert_eq!(samples, vec![Sample::new(100, "co2evitado-value")]);
    }

    #[tokio::test]
    async fn test_latest_round_trip() {
        let client = spawn_proxy(FakeUpstream { fail_with: None }).await;
        let values = client.latest().await.unwrap();
        assert_eq!(values["tempEx"], vec![Sample::new(1_700_000_000_000, "21,5")]);
    }

    #[tokio::test]
    async fn test_auth_failure_is_transient() {
        let client = spawn_proxy(FakeUpstream {
            fail_with: Some(|| AdapterError::Auth("ThingsBoard authentication error: 401".into())),
        })
        .await;

        let err = client.latest().await.unwrap_err();
        assert_eq!(
            err,
            FetchError::Status {
                status: 500,
                message: Some("Failed to authenticate with ThingsBoard".to_string()),
                code: Some("auth_failed".to_string()),
            }
        );
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_not_found_is_final() {
        let client = spawn_proxy(FakeUpstream { fail_with: None }).await;
        let err = client.get_json::<LatestValues>("/nope", &[]).await.unwrap_err();

        assert_eq!(
            err,
            FetchError::Status {
                status: 404,
                message: Some("Page not found".to_string()),
                code: None,
            }
        );
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = ProxyClient::new(&format!("http://{}", addr)).unwrap();
        let err = client.latest().await.unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
        assert!(err.is_transient());
    }
}
