//! HTTP routes re-exposing upstream telemetry.
//!
//! | Route | Response |
//! |-------|----------|
//! | `GET /api/getdata` | latest value of every key |
//! | `GET /api/gethistory?key=&startTs=&endTs=` | samples of one key in the window |
//! | `GET /health` | `OK` |
//!
//! Upstream failures answer `500` with `{"error": ..., "code": ...}` where
//! `code` is [`CODE_AUTH_FAILED`] for authentication problems and
//! [`CODE_UPSTREAM_ERROR`] otherwise.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode, Uri};
use hyper_util::rt::TokioIo;
use serde::Serialize;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use ecowatch_adapters::AdapterError;
use ecowatch_types::HistoryWindow;

use crate::upstream::Upstream;

/// Error message returned when the upstream login fails.
pub const AUTH_FAILURE_MESSAGE: &str = "Failed to authenticate with ThingsBoard";

/// Error code for authentication failures.
pub const CODE_AUTH_FAILED: &str = "auth_failed";

/// Error code for any other upstream failure.
pub const CODE_UPSTREAM_ERROR: &str = "upstream_error";

/// Error code for malformed requests.
pub const CODE_BAD_REQUEST: &str = "bad_request";

/// Errors that stop the proxy server.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The listen address could not be parsed.
    #[error("invalid listen address {addr:?}: {source}")]
    Addr {
        /// The address as configured.
        addr: String,
        /// Parse failure.
        source: std::net::AddrParseError,
    },

    /// Binding or accepting on the socket failed.
    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration for the proxy HTTP server.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Address to listen on (e.g., "0.0.0.0:3000")
    pub listen_addr: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

impl ProxyConfig {
    /// Listen on all interfaces at `port`.
    pub fn with_port(port: u16) -> Self {
        Self {
            listen_addr: format!("0.0.0.0:{}", port),
        }
    }
}

/// Proxy server forwarding dashboard requests to an [`Upstream`].
pub struct ProxyServer {
    config: ProxyConfig,
    upstream: Arc<dyn Upstream>,
}

impl ProxyServer {
    /// Create a server for the given upstream.
    pub fn new(config: ProxyConfig, upstream: Arc<dyn Upstream>) -> Self {
        Self { config, upstream }
    }

    /// Get the configuration.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Bind the listen address and serve until the task is dropped.
    pub async fn run(self) -> Result<(), ProxyError> {
        let addr: SocketAddr = self
            .config
            .listen_addr
            .parse()
            .map_err(|source| ProxyError::Addr {
                addr: self.config.listen_addr.clone(),
                source,
            })?;
        let listener = TcpListener::bind(addr).await?;
        info!("Server running at http://{}", addr);

        serve(listener, self.upstream).await
    }
}

/// Accept connections on `listener` forever.
pub async fn serve(listener: TcpListener, upstream: Arc<dyn Upstream>) -> Result<(), ProxyError> {
    loop {
        let (stream, peer) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let upstream = upstream.clone();

        tokio::spawn(async move {
            let service = service_fn(move |req: Request<hyper::body::Incoming>| {
                let upstream = upstream.clone();
                async move {
                    Ok::<_, Infallible>(route(req.method(), req.uri(), upstream.as_ref()).await)
                }
            });

            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                debug!("Connection error from {}: {}", peer, e);
            }
        });
    }
}

/// Dispatch one request.
pub async fn route(method: &Method, uri: &Uri, upstream: &dyn Upstream) -> Response<Full<Bytes>> {
    if *method != Method::GET {
        return not_found();
    }

    match uri.path() {
        "/api/getdata" => match upstream.latest().await {
            Ok(values) => {
                debug!("Telemetry data: {} keys", values.len());
                json_response(StatusCode::OK, &values)
            }
            Err(e) => upstream_failure("Telemetry error", &e),
        },
        "/api/gethistory" => {
            let (key, window) = match parse_history_query(uri.query()) {
                Ok(parsed) => parsed,
                Err(message) => {
                    return json_response(
                        StatusCode::BAD_REQUEST,
                        &ErrorBody {
                            error: message,
                            code: CODE_BAD_REQUEST,
                        },
                    )
                }
            };

            match upstream.history(&key, window).await {
                Ok(samples) => {
                    debug!("Telemetry history for {}: {} samples", key, samples.len());
                    json_response(StatusCode::OK, &samples)
                }
                Err(e) => upstream_failure("Telemetry history error", &e),
            }
        }
        "/health" | "/healthz" => text_response(StatusCode::OK, "OK"),
        _ => not_found(),
    }
}

/// Parse `key`, `startTs` and `endTs` from a query string.
pub fn parse_history_query(query: Option<&str>) -> Result<(String, HistoryWindow), String> {
    let mut key = None;
    let mut start = None;
    let mut end = None;

    for (name, value) in url::form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
        match name.as_ref() {
            "key" => key = Some(value.into_owned()),
            "startTs" => start = Some(value.into_owned()),
            "endTs" => end = Some(value.into_owned()),
            _ => {}
        }
    }

    let key = key
        .filter(|k| !k.is_empty())
        .ok_or_else(|| "missing query parameter: key".to_string())?;
    let start_ts = parse_ts("startTs", start)?;
    let end_ts = parse_ts("endTs", end)?;
    let window = HistoryWindow::new(start_ts, end_ts).map_err(|e| e.to_string())?;

    Ok((key, window))
}

fn parse_ts(name: &str, raw: Option<String>) -> Result<i64, String> {
    let raw = raw.ok_or_else(|| format!("missing query parameter: {}", name))?;
    raw.trim()
        .parse()
        .map_err(|_| format!("invalid {}: {:?}", name, raw))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
}

fn upstream_failure(context: &str, err: &AdapterError) -> Response<Full<Bytes>> {
    error!("{}: {}", context, err);

    let body = if err.is_auth() {
        ErrorBody {
            error: AUTH_FAILURE_MESSAGE.to_string(),
            code: CODE_AUTH_FAILED,
        }
    } else {
        ErrorBody {
            error: err.to_string(),
            code: CODE_UPSTREAM_ERROR,
        }
    };

    json_response(StatusCode::INTERNAL_SERVER_ERROR, &body)
}

fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    match serde_json::to_vec(body) {
        Ok(bytes) => build_response(status, "application/json", Bytes::from(bytes)),
        Err(e) => {
            error!("Failed to encode response: {}", e);
            text_response(StatusCode::INTERNAL_SERVER_ERROR, "Server error")
        }
    }
}

fn text_response(status: StatusCode, body: &'static str) -> Response<Full<Bytes>> {
    build_response(status, "text/plain", Bytes::from_static(body.as_bytes()))
}

fn not_found() -> Response<Full<Bytes>> {
    text_response(StatusCode::NOT_FOUND, "Page not found")
}

fn build_response(
    status: StatusCode,
    content_type: &'static str,
    body: Bytes,
) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}
