//! Errors talking to the ecowatch proxy.

use thiserror::Error;

/// Substring the proxy puts in its error message when the upstream login
/// fails.
pub const AUTH_FAILURE_MARKER: &str = "Failed to authenticate";

/// Structured error code for upstream login failures.
pub const AUTH_FAILED_CODE: &str = "auth_failed";

/// A failed request to the proxy.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    /// The proxy answered with a non-success status.
    #[error("HTTP {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Status {
        /// HTTP status code.
        status: u16,
        /// `error` field of the response body, or the raw body.
        message: Option<String>,
        /// `code` field of the response body.
        code: Option<String>,
    },

    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body was not the expected JSON.
    #[error("invalid response body: {0}")]
    Decode(String),
}

impl FetchError {
    /// Whether a retry could plausibly succeed.
    ///
    /// HTTP 500, upstream authentication failures and transport errors are
    /// transient. Everything else is final.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Status { status: 500, .. } => true,
            FetchError::Status { message, code, .. } => {
                code.as_deref() == Some(AUTH_FAILED_CODE)
                    || message
                        .as_deref()
                        .is_some_and(|m| m.contains(AUTH_FAILURE_MARKER))
            }
            FetchError::Transport(_) => true,
            FetchError::Decode(_) => false,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FetchError::Decode(err.to_string())
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

/// Whether a free-form failure message names a transient condition.
///
/// Used for failures reported out of band, where only the text survives.
pub fn is_transient_message(message: &str) -> bool {
    message.contains("500") || message.contains(AUTH_FAILURE_MARKER)
}
