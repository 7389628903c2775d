//! Error types for adapters.

use thiserror::Error;

/// Errors that can occur when talking to an upstream telemetry platform.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Upstream answered with a non-success status.
    #[error("API returned status {status}")]
    Status {
        /// The HTTP status code.
        status: u16,
    },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Connection failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Timeout waiting for response.
    #[error("Request timed out")]
    Timeout,

    /// Adapter was configured incorrectly.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl AdapterError {
    /// Check if this error came from an authentication failure.
    pub fn is_auth(&self) -> bool {
        matches!(self, AdapterError::Auth(_))
    }
}

#[cfg(feature = "thingsboard")]
impl From<reqwest::Error> for AdapterError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AdapterError::Timeout
        } else if err.is_connect() {
            AdapterError::Connection(err.to_string())
        } else if err.is_decode() {
            AdapterError::Parse(err.to_string())
        } else {
            AdapterError::Http(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_auth() {
        assert!(AdapterError::Auth("bad password".to_string()).is_auth());
        assert!(!AdapterError::Status { status: 500 }.is_auth());
        assert!(!AdapterError::Timeout.is_auth());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            AdapterError::Status { status: 404 }.to_string(),
            "API returned status 404"
        );
        assert_eq!(
            AdapterError::Auth("ThingsBoard authentication error: 401".to_string()).to_string(),
            "Authentication failed: ThingsBoard authentication error: 401"
        );
    }
}
