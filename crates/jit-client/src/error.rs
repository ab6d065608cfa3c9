//! Client error types.

use jit_types::SourceError;
use thiserror::Error;

/// Client error type.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Broker returned an error response.
    #[error("API error ({status}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Broker asked us to back off.
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    pub fn is_auth_error(&self) -> bool {
        matches!(self, Error::Auth(_))
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Error::RateLimited(_))
    }

    pub fn is_server_error(&self) -> bool {
        matches!(self, Error::Api { status, .. } if *status >= 500)
    }
}

impl From<Error> for SourceError {
    fn from(err: Error) -> Self {
        match err {
            Error::Http(e) if e.is_timeout() => SourceError::DeadlineExceeded,
            Error::Http(e) if e.is_decode() => SourceError::Decode(e.to_string()),
            Error::Http(e) => SourceError::Transport(e.to_string()),
            Error::InvalidUrl(e) => SourceError::Transport(e.to_string()),
            Error::Config(message) => SourceError::Transport(message),
            Error::Json(e) => SourceError::Decode(e.to_string()),
            Error::Api {
                status, message, ..
            } => SourceError::Broker { status, message },
            Error::Auth(message) => SourceError::Auth(message),
            Error::NotFound(message) => SourceError::NotFound(message),
            Error::RateLimited(message) => SourceError::RateLimited(message),
        }
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error body returned by the broker.
#[derive(Debug, serde::Deserialize)]
pub(crate) struct ErrorResponse {
    pub code: String,
    pub message: String,
}
