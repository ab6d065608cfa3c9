//! Error type shared by every eligibility and session source.

use thiserror::Error;

/// Result type alias for source calls.
pub type Result<T> = std::result::Result<T, SourceError>;

/// Errors a source call can produce.
///
/// Concrete sources (the broker client, test stubs) convert their own errors
/// into this type at the trait boundary so the cache and aggregator never
/// depend on a transport.
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    /// The call's cancellation token fired.
    #[error("operation cancelled")]
    Cancelled,

    /// The call's deadline elapsed.
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// The broker rejected our credentials.
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("rate limited by broker: {0}")]
    RateLimited(String),

    /// Any other non-success broker response.
    #[error("broker error ({status}): {message}")]
    Broker { status: u16, message: String },

    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
}

impl SourceError {
    /// True for errors caused by the caller's context rather than the source.
    pub fn is_context_error(&self) -> bool {
        matches!(self, SourceError::Cancelled | SourceError::DeadlineExceeded)
    }
}
