//! Configuration for the store.

use std::path::PathBuf;
use std::time::Duration;

/// Default freshness horizon for eligibility entries.
pub const DEFAULT_TTL: Duration = Duration::from_secs(4 * 60 * 60);

/// Default retention for session elevation timestamps.
/// Longer than any elevation the broker grants.
pub const DEFAULT_SESSION_RETENTION: Duration = Duration::from_secs(24 * 60 * 60);

/// Configuration for the store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Directory holding all store files. Created on open if absent.
    pub root: PathBuf,

    /// Maximum age of an eligibility entry before reads treat it as missing.
    pub ttl: Duration,

    /// Maximum age of a session timestamp before it is dropped.
    pub session_retention: Duration,
}

impl StoreConfig {
    /// Create a configuration rooted at `root` with default horizons.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ttl: DEFAULT_TTL,
            session_retention: DEFAULT_SESSION_RETENTION,
        }
    }

    /// Set the eligibility TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the session timestamp retention.
    pub fn with_session_retention(mut self, retention: Duration) -> Self {
        self.session_retention = retention;
        self
    }
}
