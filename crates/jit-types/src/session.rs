//! Active elevation sessions.

use serde::{Deserialize, Serialize};

use crate::provider::Provider;

/// An active elevation as reported by the broker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub provider: Provider,
    pub workspace_id: String,
    pub role_name: String,

    /// Total granted lifetime, in seconds.
    pub duration_secs: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl Session {
    pub fn new(
        id: impl Into<String>,
        provider: Provider,
        workspace_id: impl Into<String>,
        role_name: impl Into<String>,
        duration_secs: u64,
    ) -> Self {
        Self {
            id: id.into(),
            provider,
            workspace_id: workspace_id.into(),
            role_name: role_name.into(),
            duration_secs,
            status: None,
        }
    }
}
