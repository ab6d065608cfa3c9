//! Request and response bodies for the broker API.

use jit_types::{EligibleGroup, EligibleTarget, Provider, Session};
use serde::{Deserialize, Serialize};

/// `GET eligibility/{provider}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetsResponse {
    #[serde(default)]
    pub targets: Vec<EligibleTarget>,
}

/// `GET groups/{provider}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupsResponse {
    #[serde(default)]
    pub groups: Vec<EligibleGroup>,
}

/// `GET sessions`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionsResponse {
    #[serde(default)]
    pub sessions: Vec<Session>,
}

/// Query parameters for listing sessions.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionsQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<Provider>,
}

/// `POST elevations`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElevationRequest {
    pub provider: Provider,
    pub workspace_id: String,
    pub role_name: String,
    pub duration_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ElevationRequest {
    pub fn new(
        provider: Provider,
        workspace_id: impl Into<String>,
        role_name: impl Into<String>,
        duration_secs: u64,
    ) -> Self {
        Self {
            provider,
            workspace_id: workspace_id.into(),
            role_name: role_name.into(),
            duration_secs,
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}
