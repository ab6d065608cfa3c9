//! Eligibility API.

use jit_types::Provider;

use crate::client::BrokerClient;
use crate::error::Result;
use crate::types::{GroupsResponse, TargetsResponse};

/// Eligibility API client.
pub struct EligibilityApi {
    client: BrokerClient,
}

impl EligibilityApi {
    pub(crate) fn new(client: BrokerClient) -> Self {
        Self { client }
    }

    /// Cloud targets the caller may elevate into on `provider`.
    pub async fn targets(&self, provider: Provider) -> Result<TargetsResponse> {
        self.client
            .get(&format!("eligibility/{}", provider.tag()))
            .await
    }

    /// Directory groups the caller may join on `provider`.
    pub async fn groups(&self, provider: Provider) -> Result<GroupsResponse> {
        self.client.get(&format!("groups/{}", provider.tag())).await
    }
}
