//! Elevations API.

use jit_types::Session;

use crate::client::BrokerClient;
use crate::error::Result;
use crate::types::ElevationRequest;

/// Elevations API client.
pub struct ElevationsApi {
    client: BrokerClient,
}

impl ElevationsApi {
    pub(crate) fn new(client: BrokerClient) -> Self {
        Self { client }
    }

    /// Request an elevation. Returns the session the broker opened.
    pub async fn create(&self, request: &ElevationRequest) -> Result<Session> {
        self.client.post("elevations", request).await
    }
}
