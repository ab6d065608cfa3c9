//! Sessions API.

use jit_types::Provider;

use crate::client::BrokerClient;
use crate::error::Result;
use crate::types::{SessionsQuery, SessionsResponse};

/// Sessions API client.
pub struct SessionsApi {
    client: BrokerClient,
}

impl SessionsApi {
    pub(crate) fn new(client: BrokerClient) -> Self {
        Self { client }
    }

    /// List active sessions, optionally for one provider.
    pub async fn list(&self, provider: Option<Provider>) -> Result<SessionsResponse> {
        self.client
            .get_with_query("sessions", &SessionsQuery { provider })
            .await
    }

    /// Revoke a session.
    pub async fn revoke(&self, id: &str) -> Result<()> {
        self.client.delete(&format!("sessions/{}", id)).await
    }
}
