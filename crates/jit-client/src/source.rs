//! Source trait implementations backed by the broker.
//!
//! Every call runs under the caller's [`CallContext`], so cancellation and
//! deadlines abort the in-flight request.

use async_trait::async_trait;
use jit_types::{
    CallContext, CloudEligibilitySource, EligibleGroup, EligibleTarget, GroupsEligibilitySource,
    Provider, Session, SessionsSource, SourceError,
};

use crate::client::BrokerClient;
use crate::types::ElevationRequest;

#[async_trait]
impl CloudEligibilitySource for BrokerClient {
    async fn eligible_targets(
        &self,
        ctx: &CallContext,
        provider: Provider,
    ) -> jit_types::Result<Vec<EligibleTarget>> {
        ctx.run(async {
            let response = self.eligibility().targets(provider).await?;
            Ok::<_, SourceError>(response.targets)
        })
        .await
    }
}

#[async_trait]
impl GroupsEligibilitySource for BrokerClient {
    async fn eligible_groups(
        &self,
        ctx: &CallContext,
        provider: Provider,
    ) -> jit_types::Result<Vec<EligibleGroup>> {
        ctx.run(async {
            let response = self.eligibility().groups(provider).await?;
            Ok::<_, SourceError>(response.groups)
        })
        .await
    }
}

#[async_trait]
impl SessionsSource for BrokerClient {
    async fn active_sessions(
        &self,
        ctx: &CallContext,
        provider: Option<Provider>,
    ) -> jit_types::Result<Vec<Session>> {
        ctx.run(async {
            let response = self.sessions().list(provider).await?;
            Ok::<_, SourceError>(response.sessions)
        })
        .await
    }
}

impl BrokerClient {
    /// Request an elevation under `ctx`.
    pub async fn elevate(
        &self,
        ctx: &CallContext,
        request: &ElevationRequest,
    ) -> jit_types::Result<Session> {
        ctx.run(async {
            self.elevations()
                .create(request)
                .await
                .map_err(SourceError::from)
        })
        .await
    }

    /// Revoke one session under `ctx`.
    pub async fn revoke(&self, ctx: &CallContext, session_id: &str) -> jit_types::Result<()> {
        ctx.run(async {
            self.sessions()
                .revoke(session_id)
                .await
                .map_err(SourceError::from)
        })
        .await
    }
}
