//! Source contracts for eligibility and session lookups.
//!
//! The cache decorator and the aggregator are written against these traits
//! only. The broker client implements them for real network calls; tests
//! implement them with in-memory stubs.

use std::sync::Arc;

use async_trait::async_trait;

use crate::context::CallContext;
use crate::eligibility::{EligibleGroup, EligibleTarget};
use crate::error::Result;
use crate::provider::Provider;
use crate::session::Session;

/// Lists the cloud targets the caller may elevate into on one provider.
#[async_trait]
pub trait CloudEligibilitySource: Send + Sync {
    async fn eligible_targets(
        &self,
        ctx: &CallContext,
        provider: Provider,
    ) -> Result<Vec<EligibleTarget>>;
}

/// Lists the groups the caller may join on one provider's directory.
#[async_trait]
pub trait GroupsEligibilitySource: Send + Sync {
    async fn eligible_groups(
        &self,
        ctx: &CallContext,
        provider: Provider,
    ) -> Result<Vec<EligibleGroup>>;
}

/// Lists the caller's active elevation sessions.
#[async_trait]
pub trait SessionsSource: Send + Sync {
    async fn active_sessions(
        &self,
        ctx: &CallContext,
        provider: Option<Provider>,
    ) -> Result<Vec<Session>>;
}

pub type SharedCloudSource = Arc<dyn CloudEligibilitySource>;
pub type SharedGroupsSource = Arc<dyn GroupsEligibilitySource>;
pub type SharedSessionsSource = Arc<dyn SessionsSource>;
