//! In-memory sources with scripted responses and call counters.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use jit_types::{
    CallContext, CloudEligibilitySource, EligibleGroup, EligibleTarget, GroupsEligibilitySource,
    Provider, Session, SessionsSource, SourceError,
};
use parking_lot::Mutex;

/// Scripted cloud and groups source.
#[derive(Default)]
pub struct StubSource {
    targets: HashMap<Provider, Result<Vec<EligibleTarget>, SourceError>>,
    groups: HashMap<Provider, Result<Vec<EligibleGroup>, SourceError>>,
    delay: Option<Duration>,
    target_calls: Mutex<HashMap<Provider, usize>>,
    group_calls: Mutex<HashMap<Provider, usize>>,
}

impl StubSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_targets(mut self, provider: Provider, targets: Vec<EligibleTarget>) -> Self {
        self.targets.insert(provider, Ok(targets));
        self
    }

    pub fn with_target_error(mut self, provider: Provider, error: SourceError) -> Self {
        self.targets.insert(provider, Err(error));
        self
    }

    pub fn with_groups(mut self, provider: Provider, groups: Vec<EligibleGroup>) -> Self {
        self.groups.insert(provider, Ok(groups));
        self
    }

    pub fn with_group_error(mut self, provider: Provider, error: SourceError) -> Self {
        self.groups.insert(provider, Err(error));
        self
    }

    /// Every call sleeps this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn target_calls(&self, provider: Provider) -> usize {
        self.target_calls.lock().get(&provider).copied().unwrap_or(0)
    }

    pub fn total_target_calls(&self) -> usize {
        self.target_calls.lock().values().sum()
    }

    pub fn group_calls(&self, provider: Provider) -> usize {
        self.group_calls.lock().get(&provider).copied().unwrap_or(0)
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl CloudEligibilitySource for StubSource {
    async fn eligible_targets(
        &self,
        _ctx: &CallContext,
        provider: Provider,
    ) -> jit_types::Result<Vec<EligibleTarget>> {
        *self.target_calls.lock().entry(provider).or_default() += 1;
        self.pause().await;
        self.targets
            .get(&provider)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

#[async_trait]
impl GroupsEligibilitySource for StubSource {
    async fn eligible_groups(
        &self,
        _ctx: &CallContext,
        provider: Provider,
    ) -> jit_types::Result<Vec<EligibleGroup>> {
        *self.group_calls.lock().entry(provider).or_default() += 1;
        self.pause().await;
        self.groups
            .get(&provider)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// Scripted sessions source.
pub struct StubSessions {
    response: Result<Vec<Session>, SourceError>,
    calls: Mutex<usize>,
}

impl StubSessions {
    pub fn ok(sessions: Vec<Session>) -> Self {
        Self {
            response: Ok(sessions),
            calls: Mutex::new(0),
        }
    }

    pub fn failing(error: SourceError) -> Self {
        Self {
            response: Err(error),
            calls: Mutex::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock()
    }
}

#[async_trait]
impl SessionsSource for StubSessions {
    async fn active_sessions(
        &self,
        _ctx: &CallContext,
        provider: Option<Provider>,
    ) -> jit_types::Result<Vec<Session>> {
        *self.calls.lock() += 1;
        self.response.clone().map(|sessions| {
            sessions
                .into_iter()
                .filter(|s| provider.is_none_or(|p| s.provider == p))
                .collect()
        })
    }
}

pub fn target(workspace_id: &str, workspace_name: &str, role: &str) -> EligibleTarget {
    EligibleTarget::new(workspace_id, workspace_name, role)
}
