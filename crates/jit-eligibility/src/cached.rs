//! Read-through cache in front of the eligibility sources.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use jit_store::{CacheKey, Store};
use jit_types::{
    CallContext, CloudEligibilitySource, EligibleGroup, EligibleTarget, GroupsEligibilitySource,
    Provider, SharedCloudSource, SharedGroupsSource,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// Caching decorator over a cloud and a groups eligibility source.
///
/// Implements both source traits itself, so it can stand in wherever the
/// uncached sources are used. Within one process every call site asking for
/// the same provider converges on one upstream call while the entry is fresh.
///
/// With `refresh` set, reads are skipped but successful fetches still
/// repopulate the store. Failed fetches never write.
pub struct CachedEligibility {
    cloud: SharedCloudSource,
    groups: SharedGroupsSource,
    store: Arc<Store>,
    refresh: bool,
}

impl CachedEligibility {
    pub fn new(cloud: SharedCloudSource, groups: SharedGroupsSource, store: Arc<Store>) -> Self {
        Self {
            cloud,
            groups,
            store,
            refresh: false,
        }
    }

    /// Bypass cache reads for this instance.
    pub fn with_refresh(mut self, refresh: bool) -> Self {
        self.refresh = refresh;
        self
    }

    pub fn refresh(&self) -> bool {
        self.refresh
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    async fn read_through<T, F>(&self, key: CacheKey, fetch: F) -> jit_types::Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: Future<Output = jit_types::Result<T>>,
    {
        if self.refresh {
            debug!(key = %key, "Cache bypassed (refresh)");
        } else if let Some(hit) = self.store.get_json::<T>(&key) {
            debug!(key = %key, "Cache hit");
            return Ok(hit);
        } else {
            debug!(key = %key, "Cache miss");
        }

        let value = fetch.await?;

        if let Err(e) = self.store.set_json(&key, &value) {
            warn!(key = %key, error = %e, "Failed to write eligibility cache");
        }

        Ok(value)
    }
}

#[async_trait]
impl CloudEligibilitySource for CachedEligibility {
    async fn eligible_targets(
        &self,
        ctx: &CallContext,
        provider: Provider,
    ) -> jit_types::Result<Vec<EligibleTarget>> {
        self.read_through(
            CacheKey::eligibility(provider.tag()),
            self.cloud.eligible_targets(ctx, provider),
        )
        .await
    }
}

#[async_trait]
impl GroupsEligibilitySource for CachedEligibility {
    async fn eligible_groups(
        &self,
        ctx: &CallContext,
        provider: Provider,
    ) -> jit_types::Result<Vec<EligibleGroup>> {
        self.read_through(
            CacheKey::groups(provider.tag()),
            self.groups.eligible_groups(ctx, provider),
        )
        .await
    }
}
