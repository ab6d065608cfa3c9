//! Concurrent fan-out/gather across providers.
//!
//! Every routine here spawns one task per outbound query into a `JoinSet`
//! owned by the routine, waits for all of them, and then applies its error
//! policy in a single scan over the joined results:
//!
//! - the session list is mandatory: its failure is fatal
//! - per-provider eligibility is optional: a failure is logged, reported as
//!   degraded, and the provider contributes nothing
//! - when every provider of an elevation fan-out fails, the failures are
//!   promoted to one aggregated error
//!
//! Results arrive in completion order. Nothing here sorts; callers that
//! present results sort after the join.

use std::collections::{BTreeSet, HashMap};
use std::future::Future;

use jit_types::{
    CallContext, EligibleGroup, EligibleTarget, GroupsEligibilitySource, Provider, Session,
    SharedCloudSource, SharedGroupsSource, SharedSessionsSource, SourceError, Tagged,
};
use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::error::{EligibilityError, ProviderFailure, Result};

const LIST_ELIGIBILITY: &str = "list eligibility";
const LIST_GROUPS: &str = "list groups";

type ProviderResult<T> = (Provider, jit_types::Result<Vec<T>>);
type ProviderTargets = ProviderResult<EligibleTarget>;

/// Output of [`sessions_with_names`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatusReport {
    pub sessions: Vec<Session>,

    /// Workspace id to display name, from providers that answered.
    pub workspace_names: HashMap<String, String>,

    /// Providers whose eligibility lookup failed.
    pub degraded: Vec<ProviderFailure>,
}

/// Output of [`resolve_workspace_names`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct NameResolution {
    pub names: HashMap<String, String>,
    pub degraded: Vec<ProviderFailure>,
}

impl NameResolution {
    /// Display name for `workspace_id`, falling back to the id itself.
    pub fn name_or_id<'a>(&'a self, workspace_id: &'a str) -> &'a str {
        self.names
            .get(workspace_id)
            .map(String::as_str)
            .unwrap_or(workspace_id)
    }
}

/// Eligible targets for an elevation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TargetSet {
    /// One provider was requested; it is implied, so items are untagged.
    Single { targets: Vec<EligibleTarget> },

    /// Every provider was queried; each item carries its origin.
    Tagged {
        targets: Vec<Tagged<EligibleTarget>>,
        degraded: Vec<ProviderFailure>,
    },
}

impl TargetSet {
    pub fn len(&self) -> usize {
        match self {
            TargetSet::Single { targets } => targets.len(),
            TargetSet::Tagged { targets, .. } => targets.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sort by display label for stable presentation.
    pub fn sort(&mut self) {
        match self {
            TargetSet::Single { targets } => targets.sort_by_key(|t| t.display_label()),
            TargetSet::Tagged { targets, .. } => targets.sort_by_key(|t| t.display_label()),
        }
    }

    pub fn degraded(&self) -> &[ProviderFailure] {
        match self {
            TargetSet::Single { .. } => &[],
            TargetSet::Tagged { degraded, .. } => degraded,
        }
    }

    /// Flatten into tagged items, tagging single-provider results with
    /// `requested`.
    pub fn into_tagged(self, requested: Provider) -> Vec<Tagged<EligibleTarget>> {
        match self {
            TargetSet::Single { targets } => targets
                .into_iter()
                .map(|t| Tagged::new(requested, t))
                .collect(),
            TargetSet::Tagged { targets, .. } => targets,
        }
    }
}

/// Eligible groups gathered from every queried provider.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GroupSet {
    pub groups: Vec<Tagged<EligibleGroup>>,

    /// Providers whose group lookup failed.
    pub degraded: Vec<ProviderFailure>,
}

impl GroupSet {
    /// Tag a single provider's groups.
    pub fn single(provider: Provider, groups: Vec<EligibleGroup>) -> Self {
        Self {
            groups: groups.into_iter().map(|g| Tagged::new(provider, g)).collect(),
            degraded: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Sort by provider, then group name.
    pub fn sort(&mut self) {
        self.groups
            .sort_by(|a, b| (a.provider, &a.item.display_name).cmp(&(b.provider, &b.item.display_name)));
    }
}

/// Fetch the active sessions and every provider's eligibility concurrently,
/// and build a workspace name map from the providers that answered.
///
/// A session-list failure fails the whole call. Eligibility failures are
/// degraded.
pub async fn sessions_with_names(
    ctx: &CallContext,
    sessions: SharedSessionsSource,
    cloud: SharedCloudSource,
    providers: &[Provider],
) -> Result<StatusReport> {
    enum Fetched {
        Sessions(jit_types::Result<Vec<Session>>),
        Targets(Provider, jit_types::Result<Vec<EligibleTarget>>),
    }

    let mut tasks = JoinSet::new();
    {
        let ctx = ctx.clone();
        tasks.spawn(async move {
            Fetched::Sessions(ctx.run(sessions.active_sessions(&ctx, None)).await)
        });
    }
    for provider in distinct(providers.iter().copied()) {
        let ctx = ctx.clone();
        let cloud = cloud.clone();
        tasks.spawn(async move {
            Fetched::Targets(
                provider,
                ctx.run(cloud.eligible_targets(&ctx, provider)).await,
            )
        });
    }

    let mut session_result = None;
    let mut per_provider = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Fetched::Sessions(result)) => session_result = Some(result),
            Ok(Fetched::Targets(provider, result)) => per_provider.push((provider, result)),
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => warn!(error = %e, "Aggregation task did not complete"),
        }
    }

    let sessions = session_result
        .unwrap_or(Err(SourceError::Cancelled))
        .map_err(EligibilityError::Sessions)?;
    let (workspace_names, degraded) = name_map(per_provider);

    debug!(
        sessions = sessions.len(),
        names = workspace_names.len(),
        degraded = degraded.len(),
        "Joined sessions with eligibility"
    );

    Ok(StatusReport {
        sessions,
        workspace_names,
        degraded,
    })
}

/// Resolve workspace display names for an existing session list.
///
/// Queries each distinct provider present in `sessions` once, concurrently.
/// Failures are degraded; this never fails as a whole.
pub async fn resolve_workspace_names(
    ctx: &CallContext,
    cloud: SharedCloudSource,
    sessions: &[Session],
) -> NameResolution {
    let providers = distinct(sessions.iter().map(|s| s.provider));
    let results = fan_out_targets(ctx, cloud, providers).await;
    let (names, degraded) = name_map(results);
    NameResolution { names, degraded }
}

/// Fetch eligible targets for an elevation.
///
/// With `requested` set only that provider is queried and its error is
/// returned as-is (with context). Otherwise every provider in `supported` is
/// queried concurrently; individual failures are degraded unless all of them
/// failed.
pub async fn eligible_targets(
    ctx: &CallContext,
    cloud: SharedCloudSource,
    requested: Option<Provider>,
    supported: &[Provider],
) -> Result<TargetSet> {
    if let Some(provider) = requested {
        let targets = ctx
            .run(cloud.eligible_targets(ctx, provider))
            .await
            .map_err(|source| EligibilityError::Source {
                provider,
                operation: LIST_ELIGIBILITY,
                source,
            })?;
        return Ok(TargetSet::Single { targets });
    }

    let results = fan_out_targets(ctx, cloud, distinct(supported.iter().copied())).await;
    let (targets, degraded) = tag_results(results, LIST_ELIGIBILITY)?;
    Ok(TargetSet::Tagged { targets, degraded })
}

/// Fetch eligible groups for one provider's directory.
pub async fn eligible_groups(
    ctx: &CallContext,
    groups: &dyn GroupsEligibilitySource,
    provider: Provider,
) -> Result<Vec<EligibleGroup>> {
    ctx.run(groups.eligible_groups(ctx, provider))
        .await
        .map_err(|source| EligibilityError::Source {
            provider,
            operation: LIST_GROUPS,
            source,
        })
}

/// Fetch eligible groups from every provider in `supported` concurrently.
///
/// A provider whose lookup fails is degraded and contributes nothing. Only
/// when every provider failed does the call fail, with
/// [`EligibilityError::AllProvidersFailed`].
pub async fn eligible_groups_across(
    ctx: &CallContext,
    groups: SharedGroupsSource,
    supported: &[Provider],
) -> Result<GroupSet> {
    let providers = distinct(supported.iter().copied());
    let results = fan_out(ctx, providers, move |ctx, provider| {
        let groups = groups.clone();
        async move { groups.eligible_groups(&ctx, provider).await }
    })
    .await;

    let (groups, degraded) = tag_results(results, LIST_GROUPS)?;
    debug!(groups = groups.len(), degraded = degraded.len(), "Joined group eligibility");
    Ok(GroupSet { groups, degraded })
}

/// One concurrent eligibility query per provider, joined.
async fn fan_out_targets(
    ctx: &CallContext,
    cloud: SharedCloudSource,
    providers: Vec<Provider>,
) -> Vec<ProviderTargets> {
    fan_out(ctx, providers, move |ctx, provider| {
        let cloud = cloud.clone();
        async move { cloud.eligible_targets(&ctx, provider).await }
    })
    .await
}

/// Spawn `query` once per provider into a `JoinSet` and wait for all of them.
///
/// Each task runs under its own clone of `ctx`.
async fn fan_out<T, F, Fut>(
    ctx: &CallContext,
    providers: Vec<Provider>,
    query: F,
) -> Vec<ProviderResult<T>>
where
    T: Send + 'static,
    F: Fn(CallContext, Provider) -> Fut,
    Fut: Future<Output = jit_types::Result<Vec<T>>> + Send + 'static,
{
    let mut tasks = JoinSet::new();
    for provider in providers {
        let ctx = ctx.clone();
        let query = query(ctx.clone(), provider);
        tasks.spawn(async move {
            let result = ctx.run(query).await;
            (provider, result)
        });
    }

    let mut results = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(result) => results.push(result),
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => warn!(error = %e, "Eligibility task did not complete"),
        }
    }
    results
}

/// Tag successful items with their provider and degrade failed providers.
/// Fails only when every provider failed.
fn tag_results<T>(
    results: Vec<ProviderResult<T>>,
    operation: &'static str,
) -> Result<(Vec<Tagged<T>>, Vec<ProviderFailure>)> {
    let mut items = Vec::new();
    let mut degraded = Vec::new();
    let mut answered = 0;
    for (provider, result) in results {
        match result {
            Ok(found) => {
                answered += 1;
                items.extend(found.into_iter().map(|item| Tagged::new(provider, item)));
            }
            Err(error) => {
                warn!(provider = %provider, error = %error, operation, "Skipping provider: lookup failed");
                degraded.push(ProviderFailure::new(provider, error));
            }
        }
    }

    if answered == 0 && !degraded.is_empty() {
        return Err(EligibilityError::AllProvidersFailed(degraded));
    }
    Ok((items, degraded))
}

/// Workspace id to name from successful results; failures become degraded.
fn name_map(results: Vec<ProviderTargets>) -> (HashMap<String, String>, Vec<ProviderFailure>) {
    let mut names = HashMap::new();
    let mut degraded = Vec::new();
    for (provider, result) in results {
        match result {
            Ok(targets) => {
                for target in targets {
                    names.insert(target.workspace_id, target.workspace_name);
                }
            }
            Err(error) => {
                warn!(provider = %provider, error = %error, "Skipping provider: eligibility lookup failed");
                degraded.push(ProviderFailure::new(provider, error));
            }
        }
    }
    (names, degraded)
}

fn distinct(providers: impl IntoIterator<Item = Provider>) -> Vec<Provider> {
    providers
        .into_iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
