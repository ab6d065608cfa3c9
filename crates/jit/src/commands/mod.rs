//! CLI command handlers.

pub mod cache;
pub mod elevate;
pub mod groups;
pub mod revoke;
pub mod status;
pub mod targets;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result};
use console::Style;
use jit_client::BrokerClient;
use jit_config::JitConfig;
use jit_eligibility::{CachedEligibility, ProviderFailure};
use jit_store::{Store, StoreConfig};
use jit_types::{CallContext, Provider, SharedCloudSource, SharedGroupsSource};

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
    /// Skip cache reads for this invocation.
    pub refresh: bool,
    /// Broker URL from `--broker` or `JIT_BROKER_URL`.
    pub broker_url: Option<String>,
    /// Per-call timeout for broker lookups.
    pub timeout: Duration,
    /// Cancellation and deadline for this invocation's lookups.
    pub call: CallContext,
    /// Merged file configuration.
    pub config: JitConfig,
}

/// Everything a command needs to talk to the broker.
pub struct Broker {
    pub client: BrokerClient,
    pub store: Arc<Store>,
    /// Cloud eligibility, cached unless `[cache].enabled = false`.
    pub cloud: SharedCloudSource,
    /// Groups eligibility, cached unless `[cache].enabled = false`.
    pub groups: SharedGroupsSource,
}

impl Context {
    /// Providers queried when none is named.
    pub fn providers(&self) -> Vec<Provider> {
        self.config.defaults().providers
    }

    /// Explicit provider, else the configured default.
    pub fn provider_or_default(&self, provider: Option<Provider>) -> Option<Provider> {
        provider.or(self.config.defaults().provider)
    }

    /// Open the on-disk store with the configured horizons.
    pub fn open_store(&self) -> Result<Arc<Store>> {
        let cache = self.config.cache();
        let dir = cache.effective_dir();
        let store = Store::open(
            StoreConfig::new(&dir)
                .with_ttl(cache.ttl())
                .with_session_retention(cache.session_retention()),
        )
        .with_context(|| format!("failed to open cache at {}", dir.display()))?;
        Ok(Arc::new(store))
    }

    /// Build a broker client from flags, environment and config.
    pub fn client(&self) -> Result<BrokerClient> {
        let broker = self.config.broker();
        let url = match self.broker_url.as_deref() {
            Some(url) if !url.is_empty() => url,
            _ => broker.require_url()?,
        };

        let mut builder = BrokerClient::builder().base_url(url).timeout(self.timeout);
        if let Some(token) = broker.resolve_token() {
            builder = builder.auth_token(token);
        }
        builder
            .build()
            .with_context(|| format!("invalid broker URL: {url}"))
    }

    /// Client, store and the eligibility sources wired together.
    pub fn connect(&self) -> Result<Broker> {
        let client = self.client()?;
        let store = self.open_store()?;

        let (cloud, groups) = if self.config.cache().enabled {
            let cached = Arc::new(
                CachedEligibility::new(
                    Arc::new(client.clone()),
                    Arc::new(client.clone()),
                    store.clone(),
                )
                .with_refresh(self.refresh),
            );
            let cloud: SharedCloudSource = cached.clone();
            let groups: SharedGroupsSource = cached;
            (cloud, groups)
        } else {
            let direct = Arc::new(client.clone());
            let cloud: SharedCloudSource = direct.clone();
            let groups: SharedGroupsSource = direct;
            (cloud, groups)
        };

        Ok(Broker {
            client,
            store,
            cloud,
            groups,
        })
    }
}

/// Print one dimmed line per degraded provider.
pub fn print_degraded(degraded: &[ProviderFailure]) {
    if degraded.is_empty() {
        return;
    }
    let yellow = Style::new().yellow();
    let dim = Style::new().dim();
    println!();
    for failure in degraded {
        println!(
            "  {} {} {}",
            yellow.apply_to("!"),
            failure.provider.display_name(),
            dim.apply_to(format!("unavailable: {}", failure.error))
        );
    }
}
