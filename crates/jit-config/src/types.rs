//! Configuration types.
//!
//! # Configuration
//!
//! ```toml
//! [broker]
//! url = "https://broker.example.com"
//! timeout_secs = 30
//! token_env = "JIT_TOKEN"
//!
//! [cache]
//! dir = "~/.cache/jit"
//! ttl_secs = 14400
//! session_retention_secs = 86400
//! enabled = true
//!
//! [defaults]
//! provider = "azure"
//! providers = ["aws", "azure", "gcp"]
//! duration_secs = 3600
//! ```
//!
//! # Environment Variables
//!
//! - `JIT_CACHE_DIR` - Override the cache directory

use std::path::{Path, PathBuf};
use std::time::Duration;

use jit_types::Provider;
use serde::{Deserialize, Serialize};

use crate::{ConfigError, Result};

/// Environment variable overriding the cache directory.
pub const CACHE_DIR_ENV: &str = "JIT_CACHE_DIR";

const APP_NAME: &str = "jit";

/// Root configuration. Each section is optional so layers can be merged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JitConfig {
    pub broker: Option<BrokerConfig>,
    pub cache: Option<CacheSection>,
    pub defaults: Option<DefaultsConfig>,
}

impl JitConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one (other takes priority).
    pub fn merge(&mut self, other: JitConfig) {
        if other.broker.is_some() {
            self.broker = other.broker;
        }

        if other.cache.is_some() {
            self.cache = other.cache;
        }

        if other.defaults.is_some() {
            self.defaults = other.defaults;
        }
    }

    /// Broker settings, defaulted if the section is absent.
    pub fn broker(&self) -> BrokerConfig {
        self.broker.clone().unwrap_or_default()
    }

    /// Cache settings, defaulted if the section is absent.
    pub fn cache(&self) -> CacheSection {
        self.cache.clone().unwrap_or_default()
    }

    /// Default elevation settings, defaulted if the section is absent.
    pub fn defaults(&self) -> DefaultsConfig {
        self.defaults.clone().unwrap_or_default()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Broker
// ─────────────────────────────────────────────────────────────────────────────

/// Broker connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// Base URL of the broker API.
    pub url: Option<String>,

    /// Per-request timeout in seconds.
    /// Default: 30
    pub timeout_secs: u64,

    /// Environment variable holding the bearer token.
    /// Default: `JIT_TOKEN`
    pub token_env: String,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_secs: 30,
            token_env: "JIT_TOKEN".to_string(),
        }
    }
}

impl BrokerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The configured URL, or an error naming every way to set it.
    pub fn require_url(&self) -> Result<&str> {
        self.url
            .as_deref()
            .filter(|url| !url.is_empty())
            .ok_or(ConfigError::MissingBrokerUrl)
    }

    /// Read the bearer token from `token_env`, if set.
    pub fn resolve_token(&self) -> Option<String> {
        std::env::var(&self.token_env)
            .ok()
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Cache
// ─────────────────────────────────────────────────────────────────────────────

/// Eligibility cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSection {
    /// Cache directory. Default: platform cache dir + `/jit`.
    ///
    /// Can be overridden by the `JIT_CACHE_DIR` environment variable.
    pub dir: Option<PathBuf>,

    /// Freshness horizon for eligibility entries, in seconds.
    /// Default: 14400 (4 hours)
    pub ttl_secs: u64,

    /// Retention for session elevation timestamps, in seconds.
    /// Default: 86400 (24 hours)
    pub session_retention_secs: u64,

    /// When false, every lookup goes to the broker.
    /// Default: true
    pub enabled: bool,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            dir: None,
            ttl_secs: 4 * 60 * 60,
            session_retention_secs: 24 * 60 * 60,
            enabled: true,
        }
    }
}

impl CacheSection {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn session_retention(&self) -> Duration {
        Duration::from_secs(self.session_retention_secs)
    }

    /// Get the effective cache directory, checking the environment first.
    ///
    /// Resolution order:
    /// 1. `JIT_CACHE_DIR` environment variable
    /// 2. Configured `dir` value (`~` expanded)
    /// 3. Platform cache directory + `/jit`
    pub fn effective_dir(&self) -> PathBuf {
        if let Ok(env_dir) = std::env::var(CACHE_DIR_ENV)
            && !env_dir.is_empty()
        {
            return PathBuf::from(env_dir);
        }

        if let Some(dir) = &self.dir {
            return expand_path(dir);
        }

        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from(".cache"))
            .join(APP_NAME)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Defaults
// ─────────────────────────────────────────────────────────────────────────────

/// Default elevation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Provider used when none is given on the command line.
    /// Default: none (query every provider)
    pub provider: Option<Provider>,

    /// Providers queried by fan-out operations.
    /// Default: all supported providers
    pub providers: Vec<Provider>,

    /// Requested elevation duration in seconds.
    /// Default: 3600
    pub duration_secs: u64,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            provider: None,
            providers: Provider::ALL.to_vec(),
            duration_secs: 3600,
        }
    }
}

/// Expand `~/` to the home directory.
fn expand_path(path: &Path) -> PathBuf {
    if let Some(rest) = path.to_str().and_then(|s| s.strip_prefix("~/"))
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = JitConfig::new();
        let cache = config.cache();
        assert_eq!(cache.ttl(), Duration::from_secs(4 * 3600));
        assert_eq!(cache.session_retention(), Duration::from_secs(24 * 3600));
        assert!(cache.enabled);

        let broker = config.broker();
        assert!(broker.url.is_none());
        assert_eq!(broker.timeout(), Duration::from_secs(30));
        assert_eq!(broker.token_env, "JIT_TOKEN");

        let defaults = config.defaults();
        assert_eq!(defaults.providers, Provider::ALL.to_vec());
        assert_eq!(defaults.duration_secs, 3600);
    }

    #[test]
    fn test_parse_full() {
        let config = JitConfig::from_toml(
            r#"
[broker]
url = "https://broker.example.com"
timeout_secs = 10

[cache]
dir = "/var/cache/jit"
ttl_secs = 600
enabled = false

[defaults]
provider = "azure"
providers = ["aws", "azure"]
"#,
        )
        .unwrap();

        assert_eq!(config.broker().require_url().unwrap(), "https://broker.example.com");
        assert_eq!(config.broker().timeout_secs, 10);
        // Unset fields within a present section keep their defaults.
        assert_eq!(config.broker().token_env, "JIT_TOKEN");
        assert_eq!(config.cache().ttl_secs, 600);
        assert_eq!(config.cache().session_retention_secs, 86400);
        assert!(!config.cache().enabled);
        assert_eq!(config.defaults().provider, Some(Provider::Azure));
        assert_eq!(config.defaults().providers, vec![Provider::Aws, Provider::Azure]);
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let err = JitConfig::from_toml("[defaults]\nprovider = \"oracle\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_merge_section_wise() {
        let mut base = JitConfig::from_toml("[broker]\nurl = \"https://a\"\n[cache]\nttl_secs = 60\n").unwrap();
        let layer = JitConfig::from_toml("[cache]\nttl_secs = 120\n").unwrap();
        base.merge(layer);

        assert_eq!(base.broker().url.as_deref(), Some("https://a"));
        assert_eq!(base.cache().ttl_secs, 120);
    }

    #[test]
    fn test_missing_broker_url() {
        let broker = BrokerConfig {
            url: Some(String::new()),
            ..BrokerConfig::default()
        };
        assert!(matches!(broker.require_url(), Err(ConfigError::MissingBrokerUrl)));
    }

    #[test]
    fn test_roundtrip_toml() {
        let config = JitConfig {
            cache: Some(CacheSection {
                ttl_secs: 900,
                ..CacheSection::default()
            }),
            ..JitConfig::default()
        };
        let reparsed = JitConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(reparsed.cache().ttl_secs, 900);
    }

    #[test]
    fn test_effective_dir() {
        // SAFETY: Tests touching this variable are confined to this one test
        unsafe { std::env::remove_var(CACHE_DIR_ENV) };

        let configured = CacheSection {
            dir: Some(PathBuf::from("/custom/cache")),
            ..CacheSection::default()
        };
        assert_eq!(configured.effective_dir(), PathBuf::from("/custom/cache"));

        let default = CacheSection::default();
        assert!(default.effective_dir().ends_with("jit"));

        // SAFETY: See above
        unsafe { std::env::set_var(CACHE_DIR_ENV, "/from/env") };
        assert_eq!(configured.effective_dir(), PathBuf::from("/from/env"));
        unsafe { std::env::remove_var(CACHE_DIR_ENV) };
    }

    #[test]
    fn test_expand_path() {
        let absolute = PathBuf::from("/absolute/path");
        assert_eq!(expand_path(&absolute), absolute);

        if dirs::home_dir().is_some() {
            let expanded = expand_path(Path::new("~/cache"));
            assert!(!expanded.to_string_lossy().starts_with("~/"));
        }
    }
}
