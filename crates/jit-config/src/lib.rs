//! Configuration system for the jit CLI.
//!
//! Provides TOML-based configuration with:
//! - Broker connection settings (`[broker]`)
//! - Eligibility cache location and horizons (`[cache]`)
//! - Default provider and elevation duration (`[defaults]`)
//! - Config file layering (XDG user config + project-local `jit.toml`)

pub mod discovery;
pub mod error;
pub mod types;

pub use discovery::{
    CONFIG_DIR_ENV, ConfigSource, LoadedConfig, load_config, load_config_file,
    load_config_with_options, xdg_config_dir, xdg_config_path,
};
pub use error::{ConfigError, Result};
pub use types::{BrokerConfig, CACHE_DIR_ENV, CacheSection, DefaultsConfig, JitConfig};
