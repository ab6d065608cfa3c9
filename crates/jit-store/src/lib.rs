//! Disk-persisted TTL store.
//!
//! This crate provides the key/value store that sits behind the eligibility
//! cache:
//! - One JSON file per cache key, replaced atomically on every write
//! - Freshness evaluated lazily at read time against the stored write time,
//!   so readers configured with a different TTL interpret old entries correctly
//! - A separate session-timestamp namespace with its own retention horizon
//!
//! # Example
//!
//! ```rust,ignore
//! use jit_store::{CacheKey, Store, StoreConfig};
//!
//! let store = Store::open(StoreConfig::new(cache_dir).with_ttl(Duration::from_secs(4 * 3600)))?;
//! store.set_json(&CacheKey::eligibility("azure"), &targets)?;
//! let cached: Option<Vec<Target>> = store.get_json(&CacheKey::eligibility("azure"));
//! ```

mod config;
mod error;
mod key;
mod persistence;
mod store;
mod ttl;

pub use config::{DEFAULT_SESSION_RETENTION, DEFAULT_TTL, StoreConfig};
pub use error::{Result, StoreError};
pub use key::{CacheKey, CacheKind};
pub use persistence::{CacheEntry, FORMAT_VERSION};
pub use store::{Store, StoreStats};
pub use ttl::TtlPolicy;
