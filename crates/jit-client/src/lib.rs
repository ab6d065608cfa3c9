//! HTTP client for the jit elevation broker.
//!
//! [`BrokerClient`] exposes the broker's REST endpoints as typed calls and
//! implements the eligibility and session source traits from `jit-types`,
//! so the cache and aggregator can use it directly.
//!
//! # API Coverage
//!
//! - **Eligibility**: cloud targets and directory groups per provider
//! - **Sessions**: list active sessions, revoke
//! - **Elevations**: request a new elevation

pub mod api;
pub mod client;
pub mod error;
mod source;
pub mod types;

pub use client::{BrokerClient, ClientBuilder};
pub use error::{Error, Result};
pub use types::*;
