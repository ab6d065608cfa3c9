//! Shared types for the jit elevation CLI.
//!
//! Everything that crosses a crate boundary lives here: the provider tag, the
//! eligibility and session records returned by the broker, the source traits
//! the cache and aggregator are written against, and the [`CallContext`] that
//! carries cancellation and deadlines into every outbound call.

pub mod context;
pub mod eligibility;
pub mod error;
pub mod provider;
pub mod session;
pub mod source;

pub use context::CallContext;
pub use eligibility::{EligibleGroup, EligibleTarget, Tagged};
pub use error::{Result, SourceError};
pub use provider::{ParseProviderError, Provider};
pub use session::Session;
pub use source::{
    CloudEligibilitySource, GroupsEligibilitySource, SessionsSource, SharedCloudSource,
    SharedGroupsSource, SharedSessionsSource,
};
