//! Eligibility cache and concurrent multi-provider aggregation.
//!
//! - [`CachedEligibility`] wraps the cloud and groups eligibility sources and
//!   serves repeated queries from the [`jit_store::Store`]
//! - [`aggregate`] fans queries out across providers and joins the results,
//!   tolerating partial failure where the operation allows it
//! - [`lifetime`] turns recorded elevation times into remaining session time

pub mod aggregate;
pub mod cached;
pub mod error;
pub mod lifetime;

#[cfg(test)]
pub(crate) mod testing;

pub use aggregate::{
    GroupSet, NameResolution, StatusReport, TargetSet, eligible_groups, eligible_groups_across,
    eligible_targets, resolve_workspace_names, sessions_with_names,
};
pub use cached::CachedEligibility;
pub use error::{EligibilityError, ProviderFailure, Result};
pub use lifetime::{Remaining, format_duration, remaining_lifetime};
