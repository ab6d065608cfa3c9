//! API endpoint groups.

mod elevations;
mod eligibility;
mod sessions;

pub use elevations::ElevationsApi;
pub use eligibility::EligibilityApi;
pub use sessions::SessionsApi;
