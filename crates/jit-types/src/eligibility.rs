//! Eligibility records returned by the broker.

use serde::{Deserialize, Serialize};

use crate::provider::Provider;

/// A workspace/role pair the caller may elevate into.
///
/// A workspace is the provider's unit of scope: an AWS account, an Azure
/// subscription or a GCP project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibleTarget {
    pub workspace_id: String,
    pub workspace_name: String,
    pub role_name: String,

    /// Entra/identity directory the workspace belongs to, when the provider has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory_name: Option<String>,

    /// Longest elevation the policy allows, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_duration_secs: Option<u64>,
}

impl EligibleTarget {
    pub fn new(
        workspace_id: impl Into<String>,
        workspace_name: impl Into<String>,
        role_name: impl Into<String>,
    ) -> Self {
        Self {
            workspace_id: workspace_id.into(),
            workspace_name: workspace_name.into(),
            role_name: role_name.into(),
            directory_name: None,
            max_duration_secs: None,
        }
    }

    pub fn with_directory(mut self, directory: impl Into<String>) -> Self {
        self.directory_name = Some(directory.into());
        self
    }

    pub fn with_max_duration(mut self, secs: u64) -> Self {
        self.max_duration_secs = Some(secs);
        self
    }

    /// String used for display and for stable presentation ordering.
    pub fn display_label(&self) -> String {
        format!("{} / {}", self.workspace_name, self.role_name)
    }
}

/// A group the caller may be added to temporarily.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibleGroup {
    pub group_id: String,
    pub display_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory_name: Option<String>,
}

impl EligibleGroup {
    pub fn new(group_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            display_name: display_name.into(),
            directory_name: None,
        }
    }
}

/// An item annotated with the provider it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tagged<T> {
    pub provider: Provider,
    #[serde(flatten)]
    pub item: T,
}

impl<T> Tagged<T> {
    pub fn new(provider: Provider, item: T) -> Self {
        Self { provider, item }
    }
}

impl Tagged<EligibleTarget> {
    pub fn display_label(&self) -> String {
        format!("[{}] {}", self.provider.display_name(), self.item.display_label())
    }
}
