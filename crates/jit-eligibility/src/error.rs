//! Aggregation error types.

use jit_types::{Provider, SourceError};
use serde::Serialize;
use thiserror::Error;

/// A provider whose query failed during a fan-out.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderFailure {
    pub provider: Provider,
    #[serde(serialize_with = "serialize_error")]
    pub error: SourceError,
}

impl ProviderFailure {
    pub fn new(provider: Provider, error: SourceError) -> Self {
        Self { provider, error }
    }
}

fn serialize_error<S: serde::Serializer>(
    error: &SourceError,
    s: S,
) -> std::result::Result<S::Ok, S::Error> {
    s.collect_str(error)
}

fn summarize(failures: &[ProviderFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{}: {}", f.provider, f.error))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors surfaced by eligibility operations.
#[derive(Debug, Error)]
pub enum EligibilityError {
    /// The only source for this operation failed.
    #[error("{operation} failed for {provider}: {source}")]
    Source {
        provider: Provider,
        operation: &'static str,
        #[source]
        source: SourceError,
    },

    /// Listing active sessions failed. Always fatal.
    #[error("failed to list active sessions: {0}")]
    Sessions(#[source] SourceError),

    /// Every provider in a fan-out failed.
    #[error("all providers failed: {}", summarize(.0))]
    AllProvidersFailed(Vec<ProviderFailure>),

    /// Every source answered but none offered anything.
    #[error("no eligible targets or groups found, check your policies")]
    NoEligibleTargets,
}

impl EligibilityError {
    /// True if the failure came from the caller's cancellation or deadline.
    pub fn is_context_error(&self) -> bool {
        match self {
            EligibilityError::Source { source, .. } => source.is_context_error(),
            EligibilityError::Sessions(source) => source.is_context_error(),
            EligibilityError::AllProvidersFailed(failures) => {
                !failures.is_empty() && failures.iter().all(|f| f.error.is_context_error())
            }
            EligibilityError::NoEligibleTargets => false,
        }
    }
}

/// Result type for eligibility operations.
pub type Result<T> = std::result::Result<T, EligibilityError>;
