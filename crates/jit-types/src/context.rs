//! Cancellation and deadline propagation for outbound calls.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{Result, SourceError};

/// Carries a cancellation token and an optional deadline into a source call.
///
/// Cloning shares the token, so cancelling any clone cancels every in-flight
/// call made with it. Deadlines are per-clone: [`CallContext::fresh_deadline`]
/// derives a context that is still cancellable from the parent but whose
/// timeout starts now.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    cancellation: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    /// A context with no deadline and a fresh cancellation token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing cancellation token.
    pub fn with_cancellation(cancellation: CancellationToken) -> Self {
        Self {
            cancellation,
            deadline: None,
        }
    }

    /// Set a deadline `timeout` from now.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    /// Derive a context sharing this one's cancellation but with a new
    /// deadline starting now.
    pub fn fresh_deadline(&self, timeout: Duration) -> Self {
        Self {
            cancellation: self.cancellation.clone(),
            deadline: Some(Instant::now() + timeout),
        }
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Cancel every call sharing this context's token.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// Fail fast if the context is already cancelled or past its deadline.
    pub fn check(&self) -> Result<()> {
        if self.cancellation.is_cancelled() {
            return Err(SourceError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(SourceError::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// Drive `fut` to completion unless the context is cancelled or its
    /// deadline passes first.
    ///
    /// A context that is already done returns its error without polling `fut`.
    pub async fn run<F, T>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.check()?;

        let deadline = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancellation.cancelled() => Err(SourceError::Cancelled),
            _ = deadline => Err(SourceError::DeadlineExceeded),
            result = fut => result,
        }
    }
}
