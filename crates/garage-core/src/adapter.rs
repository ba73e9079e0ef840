//! Commit adapters: the boundary between a wizard and external systems.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StepError;
use crate::form::{FormData, StepPayload};

/// Everything an adapter is given for one commit attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitRequest {
    /// The wizard issuing the commit.
    pub wizard_id: Uuid,

    /// The step being left.
    pub step_id: String,

    /// Monotonic attempt counter within the wizard.
    pub attempt: u64,

    /// Stable for a verbatim retry, changes when the answers change.
    /// Backends use it to avoid double submission.
    pub idempotency_key: String,

    /// Accumulated answers at the time of the attempt.
    pub form_data: FormData,
}

/// Trait for commit actions attached to steps.
///
/// Implementations may be called again with the same idempotency key after a
/// failure or timeout, and must not repeat side effects in that case.
#[async_trait]
pub trait CommitAdapter: Send + Sync {
    /// Perform the commit.
    async fn commit(&self, request: CommitRequest) -> Result<StepPayload, StepError>;
}

struct FnAdapter<F>(F);

#[async_trait]
impl<F, Fut> CommitAdapter for FnAdapter<F>
where
    F: Fn(CommitRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Result<StepPayload, StepError>> + Send + 'static,
{
    async fn commit(&self, request: CommitRequest) -> Result<StepPayload, StepError> {
        (self.0)(request).await
    }
}

/// Wrap an async closure as a [`CommitAdapter`].
pub fn adapter_fn<F, Fut>(f: F) -> Arc<dyn CommitAdapter>
where
    F: Fn(CommitRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<StepPayload, StepError>> + Send + 'static,
{
    Arc::new(FnAdapter(f))
}
