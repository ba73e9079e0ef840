//! # Garage Core
//!
//! Core primitives for linear wizards.
//!
//! This crate provides the fundamental building blocks:
//! - [`StepDefinition`] - A named step with a completeness predicate and optional commit
//! - [`Flow`] - An ordered, validated list of steps ending in a terminal step
//! - [`FormData`] - Accumulated answers across steps
//! - [`CommitAdapter`] - Boundary to backends and wallets
//! - [`StepError`] / [`WizardError`] - Wizard-level and API-level errors

pub mod adapter;
pub mod error;
pub mod flow;
pub mod form;
pub mod step;
pub mod types;

// Re-exports for convenience
pub use adapter::{adapter_fn, CommitAdapter, CommitRequest};
pub use error::{ErrorKind, Result, StepError, WizardError};
pub use flow::{Flow, FlowBuilder};
pub use form::{FormData, StepPayload};
pub use step::{FieldIssue, StepCommit, StepDefinition};
pub use types::*;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::adapter::{adapter_fn, CommitAdapter, CommitRequest};
    pub use crate::error::{ErrorKind, Result, StepError, WizardError};
    pub use crate::flow::{Flow, FlowBuilder};
    pub use crate::form::{FormData, StepPayload};
    pub use crate::step::{FieldIssue, StepDefinition};
    pub use crate::types::{CommitKind, WizardStatus};
}
