//! Error types for wizards.
//!
//! Two layers live here. [`StepError`] is the classified, always-recoverable
//! error a wizard stores in its state when a step cannot be left. [`WizardError`]
//! covers everything around a wizard: malformed flow definitions, unknown flows
//! and sessions.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Classification of a step-level error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Required inputs are incomplete or malformed.
    Validation,
    /// The commit adapter failed.
    Commit,
    /// A uniqueness check failed.
    Conflict,
    /// The commit did not finish within the configured timeout.
    Timeout,
    /// The commit was cancelled because the wizard was reset.
    Cancelled,
}

/// A classified error attached to the current step.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("{kind:?}: {message}")]
pub struct StepError {
    /// The error classification.
    pub kind: ErrorKind,

    /// Human-readable message.
    pub message: String,

    /// The offending field, for inline errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,

    /// When the error occurred.
    pub occurred_at: DateTime<Utc>,
}

impl StepError {
    /// Create an error of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            field: None,
            occurred_at: Utc::now(),
        }
    }

    /// A commit failure (network error, rejected transaction).
    pub fn commit(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Commit, message)
    }

    /// A uniqueness conflict on `field`.
    pub fn conflict(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message).on_field(field)
    }

    /// A validation failure on `field`.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message).on_field(field)
    }

    /// A commit that exceeded `limit`.
    pub fn timeout(limit: Duration) -> Self {
        Self::new(
            ErrorKind::Timeout,
            format!("Request timed out after {}ms", limit.as_millis()),
        )
    }

    /// A commit cancelled by a reset.
    pub fn cancelled() -> Self {
        Self::new(ErrorKind::Cancelled, "Request was cancelled")
    }

    /// Attach the offending field.
    pub fn on_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Returns true if this is a conflict on `field`.
    pub fn is_conflict_on(&self, field: &str) -> bool {
        self.kind == ErrorKind::Conflict && self.field.as_deref() == Some(field)
    }
}

/// Errors raised outside of a running wizard.
#[derive(Error, Debug, Clone)]
pub enum WizardError {
    /// A flow definition broke an ordering or terminal-step invariant.
    #[error("Invalid flow '{flow}': {message}")]
    InvalidFlow { flow: String, message: String },

    /// No flow is registered under this name.
    #[error("Unknown flow: {0}")]
    UnknownFlow(String),

    /// No open wizard with this id.
    #[error("Wizard session {0} not found")]
    SessionNotFound(Uuid),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl WizardError {
    /// Shorthand for [`WizardError::InvalidFlow`].
    pub fn invalid_flow(flow: impl Into<String>, message: impl Into<String>) -> Self {
        WizardError::InvalidFlow {
            flow: flow.into(),
            message: message.into(),
        }
    }
}

/// Convenience Result type for wizard operations.
pub type Result<T> = std::result::Result<T, WizardError>;

impl From<serde_json::Error> for WizardError {
    fn from(err: serde_json::Error) -> Self {
        WizardError::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_matches_only_its_field() {
        let err = StepError::conflict("collectionName", "Name already taken");
        assert!(err.is_conflict_on("collectionName"));
        assert!(!err.is_conflict_on("symbol"));

        let err = StepError::commit("network down").on_field("collectionName");
        assert!(!err.is_conflict_on("collectionName"));
    }

    #[test]
    fn test_timeout_message() {
        let err = StepError::timeout(Duration::from_millis(250));
        assert_eq!(err.kind, ErrorKind::Timeout);
        assert!(err.message.contains("250ms"));
    }

    #[test]
    fn test_step_error_serialization() {
        let err = StepError::validation("vin", "VIN must be exactly 17 characters");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "validation");
        assert_eq!(json["field"], "vin");

        let json = serde_json::to_value(StepError::commit("boom")).unwrap();
        assert!(json.get("field").is_none());
    }
}
