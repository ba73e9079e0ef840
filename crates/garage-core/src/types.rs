//! Common types shared by wizards and their bindings.

use serde::{Deserialize, Serialize};

/// Transient status of a wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WizardStatus {
    /// Waiting for user input.
    #[default]
    Idle,
    /// A check commit (e.g. a uniqueness lookup) is in flight.
    Validating,
    /// A submit commit (e.g. a mint) is in flight.
    Submitting,
    /// The last commit failed; the user may retry or go back.
    Error,
    /// The terminal step is showing.
    Done,
}

impl WizardStatus {
    /// Returns true while a commit is awaited.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, WizardStatus::Validating | WizardStatus::Submitting)
    }

    /// Returns true if a forward transition may be attempted.
    pub fn accepts_advance(&self) -> bool {
        matches!(self, WizardStatus::Idle | WizardStatus::Error)
    }
}

/// What a step's commit does, which decides the in-flight status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CommitKind {
    /// Read-only verification such as a uniqueness check.
    Check,
    /// Side-effecting submission such as a mint.
    #[default]
    Submit,
}

impl CommitKind {
    /// Status shown while a commit of this kind runs.
    pub fn in_flight_status(&self) -> WizardStatus {
        match self {
            CommitKind::Check => WizardStatus::Validating,
            CommitKind::Submit => WizardStatus::Submitting,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_in_flight() {
        assert!(WizardStatus::Submitting.is_in_flight());
        assert!(WizardStatus::Validating.is_in_flight());
        assert!(!WizardStatus::Error.is_in_flight());
        assert!(!WizardStatus::Done.is_in_flight());
    }

    #[test]
    fn test_status_accepts_advance() {
        assert!(WizardStatus::Idle.accepts_advance());
        assert!(WizardStatus::Error.accepts_advance());
        assert!(!WizardStatus::Submitting.accepts_advance());
        assert!(!WizardStatus::Done.accepts_advance());
    }

    #[test]
    fn test_commit_kind_status() {
        assert_eq!(CommitKind::Check.in_flight_status(), WizardStatus::Validating);
        assert_eq!(CommitKind::Submit.in_flight_status(), WizardStatus::Submitting);
    }
}
