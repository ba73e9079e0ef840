//! Wizard change events.

use chrono::{DateTime, Utc};
use garage_core::StepError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A state change published by a wizard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WizardEvent {
    /// The wizard that changed.
    pub wizard_id: Uuid,

    /// What happened.
    pub kind: WizardEventKind,

    /// Timestamp of the change.
    pub timestamp: DateTime<Utc>,
}

/// Types of wizard events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WizardEventKind {
    /// A field was written.
    FieldUpdated { key: String },
    /// A commit started for a step.
    CommitStarted { step_id: String, attempt: u64 },
    /// The wizard moved forward.
    Advanced { from: usize, to: usize },
    /// The wizard moved back.
    Retreated { from: usize, to: usize },
    /// A commit failed; the wizard stays on the step.
    CommitFailed { step_id: String, error: StepError },
    /// A conflict error was cleared by editing its field.
    ErrorCleared { field: String },
    /// The wizard returned to its initial state.
    Reset,
}

impl WizardEvent {
    pub(crate) fn new(wizard_id: Uuid, kind: WizardEventKind) -> Self {
        Self {
            wizard_id,
            kind,
            timestamp: Utc::now(),
        }
    }
}
