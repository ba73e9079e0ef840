//! Step definitions.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::adapter::CommitAdapter;
use crate::form::FormData;
use crate::types::CommitKind;

type Predicate = Arc<dyn Fn(&FormData) -> bool + Send + Sync>;
type IssueCheck = Arc<dyn Fn(&FormData) -> Vec<FieldIssue> + Send + Sync>;

/// An inline validation message for one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldIssue {
    /// The field the message belongs to.
    pub field: String,

    /// Human-readable message.
    pub message: String,
}

impl FieldIssue {
    /// Create a new issue.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// The async action run when a step is left forward.
#[derive(Clone)]
pub struct StepCommit {
    /// Whether this is a check or a submission.
    pub kind: CommitKind,

    /// The adapter to call.
    pub adapter: Arc<dyn CommitAdapter>,
}

/// A single screen of a wizard.
#[derive(Clone)]
pub struct StepDefinition {
    /// Unique step identifier within a flow.
    pub id: String,

    /// Human-readable label.
    pub title: String,

    terminal: bool,
    complete: Predicate,
    issues: Option<IssueCheck>,
    commit: Option<StepCommit>,
}

impl StepDefinition {
    /// Create a step that is always complete and has no commit.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            terminal: false,
            complete: Arc::new(|_: &FormData| true),
            issues: None,
            commit: None,
        }
    }

    /// Create the terminal ("success") step of a flow.
    pub fn terminal(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            terminal: true,
            ..Self::new(id, title)
        }
    }

    /// Gate forward navigation on a predicate.
    pub fn complete_when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&FormData) -> bool + Send + Sync + 'static,
    {
        self.complete = Arc::new(predicate);
        self
    }

    /// Gate forward navigation on a validator: the step is complete when the
    /// validator reports no issues, and the issues are shown inline.
    pub fn validated_by<F>(mut self, validator: F) -> Self
    where
        F: Fn(&FormData) -> Vec<FieldIssue> + Send + Sync + 'static,
    {
        let validator: IssueCheck = Arc::new(validator);
        let check = validator.clone();
        self.complete = Arc::new(move |data: &FormData| check(data).is_empty());
        self.issues = Some(validator);
        self
    }

    /// Attach a side-effecting commit.
    pub fn commit(mut self, adapter: Arc<dyn CommitAdapter>) -> Self {
        self.commit = Some(StepCommit {
            kind: CommitKind::Submit,
            adapter,
        });
        self
    }

    /// Attach a read-only check commit.
    pub fn check(mut self, adapter: Arc<dyn CommitAdapter>) -> Self {
        self.commit = Some(StepCommit {
            kind: CommitKind::Check,
            adapter,
        });
        self
    }

    /// Returns true if the current answers allow leaving this step.
    pub fn is_complete(&self, data: &FormData) -> bool {
        (self.complete)(data)
    }

    /// Inline validation messages for the current answers.
    pub fn issues(&self, data: &FormData) -> Vec<FieldIssue> {
        self.issues.as_ref().map(|f| f(data)).unwrap_or_default()
    }

    /// The commit run when leaving this step, if any.
    pub fn commit_action(&self) -> Option<&StepCommit> {
        self.commit.as_ref()
    }

    /// Returns true for the success step.
    pub fn is_terminal(&self) -> bool {
        self.terminal
    }
}

impl fmt::Debug for StepDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepDefinition")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("terminal", &self.terminal)
            .field("commit", &self.commit.as_ref().map(|c| c.kind))
            .finish()
    }
}
