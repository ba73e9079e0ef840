//! The wizard state store and transition engine.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use garage_core::{
    CommitRequest, FieldIssue, Flow, FormData, StepCommit, StepDefinition, StepError,
    StepPayload, WizardStatus,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::events::{WizardEvent, WizardEventKind};
use crate::idempotency::commit_key;

/// Mutable state of one open wizard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WizardState {
    /// Index of the step being shown.
    pub current_step_index: usize,

    /// Answers accumulated so far.
    pub form_data: FormData,

    /// Transient status.
    pub status: WizardStatus,

    /// Error from the last failed transition attempt.
    pub last_error: Option<StepError>,
}

/// Result of an intent.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Moved forward one step.
    Advanced { from: usize, to: usize },
    /// Moved back one step.
    Retreated { from: usize, to: usize },
    /// The commit failed; the wizard stays on the step.
    Failed(StepError),
    /// A field was written.
    Updated,
    /// Returned to the initial state.
    Reset,
    /// The intent was refused without any state change.
    Ignored(IgnoreReason),
}

/// Why an intent was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    /// The current step is not complete.
    Incomplete,
    /// A commit is in flight.
    InFlight,
    /// Already on the first step.
    AtFirstStep,
    /// On the terminal step, which can be neither left nor advanced.
    Finished,
    /// The commit belonged to an attempt that is no longer current.
    Stale,
}

/// First half of a forward transition.
#[derive(Debug)]
pub enum AdvanceStep {
    /// Nothing to await; the transition is already applied (or refused).
    Done(Transition),
    /// A commit must run before [`Wizard::complete_advance`] is called.
    Commit(PendingCommit),
}

/// A commit that has been started but not applied.
///
/// Running it does not borrow the wizard, so hosts can release their lock on
/// the wizard while the adapter is awaited.
pub struct PendingCommit {
    attempt: u64,
    commit: StepCommit,
    request: CommitRequest,
    timeout: Duration,
    cancelled: watch::Receiver<bool>,
}

impl PendingCommit {
    /// The attempt number.
    pub fn attempt(&self) -> u64 {
        self.attempt
    }

    /// The request handed to the adapter.
    pub fn request(&self) -> &CommitRequest {
        &self.request
    }

    /// Run the adapter, bounded by the commit timeout and the wizard's
    /// cancellation signal.
    pub async fn run(&self) -> Result<StepPayload, StepError> {
        let mut cancelled = self.cancelled.clone();
        let call = self.commit.adapter.commit(self.request.clone());

        tokio::select! {
            outcome = tokio::time::timeout(self.timeout, call) => match outcome {
                Ok(result) => result,
                Err(_) => {
                    warn!(
                        wizard_id = %self.request.wizard_id,
                        step = %self.request.step_id,
                        attempt = self.attempt,
                        "commit timed out"
                    );
                    Err(StepError::timeout(self.timeout))
                }
            },
            _ = cancelled.changed() => Err(StepError::cancelled()),
        }
    }
}

impl fmt::Debug for PendingCommit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingCommit")
            .field("attempt", &self.attempt)
            .field("step_id", &self.request.step_id)
            .field("kind", &self.commit.kind)
            .finish()
    }
}

struct InFlight {
    attempt: u64,
    cancel: watch::Sender<bool>,
}

/// Serializable view of a wizard for presentation bindings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WizardSnapshot {
    pub wizard_id: Uuid,
    pub flow: String,
    pub step_id: String,
    pub step_title: String,
    pub current_step_index: usize,
    pub step_count: usize,
    pub status: WizardStatus,
    pub form_data: FormData,
    pub last_error: Option<StepError>,
    /// Inline validation messages for the current step.
    pub issues: Vec<FieldIssue>,
    pub can_advance: bool,
    pub can_retreat: bool,
    pub updated_at: DateTime<Utc>,
}

/// One open wizard over a [`Flow`].
pub struct Wizard {
    id: Uuid,
    flow: Flow,
    config: EngineConfig,
    state: WizardState,
    attempts: u64,
    generation: u64,
    in_flight: Option<InFlight>,
    events: broadcast::Sender<WizardEvent>,
    updated_at: DateTime<Utc>,
}

impl Wizard {
    /// Open a wizard on the first step of `flow`.
    pub fn new(flow: Flow, config: EngineConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        let id = Uuid::new_v4();

        debug!(wizard_id = %id, flow = flow.name(), "wizard opened");

        Self {
            id,
            flow,
            config,
            state: WizardState::default(),
            attempts: 0,
            generation: 0,
            in_flight: None,
            events,
            updated_at: Utc::now(),
        }
    }

    /// The wizard id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The flow being run.
    pub fn flow(&self) -> &Flow {
        &self.flow
    }

    /// The current state.
    pub fn state(&self) -> &WizardState {
        &self.state
    }

    /// The current status.
    pub fn status(&self) -> WizardStatus {
        self.state.status
    }

    /// Answers accumulated so far.
    pub fn form_data(&self) -> &FormData {
        &self.state.form_data
    }

    /// The step being shown.
    pub fn current_step(&self) -> &StepDefinition {
        &self.flow.steps()[self.state.current_step_index]
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> broadcast::Receiver<WizardEvent> {
        self.events.subscribe()
    }

    /// Attempt a forward transition, awaiting the step's commit if it has one.
    pub async fn advance(&mut self) -> Transition {
        match self.begin_advance() {
            AdvanceStep::Done(transition) => transition,
            AdvanceStep::Commit(pending) => {
                let result = pending.run().await;
                self.complete_advance(pending, result)
            }
        }
    }

    /// Check preconditions and either move forward or start the step's commit.
    pub fn begin_advance(&mut self) -> AdvanceStep {
        if self.state.status.is_in_flight() {
            debug!(wizard_id = %self.id, "advance ignored: commit in flight");
            return AdvanceStep::Done(Transition::Ignored(IgnoreReason::InFlight));
        }

        let step = self.current_step();
        if step.is_terminal() || !self.state.status.accepts_advance() {
            return AdvanceStep::Done(Transition::Ignored(IgnoreReason::Finished));
        }

        if !step.is_complete(&self.state.form_data) {
            debug!(wizard_id = %self.id, step = %step.id, "advance ignored: step incomplete");
            return AdvanceStep::Done(Transition::Ignored(IgnoreReason::Incomplete));
        }

        let step_id = step.id.clone();
        let Some(commit) = step.commit_action().cloned() else {
            return AdvanceStep::Done(self.move_forward());
        };

        self.attempts += 1;
        let attempt = self.attempts;
        let (cancel, cancelled) = watch::channel(false);
        self.in_flight = Some(InFlight { attempt, cancel });
        self.state.status = commit.kind.in_flight_status();

        let request = CommitRequest {
            wizard_id: self.id,
            step_id: step_id.clone(),
            attempt,
            idempotency_key: commit_key(
                self.id,
                self.generation,
                &step_id,
                &self.state.form_data,
            ),
            form_data: self.state.form_data.clone(),
        };

        info!(
            wizard_id = %self.id,
            step = %step_id,
            attempt,
            kind = ?commit.kind,
            "commit started"
        );
        self.emit(WizardEventKind::CommitStarted { step_id, attempt });

        AdvanceStep::Commit(PendingCommit {
            attempt,
            commit,
            request,
            timeout: self.config.commit_timeout(),
            cancelled,
        })
    }

    /// Apply the outcome of a commit started by [`Wizard::begin_advance`].
    ///
    /// Outcomes of attempts that are no longer current are discarded.
    pub fn complete_advance(
        &mut self,
        pending: PendingCommit,
        result: Result<StepPayload, StepError>,
    ) -> Transition {
        match &self.in_flight {
            Some(current) if current.attempt == pending.attempt => {}
            _ => {
                debug!(
                    wizard_id = %self.id,
                    attempt = pending.attempt,
                    "discarding outcome of stale commit"
                );
                return Transition::Ignored(IgnoreReason::Stale);
            }
        }
        self.in_flight = None;

        match result {
            Ok(payload) => {
                self.state.form_data.merge(payload);
                self.move_forward()
            }
            Err(error) => {
                warn!(
                    wizard_id = %self.id,
                    step = %pending.request.step_id,
                    attempt = pending.attempt,
                    kind = ?error.kind,
                    "commit failed: {}",
                    error.message
                );
                self.state.status = WizardStatus::Error;
                self.state.last_error = Some(error.clone());
                self.emit(WizardEventKind::CommitFailed {
                    step_id: pending.request.step_id.clone(),
                    error: error.clone(),
                });
                Transition::Failed(error)
            }
        }
    }

    /// Attempt a backward transition. Answers are kept.
    ///
    /// The terminal step is final: its commits have already been submitted.
    pub fn retreat(&mut self) -> Transition {
        if self.state.status.is_in_flight() {
            return Transition::Ignored(IgnoreReason::InFlight);
        }
        let from = self.state.current_step_index;
        if from == 0 {
            return Transition::Ignored(IgnoreReason::AtFirstStep);
        }
        if self.current_step().is_terminal() {
            return Transition::Ignored(IgnoreReason::Finished);
        }

        let to = from - 1;
        self.state.current_step_index = to;
        self.state.status = WizardStatus::Idle;
        self.state.last_error = None;

        debug!(wizard_id = %self.id, from, to, "retreated");
        self.emit(WizardEventKind::Retreated { from, to });
        Transition::Retreated { from, to }
    }

    /// Record an answer.
    ///
    /// Errors stay visible until the next transition attempt, except a conflict
    /// on this very field, which editing it resolves.
    pub fn update_field(&mut self, key: impl Into<String>, value: Value) -> Transition {
        let key = key.into();

        let clears_conflict = self
            .state
            .last_error
            .as_ref()
            .is_some_and(|e| e.is_conflict_on(&key));
        if clears_conflict {
            self.state.last_error = None;
            if self.state.status == WizardStatus::Error {
                self.state.status = WizardStatus::Idle;
            }
            self.emit(WizardEventKind::ErrorCleared { field: key.clone() });
        }

        self.state.form_data.set(key.clone(), value);
        self.emit(WizardEventKind::FieldUpdated { key });
        Transition::Updated
    }

    /// Return to the first step with nothing entered. A commit in flight is
    /// cancelled and its outcome discarded.
    pub fn reset(&mut self) -> Transition {
        if let Some(in_flight) = self.in_flight.take() {
            debug!(wizard_id = %self.id, attempt = in_flight.attempt, "cancelling commit");
            let _ = in_flight.cancel.send(true);
        }
        self.state = WizardState::default();
        self.generation += 1;

        info!(wizard_id = %self.id, generation = self.generation, "wizard reset");
        self.emit(WizardEventKind::Reset);
        Transition::Reset
    }

    /// Serializable view of the wizard.
    pub fn snapshot(&self) -> WizardSnapshot {
        let step = self.current_step();
        let index = self.state.current_step_index;

        WizardSnapshot {
            wizard_id: self.id,
            flow: self.flow.name().to_string(),
            step_id: step.id.clone(),
            step_title: step.title.clone(),
            current_step_index: index,
            step_count: self.flow.len(),
            status: self.state.status,
            form_data: self.state.form_data.clone(),
            last_error: self.state.last_error.clone(),
            issues: step.issues(&self.state.form_data),
            can_advance: self.state.status.accepts_advance()
                && !step.is_terminal()
                && step.is_complete(&self.state.form_data),
            can_retreat: index > 0 && !step.is_terminal() && !self.state.status.is_in_flight(),
            updated_at: self.updated_at,
        }
    }

    fn move_forward(&mut self) -> Transition {
        let from = self.state.current_step_index;
        let to = (from + 1).min(self.flow.terminal_index());

        self.state.current_step_index = to;
        self.state.last_error = None;
        self.state.status = if self.flow.steps()[to].is_terminal() {
            WizardStatus::Done
        } else {
            WizardStatus::Idle
        };

        info!(wizard_id = %self.id, from, to, step = %self.flow.steps()[to].id, "advanced");
        self.emit(WizardEventKind::Advanced { from, to });
        Transition::Advanced { from, to }
    }

    fn emit(&mut self, kind: WizardEventKind) {
        self.updated_at = Utc::now();
        // No subscribers is fine.
        let _ = self.events.send(WizardEvent::new(self.id, kind));
    }
}

impl fmt::Debug for Wizard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wizard")
            .field("id", &self.id)
            .field("flow", &self.flow.name())
            .field("state", &self.state)
            .finish()
    }
}
