//! # Garage Engine
//!
//! Transition engine for linear wizards.
//!
//! A [`Wizard`] owns the state of one open wizard over a [`garage_core::Flow`]:
//! - [`Wizard::advance`] checks the current step, runs its commit and moves forward
//! - [`Wizard::retreat`] moves back, keeping every answer
//! - [`Wizard::update_field`] records an answer
//! - [`Wizard::reset`] returns to the first step with nothing entered

pub mod config;
pub mod events;
pub mod idempotency;
pub mod wizard;

pub use config::EngineConfig;
pub use events::{WizardEvent, WizardEventKind};
pub use wizard::{
    AdvanceStep, IgnoreReason, PendingCommit, Transition, Wizard, WizardSnapshot, WizardState,
};
