//! # Garage Flows
//!
//! The concrete wizards of the garage marketplace, each a step table over
//! [`garage_core::Flow`]:
//! - [`registration`] - register and mint a vehicle from a VIN photo
//! - [`upgrade`] - record an upgrade against a minted vehicle
//! - [`collection`] - create a sponsorship collection
//! - [`sponsorship`] - mint a sponsorship slot
//!
//! Commits go through a [`GarageBackend`]; [`SimulatedBackend`] stands in for
//! the real endpoints.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use garage_core::{Flow, Result, WizardError};
use serde::{Deserialize, Serialize};

pub mod backend;
pub mod collection;
pub mod registration;
pub mod simulated;
pub mod sponsorship;
pub mod upgrade;
pub mod validate;

pub use backend::GarageBackend;
pub use simulated::{SimulatedBackend, SimulatedBackendConfig};
pub use sponsorship::SponsorshipStage;

/// The wizards this crate provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowKind {
    Registration,
    Upgrade,
    Collection,
    Sponsorship,
}

impl FlowKind {
    /// Every flow kind.
    pub const ALL: [FlowKind; 4] = [
        FlowKind::Registration,
        FlowKind::Upgrade,
        FlowKind::Collection,
        FlowKind::Sponsorship,
    ];

    /// The flow name.
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowKind::Registration => "registration",
            FlowKind::Upgrade => "upgrade",
            FlowKind::Collection => "collection",
            FlowKind::Sponsorship => "sponsorship",
        }
    }

    /// Build the step table for this flow.
    pub fn build(&self, backend: Arc<dyn GarageBackend>) -> Result<Flow> {
        match self {
            FlowKind::Registration => registration::flow(backend),
            FlowKind::Upgrade => upgrade::flow(backend),
            FlowKind::Collection => collection::flow(backend),
            FlowKind::Sponsorship => sponsorship::flow(backend),
        }
    }
}

impl fmt::Display for FlowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FlowKind {
    type Err = WizardError;

    fn from_str(s: &str) -> Result<Self> {
        FlowKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| WizardError::UnknownFlow(s.to_string()))
    }
}
