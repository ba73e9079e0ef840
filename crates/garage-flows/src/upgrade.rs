//! Vehicle upgrade: pick a minted vehicle, choose the upgrade type and attach
//! proof of the work.

use std::sync::Arc;

use garage_core::{
    adapter_fn, CommitAdapter, CommitRequest, FieldIssue, Flow, FormData, Result, StepDefinition,
    StepError, StepPayload,
};
use serde::{Deserialize, Serialize};

use crate::backend::GarageBackend;
use crate::validate::{field, required};

pub const SELECT_VEHICLE: &str = "select-vehicle";
pub const SELECT_UPGRADE: &str = "select-upgrade";
pub const UPLOAD_PROOF: &str = "upload-proof";
pub const SUCCESS: &str = "success";

/// Kind of work done on a vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpgradeType {
    Performance,
    Aesthetic,
    Maintenance,
    Restoration,
}

impl UpgradeType {
    /// Parse the form value.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "performance" => Some(UpgradeType::Performance),
            "aesthetic" => Some(UpgradeType::Aesthetic),
            "maintenance" => Some(UpgradeType::Maintenance),
            "restoration" => Some(UpgradeType::Restoration),
            _ => None,
        }
    }

    /// Rough value added to the vehicle, in USD.
    pub fn estimated_value_increase(&self) -> u64 {
        match self {
            UpgradeType::Performance => 15_000,
            UpgradeType::Aesthetic => 5_000,
            UpgradeType::Maintenance => 2_000,
            UpgradeType::Restoration => 25_000,
        }
    }
}

/// Build the upgrade flow.
pub fn flow(backend: Arc<dyn GarageBackend>) -> Result<Flow> {
    Flow::builder("upgrade")
        .step(
            StepDefinition::new(SELECT_VEHICLE, "Choose a vehicle").validated_by(|data| {
                required(data, "tokenId", "A vehicle").into_iter().collect()
            }),
        )
        .step(StepDefinition::new(SELECT_UPGRADE, "Upgrade type").validated_by(upgrade_issues))
        .step(
            StepDefinition::new(UPLOAD_PROOF, "Proof of work")
                .validated_by(proof_issues)
                .commit(record(backend)),
        )
        .step(StepDefinition::terminal(SUCCESS, "Upgrade recorded"))
        .build()
}

fn upgrade_issues(data: &FormData) -> Vec<FieldIssue> {
    match data.text("upgradeType") {
        Some(value) if UpgradeType::parse(value).is_some() => Vec::new(),
        Some(value) => vec![FieldIssue::new(
            "upgradeType",
            format!("Unknown upgrade type '{}'", value),
        )],
        None => vec![FieldIssue::new("upgradeType", "Choose an upgrade type")],
    }
}

fn proof_issues(data: &FormData) -> Vec<FieldIssue> {
    let mut issues = Vec::new();
    if data.array("proofDocuments").map_or(true, |docs| docs.is_empty()) {
        issues.push(FieldIssue::new(
            "proofDocuments",
            "Attach at least one receipt or photo",
        ));
    }
    issues.extend(required(data, "description", "A description"));
    issues
}

fn record(backend: Arc<dyn GarageBackend>) -> Arc<dyn CommitAdapter> {
    adapter_fn(move |request: CommitRequest| {
        let backend = backend.clone();
        async move {
            let token_id = field(&request, "tokenId")?;
            let upgrade = field(&request, "upgradeType")
                .ok()
                .and_then(|value| UpgradeType::parse(&value))
                .ok_or_else(|| StepError::validation("upgradeType", "Choose an upgrade type"))?;

            let receipt = backend.record_upgrade(&request, &token_id, upgrade).await?;
            StepPayload::from_serialize(&receipt)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use garage_core::WizardStatus;
    use garage_engine::{EngineConfig, Wizard};
    use serde_json::json;

    use crate::simulated::SimulatedBackend;

    #[tokio::test]
    async fn test_upgrade_flow() {
        let backend = Arc::new(SimulatedBackend::instant());
        let mut wizard = Wizard::new(flow(backend).unwrap(), EngineConfig::default());

        wizard.update_field("tokenId", json!("42"));
        wizard.advance().await;

        wizard.update_field("upgradeType", json!("turbo"));
        wizard.advance().await;
        assert_eq!(wizard.current_step().id, SELECT_UPGRADE);
        assert!(wizard.snapshot().issues[0].message.contains("turbo"));

        wizard.update_field("upgradeType", json!("performance"));
        wizard.advance().await;
        assert_eq!(wizard.current_step().id, UPLOAD_PROOF);

        wizard.update_field("proofDocuments", json!([]));
        wizard.update_field("description", json!("Stage 2 ECU tune and exhaust"));
        wizard.advance().await;
        assert_eq!(wizard.current_step().id, UPLOAD_PROOF);

        wizard.update_field("proofDocuments", json!(["invoice.pdf"]));
        wizard.advance().await;

        assert_eq!(wizard.status(), WizardStatus::Done);
        assert_eq!(wizard.form_data().number("valueIncrease"), Some(15_000.0));
        assert!(wizard.form_data().text("upgradeId").unwrap().starts_with("upg_"));
    }

    #[test]
    fn test_parse_upgrade_type() {
        assert_eq!(UpgradeType::parse("restoration"), Some(UpgradeType::Restoration));
        assert_eq!(UpgradeType::parse("Restoration"), None);
    }
}
