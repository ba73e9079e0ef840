//! Vehicle registration: photograph the VIN, review the decoded specs,
//! declare ownership and mint the vehicle NFT.

use std::sync::Arc;

use garage_core::{
    adapter_fn, CommitAdapter, CommitRequest, FieldIssue, Flow, FormData, Result, StepDefinition,
    StepPayload,
};

use crate::backend::GarageBackend;
use crate::validate::{checked, field, required, vin_issues};

pub const VIN_CAPTURE: &str = "vin-capture";
pub const SPECS_REVIEW: &str = "specs-review";
pub const OWNERSHIP: &str = "ownership";
pub const MINT: &str = "mint";
pub const SUCCESS: &str = "success";

/// Build the registration flow.
pub fn flow(backend: Arc<dyn GarageBackend>) -> Result<Flow> {
    Flow::builder("registration")
        .step(
            StepDefinition::new(VIN_CAPTURE, "Scan your VIN")
                .validated_by(|data| {
                    required(data, "vinImage", "A photo of the VIN plate")
                        .into_iter()
                        .collect()
                })
                .commit(decode_vin(backend.clone())),
        )
        .step(
            StepDefinition::new(SPECS_REVIEW, "Review factory specs")
                .validated_by(vin_issues)
                .check(verify_unregistered(backend.clone())),
        )
        .step(StepDefinition::new(OWNERSHIP, "Ownership details").validated_by(ownership_issues))
        .step(
            StepDefinition::new(MINT, "Mint your vehicle")
                .validated_by(|data| {
                    checked(data, "agreeToTerms", "You must accept the terms to mint")
                        .into_iter()
                        .collect()
                })
                .commit(mint(backend)),
        )
        .step(StepDefinition::terminal(SUCCESS, "Vehicle registered"))
        .build()
}

fn ownership_issues(data: &FormData) -> Vec<FieldIssue> {
    let mut issues: Vec<FieldIssue> = required(data, "ownerName", "Owner name").into_iter().collect();

    match data.number("mileage") {
        Some(miles) if miles >= 0.0 => {}
        Some(_) => issues.push(FieldIssue::new("mileage", "Mileage cannot be negative")),
        None => issues.push(FieldIssue::new("mileage", "Mileage is required")),
    }

    issues
}

fn decode_vin(backend: Arc<dyn GarageBackend>) -> Arc<dyn CommitAdapter> {
    adapter_fn(move |request: CommitRequest| {
        let backend = backend.clone();
        async move {
            let image = field(&request, "vinImage")?;
            let decoded = backend.decode_vin(&request, &image).await?;
            StepPayload::from_serialize(&decoded)
        }
    })
}

fn verify_unregistered(backend: Arc<dyn GarageBackend>) -> Arc<dyn CommitAdapter> {
    adapter_fn(move |request: CommitRequest| {
        let backend = backend.clone();
        async move {
            let vin = field(&request, "vin")?;
            backend.check_vehicle_unregistered(&vin).await?;
            Ok(StepPayload::new())
        }
    })
}

fn mint(backend: Arc<dyn GarageBackend>) -> Arc<dyn CommitAdapter> {
    adapter_fn(move |request: CommitRequest| {
        let backend = backend.clone();
        async move {
            let vin = field(&request, "vin")?;
            let owner = field(&request, "ownerName")?;
            let receipt = backend.mint_vehicle(&request, &vin, &owner).await?;
            StepPayload::from_serialize(&receipt)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use garage_core::{ErrorKind, WizardStatus};
    use garage_engine::{EngineConfig, IgnoreReason, Transition, Wizard};
    use serde_json::json;

    use crate::simulated::{SimulatedBackend, SAMPLE_VIN};

    fn open(backend: Arc<SimulatedBackend>) -> Wizard {
        Wizard::new(flow(backend).unwrap(), EngineConfig::default())
    }

    #[tokio::test]
    async fn test_vin_capture_requires_image() {
        let mut wizard = open(Arc::new(SimulatedBackend::instant()));

        wizard.advance().await;
        assert_eq!(wizard.current_step().id, VIN_CAPTURE);

        wizard.update_field("vinImage", json!("data:image/jpeg;base64,/9j/4AAQ"));
        wizard.advance().await;

        assert_eq!(wizard.current_step().id, SPECS_REVIEW);
        assert_eq!(wizard.form_data().str("vin"), Some(SAMPLE_VIN));
        assert_eq!(
            wizard.form_data().get("factorySpecs").unwrap()["make"],
            "Porsche"
        );
    }

    #[tokio::test]
    async fn test_short_vin_blocks_review() {
        let mut wizard = open(Arc::new(SimulatedBackend::instant()));
        wizard.update_field("vinImage", json!("photo"));
        wizard.advance().await;

        wizard.update_field("vin", json!("WP0AF2A95RS12345"));
        wizard.advance().await;

        assert_eq!(wizard.state().current_step_index, 1);
        let issues = wizard.snapshot().issues;
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("17 characters"));
    }

    #[tokio::test]
    async fn test_full_registration() {
        let backend = Arc::new(SimulatedBackend::instant());
        let mut wizard = open(backend.clone());

        wizard.update_field("vinImage", json!("photo"));
        wizard.advance().await;
        wizard.advance().await;
        assert_eq!(wizard.current_step().id, OWNERSHIP);

        wizard.update_field("ownerName", json!("Dana Whitfield"));
        wizard.update_field("mileage", json!("-4"));
        wizard.advance().await;
        assert_eq!(wizard.current_step().id, OWNERSHIP);

        wizard.update_field("mileage", json!(12500));
        wizard.advance().await;
        wizard.update_field("agreeToTerms", json!(true));
        wizard.advance().await;

        assert_eq!(wizard.current_step().id, SUCCESS);
        assert_eq!(wizard.status(), WizardStatus::Done);
        assert!(wizard.form_data().contains("tokenId"));
        assert!(wizard.form_data().text("txHash").unwrap().starts_with("0x"));
        assert!(backend.is_registered(SAMPLE_VIN).await);

        assert_eq!(wizard.retreat(), Transition::Ignored(IgnoreReason::Finished));
        wizard.advance().await;
        assert_eq!(wizard.current_step().id, SUCCESS);
        assert_eq!(backend.submissions().await, 1);
    }

    #[tokio::test]
    async fn test_registered_vin_conflicts_until_edited() {
        let backend = Arc::new(SimulatedBackend::instant());
        backend.register_vin(SAMPLE_VIN).await;
        let mut wizard = open(backend);

        wizard.update_field("vinImage", json!("photo"));
        wizard.advance().await;

        let transition = wizard.advance().await;
        assert!(matches!(transition, Transition::Failed(ref e) if e.kind == ErrorKind::Conflict));
        assert_eq!(wizard.current_step().id, SPECS_REVIEW);

        wizard.update_field("vin", json!("1HGCM82633A004352"));
        assert!(wizard.state().last_error.is_none());

        wizard.advance().await;
        assert_eq!(wizard.current_step().id, OWNERSHIP);
    }

    #[tokio::test]
    async fn test_mint_failure_surfaces_and_retries() {
        let backend = Arc::new(SimulatedBackend::instant());
        let mut wizard = open(backend.clone());

        wizard.update_field("vinImage", json!("photo"));
        wizard.advance().await;
        wizard.advance().await;
        wizard.update_field("ownerName", json!("Dana Whitfield"));
        wizard.update_field("mileage", json!(8000));
        wizard.advance().await;
        wizard.update_field("agreeToTerms", json!(true));

        backend.fail_next(1);
        let transition = wizard.advance().await;
        assert!(matches!(transition, Transition::Failed(ref e) if e.kind == ErrorKind::Commit));
        assert_eq!(wizard.current_step().id, MINT);
        assert!(!wizard.form_data().contains("tokenId"));

        wizard.advance().await;
        assert_eq!(wizard.current_step().id, SUCCESS);
    }
}
