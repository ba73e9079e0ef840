//! Sponsorship minting: pick a stage, customize the offers shown on the
//! vehicle and pay for the slot.

use std::sync::Arc;

use garage_core::{
    adapter_fn, CommitAdapter, CommitRequest, FieldIssue, Flow, FormData, Result, StepDefinition,
    StepError, StepPayload,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::backend::GarageBackend;
use crate::validate::{field, is_wallet_address};

pub const SELECT_STAGE: &str = "select-stage";
pub const CUSTOMIZE_OFFERS: &str = "customize-offers";
pub const PAYMENT: &str = "payment";
pub const SUCCESS: &str = "success";

/// A sponsorship tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SponsorshipStage {
    pub name: String,
    /// Price per slot, in USDC.
    pub mint_price: u64,
    /// Number of slots.
    pub supply: u32,
    pub perks: Vec<String>,
}

fn tier(name: &str, mint_price: u64, supply: u32, perks: &[&str]) -> SponsorshipStage {
    SponsorshipStage {
        name: name.to_string(),
        mint_price,
        supply,
        perks: perks.iter().map(|p| p.to_string()).collect(),
    }
}

/// The stages on sale.
pub fn catalog() -> Vec<SponsorshipStage> {
    vec![
        tier("Stage 1", 500, 100, &["Logo on the garage page"]),
        tier(
            "Stage 2",
            1000,
            50,
            &["Logo on the garage page", "Decal on the vehicle"],
        ),
        tier(
            "Stage 3",
            2500,
            10,
            &[
                "Logo on the garage page",
                "Decal on the vehicle",
                "Featured at track events",
            ],
        ),
    ]
}

/// Look up a stage by name.
pub fn stage(name: &str) -> Option<SponsorshipStage> {
    catalog().into_iter().find(|s| s.name == name)
}

/// The stage named by the `selectedStage` field, as listed in the catalog.
pub fn selected_stage(data: &FormData) -> Option<SponsorshipStage> {
    data.get("selectedStage")
        .and_then(|s| s.get("name"))
        .and_then(Value::as_str)
        .and_then(stage)
}

/// Build the sponsorship minting flow.
pub fn flow(backend: Arc<dyn GarageBackend>) -> Result<Flow> {
    Flow::builder("sponsorship")
        .step(StepDefinition::new(SELECT_STAGE, "Choose a stage").validated_by(|data| {
            match selected_stage(data) {
                Some(_) => Vec::new(),
                None => vec![FieldIssue::new("selectedStage", "Choose a sponsorship stage")],
            }
        }))
        .step(StepDefinition::new(CUSTOMIZE_OFFERS, "Customize offers").validated_by(offer_issues))
        .step(
            StepDefinition::new(PAYMENT, "Payment")
                .validated_by(|data| match data.text("walletAddress") {
                    Some(address) if is_wallet_address(address) => Vec::new(),
                    _ => vec![FieldIssue::new("walletAddress", "Connect a valid wallet")],
                })
                .commit(mint(backend)),
        )
        .step(StepDefinition::terminal(SUCCESS, "Sponsorship minted"))
        .build()
}

fn offer_issues(data: &FormData) -> Vec<FieldIssue> {
    let valid = data.array("offers").is_some_and(|offers| {
        !offers.is_empty()
            && offers
                .iter()
                .all(|o| o.as_str().is_some_and(|s| !s.trim().is_empty()))
    });
    if valid {
        Vec::new()
    } else {
        vec![FieldIssue::new("offers", "Add at least one offer")]
    }
}

fn mint(backend: Arc<dyn GarageBackend>) -> Arc<dyn CommitAdapter> {
    adapter_fn(move |request: CommitRequest| {
        let backend = backend.clone();
        async move {
            let stage = selected_stage(&request.form_data).ok_or_else(|| {
                StepError::validation("selectedStage", "Choose a sponsorship stage")
            })?;
            let wallet = field(&request, "walletAddress")?;
            let receipt = backend.mint_sponsorship(&request, &stage, &wallet).await?;
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

    fn open() -> Wizard {
        let backend = Arc::new(SimulatedBackend::instant());
        Wizard::new(flow(backend).unwrap(), EngineConfig::default())
    }

    fn pick(wizard: &mut Wizard, name: &str) {
        let selected = serde_json::to_value(stage(name).unwrap()).unwrap();
        wizard.update_field("selectedStage", selected);
    }

    #[test]
    fn test_catalog() {
        let prices: Vec<u64> = catalog().iter().map(|s| s.mint_price).collect();
        assert_eq!(prices, vec![500, 1000, 2500]);
        assert!(stage("Stage 4").is_none());
    }

    #[tokio::test]
    async fn test_stage_survives_navigation() {
        let mut wizard = open();
        pick(&mut wizard, "Stage 2");
        assert_eq!(wizard.form_data().get("selectedStage").unwrap()["mintPrice"], 1000);

        wizard.advance().await;
        assert_eq!(wizard.current_step().id, CUSTOMIZE_OFFERS);
        assert_eq!(wizard.form_data().get("selectedStage").unwrap()["mintPrice"], 1000);

        wizard.retreat();
        assert_eq!(wizard.current_step().id, SELECT_STAGE);
        assert_eq!(
            selected_stage(wizard.form_data()).map(|s| s.name),
            Some("Stage 2".to_string())
        );
    }

    #[tokio::test]
    async fn test_unknown_stage_blocks() {
        let mut wizard = open();
        wizard.update_field("selectedStage", json!({ "name": "Stage 9", "mintPrice": 1 }));
        wizard.advance().await;
        assert_eq!(wizard.current_step().id, SELECT_STAGE);
    }

    async fn buy(wizard: &mut Wizard, name: &str) -> String {
        pick(wizard, name);
        wizard.advance().await;
        wizard.update_field("offers", json!(["10% off detailing"]));
        wizard.advance().await;
        wizard.update_field(
            "walletAddress",
            json!("0x52908400098527886E0F7030069857D2E4169EE7"),
        );
        wizard.advance().await;
        assert_eq!(wizard.status(), WizardStatus::Done);
        wizard.form_data().text("tokenId").unwrap().to_string()
    }

    #[tokio::test]
    async fn test_repeat_purchase_after_reset() {
        let backend = Arc::new(SimulatedBackend::instant());
        let mut wizard = Wizard::new(flow(backend.clone()).unwrap(), EngineConfig::default());

        let first = buy(&mut wizard, "Stage 2").await;
        wizard.reset();
        let second = buy(&mut wizard, "Stage 2").await;

        assert_ne!(first, second);
        assert_eq!(backend.submissions().await, 2);
    }

    #[tokio::test]
    async fn test_mint_sponsorship() {
        let mut wizard = open();
        pick(&mut wizard, "Stage 3");
        wizard.advance().await;

        wizard.update_field("offers", json!(["10% off detailing", " "]));
        wizard.advance().await;
        assert_eq!(wizard.current_step().id, CUSTOMIZE_OFFERS);

        wizard.update_field("offers", json!(["10% off detailing"]));
        wizard.advance().await;

        wizard.update_field("walletAddress", json!("0xabc"));
        wizard.advance().await;
        assert_eq!(wizard.current_step().id, PAYMENT);

        wizard.update_field(
            "walletAddress",
            json!("0x52908400098527886E0F7030069857D2E4169EE7"),
        );
        wizard.advance().await;

        assert_eq!(wizard.status(), WizardStatus::Done);
        assert!(wizard.form_data().contains("tokenId"));
    }
}
