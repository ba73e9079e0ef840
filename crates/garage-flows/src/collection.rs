//! Sponsorship collection creation: name the collection, configure its
//! stages and deploy it.

use std::sync::Arc;

use garage_core::{
    adapter_fn, CommitAdapter, CommitRequest, FieldIssue, Flow, FormData, Result, StepDefinition,
    StepPayload,
};
use serde_json::Value;

use crate::backend::GarageBackend;
use crate::validate::{checked, field};

pub const COLLECTION_DETAILS: &str = "collection-details";
pub const CONFIGURE_STAGES: &str = "configure-stages";
pub const REVIEW: &str = "review";
pub const SUCCESS: &str = "success";

/// Build the collection creation flow.
pub fn flow(backend: Arc<dyn GarageBackend>) -> Result<Flow> {
    Flow::builder("collection")
        .step(
            StepDefinition::new(COLLECTION_DETAILS, "Collection details")
                .validated_by(details_issues)
                .check(name_available(backend.clone())),
        )
        .step(StepDefinition::new(CONFIGURE_STAGES, "Sponsorship stages").validated_by(stage_issues))
        .step(
            StepDefinition::new(REVIEW, "Review and deploy")
                .validated_by(|data| {
                    checked(data, "confirmed", "Confirm the collection details")
                        .into_iter()
                        .collect()
                })
                .commit(deploy(backend)),
        )
        .step(StepDefinition::terminal(SUCCESS, "Collection created"))
        .build()
}

fn details_issues(data: &FormData) -> Vec<FieldIssue> {
    let mut issues = Vec::new();

    match data.text("collectionName") {
        Some(name) if (3..=32).contains(&name.chars().count()) => {}
        Some(_) => issues.push(FieldIssue::new(
            "collectionName",
            "Name must be between 3 and 32 characters",
        )),
        None => issues.push(FieldIssue::new("collectionName", "Name is required")),
    }

    let symbol_ok = data.text("symbol").is_some_and(|symbol| {
        (2..=8).contains(&symbol.len()) && symbol.chars().all(|c| c.is_ascii_uppercase())
    });
    if !symbol_ok {
        issues.push(FieldIssue::new(
            "symbol",
            "Symbol must be 2 to 8 capital letters",
        ));
    }

    issues
}

fn stage_issues(data: &FormData) -> Vec<FieldIssue> {
    let Some(stages) = data.array("stages").filter(|s| !s.is_empty()) else {
        return vec![FieldIssue::new("stages", "Add at least one stage")];
    };

    let positive = |stage: &Value, key: &str| {
        stage.get(key).and_then(Value::as_f64).is_some_and(|n| n > 0.0)
    };
    stages
        .iter()
        .enumerate()
        .filter(|(_, stage)| !positive(stage, "mintPrice") || !positive(stage, "supply"))
        .map(|(i, _)| {
            FieldIssue::new(
                "stages",
                format!("Stage {} needs a positive mint price and supply", i + 1),
            )
        })
        .collect()
}

fn name_available(backend: Arc<dyn GarageBackend>) -> Arc<dyn CommitAdapter> {
    adapter_fn(move |request: CommitRequest| {
        let backend = backend.clone();
        async move {
            let name = field(&request, "collectionName")?;
            backend.check_collection_name(&name).await?;
            Ok(StepPayload::new())
        }
    })
}

fn deploy(backend: Arc<dyn GarageBackend>) -> Arc<dyn CommitAdapter> {
    adapter_fn(move |request: CommitRequest| {
        let backend = backend.clone();
        async move {
            let name = field(&request, "collectionName")?;
            let symbol = field(&request, "symbol")?;
            let receipt = backend.create_collection(&request, &name, &symbol).await?;
            StepPayload::from_serialize(&receipt)
        }
    })
}
