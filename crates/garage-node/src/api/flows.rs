//! Flow catalog endpoint.

use axum::{extract::State, http::StatusCode, Json};
use garage_flows::FlowKind;
use serde::Serialize;

use super::error_response;
use crate::state::AppState;

/// A flow and its steps, in order.
#[derive(Debug, Serialize)]
pub struct FlowResponse {
    pub name: String,
    pub steps: Vec<StepResponse>,
}

#[derive(Debug, Serialize)]
pub struct StepResponse {
    pub id: String,
    pub title: String,
    pub terminal: bool,
}

/// List the flows a wizard can be opened on.
pub async fn list_flows(
    State(state): State<AppState>,
) -> Result<Json<Vec<FlowResponse>>, (StatusCode, String)> {
    let mut flows = Vec::with_capacity(FlowKind::ALL.len());

    for kind in FlowKind::ALL {
        let flow = kind.build(state.backend.clone()).map_err(error_response)?;
        flows.push(FlowResponse {
            name: flow.name().to_string(),
            steps: flow
                .steps()
                .iter()
                .map(|step| StepResponse {
                    id: step.id.clone(),
                    title: step.title.clone(),
                    terminal: step.is_terminal(),
                })
                .collect(),
        });
    }

    Ok(Json(flows))
}
