//! Health check endpoint.

use axum::{extract::State, Json};
use garage_flows::FlowKind;
use serde::Serialize;

use crate::state::AppState;

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Wizards currently open on this node.
    pub open_sessions: usize,
    /// Flows a wizard can be opened on.
    pub flows: Vec<&'static str>,
}

/// Health check endpoint.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        open_sessions: state.session_count().await,
        flows: FlowKind::ALL.iter().map(FlowKind::as_str).collect(),
    })
}
