//! Wizard session endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use garage_engine::WizardSnapshot;
use garage_flows::FlowKind;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use super::error_response;
use crate::state::AppState;

type ApiResult<T> = Result<T, (StatusCode, String)>;

/// Request to open a wizard.
#[derive(Debug, Deserialize)]
pub struct OpenWizardRequest {
    /// Name of the flow, e.g. `registration`.
    pub flow: String,
}

/// Request to record an answer.
#[derive(Debug, Deserialize)]
pub struct UpdateFieldRequest {
    pub key: String,
    #[serde(default)]
    pub value: Value,
}

/// Open a wizard on the first step of a flow.
pub async fn open_wizard(
    State(state): State<AppState>,
    Json(req): Json<OpenWizardRequest>,
) -> ApiResult<(StatusCode, Json<WizardSnapshot>)> {
    let kind: FlowKind = req.flow.parse().map_err(error_response)?;
    let snapshot = state.open(kind).await.map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(snapshot)))
}

/// Get the current view of a wizard.
pub async fn get_wizard(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<WizardSnapshot>> {
    state.snapshot(id).await.map(Json).map_err(error_response)
}

/// Record an answer.
pub async fn update_field(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateFieldRequest>,
) -> ApiResult<Json<WizardSnapshot>> {
    if req.key.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Field key must not be empty".to_string(),
        ));
    }

    state
        .update_field(id, req.key, req.value)
        .await
        .map(Json)
        .map_err(error_response)
}

/// Advance to the next step, running the current step's commit.
///
/// Refused and failed advances still answer 200; the snapshot carries the
/// status and `last_error`.
pub async fn advance(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<WizardSnapshot>> {
    let (transition, snapshot) = state.advance(id).await.map_err(error_response)?;
    debug!(wizard_id = %id, ?transition, "advance handled");
    Ok(Json(snapshot))
}

/// Move back one step.
pub async fn retreat(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<WizardSnapshot>> {
    state.retreat(id).await.map(Json).map_err(error_response)
}

/// Return to the first step with nothing entered.
pub async fn reset(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<WizardSnapshot>> {
    state.reset(id).await.map(Json).map_err(error_response)
}

/// Close a wizard.
pub async fn close_wizard(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.close(id).await.map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum_test::TestServer;
    use garage_core::WizardStatus;
    use garage_engine::EngineConfig;
    use garage_flows::SimulatedBackend;
    use serde_json::json;

    use super::*;
    use crate::api::router;

    fn server() -> TestServer {
        let backend = Arc::new(SimulatedBackend::instant());
        let state = AppState::new(backend, EngineConfig::default());
        TestServer::new(router(state)).unwrap()
    }

    async fn open(server: &TestServer, flow: &str) -> WizardSnapshot {
        let response = server
            .post("/api/v1/wizards")
            .json(&json!({ "flow": flow }))
            .await;
        assert_eq!(response.status_code(), StatusCode::CREATED);
        response.json::<WizardSnapshot>()
    }

    async fn set(server: &TestServer, id: Uuid, key: &str, value: Value) -> WizardSnapshot {
        server
            .patch(&format!("/api/v1/wizards/{}/fields", id))
            .json(&json!({ "key": key, "value": value }))
            .await
            .json::<WizardSnapshot>()
    }

    async fn post(server: &TestServer, id: Uuid, action: &str) -> WizardSnapshot {
        let response = server
            .post(&format!("/api/v1/wizards/{}/{}", id, action))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
        response.json::<WizardSnapshot>()
    }

    #[tokio::test]
    async fn test_health_and_flows() {
        let server = server();

        let health = server.get("/health").await.json::<Value>();
        assert_eq!(health["status"], "healthy");
        assert_eq!(health["open_sessions"], 0);
        assert_eq!(health["flows"][3], "sponsorship");

        open(&server, "upgrade").await;
        let health = server.get("/health").await.json::<Value>();
        assert_eq!(health["open_sessions"], 1);

        let flows = server.get("/api/v1/flows").await.json::<Value>();
        let names: Vec<&str> = flows
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|f| f["name"].as_str())
            .collect();
        assert_eq!(names, vec!["registration", "upgrade", "collection", "sponsorship"]);
        assert_eq!(flows[0]["steps"][0]["id"], "vin-capture");
    }

    #[tokio::test]
    async fn test_unknown_flow_and_session() {
        let server = server();

        let response = server
            .post("/api/v1/wizards")
            .json(&json!({ "flow": "garage" }))
            .await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

        let response = server
            .get(&format!("/api/v1/wizards/{}", Uuid::new_v4()))
            .await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_sponsorship_over_http() {
        let server = server();
        let id = open(&server, "sponsorship").await.wizard_id;

        let snapshot = post(&server, id, "advance").await;
        assert_eq!(snapshot.step_id, "select-stage");
        assert!(!snapshot.can_advance);
        assert_eq!(snapshot.issues[0].field, "selectedStage");

        set(
            &server,
            id,
            "selectedStage",
            json!({ "name": "Stage 2", "mintPrice": 1000, "supply": 50, "perks": [] }),
        )
        .await;
        let snapshot = post(&server, id, "advance").await;
        assert_eq!(snapshot.step_id, "customize-offers");

        let snapshot = post(&server, id, "retreat").await;
        assert_eq!(snapshot.step_id, "select-stage");
        assert_eq!(snapshot.form_data.get("selectedStage").unwrap()["mintPrice"], 1000);

        post(&server, id, "advance").await;
        set(&server, id, "offers", json!(["Free track day"])).await;
        post(&server, id, "advance").await;
        set(
            &server,
            id,
            "walletAddress",
            json!("0x52908400098527886E0F7030069857D2E4169EE7"),
        )
        .await;

        let snapshot = post(&server, id, "advance").await;
        assert_eq!(snapshot.status, WizardStatus::Done);
        assert_eq!(snapshot.step_id, "success");
        assert!(snapshot.form_data.contains("txHash"));
    }

    #[tokio::test]
    async fn test_conflict_reported_in_snapshot() {
        let server = server();
        let id = open(&server, "collection").await.wizard_id;

        set(&server, id, "collectionName", json!("Midnight Club")).await;
        set(&server, id, "symbol", json!("MID")).await;

        let snapshot = post(&server, id, "advance").await;
        assert_eq!(snapshot.status, WizardStatus::Error);
        assert_eq!(snapshot.step_id, "collection-details");
        let error = snapshot.last_error.unwrap();
        assert_eq!(error.field.as_deref(), Some("collectionName"));

        let snapshot = set(&server, id, "collectionName", json!("Midnight Riders")).await;
        assert!(snapshot.last_error.is_none());
        assert_eq!(snapshot.status, WizardStatus::Idle);
    }

    #[tokio::test]
    async fn test_reset_and_close() {
        let server = server();
        let id = open(&server, "upgrade").await.wizard_id;

        set(&server, id, "tokenId", json!("7")).await;
        post(&server, id, "advance").await;

        let snapshot = post(&server, id, "reset").await;
        assert_eq!(snapshot.current_step_index, 0);
        assert!(snapshot.form_data.is_empty());

        let response = server
            .patch(&format!("/api/v1/wizards/{}/fields", id))
            .json(&json!({ "key": " ", "value": 1 }))
            .await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

        let response = server.delete(&format!("/api/v1/wizards/{}", id)).await;
        assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

        let response = server.get(&format!("/api/v1/wizards/{}", id)).await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    }
}
