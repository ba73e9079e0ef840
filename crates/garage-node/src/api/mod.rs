//! HTTP API handlers.

pub mod flows;
pub mod health;
pub mod wizard;

use axum::{
    http::StatusCode,
    routing::{get, patch, post},
    Router,
};
use garage_core::WizardError;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Create the API router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/v1/flows", get(flows::list_flows))
        .route("/api/v1/wizards", post(wizard::open_wizard))
        .route(
            "/api/v1/wizards/:id",
            get(wizard::get_wizard).delete(wizard::close_wizard),
        )
        .route("/api/v1/wizards/:id/fields", patch(wizard::update_field))
        .route("/api/v1/wizards/:id/advance", post(wizard::advance))
        .route("/api/v1/wizards/:id/retreat", post(wizard::retreat))
        .route("/api/v1/wizards/:id/reset", post(wizard::reset))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Map a wizard error to an HTTP error response.
pub(crate) fn error_response(err: WizardError) -> (StatusCode, String) {
    let status = match &err {
        WizardError::UnknownFlow(_) => StatusCode::BAD_REQUEST,
        WizardError::SessionNotFound(_) => StatusCode::NOT_FOUND,
        WizardError::InvalidFlow { .. } | WizardError::SerializationError(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, err.to_string())
}
