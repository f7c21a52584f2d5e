use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether the chat provider has a credential.
    pub chat_configured: bool,
    /// Whether the image provider has a credential.
    pub image_configured: bool,
    pub chat_model: String,
    pub image_model: String,
}

/// GET /health -- returns service status and provider configuration.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        chat_configured: state.chat.ensure_configured().is_ok(),
        image_configured: state.image.ensure_configured().is_ok(),
        chat_model: state.config.chat.model.clone(),
        image_model: state.config.image.model.clone(),
    })
}

/// Mount health check routes.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
