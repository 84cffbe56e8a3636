use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Restorations scheduled or running.
    pub pending_restorations: usize,
    /// Restorations allowed to run at once.
    pub max_concurrent_restores: usize,
}

/// GET /health -- returns service health.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        pending_restorations: state.restorations.pending(),
        max_concurrent_restores: state.config.max_concurrent_restores,
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
