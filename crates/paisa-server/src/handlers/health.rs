//! Health handler

use std::sync::Arc;

use axum::{extract::State, Json};

use paisa_core::HealthStatus;

use crate::AppState;

/// GET /ai/health - Loaded models and adapter availability
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthStatus> {
    Json(state.selector.health())
}
