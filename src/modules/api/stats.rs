// src/modules/api/stats.rs

use crate::core::response;
use crate::core::state::AppState;
use crate::modules::docker::stats;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use serde_json::json;

// GET /api/stats
pub async fn get_stats_handler(State(state): State<AppState>) -> Response {
    match stats::collect(state.docker.as_ref()).await {
        Ok(snapshot) => response::success(json!({
            "cpu": snapshot.cpu,
            "memory": snapshot.memory,
            "io": snapshot.io,
        })),
        Err(e) => e.into_response(),
    }
}
