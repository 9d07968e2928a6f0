// src/modules/api/root.rs

use crate::core::response;
use crate::core::state::AppState;
use axum::extract::State;
use axum::response::Response;
use serde_json::json;

// GET /api
// Project information plus whether the daemon answers right now.
pub async fn get_root_handler(State(state): State<AppState>) -> Response {
    let daemon = match state.docker.version().await {
        Ok(version) => json!({
            "connected": true,
            "version": version.get("Version").cloned().unwrap_or_default(),
            "apiVersion": version.get("ApiVersion").cloned().unwrap_or_default(),
        }),
        Err(e) => json!({
            "connected": false,
            "degraded": !state.connected,
            "error": e.to_string(),
        }),
    };

    response::success(json!({
        "name": "dockdash",
        "version": env!("CARGO_PKG_VERSION"),
        "daemon": daemon,
    }))
}
