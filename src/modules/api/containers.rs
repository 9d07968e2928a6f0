// src/modules/api/containers.rs

use crate::core::response;
use crate::core::state::AppState;
use crate::modules::api::ForceQuery;
use crate::modules::docker::dispatch::{self, ActionResult, ContainerAction};
use crate::core::error::ApiError;
use crate::modules::docker::{inventory, logs, stats};
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Default, Deserialize)]
pub struct LogsQuery {
    #[serde(default)]
    tail: Option<String>,
}

impl LogsQuery {
    // Absent or "all" means every line.
    fn tail(&self) -> Result<Option<u32>, ApiError> {
        match self.tail.as_deref().map(str::trim) {
            None | Some("") | Some("all") => Ok(None),
            Some(n) => n
                .parse()
                .map(Some)
                .map_err(|_| ApiError::invalid_input(format!("Invalid tail: {}", n))),
        }
    }
}

// GET /api/containers
pub async fn list_containers_handler(State(state): State<AppState>) -> Response {
    match inventory::containers(state.docker.as_ref()).await {
        Ok(containers) => response::success(json!({
            "total": containers.len(),
            "containers": containers,
        })),
        Err(e) => e.into_response(),
    }
}

// GET /api/containers/{id}
pub async fn get_container_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    match inventory::container(state.docker.as_ref(), &id).await {
        Ok(container) => response::success(json!({ "container": container })),
        Err(e) => e.into_response(),
    }
}

// GET /api/containers/{id}/logs?tail=n
pub async fn get_container_logs_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<LogsQuery>,
) -> Response {
    let tail = match query.tail() {
        Ok(tail) => tail,
        Err(e) => return e.into_response(),
    };
    match logs::fetch(state.docker.as_ref(), &id, tail).await {
        Ok(lines) => response::success(json!({
            "total": lines.len(),
            "logs": lines,
        })),
        Err(e) => e.into_response(),
    }
}

// GET /api/containers/{id}/stats
pub async fn get_container_stats_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    match stats::container(state.docker.as_ref(), &id).await {
        Ok(usage) => response::success(json!({ "stats": usage })),
        Err(e) => e.into_response(),
    }
}

// POST /api/containers/{id}/{action}
pub async fn post_container_action_handler(
    State(state): State<AppState>,
    Path((id, action)): Path<(String, String)>,
) -> ActionResult {
    dispatch::dispatch_container(state.docker.as_ref(), &id, &action).await
}

// DELETE /api/containers/{id}?force=bool
pub async fn delete_container_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ForceQuery>,
) -> ActionResult {
    let action = ContainerAction::Delete {
        force: query.force(),
    };
    dispatch::container_action(state.docker.as_ref(), &id, action).await
}
