// src/modules/api/volumes.rs

use crate::core::error::ApiError;
use crate::core::response;
use crate::core::state::AppState;
use crate::modules::api::ForceQuery;
use crate::modules::docker::dispatch::{self, ActionResult, VolumeSpec};
use crate::modules::docker::inventory;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;

#[derive(Debug, Default, Deserialize)]
pub struct CreateVolumeRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub driver: Option<String>,
    #[serde(default)]
    pub labels: Option<HashMap<String, String>>,
}

// GET /api/volumes
pub async fn list_volumes_handler(State(state): State<AppState>) -> Response {
    match inventory::volumes(state.docker.as_ref()).await {
        Ok(volumes) => response::success(json!({
            "total": volumes.len(),
            "volumes": volumes,
        })),
        Err(e) => e.into_response(),
    }
}

// POST /api/volumes
pub async fn post_create_volume_handler(
    State(state): State<AppState>,
    body: Result<Json<CreateVolumeRequest>, JsonRejection>,
) -> Response {
    let Ok(Json(req)) = body else {
        return ApiError::invalid_input("Volume name is required").into_response();
    };
    let spec = VolumeSpec {
        name: req.name.unwrap_or_default(),
        driver: req.driver,
        labels: req.labels.unwrap_or_default(),
    };
    match dispatch::create_volume(state.docker.as_ref(), spec).await {
        Ok(volume) => response::success(json!({
            "message": "Volume created",
            "volume": volume,
        })),
        Err(e) => e.into_response(),
    }
}

// DELETE /api/volumes/{name}?force=bool
pub async fn delete_volume_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<ForceQuery>,
) -> ActionResult {
    dispatch::remove_volume(state.docker.as_ref(), &name, query.force()).await
}
