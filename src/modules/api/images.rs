// src/modules/api/images.rs

use crate::core::response;
use crate::core::state::AppState;
use crate::modules::api::ForceQuery;
use crate::modules::docker::dispatch::{self, ActionResult};
use crate::modules::docker::inventory;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Default, Deserialize)]
pub struct PullRequest {
    #[serde(default)]
    pub image: Option<String>,
}

// GET /api/images
pub async fn list_images_handler(State(state): State<AppState>) -> Response {
    match inventory::images(state.docker.as_ref()).await {
        Ok(images) => response::success(json!({
            "total": images.len(),
            "images": images,
        })),
        Err(e) => e.into_response(),
    }
}

// POST /api/images/pull
// A missing or malformed body is treated like a missing image name.
pub async fn post_pull_image_handler(
    State(state): State<AppState>,
    body: Result<Json<PullRequest>, JsonRejection>,
) -> ActionResult {
    let reference = body
        .ok()
        .and_then(|Json(req)| req.image)
        .unwrap_or_default();
    dispatch::pull_image(state.docker.as_ref(), &reference).await
}

// DELETE /api/images/{*id}?force=bool
pub async fn delete_image_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ForceQuery>,
) -> ActionResult {
    dispatch::remove_image(state.docker.as_ref(), &id, query.force()).await
}
