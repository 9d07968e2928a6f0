// src/modules/docker/dispatch.rs

//! Routes a resource id plus verb to exactly one mutating daemon call.
//!
//! Nothing here checks the current state before acting; the daemon is the
//! only judge of whether a transition is valid.

use crate::common::log;
use crate::core::error::{ApiError, Result};
use crate::core::response;
use crate::modules::docker::client::{DaemonClient, LifecycleOp};
use crate::modules::docker::normalize::{self, VolumeView};
use crate::modules::docker::raw::VolumeCreateOptions;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_VOLUME_DRIVER: &str = "local";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerAction {
    Lifecycle(LifecycleOp),
    Delete { force: bool },
}

impl FromStr for ContainerAction {
    type Err = ApiError;

    fn from_str(verb: &str) -> Result<Self> {
        let op = match verb {
            "start" => LifecycleOp::Start,
            "stop" => LifecycleOp::Stop,
            "pause" => LifecycleOp::Pause,
            "unpause" => LifecycleOp::Unpause,
            "restart" => LifecycleOp::Restart,
            "delete" | "remove" => return Ok(ContainerAction::Delete { force: false }),
            other => {
                return Err(ApiError::invalid_input(format!("Invalid action: {}", other)));
            }
        };
        Ok(ContainerAction::Lifecycle(op))
    }
}

impl fmt::Display for ContainerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerAction::Lifecycle(op) => write!(f, "{}", op),
            ContainerAction::Delete { force: true } => f.write_str("delete (force)"),
            ContainerAction::Delete { force: false } => f.write_str("delete"),
        }
    }
}

/// Uniform outcome of every mutating operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(rename = "inUse", skip_serializing_if = "Option::is_none")]
    pub in_use: Option<bool>,
    #[serde(skip)]
    status: u16,
}

impl ActionResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            error: None,
            in_use: None,
            status: 200,
        }
    }

    pub fn failed(err: &ApiError) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(err.to_string()),
            in_use: err.is_in_use().then_some(true),
            status: err.status_code().as_u16(),
        }
    }

    pub fn is_in_use(&self) -> bool {
        self.in_use == Some(true)
    }
}

impl From<Result<String>> for ActionResult {
    fn from(outcome: Result<String>) -> Self {
        match outcome {
            Ok(message) => ActionResult::ok(message),
            Err(err) => ActionResult::failed(&err),
        }
    }
}

impl IntoResponse for ActionResult {
    fn into_response(self) -> Response {
        if self.success {
            return response::message(self.message.unwrap_or_default());
        }
        let in_use = self.is_in_use();
        let status = axum::http::StatusCode::from_u16(self.status)
            .unwrap_or(axum::http::StatusCode::INTERNAL_SERVER_ERROR);
        response::failure(status, self.error.unwrap_or_default(), in_use)
    }
}

fn past_tense(op: LifecycleOp) -> &'static str {
    match op {
        LifecycleOp::Start => "started",
        LifecycleOp::Stop => "stopped",
        LifecycleOp::Pause => "paused",
        LifecycleOp::Unpause => "unpaused",
        LifecycleOp::Restart => "restarted",
    }
}

fn report(subject: &str, outcome: &Result<String>) {
    if let Err(err) = outcome {
        log::warn(&format!("✗ {}: {}", subject, err));
    }
}

pub async fn container_action(
    client: &dyn DaemonClient,
    id: &str,
    action: ContainerAction,
) -> ActionResult {
    let outcome = match action {
        ContainerAction::Lifecycle(op) => client
            .container_lifecycle(id, op)
            .await
            .map(|_| format!("Container {}", past_tense(op))),
        ContainerAction::Delete { force } => client
            .remove_container(id, force)
            .await
            .map(|_| "Container deleted".to_string()),
    };
    report(&format!("container {} {}", id, action), &outcome);
    outcome.into()
}

/// Parses the verb first; an unknown verb never reaches the daemon.
pub async fn dispatch_container(client: &dyn DaemonClient, id: &str, verb: &str) -> ActionResult {
    match verb.parse::<ContainerAction>() {
        Ok(action) => container_action(client, id, action).await,
        Err(err) => ActionResult::failed(&err),
    }
}

/// `repo[:tag]` → (repository, tag). Digest references carry no tag.
pub fn pull_target(reference: &str) -> Result<(String, Option<String>)> {
    let reference = reference.trim();
    if reference.is_empty() {
        return Err(ApiError::invalid_input("Image name is required"));
    }
    if reference.contains('@') {
        return Ok((reference.to_string(), None));
    }
    let (repository, tag) = normalize::split_reference(reference);
    Ok((repository, Some(tag)))
}

pub async fn pull_image(client: &dyn DaemonClient, reference: &str) -> ActionResult {
    let (repository, tag) = match pull_target(reference) {
        Ok(target) => target,
        Err(err) => return ActionResult::failed(&err),
    };
    let display = match &tag {
        Some(tag) => format!("{}:{}", repository, tag),
        None => repository.clone(),
    };
    log::info(&format!("➜ Pulling image {}", display));
    let outcome = client
        .pull_image(&repository, tag.as_deref())
        .await
        .map(|_| format!("Image pulled: {}", display));
    report(&format!("pull {}", display), &outcome);
    outcome.into()
}

/// An in-use rejection comes back with `inUse: true`; the caller decides
/// whether to retry with force.
pub async fn remove_image(client: &dyn DaemonClient, id: &str, force: bool) -> ActionResult {
    let outcome = client
        .remove_image(id, force)
        .await
        .map(|_| "Image deleted".to_string());
    report(&format!("image {} delete", id), &outcome);
    outcome.into()
}

#[derive(Debug, Clone, Default)]
pub struct VolumeSpec {
    pub name: String,
    pub driver: Option<String>,
    pub labels: HashMap<String, String>,
}

pub async fn create_volume(client: &dyn DaemonClient, spec: VolumeSpec) -> Result<VolumeView> {
    let name = spec.name.trim();
    if name.is_empty() {
        return Err(ApiError::invalid_input("Volume name is required"));
    }
    let driver = spec
        .driver
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or(DEFAULT_VOLUME_DRIVER)
        .to_string();

    let created = client
        .create_volume(VolumeCreateOptions {
            name: name.to_string(),
            driver,
            labels: spec.labels,
        })
        .await
        .inspect_err(|err| log::warn(&format!("✗ volume {} create: {}", name, err)))?;
    Ok(normalize::volume_view(&created))
}

pub async fn remove_volume(client: &dyn DaemonClient, name: &str, force: bool) -> ActionResult {
    let outcome = client
        .remove_volume(name, force)
        .await
        .map(|_| "Volume deleted".to_string());
    report(&format!("volume {} delete", name), &outcome);
    outcome.into()
}
