// src/modules/docker/client.rs

use crate::common::log;
use crate::core::error::{ApiError, Result};
use crate::modules::docker::raw::{
    ContainerInspect, ContainerStats, ContainerSummary, ImageSummary, PullProgress, Volume,
    VolumeCreateOptions, VolumeList,
};
use crate::modules::docker::unix::{self, UnixTransport, endpoint};
use async_trait::async_trait;
use http_body_util::BodyExt;
use hyper::Method;
use hyper::body::Bytes;
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Lifecycle verbs that map onto `POST /containers/{id}/{verb}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleOp {
    Start,
    Stop,
    Pause,
    Unpause,
    Restart,
}

impl LifecycleOp {
    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleOp::Start => "start",
            LifecycleOp::Stop => "stop",
            LifecycleOp::Pause => "pause",
            LifecycleOp::Unpause => "unpause",
            LifecycleOp::Restart => "restart",
        }
    }
}

impl fmt::Display for LifecycleOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Call surface over the daemon's control API.
///
/// Every method can fail with [`ApiError::DaemonUnavailable`] when the socket
/// cannot be reached, or with a classified rejection when the daemon refuses
/// the call. Implementations hold no per-request state.
#[async_trait]
pub trait DaemonClient: Send + Sync {
    async fn ping(&self) -> Result<()>;
    async fn version(&self) -> Result<Value>;

    async fn list_containers(&self, all: bool) -> Result<Vec<ContainerSummary>>;
    async fn inspect_container(&self, id: &str) -> Result<ContainerInspect>;
    async fn container_lifecycle(&self, id: &str, op: LifecycleOp) -> Result<()>;
    async fn remove_container(&self, id: &str, force: bool) -> Result<()>;
    async fn container_stats(&self, id: &str) -> Result<ContainerStats>;
    /// Raw log body with stdout, stderr and timestamps; `None` means every line.
    async fn container_logs(&self, id: &str, tail: Option<u32>) -> Result<Bytes>;

    async fn list_images(&self) -> Result<Vec<ImageSummary>>;
    async fn pull_image(&self, repository: &str, tag: Option<&str>) -> Result<()>;
    async fn remove_image(&self, id: &str, force: bool) -> Result<()>;

    async fn list_volumes(&self) -> Result<Vec<Volume>>;
    async fn create_volume(&self, options: VolumeCreateOptions) -> Result<Volume>;
    async fn remove_volume(&self, name: &str, force: bool) -> Result<()>;
}

pub type SharedClient = Arc<dyn DaemonClient>;

/// The production client, talking to the daemon over its unix socket.
#[derive(Debug, Clone)]
pub struct SocketClient {
    transport: UnixTransport,
}

impl SocketClient {
    pub fn new(socket_path: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            transport: UnixTransport::new(socket_path, timeout),
        }
    }

    pub fn socket_path(&self) -> &std::path::Path {
        self.transport.socket_path()
    }

    async fn post(&self, path: &str) -> Result<()> {
        self.transport.call(Method::POST, path, None).await.map(|_| ())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.transport.call(Method::DELETE, path, None).await.map(|_| ())
    }
}

fn flag(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

// Image references keep their slashes as path separators.
fn image_path<'a>(prefix: &'a str, reference: &'a str) -> Vec<&'a str> {
    std::iter::once(prefix)
        .chain(reference.split('/'))
        .collect()
}

#[async_trait]
impl DaemonClient for SocketClient {
    async fn ping(&self) -> Result<()> {
        let body = self.transport.call(Method::GET, "/_ping", None).await?;
        if String::from_utf8_lossy(&body).trim() == "OK" {
            Ok(())
        } else {
            Err(ApiError::InvalidResponse(
                "unexpected answer to ping".to_string(),
            ))
        }
    }

    async fn version(&self) -> Result<Value> {
        self.transport.get_json("/version").await
    }

    async fn list_containers(&self, all: bool) -> Result<Vec<ContainerSummary>> {
        let path = endpoint(&["containers", "json"], &[("all", flag(all))]);
        self.transport.get_json(&path).await
    }

    async fn inspect_container(&self, id: &str) -> Result<ContainerInspect> {
        let path = endpoint(&["containers", id, "json"], &[]);
        self.transport.get_json(&path).await
    }

    async fn container_lifecycle(&self, id: &str, op: LifecycleOp) -> Result<()> {
        let path = endpoint(&["containers", id, op.as_str()], &[]);
        self.post(&path).await
    }

    async fn remove_container(&self, id: &str, force: bool) -> Result<()> {
        let path = endpoint(&["containers", id], &[("force", flag(force))]);
        self.delete(&path).await
    }

    async fn container_stats(&self, id: &str) -> Result<ContainerStats> {
        let path = endpoint(&["containers", id, "stats"], &[("stream", "false")]);
        self.transport.get_json(&path).await
    }

    async fn container_logs(&self, id: &str, tail: Option<u32>) -> Result<Bytes> {
        let tail = tail.map_or_else(|| "all".to_string(), |n| n.to_string());
        let path = endpoint(
            &["containers", id, "logs"],
            &[
                ("stdout", "true"),
                ("stderr", "true"),
                ("timestamps", "true"),
                ("tail", &tail),
            ],
        );
        self.transport.call(Method::GET, &path, None).await
    }

    async fn list_images(&self) -> Result<Vec<ImageSummary>> {
        self.transport.get_json("/images/json").await
    }

    // The daemon answers 200 immediately and streams progress lines; failures
    // arrive in-stream as `{"error": ...}`. Dropping this future closes the
    // connection, which makes the daemon abandon the pull.
    async fn pull_image(&self, repository: &str, tag: Option<&str>) -> Result<()> {
        let mut query = vec![("fromImage", repository)];
        if let Some(tag) = tag {
            query.push(("tag", tag));
        }
        let path = endpoint(&["images", "create"], &query);

        let res = self.transport.send_request(Method::POST, &path, None).await?;
        let status = res.status();
        let mut body = res.into_body();

        if !status.is_success() {
            let bytes = body
                .collect()
                .await
                .map_err(|e| ApiError::DaemonUnavailable(e.to_string()))?
                .to_bytes();
            return Err(unix::rejection(status, &bytes));
        }

        let mut pending: Vec<u8> = Vec::new();
        while let Some(frame) = body.frame().await {
            let frame = frame.map_err(|e| ApiError::DaemonUnavailable(e.to_string()))?;
            if let Some(chunk) = frame.data_ref() {
                pending.extend_from_slice(chunk);
                while let Some(pos) = pending.iter().position(|b| *b == b'\n') {
                    let line: Vec<u8> = pending.drain(..=pos).collect();
                    pull_progress(repository, &line)?;
                }
            }
        }
        pull_progress(repository, &pending)
    }

    async fn remove_image(&self, id: &str, force: bool) -> Result<()> {
        let segments = image_path("images", id);
        let path = endpoint(&segments, &[("force", flag(force))]);
        self.delete(&path).await
    }

    async fn list_volumes(&self) -> Result<Vec<Volume>> {
        let list: VolumeList = self.transport.get_json("/volumes").await?;
        Ok(list.volumes.unwrap_or_default())
    }

    async fn create_volume(&self, options: VolumeCreateOptions) -> Result<Volume> {
        let body = Bytes::from(serde_json::to_vec(&options)?);
        let bytes = self
            .transport
            .call(Method::POST, "/volumes/create", Some(body))
            .await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn remove_volume(&self, name: &str, force: bool) -> Result<()> {
        let path = endpoint(&["volumes", name], &[("force", flag(force))]);
        self.delete(&path).await
    }
}

// Logs one progress line; an in-stream error ends the pull.
fn pull_progress(repository: &str, line: &[u8]) -> Result<()> {
    let text = String::from_utf8_lossy(line);
    let text = text.trim();
    if text.is_empty() {
        return Ok(());
    }
    let Ok(progress) = serde_json::from_str::<PullProgress>(text) else {
        return Ok(());
    };
    if let Some(error) = progress.error {
        return Err(ApiError::DaemonError {
            status: 500,
            message: error,
        });
    }
    if log::enabled(log::LogLevel::Debug) {
        if let Some(status) = progress.status {
            match progress.id {
                Some(id) => log::debug(&format!("▪ pull {} {}: {}", repository, id, status)),
                None => log::debug(&format!("▪ pull {}: {}", repository, status)),
            }
        }
    }
    Ok(())
}

/// Stand-in used when the daemon client could not be initialized at startup.
/// Every call reports the not-connected state instead of touching a socket.
#[derive(Debug, Clone)]
pub struct DisconnectedClient {
    reason: String,
}

impl DisconnectedClient {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn fail<T>(&self) -> Result<T> {
        Err(ApiError::NotConnected(self.reason.clone()))
    }
}

#[async_trait]
impl DaemonClient for DisconnectedClient {
    async fn ping(&self) -> Result<()> {
        self.fail()
    }

    async fn version(&self) -> Result<Value> {
        self.fail()
    }

    async fn list_containers(&self, _all: bool) -> Result<Vec<ContainerSummary>> {
        self.fail()
    }

    async fn inspect_container(&self, _id: &str) -> Result<ContainerInspect> {
        self.fail()
    }

    async fn container_lifecycle(&self, _id: &str, _op: LifecycleOp) -> Result<()> {
        self.fail()
    }

    async fn remove_container(&self, _id: &str, _force: bool) -> Result<()> {
        self.fail()
    }

    async fn container_stats(&self, _id: &str) -> Result<ContainerStats> {
        self.fail()
    }

    async fn container_logs(&self, _id: &str, _tail: Option<u32>) -> Result<Bytes> {
        self.fail()
    }

    async fn list_images(&self) -> Result<Vec<ImageSummary>> {
        self.fail()
    }

    async fn pull_image(&self, _repository: &str, _tag: Option<&str>) -> Result<()> {
        self.fail()
    }

    async fn remove_image(&self, _id: &str, _force: bool) -> Result<()> {
        self.fail()
    }

    async fn list_volumes(&self) -> Result<Vec<Volume>> {
        self.fail()
    }

    async fn create_volume(&self, _options: VolumeCreateOptions) -> Result<Volume> {
        self.fail()
    }

    async fn remove_volume(&self, _name: &str, _force: bool) -> Result<()> {
        self.fail()
    }
}
