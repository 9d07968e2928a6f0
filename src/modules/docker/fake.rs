// src/modules/docker/fake.rs

// In-memory DaemonClient for tests: records every call and answers from
// canned fixtures.

use crate::core::error::{ApiError, Result};
use crate::modules::docker::client::{DaemonClient, LifecycleOp};
use crate::modules::docker::raw::{
    ContainerInspect, ContainerStats, ContainerSummary, ImageSummary, Volume,
    VolumeCreateOptions,
};
use async_trait::async_trait;
use axum::http::StatusCode;
use hyper::body::Bytes;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListContainers(bool),
    Inspect(String),
    Lifecycle(String, LifecycleOp),
    RemoveContainer(String, bool),
    Stats(String),
    Logs(String, Option<u32>),
    ListImages,
    Pull(String, Option<String>),
    RemoveImage(String, bool),
    ListVolumes,
    CreateVolume(String, String),
    RemoveVolume(String, bool),
}

#[derive(Default)]
pub struct FakeClient {
    calls: Mutex<Vec<Call>>,
    containers: Vec<ContainerSummary>,
    inspects: HashMap<String, ContainerInspect>,
    stats: HashMap<String, ContainerStats>,
    logs: HashMap<String, Vec<u8>>,
    images: Vec<ImageSummary>,
    volumes: Vec<Volume>,
    lifecycle_rejection: Option<(u16, String)>,
    image_in_use: bool,
    volume_in_use: bool,
}

impl FakeClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_containers(mut self, containers: Value) -> Self {
        self.containers = serde_json::from_value(containers).expect("container fixture");
        self
    }

    pub fn with_inspect(mut self, id: &str, inspect: Value) -> Self {
        self.inspects.insert(
            id.to_string(),
            serde_json::from_value(inspect).expect("inspect fixture"),
        );
        self
    }

    pub fn with_stats(mut self, id: &str, stats: Value) -> Self {
        self.stats.insert(
            id.to_string(),
            serde_json::from_value(stats).expect("stats fixture"),
        );
        self
    }

    pub fn with_logs(mut self, id: &str, raw: Vec<u8>) -> Self {
        self.logs.insert(id.to_string(), raw);
        self
    }

    pub fn with_images(mut self, images: Value) -> Self {
        self.images = serde_json::from_value(images).expect("image fixture");
        self
    }

    pub fn with_volumes(mut self, volumes: Value) -> Self {
        self.volumes = serde_json::from_value(volumes).expect("volume fixture");
        self
    }

    pub fn rejecting_lifecycle(mut self, status: u16, message: &str) -> Self {
        self.lifecycle_rejection = Some((status, message.to_string()));
        self
    }

    /// Deletes without force are refused as long as a container uses the image.
    pub fn with_image_in_use(mut self) -> Self {
        self.image_in_use = true;
        self
    }

    pub fn with_volume_in_use(mut self) -> Self {
        self.volume_in_use = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

fn no_such(kind: &str, id: &str) -> ApiError {
    ApiError::NotFound(format!("No such {}: {}", kind, id))
}

#[async_trait]
impl DaemonClient for FakeClient {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn version(&self) -> Result<Value> {
        Ok(json!({ "Version": "27.0.0-fake", "ApiVersion": "1.46" }))
    }

    async fn list_containers(&self, all: bool) -> Result<Vec<ContainerSummary>> {
        self.record(Call::ListContainers(all));
        Ok(self.containers.clone())
    }

    async fn inspect_container(&self, id: &str) -> Result<ContainerInspect> {
        self.record(Call::Inspect(id.to_string()));
        self.inspects
            .get(id)
            .cloned()
            .ok_or_else(|| no_such("container", id))
    }

    async fn container_lifecycle(&self, id: &str, op: LifecycleOp) -> Result<()> {
        self.record(Call::Lifecycle(id.to_string(), op));
        match &self.lifecycle_rejection {
            Some((status, message)) => Err(crate::core::error::classify(
                StatusCode::from_u16(*status).unwrap(),
                message,
            )),
            None => Ok(()),
        }
    }

    async fn remove_container(&self, id: &str, force: bool) -> Result<()> {
        self.record(Call::RemoveContainer(id.to_string(), force));
        Ok(())
    }

    async fn container_stats(&self, id: &str) -> Result<ContainerStats> {
        self.record(Call::Stats(id.to_string()));
        self.stats
            .get(id)
            .cloned()
            .ok_or_else(|| no_such("container", id))
    }

    async fn container_logs(&self, id: &str, tail: Option<u32>) -> Result<Bytes> {
        self.record(Call::Logs(id.to_string(), tail));
        self.logs
            .get(id)
            .map(|raw| Bytes::from(raw.clone()))
            .ok_or_else(|| no_such("container", id))
    }

    async fn list_images(&self) -> Result<Vec<ImageSummary>> {
        self.record(Call::ListImages);
        Ok(self.images.clone())
    }

    async fn pull_image(&self, repository: &str, tag: Option<&str>) -> Result<()> {
        self.record(Call::Pull(
            repository.to_string(),
            tag.map(str::to_string),
        ));
        Ok(())
    }

    async fn remove_image(&self, id: &str, force: bool) -> Result<()> {
        self.record(Call::RemoveImage(id.to_string(), force));
        if self.image_in_use && !force {
            return Err(crate::core::error::classify(
                StatusCode::CONFLICT,
                &format!(
                    "conflict: unable to remove repository reference \"{}\" (must force) - container 3f4e5d is using its referenced image",
                    id
                ),
            ));
        }
        Ok(())
    }

    async fn list_volumes(&self) -> Result<Vec<Volume>> {
        self.record(Call::ListVolumes);
        Ok(self.volumes.clone())
    }

    async fn create_volume(&self, options: VolumeCreateOptions) -> Result<Volume> {
        self.record(Call::CreateVolume(
            options.name.clone(),
            options.driver.clone(),
        ));
        Ok(Volume {
            mountpoint: format!("/var/lib/docker/volumes/{}/_data", options.name),
            name: options.name,
            driver: options.driver,
            created_at: Some("2024-06-01T08:30:00Z".to_string()),
            labels: Some(options.labels),
            scope: Some("local".to_string()),
            usage_data: None,
        })
    }

    async fn remove_volume(&self, name: &str, force: bool) -> Result<()> {
        self.record(Call::RemoveVolume(name.to_string(), force));
        if self.volume_in_use && !force {
            return Err(crate::core::error::classify(
                StatusCode::CONFLICT,
                &format!("remove {}: volume is in use - [3f4e5d]", name),
            ));
        }
        Ok(())
    }
}
