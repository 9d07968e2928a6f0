// src/modules/docker/normalize.rs

//! Maps daemon-native records onto the stable shapes the front end consumes.
//!
//! Daemon responses vary across engine versions (null vs. missing arrays,
//! flat vs. nested container state). Everything here is pure: views are built
//! from one record and never touch the daemon.

use crate::modules::docker::raw::{
    ContainerInspect, ContainerSummary, ImageSummary, Mount, Port, StateField, Volume,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

pub const SHORT_ID_LEN: usize = 12;
pub const NONE_SENTINEL: &str = "<none>";
pub const DEFAULT_TAG: &str = "latest";
const NOT_AVAILABLE: &str = "N/A";
const SIZE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerState {
    Created,
    Running,
    Paused,
    Exited,
    Restarting,
    Removing,
    Dead,
    Unknown,
}

impl ContainerState {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "created" => ContainerState::Created,
            "running" => ContainerState::Running,
            "paused" => ContainerState::Paused,
            "exited" => ContainerState::Exited,
            "restarting" => ContainerState::Restarting,
            "removing" => ContainerState::Removing,
            "dead" => ContainerState::Dead,
            _ => ContainerState::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ContainerState::Created => "created",
            ContainerState::Running => "running",
            ContainerState::Paused => "paused",
            ContainerState::Exited => "exited",
            ContainerState::Restarting => "restarting",
            ContainerState::Removing => "removing",
            ContainerState::Dead => "dead",
            ContainerState::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortView {
    pub internal: u16,
    pub external: Option<u16>,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MountView {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: Option<String>,
    pub source: String,
    pub destination: String,
    pub rw: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerView {
    pub id: String,
    pub name: String,
    pub image: String,
    pub state: ContainerState,
    pub status: String,
    pub ports: Vec<PortView>,
    pub created: String,
    pub mounts: Vec<MountView>,
    pub exit_code: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageView {
    pub id: String,
    pub repository: String,
    pub tag: String,
    pub size: String,
    pub created: String,
    pub tags: Vec<String>,
    pub digests: Vec<String>,
    pub architecture: String,
    pub os: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct VolumeView {
    pub name: String,
    pub driver: String,
    pub mountpoint: String,
    pub created: Option<String>,
    pub size: Option<String>,
    pub labels: BTreeMap<String, String>,
    pub scope: String,
}

// ----- helpers -----

/// First `SHORT_ID_LEN` characters of an id, without any `algo:` prefix.
pub fn short_id(id: &str) -> String {
    let digest = id.split_once(':').map_or(id, |(_, hex)| hex);
    digest.chars().take(SHORT_ID_LEN).collect()
}

/// Strips every leading `/` from a daemon container name.
pub fn clean_name(name: &str) -> String {
    name.trim_start_matches('/').to_string()
}

/// Human-readable byte count: largest unit keeping the value >= 1, two decimals.
pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    // Two-decimal rounding can push e.g. 1023.999 KB up to 1024.00 KB.
    if (value * 100.0).round() / 100.0 >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", value, SIZE_UNITS[unit])
}

/// Epoch seconds as RFC 3339 UTC, e.g. `2024-05-01T12:00:00Z`.
pub fn format_timestamp(epoch_secs: i64) -> String {
    DateTime::<Utc>::from_timestamp(epoch_secs, 0)
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Re-renders a daemon RFC 3339 string in the same shape as [`format_timestamp`].
/// Unparseable input is passed through untouched.
pub fn format_rfc3339(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| {
            dt.with_timezone(&Utc)
                .to_rfc3339_opts(SecondsFormat::Secs, true)
        })
        .unwrap_or_else(|_| raw.to_string())
}

/// Splits `repo[:tag]` at the last `:` that comes after the last `/`, so a
/// registry port (`localhost:5000/app`) is never taken for a tag.
/// An empty tag defaults to `latest`.
pub fn split_reference(reference: &str) -> (String, String) {
    let name_start = reference.rfind('/').map_or(0, |i| i + 1);
    match reference[name_start..].rfind(':') {
        Some(i) => {
            let split = name_start + i;
            let tag = &reference[split + 1..];
            let tag = if tag.is_empty() { DEFAULT_TAG } else { tag };
            (reference[..split].to_string(), tag.to_string())
        }
        None => (reference.to_string(), DEFAULT_TAG.to_string()),
    }
}

// ----- containers -----

fn state_of(state: Option<&StateField>) -> ContainerState {
    match state {
        Some(StateField::Flat(s)) => ContainerState::parse(s),
        Some(StateField::Nested(nested)) => match nested.status.as_deref() {
            Some(s) => ContainerState::parse(s),
            None if nested.dead == Some(true) => ContainerState::Dead,
            None if nested.restarting == Some(true) => ContainerState::Restarting,
            None if nested.paused == Some(true) => ContainerState::Paused,
            None if nested.running == Some(true) => ContainerState::Running,
            None => ContainerState::Unknown,
        },
        None => ContainerState::Unknown,
    }
}

fn status_text(status: Option<&str>, state: ContainerState, exit_code: Option<i64>) -> String {
    match status.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => s.to_string(),
        None => match (state, exit_code) {
            (ContainerState::Exited, Some(code)) => format!("Exited ({})", code),
            _ => state.as_str().to_string(),
        },
    }
}

fn dedup_ports(ports: impl IntoIterator<Item = PortView>) -> Vec<PortView> {
    let mut out: Vec<PortView> = Vec::new();
    for port in ports {
        if !out.contains(&port) {
            out.push(port);
        }
    }
    out
}

fn port_view(port: &Port) -> PortView {
    PortView {
        internal: port.private_port,
        external: port.public_port.filter(|p| *p != 0),
        kind: if port.kind.is_empty() {
            "tcp".to_string()
        } else {
            port.kind.to_lowercase()
        },
    }
}

fn mount_view(mount: &Mount) -> MountView {
    MountView {
        kind: mount.r#type.clone().unwrap_or_default(),
        name: mount.name.clone().filter(|n| !n.is_empty()),
        source: mount.source.clone().unwrap_or_default(),
        destination: mount.destination.clone().unwrap_or_default(),
        rw: mount.rw.unwrap_or(true),
    }
}

pub fn container_view(raw: &ContainerSummary) -> ContainerView {
    let state = state_of(raw.state.as_ref());
    let exit_code = raw.exit_code.or(match &raw.state {
        Some(StateField::Nested(nested)) => nested.exit_code,
        _ => None,
    });
    let name = raw
        .names
        .as_ref()
        .and_then(|names| names.first())
        .map(|n| clean_name(n))
        .unwrap_or_default();

    ContainerView {
        id: short_id(&raw.id),
        name,
        image: raw.image.clone(),
        state,
        status: status_text(raw.status.as_deref(), state, exit_code),
        ports: dedup_ports(raw.ports.iter().flatten().map(port_view)),
        created: format_timestamp(raw.created),
        mounts: raw.mounts.iter().flatten().map(mount_view).collect(),
        exit_code,
    }
}

/// Builds the same view from an inspect record, used for single-container lookups.
pub fn container_detail(raw: &ContainerInspect) -> ContainerView {
    let nested = raw.state.clone().unwrap_or_default();
    let exit_code = nested.exit_code;
    let state = state_of(Some(&StateField::Nested(nested)));

    let mut ports: Vec<PortView> = Vec::new();
    if let Some(map) = raw.network_settings.as_ref().and_then(|n| n.ports.as_ref()) {
        for (key, bindings) in map {
            let (internal, kind) = match key.split_once('/') {
                Some((port, proto)) => (port, proto),
                None => (key.as_str(), "tcp"),
            };
            let Ok(internal) = internal.parse::<u16>() else {
                continue;
            };
            let externals: Vec<Option<u16>> = match bindings {
                Some(list) if !list.is_empty() => list
                    .iter()
                    .map(|b| b.host_port.as_deref().and_then(|p| p.parse().ok()))
                    .collect(),
                _ => vec![None],
            };
            ports.extend(externals.into_iter().map(|external| PortView {
                internal,
                external,
                kind: kind.to_lowercase(),
            }));
        }
    }
    let mut ports = dedup_ports(ports);
    ports.sort_by(|a, b| (a.internal, &a.kind, a.external).cmp(&(b.internal, &b.kind, b.external)));

    ContainerView {
        id: short_id(&raw.id),
        name: clean_name(&raw.name),
        image: raw
            .config
            .as_ref()
            .and_then(|c| c.image.clone())
            .or_else(|| raw.image.clone())
            .unwrap_or_default(),
        state,
        status: status_text(None, state, exit_code),
        ports,
        created: raw
            .created
            .as_deref()
            .map(format_rfc3339)
            .unwrap_or_default(),
        mounts: raw.mounts.iter().flatten().map(mount_view).collect(),
        exit_code,
    }
}

// ----- images -----

pub fn image_view(raw: &ImageSummary) -> ImageView {
    let tags: Vec<String> = raw.repo_tags.clone().unwrap_or_default();
    let (repository, tag) = match tags.first() {
        Some(primary) if primary != "<none>:<none>" => split_reference(primary),
        _ => (NONE_SENTINEL.to_string(), NONE_SENTINEL.to_string()),
    };

    ImageView {
        id: short_id(&raw.id),
        repository,
        tag,
        size: format_size(raw.size.max(0) as u64),
        created: format_timestamp(raw.created),
        tags,
        digests: raw.repo_digests.clone().unwrap_or_default(),
        architecture: raw
            .architecture
            .clone()
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        os: raw.os.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string()),
    }
}

// ----- volumes -----

pub fn volume_view(raw: &Volume) -> VolumeView {
    VolumeView {
        name: raw.name.clone(),
        driver: raw.driver.clone(),
        mountpoint: raw.mountpoint.clone(),
        created: raw.created_at.as_deref().map(format_rfc3339),
        size: raw
            .usage_data
            .as_ref()
            .filter(|usage| usage.size >= 0)
            .map(|usage| format_size(usage.size as u64)),
        labels: raw
            .labels
            .clone()
            .unwrap_or_default()
            .into_iter()
            .collect(),
        scope: raw.scope.clone().unwrap_or_else(|| "local".to_string()),
    }
}
