// src/modules/docker/stats.rs

use crate::common::log;
use crate::core::error::Result;
use crate::modules::docker::client::DaemonClient;
use crate::modules::docker::normalize::{self, ContainerState};
use crate::modules::docker::raw::ContainerStats;
use futures::future::join_all;
use serde::Serialize;

const MIB: f64 = 1024.0 * 1024.0;

/// Aggregate utilization across every running container.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StatsSnapshot {
    /// Percent of host CPU, summed across containers.
    pub cpu: f64,
    /// MB of memory in use.
    pub memory: f64,
    /// MB read plus written to block devices.
    pub io: f64,
}

/// (cpu delta / system delta) * 100; a zero system delta contributes nothing.
pub fn cpu_percent(stats: &ContainerStats) -> f64 {
    let cpu_delta = stats
        .cpu_stats
        .cpu_usage
        .total_usage
        .saturating_sub(stats.precpu_stats.cpu_usage.total_usage);
    let system_delta = stats
        .cpu_stats
        .system_cpu_usage
        .unwrap_or(0)
        .saturating_sub(stats.precpu_stats.system_cpu_usage.unwrap_or(0));
    if system_delta == 0 {
        return 0.0;
    }
    cpu_delta as f64 / system_delta as f64 * 100.0
}

pub fn memory_bytes(stats: &ContainerStats) -> u64 {
    stats.memory_stats.usage.unwrap_or(0)
}

// cgroup v1 reports "Read"/"Write", v2 "read"/"write".
pub fn io_bytes(stats: &ContainerStats) -> u64 {
    stats
        .blkio_stats
        .io_service_bytes_recursive
        .iter()
        .flatten()
        .filter(|entry| {
            entry.op.eq_ignore_ascii_case("read") || entry.op.eq_ignore_ascii_case("write")
        })
        .map(|entry| entry.value)
        .sum()
}

/// Utilization of a single container from one stats snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerUsage {
    pub cpu: f64,
    pub memory: f64,
    pub io: f64,
    pub online_cpus: Option<u32>,
}

pub fn usage(stats: &ContainerStats) -> ContainerUsage {
    ContainerUsage {
        cpu: round2(cpu_percent(stats)),
        memory: round2(memory_bytes(stats) as f64 / MIB),
        io: round2(io_bytes(stats) as f64 / MIB),
        online_cpus: stats.cpu_stats.online_cpus,
    }
}

pub async fn container(client: &dyn DaemonClient, id: &str) -> Result<ContainerUsage> {
    let stats = client.container_stats(id).await?;
    Ok(usage(&stats))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn aggregate<'a>(samples: impl IntoIterator<Item = &'a ContainerStats>) -> StatsSnapshot {
    let (cpu, memory, io) = samples.into_iter().fold((0.0, 0u64, 0u64), |acc, s| {
        (
            acc.0 + cpu_percent(s),
            acc.1.saturating_add(memory_bytes(s)),
            acc.2.saturating_add(io_bytes(s)),
        )
    });
    StatsSnapshot {
        cpu: round2(cpu),
        memory: round2(memory as f64 / MIB),
        io: round2(io as f64 / MIB),
    }
}

/// Fetches one snapshot per running container concurrently. Containers whose
/// stats cannot be fetched (typically gone since the listing) are skipped.
pub async fn collect(client: &dyn DaemonClient) -> Result<StatsSnapshot> {
    let running: Vec<String> = client
        .list_containers(false)
        .await?
        .into_iter()
        .filter(|c| {
            let view = normalize::container_view(c);
            view.state == ContainerState::Running
        })
        .map(|c| c.id)
        .collect();

    let fetched = join_all(running.iter().map(|id| async move {
        client
            .container_stats(id)
            .await
            .inspect_err(|err| {
                log::debug(&format!(
                    "▪ skipping stats for {}: {}",
                    normalize::short_id(id),
                    err
                ))
            })
            .ok()
    }))
    .await;

    Ok(aggregate(fetched.iter().flatten()))
}
