// src/core/bootstrap.rs

use crate::common::env::CONFIG;
use crate::common::log;
use crate::core::error::ApiError;
use crate::core::state::AppState;
use crate::modules::axum::core as server;
use crate::modules::docker::client::{DaemonClient, DisconnectedClient, SocketClient};
use chrono::Local;
use std::os::unix::fs::FileTypeExt;
use std::path::Path;
use std::process;
use std::sync::Arc;
use std::time::Duration;

pub async fn init() {
    banner();
    let state = connect_daemon().await;
    server::start(state).await;
}

fn banner() {
    const MAGENTA: &str = "\x1b[35m";
    const RESET: &str = "\x1b[0m";

    println!();
    println!("  {}▲ dockdash {}{}", MAGENTA, env!("CARGO_PKG_VERSION"), RESET);
    println!("  - Timestamp: {}", Local::now().format("%Y-%m-%d %H:%M:%S"));
    println!("  - Environment:");
    println!("    ✓ socket {}", CONFIG.socket_path.display());
    println!("    ✓ static {}", CONFIG.static_dir.display());
    println!("    ✓ port {}", CONFIG.port);
    println!();

    log::info("✓ Starting...");
}

/// The socket must exist and be a socket before a client is built for it.
pub fn open_client(socket_path: &Path, timeout: Duration) -> Result<SocketClient, ApiError> {
    let metadata = std::fs::metadata(socket_path).map_err(|e| {
        ApiError::NotConnected(format!(
            "Docker socket not found at {}: {}",
            socket_path.display(),
            e
        ))
    })?;
    if !metadata.file_type().is_socket() {
        return Err(ApiError::NotConnected(format!(
            "{} is not a socket file",
            socket_path.display()
        )));
    }
    Ok(SocketClient::new(socket_path, timeout))
}

// Either refuses to start (REQUIRE_DAEMON) or serves in degraded mode; both
// are logged.
fn unreachable_daemon(reason: &str) {
    log::error(&format!("✗ Docker daemon check failed: {}", reason));
    if CONFIG.require_daemon {
        log::error("✗ REQUIRE_DAEMON is set, refusing to serve");
        if let Some(path) = log::get_log_path() {
            log::error(&format!("✗ The crash report can be found at {}", path.display()));
        }
        std::thread::sleep(Duration::from_millis(500));
        process::exit(1);
    }
    log::warn("▲ Serving in degraded mode, every API call will report the daemon as unavailable");
}

async fn connect_daemon() -> AppState {
    let timeout = Duration::from_secs(CONFIG.docker_timeout_secs);
    let client = match open_client(&CONFIG.socket_path, timeout) {
        Ok(client) => client,
        Err(e) => {
            let reason = e.to_string();
            unreachable_daemon(&reason);
            return AppState::new(Arc::new(DisconnectedClient::new(reason)), false);
        }
    };

    match client.ping().await {
        Ok(()) => {
            match client.version().await {
                Ok(version) => log::info(&format!(
                    "✓ Connected to Docker {} (API {}) at {}",
                    version.get("Version").and_then(|v| v.as_str()).unwrap_or("?"),
                    version.get("ApiVersion").and_then(|v| v.as_str()).unwrap_or("?"),
                    client.socket_path().display()
                )),
                Err(_) => log::info(&format!(
                    "✓ Connected to Docker at {}",
                    client.socket_path().display()
                )),
            }
            AppState::new(Arc::new(client), true)
        }
        // The socket exists, so later calls may succeed once the daemon is up.
        Err(e) => {
            unreachable_daemon(&e.to_string());
            AppState::new(Arc::new(client), false)
        }
    }
}
