// src/core/state.rs

use crate::modules::docker::client::SharedClient;

/// Shared by every handler. The daemon handle is the only state and is never
/// mutated after startup.
#[derive(Clone)]
pub struct AppState {
    pub docker: SharedClient,
    pub connected: bool,
}

impl AppState {
    pub fn new(docker: SharedClient, connected: bool) -> Self {
        Self { docker, connected }
    }
}
