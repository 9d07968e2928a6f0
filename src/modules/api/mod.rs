// src/modules/api/mod.rs

pub mod containers;
pub mod images;
pub mod root;
pub mod stats;
pub mod volumes;

use serde::Deserialize;

/// `?force=...` on delete routes. Anything but a truthy value means no force.
#[derive(Debug, Default, Deserialize)]
pub struct ForceQuery {
    #[serde(default)]
    force: Option<String>,
}

impl ForceQuery {
    pub fn force(&self) -> bool {
        matches!(
            self.force.as_deref().map(str::trim),
            Some("true") | Some("1") | Some("yes")
        )
    }
}
