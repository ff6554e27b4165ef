//! First-run bookkeeping for a project

use crate::analyzer::clock::{iso_timestamp, Clock};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const STATE_FILENAME: &str = ".pagescore-state.json";

/// Contents of the state file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallState {
    pub version: String,
    pub installed_at: String,
}

pub fn load_state(project_root: &Path) -> Option<InstallState> {
    let content = fs::read_to_string(project_root.join(STATE_FILENAME)).ok()?;
    serde_json::from_str(&content).ok()
}

/// Record the first run in this project. Returns true only on that first run;
/// later runs leave the state file alone.
pub fn record_install(project_root: &Path, clock: &dyn Clock) -> Result<bool> {
    let path = project_root.join(STATE_FILENAME);
    if path.exists() {
        return Ok(false);
    }

    let state = InstallState {
        version: env!("CARGO_PKG_VERSION").to_string(),
        installed_at: iso_timestamp(clock.now()),
    };
    let json = serde_json::to_string_pretty(&state).context("Failed to serialize state")?;
    fs::write(&path, json)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    tracing::info!(version = %state.version, "pagescore installed in this project");
    Ok(true)
}
