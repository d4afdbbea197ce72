//! Path resolution for config, note and state files.

use std::path::PathBuf;

use crate::cli::Cli;
use crate::config::{default_config_path, default_local_path, default_state_path, SealnoteConfig};
use crate::errors::CliError;

/// Resolve the config file path, checking SEALNOTE_CONFIG env var first.
pub fn resolve_config_path() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("SEALNOTE_CONFIG") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value));
        }
    }
    default_config_path()
}

/// Resolve the local note path from CLI args (or SEALNOTE_LOCAL_PATH), then
/// config, then the XDG data dir.
pub fn resolve_local_path(cli: &Cli, config: &SealnoteConfig) -> anyhow::Result<PathBuf> {
    if let Some(path) = cli.local.as_deref().filter(|p| !p.trim().is_empty()) {
        return Ok(PathBuf::from(path));
    }
    if let Some(path) = config.storage.local_path.as_deref() {
        return Ok(PathBuf::from(path));
    }
    default_local_path()
}

pub fn resolve_state_path() -> anyhow::Result<PathBuf> {
    default_state_path()
}

/// Error returned when no backend holds a note.
pub fn no_note_error(backends: &[String]) -> CliError {
    CliError::not_found(
        format!("No note found in storage ({})", backends.join(", ")),
        "Hint: Run `sealnote init` to create one.",
    )
}
