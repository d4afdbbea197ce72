//! Prompt and editor helper functions for the CLI.

use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use dialoguer::{Confirm, Password};
use sealnote_core::crypto::validate_passphrase;
use tokio::process::Command;

use crate::errors::CliError;

pub const PASSPHRASE_ENV: &str = "SEALNOTE_PASSPHRASE";
pub const NEW_PASSPHRASE_ENV: &str = "SEALNOTE_NEW_PASSPHRASE";

/// Passphrase from SEALNOTE_PASSPHRASE, if set and not blank.
pub fn env_passphrase() -> Option<String> {
    read_env(PASSPHRASE_ENV)
}

fn read_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

/// Prompt for the passphrase of an existing note.
pub fn prompt_passphrase() -> anyhow::Result<String> {
    Password::new()
        .with_prompt("Passphrase")
        .interact()
        .map_err(|e| anyhow::anyhow!("Failed to read passphrase: {}", e))
}

/// Prompt for a new passphrase with confirmation, or read it from `env_var`.
pub fn prompt_new_passphrase(env_var: &str, interactive: bool) -> anyhow::Result<String> {
    let passphrase = match read_env(env_var) {
        Some(value) => value,
        None if !interactive => {
            return Err(anyhow::anyhow!(
                "No passphrase provided and no TTY available. Set {}.",
                env_var
            ))
        }
        None => Password::new()
            .with_prompt("New passphrase")
            .with_confirmation("Confirm passphrase", "Passphrases do not match")
            .interact()
            .map_err(|e| anyhow::anyhow!("Failed to read passphrase: {}", e))?,
    };
    validate_passphrase(&passphrase).map_err(|e| CliError::invalid_input(e.to_string()))?;
    Ok(passphrase)
}

/// Yes/no question; non-interactive sessions get `default`.
pub fn confirm(prompt: &str, default: bool, interactive: bool) -> anyhow::Result<bool> {
    if !interactive {
        return Ok(default);
    }
    Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact()
        .map_err(|e| anyhow::anyhow!("Failed to read confirmation: {}", e))
}

/// Result of an editing session.
#[derive(Debug, PartialEq, Eq)]
pub enum EditOutcome {
    Changed(String),
    Unchanged,
    /// The session ended before the editor exited; nothing was kept.
    Expired,
}

/// Open `initial` in the editor and return what the user saved.
///
/// The editor is killed if `expired` resolves first.
pub async fn edit_in_editor<F>(
    editor_override: Option<&str>,
    initial: &str,
    expired: F,
) -> anyhow::Result<EditOutcome>
where
    F: Future<Output = ()>,
{
    let editor = editor_override
        .map(|value| value.to_string())
        .or_else(|| std::env::var("EDITOR").ok())
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| anyhow::anyhow!("$EDITOR is not set; set it or ui.editor in the config"))?;

    let file = TempNote::create(initial)?;
    let mut parts = editor.split_whitespace();
    let program = parts
        .next()
        .ok_or_else(|| anyhow::anyhow!("Editor command is empty"))?;
    let mut child = Command::new(program)
        .args(parts)
        .arg(file.path())
        .spawn()
        .map_err(|e| anyhow::anyhow!("Failed to launch editor: {}", e))?;

    tokio::select! {
        status = child.wait() => {
            let status = status.map_err(|e| anyhow::anyhow!("Failed to wait for editor: {}", e))?;
            if !status.success() {
                return Err(anyhow::anyhow!("Editor exited with failure"));
            }
        }
        _ = expired => {
            let _ = child.kill().await;
            return Ok(EditOutcome::Expired);
        }
    }

    let contents = std::fs::read_to_string(file.path())
        .map_err(|e| anyhow::anyhow!("Failed to read temp file: {}", e))?;
    if contents == initial {
        Ok(EditOutcome::Unchanged)
    } else {
        Ok(EditOutcome::Changed(contents))
    }
}

/// Private temp file holding plaintext while the editor runs; removed on drop.
struct TempNote {
    path: PathBuf,
}

impl TempNote {
    fn create(contents: &str) -> anyhow::Result<Self> {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| anyhow::anyhow!("System time error: {}", e))?
            .as_nanos();
        let filename = format!("sealnote_{}_{}.txt", std::process::id(), nanos);
        let path = std::env::temp_dir().join(filename);

        let mut options = std::fs::OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options
            .open(&path)
            .map_err(|e| anyhow::anyhow!("Failed to create temp file: {}", e))?;
        let note = Self { path };
        file.write_all(contents.as_bytes())
            .map_err(|e| anyhow::anyhow!("Failed to write temp file: {}", e))?;
        Ok(note)
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempNote {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}
