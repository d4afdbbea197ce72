use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use sealnote_core::crypto::PassphraseKdf;
use sealnote_core::storage::drive::DEFAULT_API_BASE_URL;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_FILE_NAME, DEFAULT_REMEMBER_TIMEOUT_SECONDS};

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SealnoteConfig {
    #[serde(default)]
    pub storage: StorageSection,
    #[serde(default)]
    pub remote: RemoteSection,
    #[serde(default)]
    pub session: SessionSection,
    #[serde(default)]
    pub security: SecuritySection,
    #[serde(default)]
    pub ui: UiSection,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    pub local_path: Option<String>,
    pub file_name: String,
    pub write_debounce_ms: u64,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            local_path: None,
            file_name: DEFAULT_FILE_NAME.to_string(),
            write_debounce_ms: 0,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteSection {
    pub enabled: bool,
    pub api_base_url: String,
    pub token_command: Option<String>,
}

impl Default for RemoteSection {
    fn default() -> Self {
        Self {
            enabled: false,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            token_command: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSection {
    /// Seconds a paused session stays unlocked; 0 forgets at once, -1 never.
    pub remember_timeout_seconds: i64,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            remember_timeout_seconds: DEFAULT_REMEMBER_TIMEOUT_SECONDS,
        }
    }
}

impl SessionSection {
    pub fn remember_timeout(&self) -> Option<Duration> {
        u64::try_from(self.remember_timeout_seconds)
            .ok()
            .map(Duration::from_secs)
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SecuritySection {
    pub passphrase_kdf: KdfSetting,
    pub device_unlock: bool,
}

impl Default for SecuritySection {
    fn default() -> Self {
        Self {
            passphrase_kdf: KdfSetting::Sha512,
            device_unlock: true,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UiSection {
    pub editor: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum KdfSetting {
    Sha512,
    Argon2id,
}

impl From<KdfSetting> for PassphraseKdf {
    fn from(value: KdfSetting) -> Self {
        match value {
            KdfSetting::Sha512 => PassphraseKdf::Sha512,
            KdfSetting::Argon2id => PassphraseKdf::Argon2id,
        }
    }
}

/// Parse a `--kdf` flag value.
pub fn parse_kdf(value: &str) -> anyhow::Result<KdfSetting> {
    match value.trim().to_ascii_lowercase().as_str() {
        "sha512" | "sha-512" => Ok(KdfSetting::Sha512),
        "argon2id" | "argon2" => Ok(KdfSetting::Argon2id),
        other => Err(anyhow::anyhow!(
            "Unsupported key derivation: {} (use sha512 or argon2id)",
            other
        )),
    }
}

/// Per-device state that is not user configuration.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DeviceState {
    pub biometric_created_at: Option<DateTime<Utc>>,
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_config_dir()?.join("config.toml"))
}

pub fn default_local_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_data_dir()?.join(DEFAULT_FILE_NAME))
}

pub fn default_state_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_data_dir()?.join("state.toml"))
}

/// Read the config file; a missing file yields the defaults.
pub fn read_config(path: &Path) -> anyhow::Result<SealnoteConfig> {
    if !path.exists() {
        return Ok(SealnoteConfig::default());
    }
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))?;
    toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("Failed to parse config {}: {}", path.display(), e))
}

pub fn read_state(path: &Path) -> anyhow::Result<DeviceState> {
    if !path.exists() {
        return Ok(DeviceState::default());
    }
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read state {}: {}", path.display(), e))?;
    toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("Failed to parse state {}: {}", path.display(), e))
}

pub fn write_state(path: &Path, state: &DeviceState) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            anyhow::anyhow!(
                "Failed to create state directory {}: {}",
                parent.display(),
                e
            )
        })?;
    }
    let contents =
        toml::to_string_pretty(state).map_err(|e| anyhow::anyhow!("TOML error: {}", e))?;
    std::fs::write(path, contents)
        .map_err(|e| anyhow::anyhow!("Failed to write state {}: {}", path.display(), e))?;
    Ok(())
}

pub fn xdg_config_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_CONFIG_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("sealnote"));
        }
    }
    Ok(home_dir()?.join(".config").join("sealnote"))
}

pub fn xdg_data_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_DATA_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("sealnote"));
        }
    }
    Ok(home_dir()?.join(".local").join("share").join("sealnote"))
}

fn home_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .map_err(|_| anyhow::anyhow!("HOME is not set; cannot resolve default paths"))?;
    Ok(PathBuf::from(home))
}
