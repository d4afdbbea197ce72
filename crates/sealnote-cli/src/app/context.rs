//! Application context for the SealNote CLI.
//!
//! Provides a unified context that combines CLI arguments with
//! lazily-loaded configuration and builds the storage stack from it.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use once_cell::unsync::OnceCell;

use sealnote_core::crypto::PassphraseKdf;
use sealnote_core::storage::{DriveBackend, LocalFileBackend, StorageFormat};
use sealnote_core::{SessionSlot, Storage, Vault, VaultOptions};

use crate::cli::Cli;
use crate::config::{parse_kdf, read_config, read_state, write_state, DeviceState, SealnoteConfig};
use crate::security::KeyringStore;
use crate::token::CommandTokenProvider;

use super::resolver::{resolve_config_path, resolve_local_path, resolve_state_path};

/// Application context that bundles CLI args with configuration.
///
/// This avoids repeatedly loading config and threading multiple parameters
/// through handler functions.
pub struct AppContext<'a> {
    cli: &'a Cli,
    config: OnceCell<SealnoteConfig>,
}

impl<'a> AppContext<'a> {
    /// Create a new application context from CLI arguments.
    pub fn new(cli: &'a Cli) -> Self {
        Self {
            cli,
            config: OnceCell::new(),
        }
    }

    /// Check if quiet mode is enabled.
    pub fn quiet(&self) -> bool {
        self.cli.quiet
    }

    /// Prompts are allowed: stdin is a terminal and --no-input was not given.
    pub fn interactive(&self) -> bool {
        std::io::stdin().is_terminal() && !self.cli.no_input
    }

    /// Get the configuration, loading it lazily if needed.
    pub fn config(&self) -> anyhow::Result<&SealnoteConfig> {
        self.config
            .get_or_try_init(|| read_config(&resolve_config_path()?))
    }

    /// Get the configured editor override, if any.
    pub fn editor(&self) -> anyhow::Result<Option<&str>> {
        Ok(self.config()?.ui.editor.as_deref())
    }

    pub fn local_path(&self) -> anyhow::Result<PathBuf> {
        resolve_local_path(self.cli, self.config()?)
    }

    pub fn remember_timeout(&self) -> anyhow::Result<Option<Duration>> {
        Ok(self.config()?.session.remember_timeout())
    }

    /// KDF for new passphrase keys: the flag if given, else the config.
    pub fn kdf(&self, flag: Option<&str>) -> anyhow::Result<PassphraseKdf> {
        let setting = match flag {
            Some(value) => parse_kdf(value)?,
            None => self.config()?.security.passphrase_kdf,
        };
        Ok(setting.into())
    }

    pub fn device_unlock_enabled(&self) -> anyhow::Result<bool> {
        Ok(self.config()?.security.device_unlock)
    }

    pub fn key_store(&self) -> anyhow::Result<KeyringStore> {
        Ok(KeyringStore::new(&self.local_path()?, self.interactive()))
    }

    pub fn device_state(&self) -> anyhow::Result<DeviceState> {
        read_state(&resolve_state_path()?)
    }

    pub fn save_device_state(&self, state: &DeviceState) -> anyhow::Result<()> {
        write_state(&resolve_state_path()?, state)
    }

    /// Backends in priority order: local file first, then the remote store.
    pub fn storage(&self) -> anyhow::Result<Storage> {
        let config = self.config()?;
        let mut backends: Vec<Arc<dyn StorageFormat>> =
            vec![Arc::new(LocalFileBackend::new(self.local_path()?))];
        if config.remote.enabled {
            let tokens = Arc::new(CommandTokenProvider::new(
                config.remote.token_command.clone(),
            ));
            let drive = DriveBackend::new(
                config.remote.api_base_url.clone(),
                config.storage.file_name.clone(),
                tokens,
            )
            .map_err(|e| anyhow::anyhow!("Failed to set up remote storage: {}", e))?;
            backends.push(Arc::new(drive));
        }
        let storage = Storage::new(backends);
        tracing::debug!(backends = ?storage.backend_names(), "storage configured");
        Ok(storage)
    }

    pub fn vault(&self) -> anyhow::Result<Vault> {
        let config = self.config()?;
        let options = VaultOptions {
            remember_timeout: config.session.remember_timeout(),
            write_debounce: Duration::from_millis(config.storage.write_debounce_ms),
        };
        Ok(Vault::new(self.storage()?, SessionSlot::new(), options))
    }
}
