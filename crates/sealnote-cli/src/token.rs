//! Access tokens for the remote backend.

use async_trait::async_trait;
use secrecy::SecretString;
use tokio::process::Command;

use sealnote_core::storage::TokenProvider;
use sealnote_core::BackendError;

pub const TOKEN_ENV: &str = "SEALNOTE_DRIVE_TOKEN";

/// Reads `SEALNOTE_DRIVE_TOKEN`, or runs the configured command and uses its
/// trimmed stdout.
pub struct CommandTokenProvider {
    command: Option<String>,
}

impl CommandTokenProvider {
    pub fn new(command: Option<String>) -> Self {
        Self { command }
    }
}

#[async_trait]
impl TokenProvider for CommandTokenProvider {
    async fn access_token(&self) -> Result<SecretString, BackendError> {
        if let Ok(value) = std::env::var(TOKEN_ENV) {
            if !value.trim().is_empty() {
                return Ok(SecretString::from(value.trim().to_string()));
            }
        }

        let command = self.command.as_deref().ok_or_else(|| {
            BackendError::Auth(format!(
                "No access token; set {} or remote.token_command",
                TOKEN_ENV
            ))
        })?;
        let output = Command::new("sh")
            .arg("-c")
            .arg(command)
            .output()
            .await
            .map_err(|e| BackendError::Auth(format!("Failed to run token command: {}", e)))?;
        if !output.status.success() {
            return Err(BackendError::Auth(format!(
                "Token command exited with {}",
                output.status
            )));
        }
        let token = String::from_utf8(output.stdout)
            .map_err(|_| BackendError::Auth("Token command printed invalid UTF-8".to_string()))?;
        let token = token.trim();
        if token.is_empty() {
            return Err(BackendError::Auth(
                "Token command printed nothing".to_string(),
            ));
        }
        Ok(SecretString::from(token.to_string()))
    }
}
