//! Loading the note and unlocking it, with passphrase retry logic.

use chrono::{DateTime, Utc};
use zeroize::Zeroizing;

use sealnote_core::crypto::SecureKeyStore;
use sealnote_core::{
    unlock_with_device, BiometricError, CryptoError, DecryptedMessage, Error, Message, Vault,
};

use crate::constants::MAX_PASSPHRASE_ATTEMPTS;
use crate::errors::CliError;
use crate::helpers::{confirm, env_passphrase, prompt_passphrase, PASSPHRASE_ENV};
use crate::output::{print_failures, print_repaired, print_write_report};

use super::context::AppContext;
use super::resolver::no_note_error;

/// Read every backend and return the authoritative message.
///
/// Backend failures are printed as warnings; empty storage is a NotFound
/// error with a hint to run `sealnote init`.
pub async fn load_message(ctx: &AppContext<'_>, vault: &Vault) -> anyhow::Result<Message> {
    let report = vault.load().await.map_err(|e| CliError::storage(&e))?;
    print_failures(&report.failures);
    print_repaired(&report.repaired, ctx.quiet());
    let names = vault.storage().backend_names();
    report
        .into_message()
        .ok_or_else(|| no_note_error(&names).into())
}

/// Load and unlock the note: device key first, then SEALNOTE_PASSPHRASE,
/// then an interactive prompt.
pub async fn unlock(ctx: &AppContext<'_>, vault: &Vault) -> anyhow::Result<DecryptedMessage> {
    let message = load_message(ctx, vault).await?;

    let mut unavailable_device = None;
    if ctx.device_unlock_enabled()? {
        let mut state = ctx.device_state()?;
        if let Some(created_at) = state.biometric_created_at {
            let store = ctx.key_store()?;
            match unlock_with_device(&message, &store, created_at) {
                Ok(decrypted) => {
                    tracing::debug!("unlocked with device key");
                    return Ok(decrypted);
                }
                Err(Error::Biometric(BiometricError::Cancelled)) => {}
                Err(Error::Crypto(CryptoError::MissingKey)) => {
                    // Enrollment was removed from the note by another client.
                    eprintln!("Warning: this device is no longer enrolled in the note");
                    let _ = store.delete_key();
                    state.biometric_created_at = None;
                    ctx.save_device_state(&state)?;
                }
                Err(err) => {
                    eprintln!("Warning: this device's key cannot unlock the note: {}", err);
                    unavailable_device = Some(created_at);
                }
            }
        }
    }

    let decrypted = unlock_with_passphrase(ctx, &message)?;
    match unavailable_device {
        Some(created_at) => offer_device_removal(ctx, vault, decrypted, created_at).await,
        None => Ok(decrypted),
    }
}

fn unlock_with_passphrase(
    ctx: &AppContext<'_>,
    message: &Message,
) -> anyhow::Result<DecryptedMessage> {
    if let Some(passphrase) = env_passphrase().map(Zeroizing::new) {
        return message
            .decrypt_with_passphrase(passphrase.as_str())
            .map_err(|err| passphrase_error(err, Some(format!("Hint: Check {}.", PASSPHRASE_ENV))));
    }

    if !ctx.interactive() {
        return Err(CliError::auth_failed_with_hint(
            "No passphrase provided and no TTY available.",
            format!(
                "Hint: Set {} or enroll this device with `sealnote device enroll`.",
                PASSPHRASE_ENV
            ),
        )
        .into());
    }

    for attempt in 1..=MAX_PASSPHRASE_ATTEMPTS {
        let passphrase = Zeroizing::new(prompt_passphrase()?);
        match message.decrypt_with_passphrase(passphrase.as_str()) {
            Ok(decrypted) => return Ok(decrypted),
            Err(err) if is_wrong_passphrase(&err) => {
                let remaining = MAX_PASSPHRASE_ATTEMPTS - attempt;
                if remaining > 0 {
                    eprintln!(
                        "Incorrect passphrase. {} attempt{} remaining.",
                        remaining,
                        if remaining == 1 { "" } else { "s" }
                    );
                }
            }
            Err(err) => return Err(passphrase_error(err, None)),
        }
    }

    Err(CliError::auth_failed("Too many incorrect passphrase attempts.").into())
}

fn is_wrong_passphrase(err: &CryptoError) -> bool {
    matches!(err, CryptoError::Integrity | CryptoError::Decryption)
}

fn passphrase_error(err: CryptoError, hint: Option<String>) -> anyhow::Error {
    let cli = match (&err, hint) {
        (CryptoError::Integrity | CryptoError::Decryption, Some(hint)) => {
            CliError::auth_failed_with_hint("Incorrect passphrase.", hint)
        }
        (CryptoError::Integrity | CryptoError::Decryption, None) => {
            CliError::auth_failed("Incorrect passphrase.")
        }
        (CryptoError::MissingKey, _) => CliError::auth_failed_with_hint(
            "The note has no passphrase unlock method.",
            "Hint: Unlock with an enrolled device instead.",
        ),
        _ => return anyhow::anyhow!("Failed to unlock note: {}", err),
    };
    cli.into()
}

/// After a passphrase unlock, offer to drop a device key that no longer works.
async fn offer_device_removal(
    ctx: &AppContext<'_>,
    vault: &Vault,
    decrypted: DecryptedMessage,
    created_at: DateTime<Utc>,
) -> anyhow::Result<DecryptedMessage> {
    let Some(key) = decrypted.message().find_biometric(created_at).cloned() else {
        return Ok(decrypted);
    };
    if !confirm(
        "Remove this device's unusable key from the note?",
        false,
        ctx.interactive(),
    )? {
        return Ok(decrypted);
    }

    let updated = decrypted
        .remove_keys(&[key])
        .map_err(|e| anyhow::anyhow!("Failed to remove device key: {}", e))?;
    let report = vault
        .storage()
        .write(updated.message())
        .await
        .map_err(|e| CliError::storage(&e))?;
    print_write_report(&report);

    let mut state = ctx.device_state()?;
    state.biometric_created_at = None;
    ctx.save_device_state(&state)?;
    let _ = ctx.key_store()?.delete_key();
    if !ctx.quiet() {
        eprintln!("Removed this device's key");
    }
    Ok(updated)
}
