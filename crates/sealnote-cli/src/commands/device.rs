use sealnote_core::crypto::SecureKeyStore;
use sealnote_core::{enroll_device, BiometricError, DecryptedMessage, Error, Vault};

use crate::app::{unlock, AppContext};
use crate::cli::DeviceSubcommand;
use crate::errors::{core_error, CliError};
use crate::output::print_write_report;

pub async fn handle_device(ctx: &AppContext<'_>, command: &DeviceSubcommand) -> anyhow::Result<()> {
    match command {
        DeviceSubcommand::Enroll => handle_enroll(ctx).await,
        DeviceSubcommand::Forget => handle_forget(ctx).await,
    }
}

async fn handle_enroll(ctx: &AppContext<'_>) -> anyhow::Result<()> {
    let vault = ctx.vault()?;
    let decrypted = unlock(ctx, &vault).await?;
    enroll(ctx, &vault, &decrypted).await?;
    Ok(())
}

/// Add a key for this device, write the note, and remember the enrollment.
pub async fn enroll(
    ctx: &AppContext<'_>,
    vault: &Vault,
    decrypted: &DecryptedMessage,
) -> anyhow::Result<DecryptedMessage> {
    let mut state = ctx.device_state()?;
    if let Some(created_at) = state.biometric_created_at {
        if decrypted.message().find_biometric(created_at).is_some() {
            return Err(CliError::invalid_input(
                "This device is already enrolled.\nHint: Run `sealnote device forget` first to re-enroll.",
            )
            .into());
        }
    }

    let store = ctx.key_store()?;
    let (updated, key) = enroll_device(decrypted, &store).map_err(|err| match err {
        Error::Biometric(BiometricError::Cancelled) => CliError::auth_failed_with_hint(
            "Device enrollment was not confirmed.",
            "Hint: Enrollment asks for confirmation and needs a terminal.",
        )
        .into(),
        other => core_error(other),
    })?;

    let report = vault
        .storage()
        .write(updated.message())
        .await
        .map_err(|e| CliError::storage(&e))?;
    print_write_report(&report);

    state.biometric_created_at = key.label.created_at();
    ctx.save_device_state(&state)?;
    if !ctx.quiet() {
        println!("Enrolled this device ({})", key.label);
    }
    Ok(updated)
}

async fn handle_forget(ctx: &AppContext<'_>) -> anyhow::Result<()> {
    let mut state = ctx.device_state()?;
    let Some(created_at) = state.biometric_created_at else {
        return Err(CliError::not_found(
            "This device is not enrolled.",
            "Hint: Run `sealnote device enroll` to add it.",
        )
        .into());
    };

    let vault = ctx.vault()?;
    let decrypted = unlock(ctx, &vault).await?;
    if let Some(key) = decrypted.message().find_biometric(created_at).cloned() {
        let updated = decrypted.remove_keys(&[key]).map_err(|e| core_error(e.into()))?;
        let report = vault
            .storage()
            .write(updated.message())
            .await
            .map_err(|e| CliError::storage(&e))?;
        print_write_report(&report);
    }

    ctx.key_store()?.delete_key().map_err(|e| core_error(e.into()))?;
    state.biometric_created_at = None;
    ctx.save_device_state(&state)?;
    if !ctx.quiet() {
        println!("Removed this device's unlock method");
    }
    Ok(())
}
