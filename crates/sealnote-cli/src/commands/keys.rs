use sealnote_core::crypto::{Label, SecureKeyStore};

use crate::app::{load_message, unlock, AppContext};
use crate::cli::{KeysRemoveArgs, KeysSubcommand};
use crate::errors::{core_error, CliError};
use crate::output::{keys_plain, keys_table, print_write_report};

pub async fn handle_keys(ctx: &AppContext<'_>, command: &KeysSubcommand) -> anyhow::Result<()> {
    match command {
        KeysSubcommand::List => handle_list(ctx).await,
        KeysSubcommand::Remove(args) => handle_remove(ctx, args).await,
    }
}

/// Labels are stored in the clear, so listing needs no unlock.
async fn handle_list(ctx: &AppContext<'_>) -> anyhow::Result<()> {
    let vault = ctx.vault()?;
    let message = load_message(ctx, &vault).await?;
    let this_device = ctx
        .device_state()?
        .biometric_created_at
        .map(|created_at| Label::Biometric { created_at });

    if ctx.quiet() {
        println!("{}", keys_plain(&message.keys));
    } else {
        println!("{}", keys_table(&message.keys, this_device.as_ref()));
    }
    Ok(())
}

async fn handle_remove(ctx: &AppContext<'_>, args: &KeysRemoveArgs) -> anyhow::Result<()> {
    let label = Label::parse(args.label.trim());
    let vault = ctx.vault()?;
    let decrypted = unlock(ctx, &vault).await?;

    let key = decrypted.message().find_key(&label).cloned().ok_or_else(|| {
        CliError::not_found(
            format!("No unlock method labelled {}", args.label),
            "Hint: Run `sealnote keys list` to see the labels.",
        )
    })?;
    let updated = decrypted
        .remove_keys(&[key])
        .map_err(|e| core_error(e.into()))?;
    let report = vault
        .storage()
        .write(updated.message())
        .await
        .map_err(|e| CliError::storage(&e))?;
    print_write_report(&report);

    // Removing this device's own key also drops its keyring secret.
    let mut state = ctx.device_state()?;
    if state.biometric_created_at.is_some() && state.biometric_created_at == label.created_at() {
        ctx.key_store()?.delete_key().map_err(|e| core_error(e.into()))?;
        state.biometric_created_at = None;
        ctx.save_device_state(&state)?;
    }

    if !ctx.quiet() {
        println!("Removed unlock method {}", label);
    }
    Ok(())
}
