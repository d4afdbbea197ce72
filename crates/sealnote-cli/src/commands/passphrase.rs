use zeroize::Zeroizing;

use crate::app::{unlock, AppContext};
use crate::cli::PassphraseArgs;
use crate::errors::{core_error, CliError};
use crate::helpers::{prompt_new_passphrase, NEW_PASSPHRASE_ENV};
use crate::output::print_write_report;

/// Replace every passphrase key with one for the new passphrase. Device keys
/// are kept.
pub async fn handle_passphrase(ctx: &AppContext<'_>, args: &PassphraseArgs) -> anyhow::Result<()> {
    let kdf = ctx.kdf(args.kdf.as_deref())?;
    let vault = ctx.vault()?;
    let decrypted = unlock(ctx, &vault).await?;

    let passphrase = Zeroizing::new(prompt_new_passphrase(NEW_PASSPHRASE_ENV, ctx.interactive())?);
    let updated = decrypted
        .change_passphrase(passphrase.as_str(), kdf)
        .map_err(|e| core_error(e.into()))?;
    let report = vault
        .storage()
        .write(updated.message())
        .await
        .map_err(|e| CliError::storage(&e))?;
    print_write_report(&report);

    if !ctx.quiet() {
        println!("Passphrase changed");
    }
    Ok(())
}
