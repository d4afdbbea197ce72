use zeroize::Zeroizing;

use crate::app::AppContext;
use crate::cli::InitArgs;
use crate::commands::device::enroll;
use crate::errors::{core_error, CliError};
use crate::helpers::{prompt_new_passphrase, PASSPHRASE_ENV};
use crate::output::{print_failures, print_write_report};

pub async fn handle_init(ctx: &AppContext<'_>, args: &InitArgs) -> anyhow::Result<()> {
    let vault = ctx.vault()?;
    let kdf = ctx.kdf(args.kdf.as_deref())?;

    // Refuse before prompting; an inconclusive read also refuses.
    let existing = vault.load().await.map_err(|e| CliError::storage(&e))?;
    print_failures(&existing.failures);
    if existing.message().is_some() {
        return Err(CliError::invalid_input(
            "A note already exists in storage.\nHint: Run `sealnote edit` to open it.",
        )
        .into());
    }

    let passphrase = Zeroizing::new(prompt_new_passphrase(PASSPHRASE_ENV, ctx.interactive())?);
    let (decrypted, report) = vault
        .create(passphrase.as_str(), kdf)
        .await
        .map_err(core_error)?;
    print_write_report(&report);

    if args.enroll_device {
        enroll(ctx, &vault, &decrypted).await?;
    }
    vault.lock().await.map_err(|e| CliError::storage(&e))?;

    if !ctx.quiet() {
        println!("Created note on {}", report.written.join(", "));
        println!("Local file: {}", ctx.local_path()?.display());
    }
    Ok(())
}
