use std::time::Duration;

use sealnote_core::storage::WriteReport;
use sealnote_core::{DecryptedMessage, Vault};
use zeroize::Zeroizing;

use crate::app::{unlock, AppContext};
use crate::errors::{core_error, CliError};
use crate::helpers::{edit_in_editor, EditOutcome};
use crate::output::print_write_report;

pub async fn handle_show(ctx: &AppContext<'_>) -> anyhow::Result<()> {
    let vault = ctx.vault()?;
    let decrypted = unlock(ctx, &vault).await?;
    let content = decrypted.content();
    if content.is_empty() || content.ends_with('\n') {
        print!("{}", content);
    } else {
        println!("{}", content);
    }
    Ok(())
}

/// Edit the note in `$EDITOR`. The session is remembered for the configured
/// timeout; if it expires first the editor is killed and nothing is saved.
pub async fn handle_edit(ctx: &AppContext<'_>) -> anyhow::Result<()> {
    let vault = ctx.vault()?;
    let decrypted = unlock(ctx, &vault).await?;
    // A zero timeout forgets a paused session at once; it does not bound editing.
    let limit = ctx.remember_timeout()?.filter(|timeout| !timeout.is_zero());

    match edit_session(&vault, decrypted, ctx.editor()?, limit).await? {
        Edited::Expired => Err(session_expired()),
        Edited::Unchanged => {
            if !ctx.quiet() {
                println!("No changes");
            }
            Ok(())
        }
        Edited::Saved(report) => {
            if let Some(report) = report {
                print_write_report(&report);
            }
            if !ctx.quiet() {
                println!("Saved");
            }
            Ok(())
        }
    }
}

#[derive(Debug)]
enum Edited {
    Saved(Option<WriteReport>),
    Unchanged,
    Expired,
}

/// Remember `decrypted` for `limit`, run the editor, and write the result.
/// The session is locked when this returns.
async fn edit_session(
    vault: &Vault,
    decrypted: DecryptedMessage,
    editor: Option<&str>,
    limit: Option<Duration>,
) -> anyhow::Result<Edited> {
    let initial = Zeroizing::new(decrypted.content().to_string());
    // Published before the editor starts so an editor that exits at once
    // still finds the session.
    let generation = vault.slot().publish(decrypted, limit);

    let outcome = edit_in_editor(editor, initial.as_str(), vault.slot().released(generation)).await;
    let edited = match outcome {
        Ok(EditOutcome::Changed(content)) => {
            let content = Zeroizing::new(content);
            match vault.session() {
                Some(current) => {
                    let updated = current
                        .update_content(content.as_str())
                        .map_err(|e| core_error(e.into()))?;
                    vault.save(updated);
                    Edited::Saved(None)
                }
                None => Edited::Expired,
            }
        }
        Ok(EditOutcome::Unchanged) => Edited::Unchanged,
        Ok(EditOutcome::Expired) => Edited::Expired,
        Err(e) => {
            vault.slot().clear();
            return Err(e);
        }
    };

    let report = vault.lock().await.map_err(|e| CliError::storage(&e))?;
    Ok(match edited {
        Edited::Saved(_) => Edited::Saved(report),
        other => other,
    })
}

fn session_expired() -> anyhow::Error {
    CliError::auth_failed_with_hint(
        "Session expired while editing; changes were discarded.",
        "Hint: Raise session.remember_timeout_seconds in the config.",
    )
    .into()
}
