use sealnote_core::storage::ReadOutcome;

use crate::app::AppContext;
use crate::errors::CliError;

/// Read every backend, repair stale copies, and print one status line per
/// backend.
pub async fn handle_sync(ctx: &AppContext<'_>) -> anyhow::Result<()> {
    let vault = ctx.vault()?;
    let report = vault.load().await.map_err(|e| CliError::storage(&e))?;

    for name in vault.storage().backend_names() {
        let status = if let Some(failure) = report.failures.iter().find(|f| f.backend == name) {
            format!("failed ({})", failure.error)
        } else if report.repaired.contains(&name) {
            "repaired".to_string()
        } else {
            "ok".to_string()
        };
        println!("{}: {}", name, status);
    }

    if report.outcome == ReadOutcome::Empty && !ctx.quiet() {
        println!("No note in storage yet. Run `sealnote init` to create one.");
    }
    Ok(())
}
