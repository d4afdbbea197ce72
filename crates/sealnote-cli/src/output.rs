//! Output formatting helpers for the CLI.

use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};

use sealnote_core::crypto::{Key, Label};
use sealnote_core::storage::WriteReport;
use sealnote_core::BackendFailure;

/// Print a `Warning:` line per failed backend. Warnings are printed even in
/// quiet mode.
pub fn print_failures(failures: &[BackendFailure]) {
    for failure in failures {
        eprintln!("Warning: {} backend failed: {}", failure.backend, failure.error);
    }
}

pub fn print_repaired(repaired: &[String], quiet: bool) {
    if quiet {
        return;
    }
    for backend in repaired {
        eprintln!("Repaired stale copy on {}", backend);
    }
}

pub fn print_write_report(report: &WriteReport) {
    print_failures(&report.failures);
}

/// Human description of an unlock method.
pub fn label_kind(label: &Label) -> String {
    match label {
        Label::Passphrase(_) => "passphrase".to_string(),
        Label::Biometric { created_at } => {
            format!("device key (enrolled {})", created_at.format("%Y-%m-%d %H:%M UTC"))
        }
        Label::Unknown(_) => "unknown".to_string(),
    }
}

/// Table of unlock methods, marking the one enrolled on this device.
pub fn keys_table(keys: &[Key], this_device: Option<&Label>) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Label", "Kind", "This device"]);
    for key in keys {
        let mine = this_device.map(|label| label == &key.label).unwrap_or(false);
        table.add_row(vec![
            key.label.to_string(),
            label_kind(&key.label),
            if mine { "yes".to_string() } else { String::new() },
        ]);
    }
    table.to_string()
}

/// One `label<TAB>kind` line per key, for quiet mode and pipes.
pub fn keys_plain(keys: &[Key]) -> String {
    keys.iter()
        .map(|key| format!("{}\t{}", key.label, label_kind(&key.label)))
        .collect::<Vec<_>>()
        .join("\n")
}
