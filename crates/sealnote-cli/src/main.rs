//! SealNote CLI - a single encrypted note kept in sync across storage backends
//!
//! This is the command-line interface for SealNote. It provides a user-friendly
//! interface to the core library functionality.

mod app;
mod cli;
mod commands;
mod config;
mod constants;
mod errors;
mod helpers;
mod output;
mod security;
mod token;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::app::AppContext;
use crate::cli::{Cli, Commands};
use crate::commands::{device, init, keys, misc, note, passphrase, sync};
use crate::errors::CliError;

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    let ctx = AppContext::new(&cli);

    if let Err(e) = run(&ctx, &cli).await {
        if let Some(cli_error) = e.downcast_ref::<CliError>() {
            cli_error.exit();
        }
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Log to stderr, filtered by SEALNOTE_LOG (default `warn`).
fn init_tracing() {
    let filter =
        EnvFilter::try_from_env("SEALNOTE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

async fn run(ctx: &AppContext<'_>, cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Some(Commands::Init(args)) => init::handle_init(ctx, args).await,
        Some(Commands::Edit) | None => note::handle_edit(ctx).await,
        Some(Commands::Show) => note::handle_show(ctx).await,
        Some(Commands::Passphrase(args)) => passphrase::handle_passphrase(ctx, args).await,
        Some(Commands::Device(command)) => device::handle_device(ctx, command).await,
        Some(Commands::Keys(command)) => keys::handle_keys(ctx, command).await,
        Some(Commands::Sync) => sync::handle_sync(ctx).await,
        Some(Commands::Completions(args)) => misc::handle_completions(args.shell),
    }
}
