use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use sealnote_core::VERSION;

/// SealNote - a single encrypted note, kept in sync across local and remote storage
#[derive(Parser)]
#[command(name = "sealnote")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the local note file
    #[arg(short, long, global = true, env = "SEALNOTE_LOCAL_PATH")]
    pub local: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable interactive prompts
    #[arg(long, global = true)]
    pub no_input: bool,
}

/// Arguments for the `init` command
#[derive(Args)]
pub struct InitArgs {
    /// Key derivation for the passphrase (sha512 or argon2id)
    #[arg(long, value_name = "KDF")]
    pub kdf: Option<String>,

    /// Enroll this device right after creating the note
    #[arg(long)]
    pub enroll_device: bool,
}

/// Arguments for the `passphrase` command
#[derive(Args)]
pub struct PassphraseArgs {
    /// Key derivation for the new passphrase (sha512 or argon2id)
    #[arg(long, value_name = "KDF")]
    pub kdf: Option<String>,
}

/// Arguments for the `keys remove` command
#[derive(Args)]
pub struct KeysRemoveArgs {
    /// Label of the unlock method, as printed by `keys list`
    #[arg(value_name = "LABEL")]
    pub label: String,
}

/// Arguments for the `completions` command
#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_name = "SHELL")]
    pub shell: Shell,
}

#[derive(Subcommand)]
pub enum DeviceSubcommand {
    /// Add an unlock method backed by this device's keyring
    Enroll,

    /// Remove this device's unlock method and its keyring secret
    Forget,
}

#[derive(Subcommand)]
pub enum KeysSubcommand {
    /// List the unlock methods stored in the note
    List,

    /// Remove an unlock method (the last one is never removed)
    Remove(KeysRemoveArgs),
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new encrypted note
    Init(InitArgs),

    /// Unlock the note and edit it in $EDITOR (default)
    Edit,

    /// Unlock the note and print it
    Show,

    /// Change the passphrase
    Passphrase(PassphraseArgs),

    /// Manage this device's unlock method
    #[command(subcommand)]
    Device(DeviceSubcommand),

    /// Inspect or remove unlock methods
    #[command(subcommand)]
    Keys(KeysSubcommand),

    /// Read every backend and repair stale copies
    Sync,

    /// Generate shell completions
    Completions(CompletionsArgs),
}
