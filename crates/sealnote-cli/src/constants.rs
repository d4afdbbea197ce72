//! Constants used throughout the CLI.

/// Exit codes for the CLI.
///
/// These follow common Unix conventions:
/// - 0: Success
/// - 1: General error (used by anyhow for unhandled errors)
/// - 2: Misuse of shell command (reserved by shells)
/// - 3+: Application-specific errors
pub mod exit_codes {
    /// Resource not found (no note in storage, unknown key label).
    pub const NOT_FOUND: i32 = 3;

    /// Invalid user input or arguments.
    pub const INVALID_INPUT: i32 = 4;

    /// Authentication failed (wrong passphrase, too many attempts).
    pub const AUTH_FAILED: i32 = 5;

    /// Every storage backend failed, or their state could not be decided.
    pub const STORAGE: i32 = 6;
}

/// Passphrase attempts before giving up.
pub const MAX_PASSPHRASE_ATTEMPTS: usize = 3;

/// Service name used for keyring entries.
pub const KEYRING_SERVICE: &str = "sealnote";

/// Default remote file name.
pub const DEFAULT_FILE_NAME: &str = "sealnote.json";

/// Default remember timeout in seconds.
pub const DEFAULT_REMEMBER_TIMEOUT_SECONDS: i64 = 300;
