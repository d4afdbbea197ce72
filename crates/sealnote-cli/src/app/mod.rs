//! Application-level utilities for the SealNote CLI.
//!
//! This module provides:
//! - Application context for unified CLI + config handling
//! - Path resolution for config, local note and device state
//! - Unlocking with the device key or a passphrase, with retry logic

mod context;
mod resolver;
mod unlock;

// Re-export public API
pub use context::AppContext;
pub use resolver::{no_note_error, resolve_config_path, resolve_local_path, resolve_state_path};
pub use unlock::{load_message, unlock};
