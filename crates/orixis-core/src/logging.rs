//! File-backed `tracing` setup.
//!
//! A full-screen TUI owns its terminal, so diagnostics go to a file instead
//! of stderr. `RUST_LOG` wins over the directives passed in when it is set.

use crate::runtime::ProgramError;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Default filter used when neither `RUST_LOG` nor explicit directives are given.
pub const DEFAULT_DIRECTIVES: &str = "info,orixis_palette=debug";

/// Install a global `tracing` subscriber that appends to `path`.
///
/// Fails if the file cannot be opened, the directives do not parse, or a
/// global subscriber is already installed.
pub fn init_file_logging(path: impl AsRef<Path>, directives: &str) -> Result<(), ProgramError> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path.as_ref())?;

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(directives)
            .map_err(|err| ProgramError::Logging(err.to_string()))?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(true)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|err| ProgramError::Logging(err.to_string()))
}
