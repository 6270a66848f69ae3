//! Locating the aider executable.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Executable name searched on `PATH` when no explicit binary is configured.
pub const DEFAULT_BINARY: &str = "aider";

/// Error returned when the aider executable cannot be found.
#[derive(Debug, Error)]
#[error(
    "{binary} not found ({reason}). Install aider (https://aider.chat/docs/install.html) or point --aider-bin at it"
)]
pub struct NoAgentError {
    pub binary: String,
    pub reason: String,
}

/// Resolves the aider executable.
///
/// `binary` may be a bare name (searched on `PATH`) or a path. Falls back to
/// [`DEFAULT_BINARY`].
pub fn detect_agent(binary: Option<&Path>) -> Result<PathBuf, NoAgentError> {
    let candidate = binary.unwrap_or_else(|| Path::new(DEFAULT_BINARY));
    match which::which(candidate) {
        Ok(path) => {
            debug!("Using aider at {}", path.display());
            Ok(path)
        }
        Err(e) => Err(NoAgentError {
            binary: candidate.display().to_string(),
            reason: e.to_string(),
        }),
    }
}
