//! Error types for plandex-update.

use thiserror::Error;

/// Result type alias using the crate error.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the self-update subsystem.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed, timed out, or returned a non-success status.
    #[error("network error: {0}")]
    Network(String),

    /// A version string or release tag is not valid semver.
    #[error("invalid version '{input}': {reason}")]
    InvalidVersion {
        /// The rejected input.
        input: String,
        /// Why the parser rejected it.
        reason: String,
    },

    /// The tag listing contained no CLI release tag.
    #[error("no CLI release tag found in tag listing")]
    NotFound,

    /// Archive is corrupt or lacks the expected binary.
    #[error("archive error: {0}")]
    Archive(String),

    /// The executable could not be replaced for lack of privilege.
    #[error(
        "failed to apply update due to permission error; please try running your command again with elevated privileges (e.g. 'sudo'): {0}"
    )]
    Permission(String),

    /// Any other failure while replacing the executable.
    #[error("failed to apply update: {0}")]
    Patch(String),

    /// The updated binary could not be started or waited on.
    #[error("failed to restart: {0}")]
    Respawn(String),

    /// Reading the confirmation answer failed.
    #[error("prompt error: {0}")]
    Prompt(String),

    /// Configuration file could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Network(format!("request timed out: {e}"))
        } else {
            Self::Network(e.to_string())
        }
    }
}
