//! Re-executes the updated binary and forwards its exit status.

use crate::error::{Error, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use tracing::debug;

/// Executable path plus the arguments to hand it, byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInvocation {
    executable: PathBuf,
    args: Vec<OsString>,
}

impl ProcessInvocation {
    /// Build an invocation from explicit parts.
    #[must_use]
    pub fn new(executable: impl Into<PathBuf>, args: Vec<OsString>) -> Self {
        Self {
            executable: executable.into(),
            args,
        }
    }

    /// Get the executable path.
    #[must_use]
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Get the argument vector (without the program name).
    #[must_use]
    pub fn args(&self) -> &[OsString] {
        &self.args
    }
}

/// Run `invocation` with inherited stdin/stdout/stderr and wait for it.
///
/// Returns the status the caller should exit with: the child's own code, or
/// on Unix `128 + signal` for a child killed by a signal.
///
/// # Errors
///
/// Returns [`Error::Respawn`] if the child cannot be started or waited on,
/// or if it ended without any status to forward.
pub fn respawn(invocation: &ProcessInvocation) -> Result<i32> {
    debug!(
        "Respawning {} with {} argument(s)",
        invocation.executable.display(),
        invocation.args.len()
    );

    let mut child = Command::new(&invocation.executable)
        .args(&invocation.args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|e| {
            Error::Respawn(format!(
                "failed to start {}: {e}",
                invocation.executable.display()
            ))
        })?;

    let status = child
        .wait()
        .map_err(|e| Error::Respawn(format!("failed to wait for child process: {e}")))?;

    exit_code(status)
}

fn exit_code(status: ExitStatus) -> Result<i32> {
    if let Some(code) = status.code() {
        return Ok(code);
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return Ok(128 + signal);
        }
    }

    Err(Error::Respawn(format!(
        "child process ended without an exit status: {status}"
    )))
}
