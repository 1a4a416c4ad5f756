//! Atomic replacement of the running executable.
//!
//! The new image is written in full to a staging file beside the target,
//! flushed, then renamed over the target. Rename within one directory is
//! atomic on Unix, so the target path always holds either the complete old
//! image or the complete new one.
//!
//! Windows refuses to rename over a running executable. There the old image
//! is first moved aside to `<target>.old` and the staged file renamed into
//! place, which leaves a short window where the target path does not exist.
//! If the second rename fails the old image is moved back.

use crate::error::{Error, Result};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Replaces the executable at a fixed path.
#[derive(Debug, Clone)]
pub struct BinaryPatcher {
    target: PathBuf,
}

impl BinaryPatcher {
    /// Create a patcher for the executable at `target`.
    #[must_use]
    pub fn new(target: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
        }
    }

    /// Write `content` to a staging file next to the target.
    ///
    /// The target is untouched until [`StagedBinary::commit`]; dropping the
    /// staged binary discards it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Permission`] if the directory is not writable and
    /// [`Error::Patch`] for any other I/O failure.
    pub fn stage<R: Read>(&self, mut content: R) -> Result<StagedBinary> {
        let dir = self.target.parent().ok_or_else(|| {
            Error::Patch(format!(
                "executable path has no parent directory: {}",
                self.target.display()
            ))
        })?;
        let name = self
            .target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut file = tempfile::Builder::new()
            .prefix(&format!(".{name}."))
            .suffix(".new")
            .tempfile_in(dir)
            .map_err(|e| classify(&e, "failed to create staging file"))?;

        let written = io::copy(&mut content, &mut file)
            .map_err(|e| classify(&e, "failed to write staging file"))?;

        self.copy_permissions(file.path())?;

        file.as_file()
            .sync_all()
            .map_err(|e| classify(&e, "failed to flush staging file"))?;

        debug!(
            "Staged {written} bytes for {} at {}",
            self.target.display(),
            file.path().display()
        );

        Ok(StagedBinary {
            file,
            target: self.target.clone(),
        })
    }

    /// Stage `content` and swap it into place.
    ///
    /// # Errors
    ///
    /// As [`BinaryPatcher::stage`] and [`StagedBinary::commit`].
    pub fn apply<R: Read>(&self, content: R) -> Result<()> {
        self.stage(content)?.commit()
    }

    #[cfg(unix)]
    fn copy_permissions(&self, staged: &Path) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let perms = fs::metadata(&self.target)
            .map(|m| m.permissions())
            .unwrap_or_else(|_| fs::Permissions::from_mode(0o755));
        fs::set_permissions(staged, perms)
            .map_err(|e| classify(&e, "failed to set staging file permissions"))
    }

    #[cfg(not(unix))]
    fn copy_permissions(&self, _staged: &Path) -> Result<()> {
        Ok(())
    }
}

/// A fully written replacement image awaiting the swap.
#[derive(Debug)]
pub struct StagedBinary {
    file: NamedTempFile,
    target: PathBuf,
}

impl StagedBinary {
    /// Location of the staging file.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Atomically move the staged image over the target.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Permission`] if the rename is denied and
    /// [`Error::Patch`] for any other failure.
    #[cfg(not(windows))]
    pub fn commit(self) -> Result<()> {
        let Self { file, target } = self;
        file.persist(&target)
            .map_err(|e| classify(&e.error, "failed to replace executable"))?;

        info!("Replaced {}", target.display());
        Ok(())
    }

    /// Move the running image aside and the staged image into place.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Permission`] if either rename is denied and
    /// [`Error::Patch`] for any other failure, naming `<target>.old` when
    /// the old image could not be moved back.
    #[cfg(windows)]
    pub fn commit(self) -> Result<()> {
        let Self { file, target } = self;
        replace_moving_aside(file, &target)?;

        info!("Replaced {}", target.display());
        Ok(())
    }
}

/// Where the old image waits while the staged one is renamed into place.
#[cfg(any(windows, test))]
fn aside_path(target: &Path) -> PathBuf {
    let mut aside = target.as_os_str().to_os_string();
    aside.push(".old");
    PathBuf::from(aside)
}

#[cfg(any(windows, test))]
fn replace_moving_aside(file: NamedTempFile, target: &Path) -> Result<()> {
    let aside = aside_path(target);

    // Left behind by the previous upgrade, whose process has exited.
    match fs::remove_file(&aside) {
        Ok(()) => debug!("Removed stale {}", aside.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("Could not remove stale {}: {e}", aside.display()),
    }

    fs::rename(target, &aside)
        .map_err(|e| classify(&e, "failed to move running executable aside"))?;

    if let Err(e) = file.persist(target) {
        return Err(restore_aside(&aside, target, &e.error));
    }

    if let Err(e) = fs::remove_file(&aside) {
        debug!("Leaving {} in place: {e}", aside.display());
    }
    Ok(())
}

/// Move the old image back after a failed swap and describe what happened.
#[cfg(any(windows, test))]
fn restore_aside(aside: &Path, target: &Path, cause: &io::Error) -> Error {
    match fs::rename(aside, target) {
        Ok(()) => classify(cause, "failed to replace executable"),
        Err(restore) => {
            tracing::warn!(
                "Could not move {} back to {}: {restore}",
                aside.display(),
                target.display()
            );
            Error::Patch(format!(
                "failed to replace executable: {cause}; restoring the previous binary also failed ({restore}), it remains at {}",
                aside.display()
            ))
        }
    }
}

fn classify(err: &io::Error, context: &str) -> Error {
    if err.kind() == io::ErrorKind::PermissionDenied {
        Error::Permission(format!("{context}: {err}"))
    } else {
        Error::Patch(format!("{context}: {err}"))
    }
}
