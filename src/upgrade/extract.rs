//! Locates the tool binary inside a gzip-compressed tar archive.

use crate::error::{Error, Result};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tar::Archive;
use tracing::debug;

/// Upper bound on the buffer reserved up front from an entry's declared size.
const MAX_PREALLOCATION: u64 = 64 * 1024 * 1024;

/// Scan a `.tar.gz` stream in order and return the content of the first
/// regular file named exactly `expected_name`.
///
/// Scanning stops at the first match; later entries are never read.
///
/// # Errors
///
/// Returns [`Error::Archive`] if the stream is not a valid gzip/tar archive
/// or if no matching entry exists.
pub fn extract_binary<R: Read>(reader: R, expected_name: &str) -> Result<Vec<u8>> {
    let mut archive = Archive::new(GzDecoder::new(reader));
    let entries = archive
        .entries()
        .map_err(|e| Error::Archive(format!("failed to read archive: {e}")))?;

    for entry in entries {
        let mut entry =
            entry.map_err(|e| Error::Archive(format!("failed to read tar header: {e}")))?;

        let is_match = entry.header().entry_type().is_file()
            && entry.path_bytes().as_ref() == expected_name.as_bytes();
        if !is_match {
            continue;
        }

        let declared = entry.size();
        let reserve = usize::try_from(declared.min(MAX_PREALLOCATION)).unwrap_or(0);
        let mut content = Vec::with_capacity(reserve);
        entry
            .read_to_end(&mut content)
            .map_err(|e| Error::Archive(format!("failed to read '{expected_name}': {e}")))?;

        if content.len() as u64 != declared {
            return Err(Error::Archive(format!(
                "'{expected_name}' is truncated: header declares {declared} bytes, archive holds {}",
                content.len()
            )));
        }

        debug!("Found {expected_name} in archive ({} bytes)", content.len());
        return Ok(content);
    }

    Err(Error::Archive(format!(
        "binary '{expected_name}' not found in archive"
    )))
}

/// [`extract_binary`] over an archive on disk.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be opened, otherwise as
/// [`extract_binary`].
pub fn extract_from_file(path: &Path, expected_name: &str) -> Result<Vec<u8>> {
    let file = File::open(path)?;
    extract_binary(file, expected_name)
}
