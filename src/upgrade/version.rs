//! Version parsing, ordering and release tags.

use crate::error::{Error, Result};
use semver::Version;
use std::cmp::Ordering;
use std::fmt;

/// Build identifier that disables the upgrade flow entirely.
pub const DEVELOPMENT_VERSION: &str = "development";

/// Prefix every CLI release tag carries.
pub const TAG_PREFIX: &str = "cli/v";

/// Returns `true` for builds that must never self-update.
#[must_use]
pub fn is_development_build(version: &str) -> bool {
    version == DEVELOPMENT_VERSION
}

/// Parse a semver string, tolerating surrounding whitespace and a leading `v`.
///
/// # Errors
///
/// Returns [`Error::InvalidVersion`] if the input is not valid semver.
pub fn parse_version(input: &str) -> Result<Version> {
    let trimmed = input.trim();
    let bare = trimmed.strip_prefix('v').unwrap_or(trimmed);
    Version::parse(bare).map_err(|e| Error::InvalidVersion {
        input: input.to_string(),
        reason: e.to_string(),
    })
}

/// Order two versions by semver precedence. Build metadata is ignored.
#[must_use]
pub fn compare(a: &Version, b: &Version) -> Ordering {
    a.cmp_precedence(b)
}

/// `true` when `remote` is strictly newer than `current`.
#[must_use]
pub fn is_upgrade(current: &Version, remote: &Version) -> bool {
    compare(current, remote) == Ordering::Less
}

/// Canonical remote identifier of a CLI release (`cli/vX.Y.Z`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseTag(String);

impl ReleaseTag {
    /// Tag for the given version.
    #[must_use]
    pub fn for_version(version: &Version) -> Self {
        Self(format!("{TAG_PREFIX}{version}"))
    }

    /// Raw tag text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Tag escaped for use as a single URL path segment (`/` becomes `%2F`).
    #[must_use]
    pub fn url_encoded(&self) -> String {
        urlencoding::encode(&self.0).into_owned()
    }
}

impl fmt::Display for ReleaseTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
