//! Release tag monitor: discovers the latest published CLI version.

use crate::config::UpgradeConfig;
use crate::error::{Error, Result};
use crate::upgrade::deadline::Deadline;
use crate::upgrade::version::{parse_version, TAG_PREFIX};
use semver::Version;
use tracing::debug;

/// Marker a qualifying line must contain besides the tag prefix.
const NAME_FIELD: &str = "\"name\"";

/// Queries the tag-listing endpoint for the newest CLI release.
pub struct VersionOracle {
    client: reqwest::Client,
    tags_url: String,
}

impl VersionOracle {
    /// Create an oracle from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &UpgradeConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.check_timeout())
            .build()?;

        Ok(Self {
            client,
            tags_url: config.tags_url.clone(),
        })
    }

    /// Fetch the tag listing and extract the first CLI release version.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Network`] if the request fails or the deadline
    /// passes, [`Error::NotFound`] if no line names a CLI tag, and
    /// [`Error::InvalidVersion`] if the extracted text is not semver.
    pub async fn latest_version(&self, deadline: &Deadline) -> Result<Version> {
        debug!("Checking for updates from {}", self.tags_url);

        let body = deadline.run(self.fetch_listing()).await?;
        let raw = scan_tag_listing(&body).ok_or(Error::NotFound)?;

        debug!("Latest CLI tag in listing: {TAG_PREFIX}{raw}");
        parse_version(raw)
    }

    async fn fetch_listing(&self) -> Result<String> {
        let response = self
            .client
            .get(&self.tags_url)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.text().await?)
    }
}

/// Scan a tag listing line by line and return the version text of the first
/// line mentioning both the name field and a `"cli/v` tag.
///
/// The listing is not parsed as a document: the first matching line wins,
/// whatever its position in semver order. A matching line whose version is
/// empty or lacks a closing quote is skipped.
#[must_use]
pub fn scan_tag_listing(body: &str) -> Option<&str> {
    let needle = format!("\"{TAG_PREFIX}");

    body.lines()
        .filter(|line| line.contains(NAME_FIELD))
        .find_map(|line| {
            let start = line.find(&needle)? + needle.len();
            let rest = &line[start..];
            let end = rest.find('"')?;
            (end > 0).then(|| &rest[..end])
        })
}
