//! Release archive download.

use crate::config::UpgradeConfig;
use crate::error::Result;
use crate::upgrade::version::ReleaseTag;
use bytes::Bytes;
use futures::StreamExt;
use semver::Version;
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Connect timeout for archive downloads. The transfer itself is unbounded.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Target platform in the naming used by release archives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    /// Operating system (`linux`, `darwin`, `windows`, ...).
    pub os: String,
    /// CPU architecture (`amd64`, `arm64`, ...).
    pub arch: String,
}

impl Platform {
    /// Platform this binary was compiled for.
    #[must_use]
    pub fn current() -> Self {
        Self::from_rust_target(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Translate Rust's `std::env::consts` identifiers to archive naming.
    #[must_use]
    pub fn from_rust_target(os: &str, arch: &str) -> Self {
        let os = match os {
            "macos" => "darwin",
            other => other,
        };
        let arch = match arch {
            "x86_64" => "amd64",
            "aarch64" => "arm64",
            "x86" => "386",
            "powerpc64" => "ppc64",
            other => other,
        };
        Self {
            os: os.to_string(),
            arch: arch.to_string(),
        }
    }

    /// File name of the tool binary on this platform.
    #[must_use]
    pub fn binary_name(&self, tool_name: &str) -> String {
        if self.os == "windows" {
            format!("{tool_name}.exe")
        } else {
            tool_name.to_string()
        }
    }
}

/// A fully downloaded archive in a private temporary file.
///
/// The file is removed when this value is dropped.
#[derive(Debug)]
pub struct DownloadedArchive {
    file: NamedTempFile,
}

impl DownloadedArchive {
    /// Location of the archive on disk.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// Downloads platform archives from the release endpoint.
pub struct ReleaseFetcher {
    client: reqwest::Client,
    base_url: String,
    tool_name: String,
}

impl ReleaseFetcher {
    /// Create a fetcher from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &UpgradeConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: config.download_base_url.trim_end_matches('/').to_string(),
            tool_name: config.tool_name.clone(),
        })
    }

    /// URL of the archive for `tag`/`version` on `platform`.
    #[must_use]
    pub fn archive_url(&self, tag: &ReleaseTag, version: &Version, platform: &Platform) -> String {
        format!(
            "{}/releases/download/{}/{}_{}_{}_{}.tar.gz",
            self.base_url,
            tag.url_encoded(),
            self.tool_name,
            version,
            platform.os,
            platform.arch
        )
    }

    /// Download the archive into a temporary file. Returns only once the
    /// whole body has been written.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Network`] on request failure or a non-success
    /// status, and [`crate::Error::Io`] if the temporary file cannot be written.
    pub async fn fetch(
        &self,
        tag: &ReleaseTag,
        version: &Version,
        platform: &Platform,
    ) -> Result<DownloadedArchive> {
        let url = self.archive_url(tag, version, platform);
        debug!("Downloading release archive from {url}");

        let response = self.client.get(&url).send().await?.error_for_status()?;

        let mut file = tempfile::Builder::new()
            .prefix(&format!("{}-", self.tool_name))
            .suffix(".tar.gz")
            .tempfile()?;

        let mut size = 0u64;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk: Bytes = chunk?;
            file.write_all(&chunk)?;
            size += chunk.len() as u64;
        }
        file.flush()?;

        info!("Downloaded {size} bytes for {tag}");
        Ok(DownloadedArchive { file })
    }
}
