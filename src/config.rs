//! Configuration for plandex-update.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the configuration file inside the user config directory.
pub const CONFIG_FILE_NAME: &str = "upgrade.toml";

/// Self-update configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeConfig {
    /// Name of the tool binary inside release archives.
    #[serde(default = "default_tool_name")]
    pub tool_name: String,

    /// Endpoint listing release tags.
    #[serde(default = "default_tags_url")]
    pub tags_url: String,

    /// Repository base URL; archives live under `releases/download/`.
    #[serde(default = "default_download_base_url")]
    pub download_base_url: String,

    /// Upper bound for the whole version check, in seconds.
    #[serde(default = "default_check_timeout")]
    pub check_timeout_secs: u64,

    /// Environment variable that disables the upgrade check when set.
    #[serde(default = "default_skip_env_var")]
    pub skip_env_var: String,

    /// User-Agent header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for UpgradeConfig {
    fn default() -> Self {
        Self {
            tool_name: default_tool_name(),
            tags_url: default_tags_url(),
            download_base_url: default_download_base_url(),
            check_timeout_secs: default_check_timeout(),
            skip_env_var: default_skip_env_var(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_tool_name() -> String {
    "plandex".to_string()
}

fn default_tags_url() -> String {
    "https://api.github.com/repos/shipdocs/plandex/tags".to_string()
}

fn default_download_base_url() -> String {
    "https://github.com/shipdocs/plandex".to_string()
}

const fn default_check_timeout() -> u64 {
    10
}

fn default_skip_env_var() -> String {
    "PLANDEX_SKIP_UPGRADE".to_string()
}

fn default_user_agent() -> String {
    format!("plandex/{}", env!("CARGO_PKG_VERSION"))
}

impl UpgradeConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Save configuration to a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn to_file(&self, path: &Path) -> crate::Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load from `path` if given, else from the default location when it
    /// exists, else fall back to defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> crate::Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }
        match default_config_path() {
            Some(path) if path.is_file() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Timeout applied to the version check.
    #[must_use]
    pub fn check_timeout(&self) -> Duration {
        Duration::from_secs(self.check_timeout_secs)
    }
}

/// Default configuration file path (`<config dir>/upgrade.toml`).
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "plandex")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}
