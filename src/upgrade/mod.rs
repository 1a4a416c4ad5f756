//! Self-upgrade flow.
//!
//! This module handles:
//! - Discovering the latest CLI release from the tag listing
//! - Asking the user before touching anything
//! - Downloading and unpacking the platform archive
//! - Atomically replacing the running binary
//! - Re-running the original invocation on the new binary
//!
//! ```text
//! CheckingVersion ──error / not newer──▶ UpToDate
//!        │
//!        ▼
//! UpdateAvailable ──no──▶ Declined
//!        │ yes
//!        ▼
//! Downloading ─▶ Extracting ─▶ Patching ──error──▶ Failed (fatal)
//!                                  │
//!                                  ▼
//!                             Respawning ─▶ exit with child's status
//! ```
//!
//! Nothing before the confirmation can stop the caller's command from
//! running. Everything after it either completes or ends the process.

mod deadline;
mod extract;
mod fetch;
mod monitor;
mod patch;
mod progress;
mod prompt;
mod respawn;
mod version;

pub use deadline::Deadline;
pub use extract::{extract_binary, extract_from_file};
pub use fetch::{DownloadedArchive, Platform, ReleaseFetcher};
pub use monitor::{scan_tag_listing, VersionOracle};
pub use patch::{BinaryPatcher, StagedBinary};
pub use progress::Spinner;
pub use prompt::{FixedAnswer, Prompter, TerminalPrompter};
pub use respawn::{respawn, ProcessInvocation};
pub use version::{
    compare, is_development_build, is_upgrade, parse_version, ReleaseTag, DEVELOPMENT_VERSION,
    TAG_PREFIX,
};

use crate::config::UpgradeConfig;
use crate::error::{Error, Result};
use owo_colors::OwoColorize;
use semver::Version;
use std::fmt;
use std::path::Path;
use tracing::{debug, info, warn};

/// Exit status used when an accepted upgrade cannot be completed.
pub const FATAL_EXIT_CODE: i32 = 1;

/// Stages of the upgrade flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpgradeStage {
    /// Querying the tag listing and comparing versions.
    CheckingVersion,
    /// A newer version exists; waiting on the user.
    UpdateAvailable,
    /// Fetching the release archive.
    Downloading,
    /// Locating the binary inside the archive.
    Extracting,
    /// Replacing the executable.
    Patching,
    /// Running the new binary.
    Respawning,
}

impl fmt::Display for UpgradeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CheckingVersion => "checking version",
            Self::UpdateAvailable => "update available",
            Self::Downloading => "downloading",
            Self::Extracting => "extracting",
            Self::Patching => "patching",
            Self::Respawning => "respawning",
        };
        f.write_str(name)
    }
}

/// How one pass through the upgrade flow ended.
#[derive(Debug)]
pub enum UpdateOutcome {
    /// The flow was disabled and made no request.
    NoUpdateChecked,
    /// No newer release, or the check failed.
    UpToDate,
    /// The user said no, or no answer could be read. Nothing was written.
    Declined {
        /// Whether the user actually answered.
        answered: bool,
    },
    /// The executable now holds `version`.
    Applied {
        /// Installed version.
        version: Version,
    },
    /// An accepted upgrade failed.
    Failed {
        /// Where it failed.
        stage: UpgradeStage,
        /// Why it failed.
        error: Error,
    },
}

/// What the caller should do after the upgrade flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Continuation {
    /// Carry on with the command that was requested.
    RunCommand,
    /// Terminate with this status.
    Exit(i32),
}

/// Result of comparing the running version with the latest release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionCheck {
    /// Version of the running build.
    pub current: Version,
    /// Latest version named by the tag listing.
    pub latest: Version,
}

impl VersionCheck {
    /// Whether `latest` is newer than `current`.
    #[must_use]
    pub fn upgrade_available(&self) -> bool {
        is_upgrade(&self.current, &self.latest)
    }
}

/// Everything one upgrade attempt needs, captured once at startup.
#[derive(Debug, Clone)]
pub struct UpgradeSession {
    config: UpgradeConfig,
    current_version: String,
    invocation: ProcessInvocation,
    platform: Platform,
    skip_requested: bool,
}

impl UpgradeSession {
    /// Create a session for an explicit invocation.
    #[must_use]
    pub fn new(
        config: UpgradeConfig,
        current_version: impl Into<String>,
        invocation: ProcessInvocation,
    ) -> Self {
        Self {
            config,
            current_version: current_version.into(),
            invocation,
            platform: Platform::current(),
            skip_requested: false,
        }
    }

    /// Create a session for the running process: its executable (symlinks
    /// resolved), its arguments, and the skip toggle from the environment.
    ///
    /// The path is resolved now because once the file is replaced the
    /// process can no longer find its installed location by itself.
    ///
    /// # Errors
    ///
    /// Returns an error if the executable path cannot be determined.
    pub fn from_env(config: UpgradeConfig, current_version: impl Into<String>) -> Result<Self> {
        let exe = std::env::current_exe()?;
        let exe = std::fs::canonicalize(&exe).unwrap_or(exe);
        let args = std::env::args_os().skip(1).collect();
        let skip = env_flag_set(&config.skip_env_var);

        Ok(Self::new(config, current_version, ProcessInvocation::new(exe, args)).with_skip(skip))
    }

    /// Override the target platform.
    #[must_use]
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Request that the flow be skipped. Never clears an earlier request.
    #[must_use]
    pub fn with_skip(mut self, skip: bool) -> Self {
        self.skip_requested |= skip;
        self
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &UpgradeConfig {
        &self.config
    }

    /// Get the running build's version identifier.
    #[must_use]
    pub fn current_version(&self) -> &str {
        &self.current_version
    }

    /// Get the invocation to re-run after an upgrade.
    #[must_use]
    pub fn invocation(&self) -> &ProcessInvocation {
        &self.invocation
    }

    /// Get the executable that will be replaced.
    #[must_use]
    pub fn executable(&self) -> &Path {
        self.invocation.executable()
    }

    /// Get the target platform.
    #[must_use]
    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    /// Whether the flow is disabled by toggle or development build.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.skip_requested || is_development_build(&self.current_version)
    }
}

fn env_flag_set(name: &str) -> bool {
    std::env::var_os(name).is_some_and(|v| !v.is_empty())
}

/// Compare `current_version` with the latest release, abandoning the
/// request once `deadline` passes.
///
/// # Errors
///
/// Returns [`Error::InvalidVersion`] if either version is malformed,
/// [`Error::Network`] on request failure or timeout, and [`Error::NotFound`]
/// if the listing names no CLI release.
pub async fn check_latest(
    config: &UpgradeConfig,
    current_version: &str,
    deadline: &Deadline,
) -> Result<VersionCheck> {
    let current = parse_version(current_version)?;
    let latest = VersionOracle::new(config)?.latest_version(deadline).await?;
    Ok(VersionCheck { current, latest })
}

/// Run the upgrade flow up to, but not including, the respawn.
///
/// Never fails: pre-confirmation problems are logged and reported as
/// [`UpdateOutcome::UpToDate`], post-confirmation ones as
/// [`UpdateOutcome::Failed`]. Pass the outcome to [`conclude`].
pub async fn check_for_upgrade<P: Prompter + ?Sized>(
    session: &UpgradeSession,
    prompter: &P,
    spinner: &mut Spinner,
) -> UpdateOutcome {
    if session.is_disabled() {
        debug!(
            "Upgrade check disabled (version {})",
            session.current_version
        );
        return UpdateOutcome::NoUpdateChecked;
    }

    debug!(stage = %UpgradeStage::CheckingVersion, "Checking for a newer release");
    spinner.start("Checking for updates");
    let deadline = Deadline::after(session.config.check_timeout());
    let check = check_latest(&session.config, &session.current_version, &deadline).await;
    spinner.stop();

    let check = match check {
        Ok(check) if check.upgrade_available() => check,
        Ok(check) => {
            debug!("Already on the latest version ({})", check.current);
            return UpdateOutcome::UpToDate;
        }
        Err(e) => {
            warn!("Upgrade check failed: {e}");
            return UpdateOutcome::UpToDate;
        }
    };

    debug!(stage = %UpgradeStage::UpdateAvailable, "{} -> {}", check.current, check.latest);
    match prompter.confirm(&check.current, &check.latest) {
        Ok(true) => {}
        Ok(false) => return UpdateOutcome::Declined { answered: true },
        Err(e) => {
            warn!("Error reading input: {e}");
            return UpdateOutcome::Declined { answered: false };
        }
    }

    spinner.start(&format!("Upgrading to {}", check.latest));
    let result = install(session, &check.latest).await;
    spinner.stop();

    match result {
        Ok(()) => {
            info!("Upgraded to {}", check.latest);
            UpdateOutcome::Applied {
                version: check.latest,
            }
        }
        Err((stage, error)) => UpdateOutcome::Failed { stage, error },
    }
}

/// Download, extract and patch. The archive is removed before returning on
/// every path.
async fn install(
    session: &UpgradeSession,
    version: &Version,
) -> std::result::Result<(), (UpgradeStage, Error)> {
    let tag = ReleaseTag::for_version(version);

    debug!(stage = %UpgradeStage::Downloading, "Fetching {tag}");
    let archive = ReleaseFetcher::new(&session.config)
        .map_err(|e| (UpgradeStage::Downloading, e))?
        .fetch(&tag, version, &session.platform)
        .await
        .map_err(|e| (UpgradeStage::Downloading, e))?;

    let binary_name = session.platform.binary_name(&session.config.tool_name);
    debug!(stage = %UpgradeStage::Extracting, "Looking for {binary_name}");
    let content = extract_from_file(archive.path(), &binary_name);
    drop(archive);
    let content = content.map_err(|e| (UpgradeStage::Extracting, e))?;

    debug!(stage = %UpgradeStage::Patching, "Replacing {}", session.executable().display());
    BinaryPatcher::new(session.executable())
        .apply(content.as_slice())
        .map_err(|e| (UpgradeStage::Patching, e))
}

/// Turn an outcome into what the caller does next, respawning the new
/// binary for [`UpdateOutcome::Applied`].
///
/// Only this function reports fatal upgrade errors; it never exits the
/// process itself.
#[must_use]
pub fn conclude(outcome: UpdateOutcome, session: &UpgradeSession) -> Continuation {
    match outcome {
        UpdateOutcome::NoUpdateChecked | UpdateOutcome::UpToDate => Continuation::RunCommand,
        UpdateOutcome::Declined { answered: false } => Continuation::RunCommand,
        UpdateOutcome::Declined { answered: true } => {
            println!(
                "Note: set {}=1 to stop upgrade prompts",
                session.config.skip_env_var
            );
            Continuation::RunCommand
        }
        UpdateOutcome::Applied { version } => {
            debug!(stage = %UpgradeStage::Respawning, "Restarting on {version}");
            match respawn(session.invocation()) {
                Ok(code) => Continuation::Exit(code),
                Err(e) => {
                    report_fatal(&e.to_string());
                    Continuation::Exit(FATAL_EXIT_CODE)
                }
            }
        }
        UpdateOutcome::Failed { stage, error } => {
            debug!("Upgrade failed while {stage}");
            report_fatal(&format!("Failed to upgrade: {error}"));
            Continuation::Exit(FATAL_EXIT_CODE)
        }
    }
}

fn report_fatal(message: &str) {
    eprintln!("{} {message}", "error:".red().bold());
}
