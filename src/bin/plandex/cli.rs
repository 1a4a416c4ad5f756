//! Command-line interface definition.

use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use plandex_update::{check_latest, Deadline, UpgradeConfig, CURRENT_VERSION};
use std::path::PathBuf;
use tracing::warn;

/// Plandex command-line tool.
#[derive(Parser, Debug)]
#[command(name = "plandex")]
#[command(author, version = CURRENT_VERSION, about, long_about = None)]
pub struct Cli {
    /// Path to the upgrade configuration file.
    #[arg(long, short, global = true, env = "PLANDEX_UPGRADE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level.
    #[arg(long, global = true, default_value = "warn", env = "RUST_LOG")]
    pub log_level: String,

    /// Skip the upgrade check for this run.
    #[arg(long, global = true)]
    pub skip_upgrade: bool,

    /// Command to run.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Top-level commands.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Print the version of this build.
    Version,
    /// Report whether a newer release exists without installing it.
    Check,
}

impl Cli {
    /// Load the upgrade configuration, falling back to defaults when the
    /// file is unreadable so a bad file never blocks the command.
    #[must_use]
    pub fn load_config(&self) -> UpgradeConfig {
        UpgradeConfig::load(self.config.as_deref()).unwrap_or_else(|e| {
            warn!("Ignoring upgrade configuration: {e}");
            UpgradeConfig::default()
        })
    }

    /// The command to run, `version` when none was given.
    #[must_use]
    pub fn command(&self) -> Command {
        self.command.unwrap_or(Command::Version)
    }

    /// Whether the upgrade flow runs before the command.
    #[must_use]
    pub fn runs_upgrade_check(&self) -> bool {
        self.command() != Command::Check
    }
}

impl Command {
    /// Execute the command.
    ///
    /// # Errors
    ///
    /// Returns an error if the release check fails.
    pub async fn run(self, config: &UpgradeConfig) -> color_eyre::Result<()> {
        match self {
            Self::Version => {
                println!("{CURRENT_VERSION}");
            }
            Self::Check => {
                let deadline = Deadline::after(config.check_timeout());
                let check = check_latest(config, CURRENT_VERSION, &deadline).await?;
                println!(
                    "Current version: {}",
                    check.current.to_string().bold().bright_cyan()
                );
                println!(
                    "Latest version:  {}",
                    check.latest.to_string().bold().bright_green()
                );
                if check.upgrade_available() {
                    println!("An upgrade is available");
                } else {
                    println!("Up to date");
                }
            }
        }
        Ok(())
    }
}
