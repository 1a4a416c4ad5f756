//! Upgrade confirmation.

use crate::error::{Error, Result};
use dialoguer::Confirm;
use owo_colors::OwoColorize;
use semver::Version;

/// Asks the user whether to install an available upgrade.
pub trait Prompter {
    /// Present `current` and `latest` and block until the user answers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Prompt`] if the answer cannot be read.
    fn confirm(&self, current: &Version, latest: &Version) -> Result<bool>;
}

/// Interactive terminal prompter.
#[derive(Debug, Clone)]
pub struct TerminalPrompter {
    tool_name: String,
}

impl TerminalPrompter {
    /// Create a prompter that names `tool_name` in its messages.
    #[must_use]
    pub fn new(tool_name: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
        }
    }
}

impl Prompter for TerminalPrompter {
    fn confirm(&self, current: &Version, latest: &Version) -> Result<bool> {
        println!(
            "A new version of {} is available: {}",
            self.tool_name,
            latest.to_string().bold().bright_green()
        );
        println!("Current version: {}", current.to_string().bold().bright_cyan());

        Confirm::new()
            .with_prompt("Upgrade to the latest version?")
            .interact()
            .map_err(|e| Error::Prompt(e.to_string()))
    }
}

/// Prompter that always gives the same answer.
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

impl Prompter for FixedAnswer {
    fn confirm(&self, _current: &Version, _latest: &Version) -> Result<bool> {
        Ok(self.0)
    }
}
