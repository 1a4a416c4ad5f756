//! Decorative spinner shown while the upgrade flow blocks.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Terminal spinner. Purely cosmetic; nothing in the flow waits on it.
pub struct Spinner {
    bar: Option<ProgressBar>,
    visible: bool,
}

impl Spinner {
    /// A spinner drawn on stderr (indicatif skips drawing off-terminal).
    #[must_use]
    pub fn new() -> Self {
        Self {
            bar: None,
            visible: true,
        }
    }

    /// A spinner that never draws.
    #[must_use]
    pub fn hidden() -> Self {
        Self {
            bar: None,
            visible: false,
        }
    }

    /// Start (or restart) spinning with `msg`.
    pub fn start(&mut self, msg: &str) {
        self.stop();

        let bar = if self.visible {
            ProgressBar::new_spinner()
        } else {
            ProgressBar::hidden()
        };
        if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
            bar.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
        }
        bar.set_message(msg.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        self.bar = Some(bar);
    }

    /// Stop spinning and erase the line.
    pub fn stop(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }

    /// Whether a spinner is currently running.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.bar.is_some()
    }
}

impl Default for Spinner {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        self.stop();
    }
}
