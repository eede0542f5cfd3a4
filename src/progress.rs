//! Progress display for long-running commands
//!
//! A single spinner on stderr with a fixed prefix and a running message,
//! using indicatif. Disabled reporters accept every call and draw nothing.

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Progress reporter for one command
pub struct Progress {
    /// Whether progress display is enabled
    enabled: bool,
    /// Current spinner
    bar: Option<ProgressBar>,
}

impl Progress {
    /// Create a new progress reporter
    pub fn new(enabled: bool) -> Self {
        Self { enabled, bar: None }
    }

    /// Create a disabled progress reporter
    pub fn disabled() -> Self {
        Self::new(false)
    }

    /// Show a spinner for an indeterminate operation
    pub fn spinner(&mut self, prefix: &str) {
        if !self.enabled {
            return;
        }

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(spinner_style());
        spinner.set_prefix(prefix.to_string());
        spinner.enable_steady_tick(Duration::from_millis(80));
        self.bar = Some(spinner);
    }

    /// Update the running message
    pub fn set_message(&self, message: &str) {
        if let Some(ref bar) = self.bar {
            bar.set_message(message.to_string());
        }
    }

    /// Finish the spinner, leaving a success line with `message`
    pub fn finish(&mut self, message: &str) {
        if let Some(bar) = self.bar.take() {
            bar.set_style(done_style());
            bar.finish_with_message(format!("{} {}", "✔".green(), message));
        }
    }

    /// Stop the spinner, leaving its last message on screen
    pub fn abandon(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.set_style(done_style());
            bar.abandon_with_message(format!("{} {}", "✖".red(), bar.message()));
        }
    }

    /// Finish and clear the spinner
    pub fn finish_and_clear(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::new(true)
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.cyan} {prefix}: {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
}

fn done_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{prefix}: {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}
