//! Progress indication for batches and listings
//!
//! Batches count finished files rather than bytes: each worker moves a whole
//! file and reports once.

use std::time::Duration;

use super::OutputConfig;

/// Progress bar wrapper
///
/// Handles progress display based on output configuration.
/// In quiet or JSON mode, progress is suppressed.
#[derive(Debug)]
pub struct ProgressBar {
    bar: Option<indicatif::ProgressBar>,
}

impl ProgressBar {
    /// Create a counter of finished files
    ///
    /// The batch size is only known inside the flow, so this counts up
    /// without a fixed length.
    pub fn counter(config: &OutputConfig, label: &str) -> Self {
        let bar = if hidden(config) {
            None
        } else {
            let bar = indicatif::ProgressBar::new_spinner();
            if let Ok(style) = indicatif::ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}: {pos} file(s) done ({elapsed})")
            {
                bar.set_style(style);
            }
            bar.set_message(label.to_string());
            bar.enable_steady_tick(Duration::from_millis(100));
            Some(bar)
        };

        Self { bar }
    }

    /// Create a spinner for indeterminate progress
    pub fn spinner(config: &OutputConfig, message: &str) -> Self {
        let bar = if hidden(config) {
            None
        } else {
            let bar = indicatif::ProgressBar::new_spinner();
            if let Ok(style) =
                indicatif::ProgressStyle::default_spinner().template("{spinner:.green} {msg}")
            {
                bar.set_style(style);
            }
            bar.set_message(message.to_string());
            bar.enable_steady_tick(Duration::from_millis(100));
            Some(bar)
        };

        Self { bar }
    }

    /// Increment progress
    pub fn inc(&self, delta: u64) {
        if let Some(bar) = &self.bar {
            bar.inc(delta);
        }
    }

    /// Print a line above the bar without breaking it
    pub fn println(&self, message: &str) {
        match &self.bar {
            Some(bar) => bar.println(message),
            None => println!("{message}"),
        }
    }

    /// Finish and clear the progress bar
    pub fn finish_and_clear(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }

    /// Check if progress bar is visible
    pub fn is_visible(&self) -> bool {
        self.bar.is_some()
    }
}

fn hidden(config: &OutputConfig) -> bool {
    config.quiet || config.json || config.no_progress
}
