//! Output formatter for human-readable and JSON output
//!
//! Ensures consistent output formatting across all commands.

use console::style;
use serde::Serialize;

use super::OutputConfig;

/// Formatter for CLI output
///
/// Handles both human-readable and JSON output formats based on configuration.
/// When JSON mode is enabled, all output is strict JSON without colors or progress.
#[derive(Debug, Clone)]
pub struct Formatter {
    config: OutputConfig,
}

impl Formatter {
    /// Create a new formatter with the given configuration
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    /// Check if JSON output mode is enabled
    pub fn is_json(&self) -> bool {
        self.config.json
    }

    /// Check if quiet mode is enabled
    pub fn is_quiet(&self) -> bool {
        self.config.quiet
    }

    /// Check if colors are enabled
    pub fn colors_enabled(&self) -> bool {
        !self.config.no_color && !self.config.json
    }

    pub fn config(&self) -> &OutputConfig {
        &self.config
    }

    /// Output a success message
    pub fn success(&self, message: &str) {
        if self.config.quiet || self.config.json {
            return;
        }
        println!("{} {message}", self.marker("✓", Marker::Success));
    }

    /// Output an error message
    ///
    /// Errors are always printed, even in quiet mode.
    pub fn error(&self, message: &str) {
        if self.config.json {
            let error = serde_json::json!({ "error": message });
            eprintln!(
                "{}",
                serde_json::to_string_pretty(&error).unwrap_or_else(|_| message.to_string())
            );
        } else {
            eprintln!("{} {message}", self.marker("✗", Marker::Error));
        }
    }

    /// Output a warning message
    pub fn warning(&self, message: &str) {
        if self.config.quiet || self.config.json {
            return;
        }
        eprintln!("{} {message}", self.marker("⚠", Marker::Warning));
    }

    /// Output JSON directly
    pub fn json<T: Serialize>(&self, value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("Error serializing output: {e}"),
        }
    }

    /// Print a line of text (respects quiet mode)
    pub fn println(&self, message: &str) {
        if self.config.quiet {
            return;
        }
        println!("{message}");
    }

    fn marker(&self, symbol: &'static str, kind: Marker) -> String {
        if !self.colors_enabled() {
            return symbol.to_string();
        }
        let styled = match kind {
            Marker::Success => style(symbol).green(),
            Marker::Error => style(symbol).red(),
            Marker::Warning => style(symbol).yellow(),
        };
        styled.to_string()
    }
}

#[derive(Debug, Clone, Copy)]
enum Marker {
    Success,
    Error,
    Warning,
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new(OutputConfig::default())
    }
}
