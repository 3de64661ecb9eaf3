//! Exit code definitions for the fs3 CLI
//!
//! Scripts depend on these values. Changing one is a breaking change.

use fs3_core::Error;

/// Exit codes for the fs3 CLI application.
///
/// These codes follow a consistent convention to allow scripts and automation
/// to handle different error scenarios appropriately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Operation completed successfully, or the user declined a prompt
    Success = 0,

    /// General/unspecified error, including a batch with failed files
    GeneralError = 1,

    /// User input error: invalid arguments, unusable configuration
    UsageError = 2,

    /// Retryable network error: timeout, connection reset, 503, etc.
    NetworkError = 3,

    /// Authentication or permission failure
    AuthError = 4,

    /// Object key or local file does not exist
    NotFound = 5,

    /// Operation is not implemented for this input (e.g. large downloads)
    UnsupportedFeature = 7,

    /// Operation was interrupted (e.g., Ctrl+C)
    Interrupted = 130,
}

impl ExitCode {
    /// Convert exit code to i32 for use with std::process::exit
    #[inline]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// Create exit code from i32 value
    ///
    /// Returns None if the value doesn't correspond to a known exit code.
    pub const fn from_i32(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Success),
            1 => Some(Self::GeneralError),
            2 => Some(Self::UsageError),
            3 => Some(Self::NetworkError),
            4 => Some(Self::AuthError),
            5 => Some(Self::NotFound),
            7 => Some(Self::UnsupportedFeature),
            130 => Some(Self::Interrupted),
            _ => None,
        }
    }

    /// Exit code for a core error
    pub fn from_error(err: &Error) -> Self {
        Self::from_i32(err.exit_code()).unwrap_or(Self::GeneralError)
    }

    /// Get a human-readable description of the exit code
    pub const fn description(self) -> &'static str {
        match self {
            Self::Success => "Operation completed successfully",
            Self::GeneralError => "General error",
            Self::UsageError => "Invalid arguments or configuration",
            Self::NetworkError => "Network error (retryable)",
            Self::AuthError => "Authentication or permission failure",
            Self::NotFound => "Resource not found",
            Self::UnsupportedFeature => "Operation not supported",
            Self::Interrupted => "Operation interrupted",
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code.as_i32()
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.description(), self.as_i32())
    }
}
