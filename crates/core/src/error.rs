//! Error types for fs3-core
//!
//! Provides a unified error type that can be converted to appropriate exit codes.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for fs3-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for fs3-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Directory walk failed; the whole scan is discarded
    #[error("Failed to scan {}: {reason}", path.display())]
    Scan { path: PathBuf, reason: String },

    /// A local path could not be made absolute
    #[error("Could not resolve path {}: {reason}", path.display())]
    PathResolution { path: PathBuf, reason: String },

    /// Local source file is missing or cannot be opened
    #[error("Cannot read {}: {reason}", path.display())]
    SourceUnreadable { path: PathBuf, reason: String },

    /// Object key is not present in the bucket
    #[error("Object key does not exist in the bucket: {0}")]
    ObjectNotFound(String),

    /// Store rejected an upload
    #[error("{} could not be uploaded: {cause}", path.display())]
    UploadFailed { path: PathBuf, cause: String },

    /// Store rejected a download, or the local write failed
    #[error("{key} could not be downloaded: {cause}")]
    DownloadFailed { key: String, cause: String },

    /// Operation exists but is not implemented for this case
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// The user declined the confirmation prompt
    #[error("Aborted")]
    UserAborted,

    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// Authentication error
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Network error (retryable)
    #[error("Network error: {0}")]
    Network(String),

    /// General error
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Get the appropriate exit code for this error
    pub const fn exit_code(&self) -> i32 {
        match self {
            // Declining a prompt is not a failure
            Error::UserAborted => 0,
            Error::PathResolution { .. } | Error::Config(_) => 2, // UsageError
            Error::Network(_) => 3,                               // NetworkError
            Error::Auth(_) => 4,                                  // AuthError
            Error::ObjectNotFound(_) | Error::SourceUnreadable { .. } => 5, // NotFound
            Error::Unsupported(_) => 7, // UnsupportedFeature
            _ => 1,                     // GeneralError
        }
    }

    /// Whether this error should be reported as a failure
    pub const fn is_failure(&self) -> bool {
        !matches!(self, Error::UserAborted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_exit_codes() {
        assert_eq!(Error::UserAborted.exit_code(), 0);
        assert_eq!(Error::Config("test".into()).exit_code(), 2);
        assert_eq!(
            Error::PathResolution {
                path: "x".into(),
                reason: "test".into()
            }
            .exit_code(),
            2
        );
        assert_eq!(Error::Network("test".into()).exit_code(), 3);
        assert_eq!(Error::Auth("test".into()).exit_code(), 4);
        assert_eq!(Error::ObjectNotFound("test".into()).exit_code(), 5);
        assert_eq!(Error::Unsupported("test".into()).exit_code(), 7);
        assert_eq!(
            Error::UploadFailed {
                path: "a.txt".into(),
                cause: "boom".into()
            }
            .exit_code(),
            1
        );
        assert_eq!(Error::General("test".into()).exit_code(), 1);
    }

    #[test]
    fn test_user_abort_is_not_failure() {
        assert!(!Error::UserAborted.is_failure());
        assert!(Error::ObjectNotFound("k".into()).is_failure());
    }

    #[test]
    fn test_error_display() {
        let err = Error::ObjectNotFound("sync/a.txt".into());
        assert_eq!(
            err.to_string(),
            "Object key does not exist in the bucket: sync/a.txt"
        );

        let err = Error::UploadFailed {
            path: "/tmp/a.txt".into(),
            cause: "timeout".into(),
        };
        assert_eq!(err.to_string(), "/tmp/a.txt could not be uploaded: timeout");
    }
}
