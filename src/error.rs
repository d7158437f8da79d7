//! Error types for the seedpath library
//!
//! Every fallible operation returns [`Result<T>`]. The variants fall into
//! three groups that callers usually treat differently:
//!
//! - **Manifest errors**: the torrent file cannot be read or parsed. Nothing
//!   has been searched or linked yet.
//! - **Configuration errors**: no locations, a broken locations file, or a
//!   lock requested on a key the [`Combinator`](crate::Combinator) never saw.
//! - **Link errors**: a final link or its parent directory could not be
//!   created. Materialization still attempts the remaining links before the
//!   first of these is returned.
//!
//! Content verification outcomes are not errors; see
//! [`Verification`](crate::types::Verification).

use std::path::PathBuf;
use thiserror::Error;

/// Type alias for Results in the seedpath library
pub type Result<T> = std::result::Result<T, SeedpathError>;

/// Main error type for all seedpath operations
#[derive(Debug, Error)]
pub enum SeedpathError {
    /// I/O errors during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Torrent file is unreadable or malformed
    #[error("Failed to read torrent {}: {reason}", .path.display())]
    Manifest {
        /// Path to the torrent file
        path: PathBuf,
        /// What went wrong
        reason: String,
    },

    /// No potential download location was configured
    #[error("You must provide at least one potential download location")]
    NoLocations,

    /// Lock requested for a key that was never registered
    #[error("Cannot lock unknown key: {0:?}")]
    UnknownKey(String),

    /// Locations file could not be read or contains an invalid entry
    #[error("{}{reason}", config_position(.path, .line))]
    Config {
        /// Locations file, if the entry came from one
        path: Option<PathBuf>,
        /// 1-based line number within `path`
        line: Option<usize>,
        /// What went wrong
        reason: String,
    },

    /// Parent directory of a link could not be created
    #[error("Failed to create directory {}: {reason}", .path.display())]
    CreateDirectory {
        /// Directory that could not be created
        path: PathBuf,
        /// Underlying error message
        reason: String,
    },

    /// Final or temporary link could not be created
    #[error("Failed to link {} to {}: {reason}", .from.display(), .to.display())]
    Link {
        /// Existing file the link points at
        from: PathBuf,
        /// Path of the link
        to: PathBuf,
        /// Underlying error message
        reason: String,
    },

    /// Staging directory survived its release
    #[error("Staging directory was not removed: {0:?}")]
    StagingLeak(PathBuf),

    /// Generic error for unexpected conditions
    #[error("Internal error: {0}")]
    Internal(String),
}

fn config_position(path: &Option<PathBuf>, line: &Option<usize>) -> String {
    match (path, line) {
        (Some(path), Some(line)) => format!("{}@{}: ", path.display(), line),
        (Some(path), None) => format!("{}: ", path.display()),
        _ => String::new(),
    }
}

impl SeedpathError {
    /// Create a manifest error for `path`
    pub fn manifest(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        SeedpathError::Manifest {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a configuration error that is not tied to a file position
    pub fn config(reason: impl Into<String>) -> Self {
        SeedpathError::Config {
            path: None,
            line: None,
            reason: reason.into(),
        }
    }

    /// Create an internal error with a custom message
    pub fn internal(msg: impl Into<String>) -> Self {
        SeedpathError::Internal(msg.into())
    }

    /// Attach a locations file position to a configuration error
    ///
    /// Errors that already carry a position, and errors of any other kind,
    /// are returned unchanged.
    pub fn at_line(self, path: impl Into<PathBuf>, line: usize) -> Self {
        match self {
            SeedpathError::Config {
                path: None,
                line: None,
                reason,
            } => SeedpathError::Config {
                path: Some(path.into()),
                line: Some(line),
                reason,
            },
            other => other,
        }
    }

    /// Check if this error stems from misconfiguration
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SeedpathError::NoLocations
                | SeedpathError::UnknownKey(_)
                | SeedpathError::Config { .. }
        )
    }

    /// Check if this error was raised while creating a link
    pub fn is_link(&self) -> bool {
        matches!(
            self,
            SeedpathError::CreateDirectory { .. } | SeedpathError::Link { .. }
        )
    }

    /// Get a user-friendly error message with suggestions
    pub fn user_message(&self) -> String {
        match self {
            SeedpathError::NoLocations => {
                "No locations specified. Pass --location or add lines to the locations file."
                    .to_string()
            }
            SeedpathError::Link { from, to, reason } if reason.contains("ermission") => {
                format!(
                    "Permission denied while linking {} to {}. Check that the download \
                     location is writable.",
                    from.display(),
                    to.display()
                )
            }
            _ => self.to_string(),
        }
    }
}
