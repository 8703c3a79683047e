//! Unified error handling for zipdelta
//!
//! Every failure the front end can observe is one of the variants below.
//! Archive and comparison failures are user facing; index misses during
//! selection sync are internal and only ever logged.

use std::path::PathBuf;
use thiserror::Error;

use crate::types::Side;

/// Unified error type for all zipdelta operations
#[derive(Error, Debug)]
pub enum Error {
    // ==================== I/O Errors ====================

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    // ==================== Archive Errors ====================

    /// The archive could not be opened or its directory could not be parsed
    #[error("Cannot read archive {}: {reason}", .path.display())]
    ArchiveUnreadable {
        path: PathBuf,
        reason: String,
    },

    /// One or both archive paths were empty when a comparison was requested
    #[error("Please select both archives (missing: {missing})")]
    MissingSelection {
        missing: String,
    },

    // ==================== Engine Errors ====================

    /// A full path has no entry in the cross-tree index
    #[error("Path not indexed: {path}")]
    PathNotIndexed {
        path: String,
    },

    /// Unexpected failure while building or classifying the trees
    #[error("Comparison failed: {message}")]
    ComparisonError {
        message: String,
    },

    // ==================== Configuration Errors ====================

    /// Invalid configuration
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        message: String,
    },

    // ==================== General Errors ====================

    /// Internal error (should not happen)
    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },

    /// Custom error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

/// Result type using the unified Error
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an error with additional context
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Error::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Create an unreadable-archive error
    pub fn archive_unreadable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Error::ArchiveUnreadable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a missing-selection error naming the sides without a path
    pub fn missing_selection(sides: &[Side]) -> Self {
        let missing = sides
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        Error::MissingSelection { missing }
    }

    /// Create a path-not-indexed error
    pub fn path_not_indexed(path: impl Into<String>) -> Self {
        Error::PathNotIndexed { path: path.into() }
    }

    /// Create a comparison error
    pub fn comparison(message: impl Into<String>) -> Self {
        Error::ComparisonError {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal {
            message: message.into(),
        }
    }

    /// Strip any context wrappers and return the innermost error
    pub fn root(&self) -> &Error {
        match self {
            Error::WithContext { source, .. } => source.root(),
            other => other,
        }
    }

    /// Check if this is a "not found" type error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self.root(),
            Error::FileNotFound(_) | Error::PathNotIndexed { .. }
        )
    }

    /// Whether the error should be reported to the user.
    ///
    /// Index misses are recovered where they happen and never escalate.
    pub fn is_user_facing(&self) -> bool {
        !matches!(self.root(), Error::PathNotIndexed { .. })
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}
