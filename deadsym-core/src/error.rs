//! Typed error handling for deadsym.
//!
//! Provides structured errors that library consumers can match on,
//! with context about what went wrong and where. Analysis itself never
//! fails on bad input: parse problems are recovered into empty results,
//! so most of these variants surface at the I/O, cache and service seams.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for deadsym operations.
#[derive(Error, Debug)]
pub enum DeadsymError {
    /// I/O error when reading/writing files
    #[error("I/O error at {path}: {message}")]
    Io {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Syntax error reported by the JS/TS parser
    #[error("Parse error in {path}: {message}")]
    Parse {
        path: PathBuf,
        message: String,
        /// Line number (1-indexed) if available
        line: Option<usize>,
        /// Column number (1-indexed) if available
        column: Option<usize>,
    },

    /// Cache-related errors
    #[error("Cache error: {message}")]
    Cache { message: String },

    /// Configuration file errors
    #[error("Config error at {path}: {message}")]
    Config { path: PathBuf, message: String },

    /// The external analysis service answered with something unusable
    #[error("Service error: {message}")]
    Service { message: String },

    /// The external analysis service is not ready to take requests
    #[error("Service unavailable ({state})")]
    ServiceUnavailable { state: String },

    /// A bounded operation ran past its deadline
    #[error("{operation} timed out after {millis}ms")]
    Timeout { operation: String, millis: u64 },

    /// Invalid argument provided
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// Generic internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DeadsymError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create a parse error without location.
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
            line: None,
            column: None,
        }
    }

    /// Create a parse error with line/column info.
    pub fn parse_at(
        path: impl Into<PathBuf>,
        message: impl Into<String>,
        line: usize,
        column: usize,
    ) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
            line: Some(line),
            column: Some(column),
        }
    }

    /// Create a cache error.
    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    /// Create a config error.
    pub fn config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a service error.
    pub fn service(message: impl Into<String>) -> Self {
        Self::Service {
            message: message.into(),
        }
    }

    /// Create a service-unavailable error naming the handle state.
    pub fn unavailable(state: impl Into<String>) -> Self {
        Self::ServiceUnavailable {
            state: state.into(),
        }
    }

    /// Create a timeout error.
    pub fn timeout(operation: impl Into<String>, millis: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            millis,
        }
    }

    /// Create an invalid-argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Check if this is a recoverable error (analysis can continue with
    /// fewer findings).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Parse { .. }
                | Self::Cache { .. }
                | Self::Config { .. }
                | Self::Service { .. }
                | Self::ServiceUnavailable { .. }
                | Self::Timeout { .. }
        )
    }

    /// Get the path associated with this error, if any.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::Io { path, .. } => Some(path),
            Self::Parse { path, .. } => Some(path),
            Self::Config { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Convenience type alias for deadsym results.
pub type DeadsymResult<T> = Result<T, DeadsymError>;

/// Extension trait for converting std::io::Error with path context.
pub trait IoResultExt<T> {
    /// Add path context to an I/O error.
    fn with_path(self, path: impl Into<PathBuf>) -> DeadsymResult<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> DeadsymResult<T> {
        self.map_err(|e| DeadsymError::io(path, e))
    }
}
