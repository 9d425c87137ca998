//! Typed error handling for jsshake.
//!
//! Provides structured errors that library consumers can match on,
//! with full context about what went wrong and where.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for shaking operations.
///
/// This provides typed errors that library consumers can match on,
/// unlike opaque `anyhow::Error` types.
#[derive(Error, Debug)]
pub enum ShakerError {
    /// Requested export names that the module does not provide, under the
    /// `error` unknown-export policy. Carries the full original request.
    #[error("Unknown export(s) requested: {}", requested.join(","))]
    UnknownExports { requested: Vec<String> },

    /// I/O error when reading/writing files
    #[error("I/O error at {path}: {message}")]
    Io {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Malformed or unsupported ESTree input
    #[error("AST error: {message}")]
    Ast { message: String },

    /// Configuration file errors
    #[error("Config error at {path}: {message}")]
    Config { path: PathBuf, message: String },

    /// Invalid argument provided
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },
}

impl ShakerError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create an AST lowering error.
    pub fn ast(message: impl Into<String>) -> Self {
        Self::Ast {
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

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn unknown_exports(requested: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::UnknownExports {
            requested: requested.into_iter().map(Into::into).collect(),
        }
    }

    /// Check if this is a recoverable error (a session can move on to the
    /// next module).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Ast { .. } | Self::UnknownExports { .. } | Self::Io { .. }
        )
    }

    /// Get the path associated with this error, if any.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::Io { path, .. } => Some(path),
            Self::Config { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Convenience type alias for shaker results.
pub type ShakerResult<T> = Result<T, ShakerError>;

/// Extension trait for converting std::io::Error with path context.
pub trait IoResultExt<T> {
    /// Add path context to an I/O error.
    fn with_path(self, path: impl Into<PathBuf>) -> ShakerResult<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> ShakerResult<T> {
        self.map_err(|e| ShakerError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error() {
        let err = ShakerError::io(
            PathBuf::from("/test/module.json"),
            std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
        );
        assert!(matches!(err, ShakerError::Io { .. }));
        assert_eq!(err.path(), Some(&PathBuf::from("/test/module.json")));
        assert!(err.to_string().contains("/test/module.json"));
    }

    #[test]
    fn test_unknown_exports_message_lists_request() {
        let err = ShakerError::unknown_exports(["a", "b"]);
        assert_eq!(err.to_string(), "Unknown export(s) requested: a,b");
    }

    #[test]
    fn test_is_recoverable() {
        assert!(ShakerError::ast("unexpected node").is_recoverable());
        assert!(ShakerError::unknown_exports(["x"]).is_recoverable());
        assert!(!ShakerError::config("/jsshake.toml", "bad").is_recoverable());
    }

    #[test]
    fn test_io_result_ext() {
        let result: std::io::Result<()> =
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "missing"));
        let shaker_result = result.with_path("/missing/module.json");
        assert!(shaker_result.is_err());
    }
}
