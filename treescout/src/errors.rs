/// Error types for treescout searches.
///
/// A search only fails for things that stop the traversal itself: an unreadable
/// directory, a failed stat, a callback that asked to stop, or a cancellation.
/// Hidden paths, exhausted symlink depth and queries that cannot be interpreted
/// are not errors and never surface here.
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for search operations
pub type SearchResult<T> = Result<T, SearchError>;

/// Boxed error returned by a match callback
pub type CallbackError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur during search operations
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Scope not found: {0}")]
    ScopeNotFound(PathBuf),
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Match callback failed: {0}")]
    Callback(CallbackError),
    #[error("Search cancelled")]
    Cancelled,
    #[error("Invalid rule: {0}")]
    InvalidRule(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl SearchError {
    /// Wraps an I/O failure with the path it happened on. `NotFound` on the
    /// scope itself is reported separately by the walker.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn scope_not_found(path: impl AsRef<Path>) -> Self {
        Self::ScopeNotFound(path.as_ref().to_path_buf())
    }

    pub fn callback(err: impl Into<CallbackError>) -> Self {
        Self::Callback(err.into())
    }

    pub fn invalid_rule(msg: impl Into<String>) -> Self {
        Self::InvalidRule(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// True for the cancellation outcome, as opposed to a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
