//! Unified error types for gemini-search.
//!
//! Storage failures surface through [`Error`]; backend invocation failures
//! have their own [`crate::backend::BackendError`] since the orchestrator
//! folds those into failure results instead of propagating them.

use tokio_rusqlite::rusqlite;

/// Unified error types for the gemini-search core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// A stored cache row could not be decoded.
    #[error("CACHE_ERROR: corrupt entry {key}: {reason}")]
    CorruptEntry { key: String, reason: String },

    /// Cache directory or analytics file could not be accessed.
    #[error("IO_ERROR: {0}")]
    Io(#[from] std::io::Error),

    /// Analytics state could not be encoded or decoded.
    #[error("ANALYTICS_ERROR: {0}")]
    Analytics(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Analytics(err.to_string())
    }
}
