//! Error types shared by the handle layer, the file-stream engine and the
//! storage adapter.
//!
//! Propagation policy: every error surfaces immediately to the caller.
//! There is no retry (a failed statement may poison the surrounding
//! transaction) and no suppression; the correct response to a failure is
//! to abort the transaction.

use thiserror::Error;

use crate::lo::Loid;

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Large-object storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// A large-object operation was attempted with no open transaction.
    /// The engine never opens one on the caller's behalf.
    #[error("no active transaction")]
    NoActiveTransaction,

    /// A prior failed statement aborted the transaction; further commands
    /// are ignored until the transaction block ends. PostgreSQL reports
    /// this as SQLSTATE 25P02, surfaced here as [`Backend`](Self::Backend);
    /// the in-memory backend raises this variant directly.
    #[error("current transaction is aborted")]
    TransactionAborted,

    /// The referenced large object does not exist.
    #[error("large object {0} does not exist")]
    ObjectNotFound(Loid),

    /// Operation forbidden by the stream's open mode.
    #[error("stream is not open for {0}")]
    Mode(&'static str),

    /// Operation attempted after the stream was closed.
    #[error("stream is closed")]
    ClosedStream,

    /// Name does not follow the `<loid>.<ext>` convention.
    #[error("invalid file name: {0}")]
    InvalidName(String),

    /// No base URL is configured.
    #[error("the file is not available at a URL")]
    NoUrl,

    /// Database error, passed through unmodified.
    #[error(transparent)]
    Backend(#[from] postgres::Error),

    /// I/O error while reading the content source of a save.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            StorageError::NoActiveTransaction => 500,
            StorageError::TransactionAborted => 500,
            StorageError::ObjectNotFound(_) => 404,
            StorageError::Mode(_) => 500,
            StorageError::ClosedStream => 500,
            StorageError::InvalidName(_) => 400,
            StorageError::NoUrl => 404,
            StorageError::Backend(_) => 500,
            StorageError::Io(_) => 500,
        }
    }
}
