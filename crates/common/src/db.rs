//! Shared persistence error type
//!
//! Stores report their failures through `RepositoryError`; the conversion
//! into the HTTP-facing `Error` decides what a caller gets to see.

use crate::error::Error;
use thiserror::Error;

/// Store-specific error types
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Database connection error: {0}")]
    Connection(#[from] sqlx::Error),

    #[error("Store lock poisoned: {0}")]
    Poisoned(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl From<RepositoryError> for Error {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Connection(e) => Error::Database(e),
            RepositoryError::Poisoned(msg) | RepositoryError::Unavailable(msg) => {
                Error::StorageUnavailable(msg)
            }
            RepositoryError::InvalidData(msg) => Error::InvalidInput(msg),
        }
    }
}
