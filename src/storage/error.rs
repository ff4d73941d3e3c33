use thiserror::Error;

use crate::library::error::LibraryError;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("malformed library json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("filesystem error: {0}")]
    Fs(#[from] std::io::Error),

    #[error("invalid backup: {0}")]
    InvalidBackup(#[from] LibraryError),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
