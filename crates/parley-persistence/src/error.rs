//! Error types for storage operations

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// SQLite / connection error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Stored value could not be encoded or decoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Backend refused the operation
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Convenient Result type alias
pub type Result<T> = std::result::Result<T, StorageError>;
