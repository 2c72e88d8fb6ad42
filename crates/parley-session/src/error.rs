//! Error types for session operations

use parley_persistence::StorageError;
use thiserror::Error;

/// Session errors
#[derive(Debug, Error)]
pub enum SessionError {
    /// Login form input rejected
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entered code does not match the one sent
    #[error("Invalid OTP")]
    InvalidOtp,

    /// `verify_otp` called before `request_otp`
    #[error("No OTP has been requested")]
    NoPendingOtp,

    #[error("Chatroom name can't be empty")]
    EmptyRoomTitle,

    #[error("Chatroom '{0}' not found")]
    RoomNotFound(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Convenient Result type alias
pub type Result<T> = std::result::Result<T, SessionError>;
