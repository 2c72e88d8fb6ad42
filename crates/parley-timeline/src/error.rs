//! Error types for opening a timeline

use thiserror::Error;

/// Timeline errors
///
/// Runtime failures (storage, backfill) never surface here; they are logged
/// and reported through the session's notifier instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimelineError {
    /// A timeline must be scoped to a real room
    #[error("Room id must not be blank")]
    InvalidRoom,
}

/// Convenient Result type alias
pub type Result<T> = std::result::Result<T, TimelineError>;
