//! Error types for relay.

use thiserror::Error;

/// Errors that can occur in relay operations.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Store error: {0}")]
    Persistence(String),

    #[error("Nothing to export: the course has no events")]
    NothingToExport,

    #[error("You need to be signed in to do that")]
    NotSignedIn,

    #[error("Course not found: {0}")]
    CourseNotFound(String),

    #[error("Event not found: {0}")]
    EventNotFound(String),

    #[error("Another change is still being saved")]
    Busy,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("ICS parse error: {0}")]
    IcsParse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RelayError {
    pub fn validation(msg: impl Into<String>) -> Self {
        RelayError::Validation(msg.into())
    }

    pub fn persistence(err: impl std::fmt::Display) -> Self {
        RelayError::Persistence(err.to_string())
    }
}

/// Result type alias for relay operations.
pub type RelayResult<T> = Result<T, RelayError>;
