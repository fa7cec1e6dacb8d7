//! Error types for the circulation engine

use thiserror::Error;

/// Stable numeric error codes surfaced to the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Success = 0,
    Failure = 1,
    NotAuthorized = 2,
    StoreFailure = 3,
    NoSuchData = 4,
    BookNotAvailable = 5,
    Duplicate = 6,
    MaxExtensionsReached = 7,
    NotExtendable = 8,
    WrongState = 9,
}

/// Main engine error type
///
/// Every operation reports a precise kind; the presentation layer decides
/// what the reader sees. The engine never retries and never recovers
/// silently.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not allowed: {0}")]
    NotAllowed(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

impl EngineError {
    /// Numeric code for the presentation layer
    pub fn code(&self) -> ErrorCode {
        match self {
            EngineError::NotFound(_) => ErrorCode::NoSuchData,
            EngineError::Conflict(_) => ErrorCode::BookNotAvailable,
            EngineError::NotAllowed(_) => ErrorCode::NotExtendable,
            EngineError::InvalidState(_) => ErrorCode::WrongState,
            EngineError::Forbidden(_) => ErrorCode::NotAuthorized,
            EngineError::Transport(_) => ErrorCode::StoreFailure,
        }
    }

    /// Whether the error came from a collaborator rather than a rule
    pub fn is_transport(&self) -> bool {
        matches!(self, EngineError::Transport(_))
    }
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
