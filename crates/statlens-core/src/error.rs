//! Shared error type across statlens crates.

use thiserror::Error;

/// Stable error codes surfaced to management clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Unknown attribute, operation, counter or registry.
    NotFound,
    /// Operation invoked with the wrong argument count or type.
    InvalidArgument,
    /// Address already taken by another registry.
    AlreadyPublished,
    /// Malformed publish address.
    InvalidAddress,
    /// Configuration rejected.
    BadConfig,
    /// Unsupported config version.
    UnsupportedVersion,
    /// Internal error.
    Internal,
}

impl ErrorCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::InvalidArgument => "INVALID_ARGUMENT",
            ErrorCode::AlreadyPublished => "ALREADY_PUBLISHED",
            ErrorCode::InvalidAddress => "INVALID_ADDRESS",
            ErrorCode::BadConfig => "BAD_CONFIG",
            ErrorCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, StatsError>;

/// Unified error type used by core and mgmt.
#[derive(Debug, Error)]
pub enum StatsError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("already published: {0}")]
    AlreadyPublished(String),
    #[error("invalid address: {0}")]
    InvalidAddress(String),
    #[error("bad config: {0}")]
    BadConfig(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl StatsError {
    /// Map the error to its stable client-facing code.
    pub fn code(&self) -> ErrorCode {
        match self {
            StatsError::NotFound(_) => ErrorCode::NotFound,
            StatsError::InvalidArgument(_) => ErrorCode::InvalidArgument,
            StatsError::AlreadyPublished(_) => ErrorCode::AlreadyPublished,
            StatsError::InvalidAddress(_) => ErrorCode::InvalidAddress,
            StatsError::BadConfig(_) => ErrorCode::BadConfig,
            StatsError::UnsupportedVersion => ErrorCode::UnsupportedVersion,
            StatsError::Internal(_) => ErrorCode::Internal,
        }
    }
}
