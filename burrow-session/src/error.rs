//! Error types for session operations.

use thiserror::Error;

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Session-specific errors.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Strict lookup of a key the session does not hold
    #[error("Key not found in session: {0}")]
    KeyNotFound(String),

    /// Session ID cannot be used as a storage name
    #[error("Invalid session ID: {0}")]
    InvalidSessionId(String),

    /// File backend I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Deserialization error
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// Shared cache failure
    #[error("Cache error: {0}")]
    Cache(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

#[cfg(feature = "redis")]
impl From<burrow_redis::RedisError> for SessionError {
    fn from(err: burrow_redis::RedisError) -> Self {
        SessionError::Cache(err.to_string())
    }
}
