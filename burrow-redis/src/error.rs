//! Redis error types.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RedisError>;

#[derive(Debug, Error)]
pub enum RedisError {
    /// Could not reach or authenticate with the server.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Command was rejected or returned an unexpected reply.
    #[error("Command error: {0}")]
    Command(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Value could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Operation timed out")]
    Timeout,

    #[error("Redis error: {0}")]
    Redis(redis::RedisError),
}

impl RedisError {
    /// Whether retrying the same operation may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection(_) | Self::Timeout => true,
            Self::Redis(err) => err.is_connection_dropped() || err.is_timeout(),
            _ => false,
        }
    }

    pub fn is_connection_error(&self) -> bool {
        match self {
            Self::Connection(_) => true,
            Self::Redis(err) => err.is_connection_dropped() || err.is_connection_refusal(),
            _ => false,
        }
    }
}

impl From<redis::RedisError> for RedisError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Redis(err)
        }
    }
}
