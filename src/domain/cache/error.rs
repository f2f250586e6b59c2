use std::time::Duration;

use thiserror::Error;

/// Failure of a single cache operation.
///
/// Cache errors never reach the caller of a lookup; they are logged, counted
/// and downgraded to a miss (reads) or a skipped population (writes).
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache connection failed: {0}")]
    Connection(String),

    #[error("Cache operation timed out after {0:?}")]
    Timeout(Duration),

    /// Timeout reported by the client itself rather than our own deadline
    #[error("Cache command timed out: {0}")]
    CommandTimeout(String),

    #[error("Cache connection pool exhausted: {0}")]
    PoolExhausted(String),

    #[error("Cache connection pool is closed")]
    PoolClosed,

    #[error("Cache command failed: {0}")]
    Command(String),
}

impl CacheError {
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    pub fn command(message: impl Into<String>) -> Self {
        Self::Command(message.into())
    }

    /// Short label for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connection(_) => "connection",
            Self::Timeout(_) | Self::CommandTimeout(_) => "timeout",
            Self::PoolExhausted(_) => "pool_exhausted",
            Self::PoolClosed => "pool_closed",
            Self::Command(_) => "command",
        }
    }
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_timeout() {
            Self::CommandTimeout(err.to_string())
        } else if err.is_connection_refusal() || err.is_connection_dropped() || err.is_io_error() {
            Self::Connection(err.to_string())
        } else {
            Self::Command(err.to_string())
        }
    }
}
