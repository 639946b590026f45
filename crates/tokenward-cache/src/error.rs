//! Error types for the cache layer.

use tokenward_protocol::ProtocolError;

/// Errors raised by a session store backend.
///
/// The in-memory store never fails; these come from backends that talk
/// to another process.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The backend was unreachable or rejected the command.
    #[error("session store unavailable: {0}")]
    Backend(String),

    /// A stored entry could not be encoded or decoded.
    #[error(transparent)]
    Codec(#[from] ProtocolError),
}

#[cfg(feature = "redis")]
impl From<deadpool_redis::redis::RedisError> for CacheError {
    fn from(err: deadpool_redis::redis::RedisError) -> Self {
        Self::Backend(err.to_string())
    }
}

#[cfg(feature = "redis")]
impl From<deadpool_redis::PoolError> for CacheError {
    fn from(err: deadpool_redis::PoolError) -> Self {
        Self::Backend(err.to_string())
    }
}
