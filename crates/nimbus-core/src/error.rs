//! Unified error type for the cache facade and its backends.

use std::fmt::Debug;
use thiserror::Error;

/// Unified error type for Nimbus cache operations.
///
/// Backend failures are folded into [`CacheError::CacheUnavailable`]; the
/// facade adds no retry or suppression on top of them. A missing key is never
/// an error.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The cache handle could not be created or the backend is unreachable.
    #[error("Cache unavailable: {0}")]
    CacheUnavailable(String),

    /// The caller supplied an invalid argument (empty key, non-positive TTL).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A duplicate-rejecting insert found the key already present.
    #[error("Key already exists: {0}")]
    KeyAlreadyExists(String),

    /// The payload could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Generic error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CacheError {
    /// Returns a machine-readable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::CacheUnavailable(_) => "CACHE_UNAVAILABLE",
            Self::InvalidArgument(_) => "INVALID_ARGUMENT",
            Self::KeyAlreadyExists(_) => "KEY_ALREADY_EXISTS",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Other(_) => "INTERNAL_ERROR",
        }
    }

    /// Creates an unavailable error.
    #[must_use]
    pub fn unavailable<T: Into<String>>(message: T) -> Self {
        Self::CacheUnavailable(message.into())
    }

    /// Creates an invalid argument error.
    #[must_use]
    pub fn invalid_argument<T: Into<String>>(message: T) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Creates a duplicate key error.
    #[must_use]
    pub fn key_exists<T: Into<String>>(key: T) -> Self {
        Self::KeyAlreadyExists(key.into())
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn configuration<T: Into<String>>(message: T) -> Self {
        Self::Configuration(message.into())
    }

    /// Checks if a later call may succeed where this one failed.
    ///
    /// Only unavailability qualifies; the facade itself never retries.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        matches!(self, Self::CacheUnavailable(_))
    }
}

impl From<std::convert::Infallible> for CacheError {
    fn from(err: std::convert::Infallible) -> Self {
        match err {}
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        // Throttling and other transient replies are reported as unavailability too.
        Self::CacheUnavailable(format!("Redis error: {}", err))
    }
}

#[cfg(feature = "redis")]
impl From<deadpool_redis::PoolError> for CacheError {
    fn from(err: deadpool_redis::PoolError) -> Self {
        Self::CacheUnavailable(format!("Failed to get Redis connection: {}", err))
    }
}
