//! Configuration validation module.
//!
//! Collects every problem in a configuration instead of stopping at the
//! first, so a bad deployment reports all of them at once.

use crate::{CacheBackend, CacheConfig};
use std::fmt;
use url::Url;

/// Configuration validation error variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    /// Region name is empty.
    EmptyRegion,
    /// URL format is invalid.
    InvalidUrl { url_type: String, message: String },
    /// Pool size must be at least one.
    EmptyPool,
    /// Pool size exceeds maximum allowed.
    PoolSizeTooLarge { value: usize, maximum: usize },
    /// Timeout value must be positive.
    NonPositiveTimeout { name: String, value: u64 },
    /// Redis key prefix is empty.
    EmptyKeyPrefix,
    /// In-process capacity must be at least one entry.
    ZeroCapacity,
    /// Log level is invalid.
    InvalidLogLevel { value: String },
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyRegion => write!(f, "Cache region name cannot be empty"),
            Self::InvalidUrl { url_type, message } => {
                write!(f, "Invalid {} URL: {}", url_type, message)
            }
            Self::EmptyPool => write!(f, "Redis pool size must be at least 1"),
            Self::PoolSizeTooLarge { value, maximum } => {
                write!(f, "Pool size {} exceeds maximum allowed ({})", value, maximum)
            }
            Self::NonPositiveTimeout { name, value } => {
                write!(f, "Timeout '{}' must be positive, got {}", name, value)
            }
            Self::EmptyKeyPrefix => write!(f, "Redis key prefix cannot be empty"),
            Self::ZeroCapacity => write!(f, "Memory cache capacity must be at least 1"),
            Self::InvalidLogLevel { value } => {
                write!(
                    f,
                    "Invalid log level: '{}' (valid: trace, debug, info, warn, error, off)",
                    value
                )
            }
        }
    }
}

impl std::error::Error for ConfigValidationError {}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Maximum connection pool size.
    const MAX_POOL_SIZE: usize = 1000;
    /// Accepted Redis URL schemes.
    const REDIS_SCHEMES: &'static [&'static str] = &["redis", "rediss", "redis+unix", "unix"];
    /// Valid log levels.
    const VALID_LOG_LEVELS: &'static [&'static str] =
        &["trace", "debug", "info", "warn", "error", "off"];

    /// Validates the entire cache configuration.
    ///
    /// Returns Ok(()) if valid, or Err with all validation errors found.
    pub fn validate(config: &CacheConfig) -> Result<(), Vec<ConfigValidationError>> {
        let mut errors = Vec::new();

        if config.region.trim().is_empty() {
            errors.push(ConfigValidationError::EmptyRegion);
        }

        match config.backend {
            CacheBackend::Redis => Self::validate_redis(&config.redis, &mut errors),
            CacheBackend::Memory => {
                if config.memory.max_capacity == 0 {
                    errors.push(ConfigValidationError::ZeroCapacity);
                }
            }
        }

        Self::validate_log_level(&config.logging.level, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validates Redis configuration.
    fn validate_redis(config: &crate::RedisConfig, errors: &mut Vec<ConfigValidationError>) {
        match Url::parse(&config.url) {
            Ok(url) if Self::REDIS_SCHEMES.contains(&url.scheme()) => {}
            Ok(url) => errors.push(ConfigValidationError::InvalidUrl {
                url_type: "redis".to_string(),
                message: format!("unsupported scheme '{}'", url.scheme()),
            }),
            Err(e) => errors.push(ConfigValidationError::InvalidUrl {
                url_type: "redis".to_string(),
                message: e.to_string(),
            }),
        }

        if config.pool_size == 0 {
            errors.push(ConfigValidationError::EmptyPool);
        } else if config.pool_size > Self::MAX_POOL_SIZE {
            errors.push(ConfigValidationError::PoolSizeTooLarge {
                value: config.pool_size,
                maximum: Self::MAX_POOL_SIZE,
            });
        }

        if config.connect_timeout_secs == 0 {
            errors.push(ConfigValidationError::NonPositiveTimeout {
                name: "redis.connect_timeout_secs".to_string(),
                value: 0,
            });
        }
        if config.wait_timeout_secs == 0 {
            errors.push(ConfigValidationError::NonPositiveTimeout {
                name: "redis.wait_timeout_secs".to_string(),
                value: 0,
            });
        }

        if config.key_prefix.is_empty() {
            errors.push(ConfigValidationError::EmptyKeyPrefix);
        }
    }

    /// Validates a filter such as `info` or `warn,nimbus_cache=debug`.
    fn validate_log_level(level: &str, errors: &mut Vec<ConfigValidationError>) {
        let valid = level.split(',').all(|directive| {
            let lvl = directive.rsplit('=').next().unwrap_or_default().trim().to_lowercase();
            Self::VALID_LOG_LEVELS.contains(&lvl.as_str())
        });

        if !valid {
            errors.push(ConfigValidationError::InvalidLogLevel {
                value: level.to_string(),
            });
        }
    }
}

/// Formats validation errors for display.
pub fn format_validation_errors(errors: &[ConfigValidationError]) -> String {
    let mut output = String::from("Configuration validation failed:\n");
    for (i, error) in errors.iter().enumerate() {
        output.push_str(&format!("  {}. {}\n", i + 1, error));
    }
    output
}
