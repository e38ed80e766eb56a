//! # Nimbus Cache
//!
//! A lazily connected facade over a distributed key-value cache.
//!
//! [`CacheProvider`] is the entry point. It owns a [`CacheHandle`] that opens
//! the configured region on first use, exactly once, through a
//! [`CacheFactory`]. Backends:
//!
//! - [`RedisCacheFactory`]: a deadpool-redis pool per provider.
//! - [`MemoryCacheFactory`]: in-process regions on moka, for development and tests.
//!
//! ```no_run
//! use nimbus_cache::CacheProvider;
//! use nimbus_config::CacheConfig;
//! use std::time::Duration;
//!
//! # async fn run() -> nimbus_core::CacheResult<()> {
//! let cache = CacheProvider::from_config(&CacheConfig::default());
//!
//! cache.set("session:42", "2024-01-01T00:00:00Z").await?;
//! let started: Option<String> = cache.get("session:42").await?;
//!
//! cache.add_with_timeout("token", &"abc", Duration::from_secs(30)).await?;
//! cache.remove("session:42").await?;
//! # Ok(())
//! # }
//! ```

pub mod handle;
pub mod memory;
pub mod provider;
pub mod redis_cache;
pub mod region;
pub mod ttl;

pub use handle::{CacheHandle, HandleState};
pub use memory::{MemoryCacheFactory, MemoryRegion};
pub use provider::CacheProvider;
pub use redis_cache::{create_pool, RedisCacheFactory, RedisRegion, RegionKeys};
pub use region::{CacheFactory, CacheRegion};
pub use ttl::Ttl;

pub use nimbus_core::{CacheError, CacheResult};
