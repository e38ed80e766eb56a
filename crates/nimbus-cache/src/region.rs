//! Seams between the facade and a cache service.
//!
//! A [`CacheFactory`] is the single entry point to a backend: given a region
//! name it connects and returns a [`CacheRegion`]. Regions store encoded
//! payloads as opaque strings and never look inside them.

use crate::Ttl;
use async_trait::async_trait;
use nimbus_core::CacheResult;
use std::sync::Arc;

/// An open handle to one named region of a cache service.
#[async_trait]
pub trait CacheRegion: Send + Sync {
    /// Name of the region this handle addresses.
    fn name(&self) -> &str;

    /// Inserts `value` only if `key` is absent.
    ///
    /// Fails with `KeyAlreadyExists` when a live entry is already stored.
    /// With `ttl == None` the service's default retention applies.
    async fn add(&self, key: &str, value: &str, ttl: Option<Ttl>) -> CacheResult<()>;

    /// Returns the stored payload, or `None` if the key is absent or expired.
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Inserts or overwrites `value` with no expiry.
    async fn put(&self, key: &str, value: &str) -> CacheResult<()>;

    /// Deletes the entry. Returns `true` if one existed.
    async fn remove(&self, key: &str) -> CacheResult<bool>;

    /// Check if a key exists in the region.
    async fn exists(&self, key: &str) -> CacheResult<bool>;

    /// Round-trips to the service.
    async fn ping(&self) -> CacheResult<()>;
}

/// Connects to a cache service and opens regions on it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheFactory: Send + Sync {
    /// Connects using the factory's configuration and opens `region`.
    async fn get_cache(&self, region: &str) -> CacheResult<Arc<dyn CacheRegion>>;
}
