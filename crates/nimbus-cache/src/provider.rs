//! The cache facade used by application code.

use crate::handle::{CacheHandle, HandleState};
use crate::memory::MemoryCacheFactory;
use crate::redis_cache::RedisCacheFactory;
use crate::region::{CacheFactory, CacheRegion};
use crate::Ttl;
use nimbus_config::{CacheBackend, CacheConfig};
use nimbus_core::{CacheError, CacheResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info};

/// Typed access to one cache region.
///
/// Every operation validates its arguments, then obtains the region from the
/// shared [`CacheHandle`] (connecting on first use) and delegates to it.
/// Values are stored as JSON. Cloning is cheap and clones share the handle.
#[derive(Clone)]
pub struct CacheProvider {
    handle: Arc<CacheHandle>,
}

impl CacheProvider {
    /// Creates a provider that opens `region` through `factory` on first use.
    pub fn new(factory: Arc<dyn CacheFactory>, region: impl Into<String>) -> Self {
        Self {
            handle: Arc::new(CacheHandle::new(factory, region)),
        }
    }

    /// Creates a provider for the backend selected in `config`.
    ///
    /// Nothing is connected until the first operation.
    pub fn from_config(config: &CacheConfig) -> Self {
        info!(
            "Configuring {} cache provider for region '{}'",
            config.backend, config.region
        );

        let factory: Arc<dyn CacheFactory> = match config.backend {
            CacheBackend::Redis => Arc::new(RedisCacheFactory::new(config.redis.clone())),
            CacheBackend::Memory => Arc::new(MemoryCacheFactory::new(config.memory.clone())),
        };

        Self::new(factory, config.region.clone())
    }

    /// Stores `value` under `key` unless the key already exists.
    ///
    /// # Errors
    ///
    /// `KeyAlreadyExists` if a live entry is stored under `key`.
    pub async fn add<T>(&self, key: &str, value: &T) -> CacheResult<()>
    where
        T: Serialize + ?Sized,
    {
        self.insert(key, value, None).await
    }

    /// Stores `value` under `key` for `ttl`, unless the key already exists.
    ///
    /// `ttl` may be a [`Ttl`], a `std::time::Duration` or a `chrono::Duration`.
    /// A zero, negative or longer than [`Ttl::MAX`] TTL fails with
    /// `InvalidArgument` before the cache is touched.
    pub async fn add_with_timeout<T, D>(&self, key: &str, value: &T, ttl: D) -> CacheResult<()>
    where
        T: Serialize + ?Sized,
        D: TryInto<Ttl>,
        D::Error: Into<CacheError>,
    {
        let ttl = to_ttl(ttl)?;
        self.insert(key, value, Some(ttl)).await
    }

    /// Reads the value stored under `key`.
    ///
    /// Absent and expired keys are `Ok(None)`.
    pub async fn get<T>(&self, key: &str) -> CacheResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        validate_key(key)?;
        let region = self.region().await?;

        match region.get(key).await? {
            Some(payload) => Ok(Some(serde_json::from_str(&payload)?)),
            None => Ok(None),
        }
    }

    /// Stores `value` under `key`, replacing any existing entry and its TTL.
    pub async fn set<T>(&self, key: &str, value: &T) -> CacheResult<()>
    where
        T: Serialize + ?Sized,
    {
        validate_key(key)?;
        let payload = encode(key, value)?;
        let region = self.region().await?;

        region.put(key, &payload).await?;
        debug!("Set key '{}'", key);
        Ok(())
    }

    /// Deletes the entry under `key`. Returns whether one existed.
    pub async fn remove(&self, key: &str) -> CacheResult<bool> {
        validate_key(key)?;
        let region = self.region().await?;
        region.remove(key).await
    }

    /// Checks whether a live entry is stored under `key`.
    pub async fn exists(&self, key: &str) -> CacheResult<bool> {
        validate_key(key)?;
        let region = self.region().await?;
        region.exists(key).await
    }

    /// Returns the cached value or computes, adds and returns a new one.
    ///
    /// If another caller adds the key between the read and the add, the stored
    /// value wins and is returned instead.
    pub async fn get_or_add_with<T, D, F, Fut>(
        &self,
        key: &str,
        ttl: D,
        factory: F,
    ) -> CacheResult<T>
    where
        T: Serialize + DeserializeOwned,
        D: TryInto<Ttl>,
        D::Error: Into<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = CacheResult<T>>,
    {
        let ttl = to_ttl(ttl)?;

        if let Some(value) = self.get(key).await? {
            return Ok(value);
        }

        let value = factory().await?;

        match self.insert(key, &value, Some(ttl)).await {
            Ok(()) => Ok(value),
            Err(CacheError::KeyAlreadyExists(_)) => {
                debug!("Key '{}' was added concurrently, reading stored value", key);
                Ok(self.get(key).await?.unwrap_or(value))
            }
            Err(e) => Err(e),
        }
    }

    /// Connects if needed and pings the backend.
    pub async fn health_check(&self) -> CacheResult<()> {
        self.region().await?.ping().await
    }

    /// The handle shared by all clones of this provider.
    pub fn handle(&self) -> &CacheHandle {
        &self.handle
    }

    /// Lifecycle state of the shared handle.
    pub fn state(&self) -> HandleState {
        self.handle.state()
    }

    async fn region(&self) -> CacheResult<&Arc<dyn CacheRegion>> {
        self.handle.get().await
    }

    async fn insert<T>(&self, key: &str, value: &T, ttl: Option<Ttl>) -> CacheResult<()>
    where
        T: Serialize + ?Sized,
    {
        validate_key(key)?;
        let payload = encode(key, value)?;
        let region = self.region().await?;
        region.add(key, &payload, ttl).await
    }
}

impl std::fmt::Debug for CacheProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheProvider")
            .field("handle", &self.handle)
            .finish()
    }
}

fn to_ttl<D>(ttl: D) -> CacheResult<Ttl>
where
    D: TryInto<Ttl>,
    D::Error: Into<CacheError>,
{
    ttl.try_into().map_err(Into::into)
}

fn validate_key(key: &str) -> CacheResult<()> {
    if key.is_empty() {
        return Err(CacheError::invalid_argument("Cache key must not be empty"));
    }
    Ok(())
}

/// JSON-encodes a value. `null` would read back as a miss, so it is refused.
fn encode<T>(key: &str, value: &T) -> CacheResult<String>
where
    T: Serialize + ?Sized,
{
    let payload = serde_json::to_string(value)?;
    if payload == "null" {
        return Err(CacheError::invalid_argument(format!(
            "Cannot cache a null value for key '{}'",
            key
        )));
    }
    Ok(payload)
}
